//! In-memory `SpotifyApi` that records every call.
//!
//! Used by the unit and integration tests to assert exactly which requests a
//! handler issued, e.g. "no mutating call" or "N-1 skips".

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::api::{
    Album, Artist, CurrentlyPlaying, Device, NewPlaylist, Playlist, Queue, SpotifyApi,
    StartPlayback, Track, User,
};
use crate::error::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SearchTracks(String),
    SearchAlbums(String),
    SearchArtists(String),
    AlbumTracks(String),
    ArtistTopTracks(String),
    CurrentUser,
    CurrentUserPlaylists(u32),
    PlaylistTracks(String),
    CreatePlaylist { name: String, public: bool, collaborative: bool, description: String },
    PlaylistAddItems { playlist_id: String, uris: Vec<String> },
    Devices,
    CurrentlyPlaying,
    Queue,
    Pause,
    Start(StartPlayback),
    Next,
    AddToQueue(String),
}

impl Call {
    /// Changes playback or library state.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Call::CreatePlaylist { .. }
                | Call::PlaylistAddItems { .. }
                | Call::Pause
                | Call::Start(_)
                | Call::Next
                | Call::AddToQueue(_)
        )
    }
}

#[derive(Default)]
struct State {
    tracks: HashMap<String, Vec<Track>>,
    albums: HashMap<String, Vec<Album>>,
    album_tracks: HashMap<String, Vec<Track>>,
    artists: HashMap<String, Vec<Artist>>,
    top_tracks: HashMap<String, Vec<Track>>,
    playlists: Vec<Playlist>,
    playlist_tracks: HashMap<String, Vec<Track>>,
    devices: Vec<Device>,
    is_playing: bool,
    now_playing: Option<Track>,
    queue: Vec<Track>,
    offline: bool,
    next_playlist_id: u32,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct FakeSpotify {
    state: Mutex<State>,
}

fn t(id: &str, name: &str) -> Track {
    Track {
        id: id.to_string(),
        name: name.to_string(),
    }
}

impl FakeSpotify {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(self, f: impl FnOnce(&mut State)) -> Self {
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
        }
        self
    }

    /// One active device, optionally playing something.
    pub fn with_active_device(self, playing: bool) -> Self {
        self.with(|s| {
            s.devices.push(Device {
                id: Some("device-1".into()),
                name: "This computer".into(),
                is_active: true,
            });
            s.is_playing = playing;
            if playing {
                s.now_playing = Some(t("now", "Now Playing"));
            }
        })
    }

    pub fn with_inactive_device(self) -> Self {
        self.with(|s| {
            s.devices.push(Device {
                id: Some("device-2".into()),
                name: "Phone".into(),
                is_active: false,
            })
        })
    }

    /// Registers a search hit for `track:<name> artist:<artist>`.
    pub fn with_track(self, name: &str, artist: &str, id: &str) -> Self {
        self.with(|s| {
            s.tracks
                .entry(format!("track:{name} artist:{artist}"))
                .or_default()
                .push(t(id, name))
        })
    }

    pub fn with_album(self, name: &str, artist: &str, id: &str, tracks: &[(&str, &str)]) -> Self {
        self.with(|s| {
            s.albums
                .entry(format!("album:{name} artist:{artist}"))
                .or_default()
                .push(Album {
                    id: id.to_string(),
                    name: name.to_string(),
                });
            s.album_tracks.insert(
                id.to_string(),
                tracks.iter().map(|(id, name)| t(id, name)).collect(),
            );
        })
    }

    pub fn with_artist(self, name: &str, id: &str, top: &[(&str, &str)]) -> Self {
        self.with(|s| {
            s.artists
                .entry(format!("artist:{name}"))
                .or_default()
                .push(Artist {
                    id: id.to_string(),
                    name: name.to_string(),
                });
            s.top_tracks.insert(
                id.to_string(),
                top.iter().map(|(id, name)| t(id, name)).collect(),
            );
        })
    }

    pub fn with_playlist(self, name: &str, id: &str, tracks: &[(&str, &str)]) -> Self {
        self.with(|s| {
            s.playlists.push(Playlist {
                id: id.to_string(),
                name: name.to_string(),
            });
            s.playlist_tracks.insert(
                id.to_string(),
                tracks.iter().map(|(id, name)| t(id, name)).collect(),
            );
        })
    }

    /// `len` queued tracks behind whatever is playing.
    pub fn with_queue(self, len: usize) -> Self {
        self.with(|s| {
            s.queue = (0..len)
                .map(|i| t(&format!("q{i}"), &format!("Queued {i}")))
                .collect();
        })
    }

    /// Every request fails with a transport error.
    pub fn offline(self) -> Self {
        self.with(|s| s.offline = true)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn playlists(&self) -> Vec<Playlist> {
        self.state.lock().map(|s| s.playlists.clone()).unwrap_or_default()
    }

    pub fn tracks_in(&self, playlist_id: &str) -> Vec<Track> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.playlist_tracks.get(playlist_id).cloned())
            .unwrap_or_default()
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().map(|s| s.is_playing).unwrap_or(false)
    }

    fn record<T>(&self, call: Call, f: impl FnOnce(&mut State) -> T) -> Result<T, ProviderError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ProviderError::decode("spotify", "fake state poisoned"))?;
        state.calls.push(call);
        if state.offline {
            return Err(ProviderError::Transport {
                provider: "spotify",
                message: "connection refused".into(),
                timeout: false,
            });
        }
        Ok(f(&mut state))
    }
}

fn take<T: Clone>(items: Option<&Vec<T>>, limit: u32) -> Vec<T> {
    items
        .map(|v| v.iter().take(limit as usize).cloned().collect())
        .unwrap_or_default()
}

#[async_trait]
impl SpotifyApi for FakeSpotify {
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<Track>, ProviderError> {
        self.record(Call::SearchTracks(query.into()), |s| {
            take(s.tracks.get(query), limit)
        })
    }

    async fn search_albums(&self, query: &str, limit: u32) -> Result<Vec<Album>, ProviderError> {
        self.record(Call::SearchAlbums(query.into()), |s| {
            take(s.albums.get(query), limit)
        })
    }

    async fn search_artists(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Artist>, ProviderError> {
        self.record(Call::SearchArtists(query.into()), |s| {
            take(s.artists.get(query), limit)
        })
    }

    async fn album_tracks(&self, album_id: &str) -> Result<Vec<Track>, ProviderError> {
        self.record(Call::AlbumTracks(album_id.into()), |s| {
            s.album_tracks.get(album_id).cloned().unwrap_or_default()
        })
    }

    async fn artist_top_tracks(&self, artist_id: &str) -> Result<Vec<Track>, ProviderError> {
        self.record(Call::ArtistTopTracks(artist_id.into()), |s| {
            s.top_tracks.get(artist_id).cloned().unwrap_or_default()
        })
    }

    async fn current_user(&self) -> Result<User, ProviderError> {
        self.record(Call::CurrentUser, |_| User { id: "listener".into() })
    }

    async fn current_user_playlists(&self, limit: u32) -> Result<Vec<Playlist>, ProviderError> {
        self.record(Call::CurrentUserPlaylists(limit), |s| {
            take(Some(&s.playlists), limit)
        })
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>, ProviderError> {
        self.record(Call::PlaylistTracks(playlist_id.into()), |s| {
            s.playlist_tracks.get(playlist_id).cloned().unwrap_or_default()
        })
    }

    async fn create_playlist(
        &self,
        _user_id: &str,
        playlist: NewPlaylist<'_>,
    ) -> Result<Playlist, ProviderError> {
        let call = Call::CreatePlaylist {
            name: playlist.name.into(),
            public: playlist.public,
            collaborative: playlist.collaborative,
            description: playlist.description.into(),
        };
        self.record(call, |s| {
            s.next_playlist_id += 1;
            let created = Playlist {
                id: format!("new-{}", s.next_playlist_id),
                name: playlist.name.to_string(),
            };
            s.playlists.push(created.clone());
            s.playlist_tracks.insert(created.id.clone(), Vec::new());
            created
        })
    }

    async fn playlist_add_items(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), ProviderError> {
        let call = Call::PlaylistAddItems {
            playlist_id: playlist_id.into(),
            uris: uris.to_vec(),
        };
        self.record(call, |s| {
            let list = s.playlist_tracks.entry(playlist_id.to_string()).or_default();
            for uri in uris {
                let id = uri.trim_start_matches("spotify:track:");
                list.push(t(id, id));
            }
        })
    }

    async fn devices(&self) -> Result<Vec<Device>, ProviderError> {
        self.record(Call::Devices, |s| s.devices.clone())
    }

    async fn currently_playing(&self) -> Result<Option<CurrentlyPlaying>, ProviderError> {
        self.record(Call::CurrentlyPlaying, |s| {
            s.now_playing.as_ref().map(|item| CurrentlyPlaying {
                is_playing: s.is_playing,
                item: Some(item.clone()),
            })
        })
    }

    async fn queue(&self) -> Result<Queue, ProviderError> {
        self.record(Call::Queue, |s| Queue {
            currently_playing: s.now_playing.clone(),
            queue: s.queue.clone(),
        })
    }

    async fn pause_playback(&self) -> Result<(), ProviderError> {
        self.record(Call::Pause, |s| s.is_playing = false)
    }

    async fn start_playback(&self, request: StartPlayback) -> Result<(), ProviderError> {
        self.record(Call::Start(request), |s| {
            s.is_playing = true;
            if s.now_playing.is_none() {
                s.now_playing = Some(t("started", "Started"));
            }
        })
    }

    async fn next_track(&self) -> Result<(), ProviderError> {
        self.record(Call::Next, |s| {
            if !s.queue.is_empty() {
                s.now_playing = Some(s.queue.remove(0));
            }
        })
    }

    async fn add_to_queue(&self, uri: &str) -> Result<(), ProviderError> {
        self.record(Call::AddToQueue(uri.into()), |s| {
            let id = uri.trim_start_matches("spotify:track:");
            s.queue.push(t(id, id));
        })
    }
}
