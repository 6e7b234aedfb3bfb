use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: Option<String>,
    pub name: String,
    pub is_active: bool,
}

/// `GET /me/player/currently-playing`; `None` at the API level means 204.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentlyPlaying {
    pub is_playing: bool,
    pub item: Option<Track>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub currently_playing: Option<Track>,
    pub queue: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlaylist<'a> {
    pub name: &'a str,
    pub public: bool,
    pub collaborative: bool,
    pub description: &'a str,
}

/// Body of `PUT /me/player/play`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPlayback {
    /// Resume whatever was loaded.
    Resume,
    Uris(Vec<String>),
    Context(String),
}

/// The subset of the Spotify Web API the bot uses.
///
/// "Nothing found" is an empty `Vec` or `None`, never an error.
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<Track>, ProviderError>;
    async fn search_albums(&self, query: &str, limit: u32) -> Result<Vec<Album>, ProviderError>;
    async fn search_artists(&self, query: &str, limit: u32)
        -> Result<Vec<Artist>, ProviderError>;

    async fn album_tracks(&self, album_id: &str) -> Result<Vec<Track>, ProviderError>;
    async fn artist_top_tracks(&self, artist_id: &str) -> Result<Vec<Track>, ProviderError>;

    async fn current_user(&self) -> Result<User, ProviderError>;
    async fn current_user_playlists(&self, limit: u32) -> Result<Vec<Playlist>, ProviderError>;
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>, ProviderError>;
    async fn create_playlist(
        &self,
        user_id: &str,
        playlist: NewPlaylist<'_>,
    ) -> Result<Playlist, ProviderError>;
    async fn playlist_add_items(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), ProviderError>;

    async fn devices(&self) -> Result<Vec<Device>, ProviderError>;
    async fn currently_playing(&self) -> Result<Option<CurrentlyPlaying>, ProviderError>;
    async fn queue(&self) -> Result<Queue, ProviderError>;

    async fn pause_playback(&self) -> Result<(), ProviderError>;
    async fn start_playback(&self, request: StartPlayback) -> Result<(), ProviderError>;
    async fn next_track(&self) -> Result<(), ProviderError>;
    async fn add_to_queue(&self, uri: &str) -> Result<(), ProviderError>;
}

pub fn track_uri(id: &str) -> String {
    format!("spotify:track:{id}")
}

pub fn album_uri(id: &str) -> String {
    format!("spotify:album:{id}")
}

pub fn playlist_uri(id: &str) -> String {
    format!("spotify:playlist:{id}")
}
