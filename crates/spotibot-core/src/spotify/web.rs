//! `SpotifyApi` over the Spotify Web API, via `rspotify`.
//!
//! rspotify handles auth headers, token refresh, pagination and empty (204)
//! responses. This file only converts between its models and ours.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use rspotify::model::{
    AdditionalType, AlbumId, ArtistId, Market, PlayContextId, PlayableId, PlayableItem,
    PlaylistId, SearchResult, SearchType, TrackId, UserId,
};
use rspotify::prelude::*;
use rspotify::AuthCodeSpotify;
use tracing::debug;

use super::api::{
    Album, Artist, CurrentlyPlaying, Device, NewPlaylist, Playlist, Queue, SpotifyApi,
    StartPlayback, Track, User,
};
use crate::error::ProviderError;

const PROVIDER: &str = "spotify";
/// Spotify rejects more than this many URIs per add-items request.
const ADD_ITEMS_CHUNK: usize = 100;

fn bad_id<E: std::fmt::Display>(raw: &str) -> impl FnOnce(E) -> ProviderError + '_ {
    move |e| ProviderError::decode(PROVIDER, format!("`{raw}`: {e}"))
}

/// Tracks and episodes both occupy a slot in the player; anything without
/// an id (local files) is dropped.
fn playable_track(item: PlayableItem) -> Option<Track> {
    match item {
        PlayableItem::Track(t) => t.id.map(|id| Track {
            id: id.id().to_string(),
            name: t.name,
        }),
        PlayableItem::Episode(e) => Some(Track {
            id: e.id.id().to_string(),
            name: e.name,
        }),
    }
}

pub fn playable_ids(uris: &[String]) -> Result<Vec<PlayableId<'static>>, ProviderError> {
    uris.iter()
        .map(|uri| {
            TrackId::from_uri(uri)
                .map(|id| PlayableId::Track(id.into_static()))
                .map_err(bad_id(uri))
        })
        .collect()
}

/// Album or playlist URI to a playback context.
pub fn context_id(uri: &str) -> Result<PlayContextId<'static>, ProviderError> {
    if let Ok(album) = AlbumId::from_uri(uri) {
        return Ok(PlayContextId::Album(album.into_static()));
    }
    PlaylistId::from_uri(uri)
        .map(|playlist| PlayContextId::Playlist(playlist.into_static()))
        .map_err(bad_id(uri))
}

pub struct SpotifyWeb {
    client: AuthCodeSpotify,
}

impl SpotifyWeb {
    pub fn new(client: AuthCodeSpotify) -> Self {
        Self { client }
    }

    async fn search(
        &self,
        query: &str,
        kind: SearchType,
        limit: u32,
    ) -> Result<SearchResult, ProviderError> {
        debug!("spotify search {:?}: {}", kind, query);
        Ok(self
            .client
            .search(query, kind, None, None, Some(limit), None)
            .await?)
    }
}

#[async_trait]
impl SpotifyApi for SpotifyWeb {
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<Track>, ProviderError> {
        match self.search(query, SearchType::Track, limit).await? {
            SearchResult::Tracks(page) => Ok(page
                .items
                .into_iter()
                .filter_map(|t| {
                    t.id.map(|id| Track {
                        id: id.id().to_string(),
                        name: t.name,
                    })
                })
                .collect()),
            _ => Ok(Vec::new()),
        }
    }

    async fn search_albums(&self, query: &str, limit: u32) -> Result<Vec<Album>, ProviderError> {
        match self.search(query, SearchType::Album, limit).await? {
            SearchResult::Albums(page) => Ok(page
                .items
                .into_iter()
                .filter_map(|a| {
                    a.id.map(|id| Album {
                        id: id.id().to_string(),
                        name: a.name,
                    })
                })
                .collect()),
            _ => Ok(Vec::new()),
        }
    }

    async fn search_artists(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Artist>, ProviderError> {
        match self.search(query, SearchType::Artist, limit).await? {
            SearchResult::Artists(page) => Ok(page
                .items
                .into_iter()
                .map(|a| Artist {
                    id: a.id.id().to_string(),
                    name: a.name,
                })
                .collect()),
            _ => Ok(Vec::new()),
        }
    }

    async fn album_tracks(&self, album_id: &str) -> Result<Vec<Track>, ProviderError> {
        let id = AlbumId::from_id(album_id).map_err(bad_id(album_id))?;
        let tracks: Vec<_> = self.client.album_track(id, None).try_collect().await?;
        Ok(tracks
            .into_iter()
            .filter_map(|t| {
                t.id.map(|id| Track {
                    id: id.id().to_string(),
                    name: t.name,
                })
            })
            .collect())
    }

    async fn artist_top_tracks(&self, artist_id: &str) -> Result<Vec<Track>, ProviderError> {
        let id = ArtistId::from_id(artist_id).map_err(bad_id(artist_id))?;
        let tracks = self
            .client
            .artist_top_tracks(id, Some(Market::FromToken))
            .await?;
        Ok(tracks
            .into_iter()
            .filter_map(|t| {
                t.id.map(|id| Track {
                    id: id.id().to_string(),
                    name: t.name,
                })
            })
            .collect())
    }

    async fn current_user(&self) -> Result<User, ProviderError> {
        let me = self.client.me().await?;
        Ok(User {
            id: me.id.id().to_string(),
        })
    }

    async fn current_user_playlists(&self, limit: u32) -> Result<Vec<Playlist>, ProviderError> {
        let page = self
            .client
            .current_user_playlists_manual(Some(limit), None)
            .await?;
        Ok(page
            .items
            .into_iter()
            .map(|p| Playlist {
                id: p.id.id().to_string(),
                name: p.name,
            })
            .collect())
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>, ProviderError> {
        let id = PlaylistId::from_id(playlist_id).map_err(bad_id(playlist_id))?;
        let items: Vec<_> = self
            .client
            .playlist_items(id, None, None)
            .try_collect()
            .await?;
        Ok(items
            .into_iter()
            .filter_map(|item| item.track)
            .filter_map(playable_track)
            .collect())
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        playlist: NewPlaylist<'_>,
    ) -> Result<Playlist, ProviderError> {
        let user = UserId::from_id(user_id).map_err(bad_id(user_id))?;
        let created = self
            .client
            .user_playlist_create(
                user,
                playlist.name,
                Some(playlist.public),
                Some(playlist.collaborative),
                Some(playlist.description),
            )
            .await?;
        Ok(Playlist {
            id: created.id.id().to_string(),
            name: created.name,
        })
    }

    async fn playlist_add_items(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), ProviderError> {
        let id = PlaylistId::from_id(playlist_id).map_err(bad_id(playlist_id))?;
        for chunk in uris.chunks(ADD_ITEMS_CHUNK) {
            let items = playable_ids(chunk)?;
            self.client
                .playlist_add_items(id.clone(), items, None)
                .await?;
        }
        Ok(())
    }

    async fn devices(&self) -> Result<Vec<Device>, ProviderError> {
        let devices = self.client.device().await?;
        Ok(devices
            .into_iter()
            .map(|d| Device {
                id: d.id,
                name: d.name,
                is_active: d.is_active,
            })
            .collect())
    }

    async fn currently_playing(&self) -> Result<Option<CurrentlyPlaying>, ProviderError> {
        let context = self
            .client
            .current_playing(None, Some(&[AdditionalType::Track, AdditionalType::Episode]))
            .await?;
        Ok(context.map(|c| CurrentlyPlaying {
            is_playing: c.is_playing,
            item: c.item.and_then(playable_track),
        }))
    }

    async fn queue(&self) -> Result<Queue, ProviderError> {
        let queue = self.client.current_user_queue().await?;
        Ok(Queue {
            currently_playing: queue.currently_playing.and_then(playable_track),
            queue: queue.queue.into_iter().filter_map(playable_track).collect(),
        })
    }

    async fn pause_playback(&self) -> Result<(), ProviderError> {
        Ok(self.client.pause_playback(None).await?)
    }

    async fn start_playback(&self, request: StartPlayback) -> Result<(), ProviderError> {
        match request {
            StartPlayback::Resume => self.client.resume_playback(None, None).await?,
            StartPlayback::Uris(uris) => {
                let items = playable_ids(&uris)?;
                self.client
                    .start_uris_playback(items, None, None, None)
                    .await?
            }
            StartPlayback::Context(uri) => {
                let context = context_id(&uri)?;
                self.client
                    .start_context_playback(context, None, None, None)
                    .await?
            }
        }
        Ok(())
    }

    async fn next_track(&self) -> Result<(), ProviderError> {
        Ok(self.client.next_track(None).await?)
    }

    async fn add_to_queue(&self, uri: &str) -> Result<(), ProviderError> {
        let item = TrackId::from_uri(uri).map_err(bad_id(uri))?;
        Ok(self
            .client
            .add_item_to_queue(PlayableId::Track(item), None)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playable_ids_from_track_uris() {
        let uris = vec![
            "spotify:track:4uLU6hMCjMI75M1A2tKUQC".to_string(),
            "spotify:track:6rqhFgbbKwnb9MLmUQDhG6".to_string(),
        ];
        let ids = playable_ids(&uris).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(matches!(&ids[0], PlayableId::Track(id) if id.id() == "4uLU6hMCjMI75M1A2tKUQC"));
    }

    #[test]
    fn test_playable_ids_rejects_other_kinds() {
        let uris = vec!["spotify:album:4aawyAB9vmqN3uQ7FjRGTy".to_string()];
        let err = playable_ids(&uris).unwrap_err();
        assert!(matches!(err, ProviderError::Decode { provider: "spotify", .. }));
    }

    #[test]
    fn test_context_id_album_and_playlist() {
        assert!(matches!(
            context_id("spotify:album:4aawyAB9vmqN3uQ7FjRGTy").unwrap(),
            PlayContextId::Album(_)
        ));
        assert!(matches!(
            context_id("spotify:playlist:37i9dQZF1DXcBWIGoYBM5M").unwrap(),
            PlayContextId::Playlist(_)
        ));
        assert!(context_id("spotify:track:4uLU6hMCjMI75M1A2tKUQC").is_err());
    }
}
