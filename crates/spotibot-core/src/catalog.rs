//! Read-only lookups against the music catalog.
//!
//! Every search keeps the provider's top-ranked hit. Zero hits is `None` or an
//! empty list; only transport failures are errors.

use std::sync::Arc;

use tracing::debug;

use crate::error::ProviderError;
use crate::operation::TrackRequest;
use crate::spotify::{Playlist, SpotifyApi, Track};

/// (display name, catalog id) of a track.
pub type TrackRef = Track;
/// (display name, catalog id) of one of the user's playlists.
pub type PlaylistRef = Playlist;

const TRACK_SEARCH_LIMIT: u32 = 5;
const ALBUM_SEARCH_LIMIT: u32 = 2;
const ARTIST_SEARCH_LIMIT: u32 = 3;
const PLAYLIST_LIMIT: u32 = 50;

#[derive(Clone)]
pub struct CatalogClient {
    api: Arc<dyn SpotifyApi>,
}

impl CatalogClient {
    pub fn new(api: Arc<dyn SpotifyApi>) -> Self {
        Self { api }
    }

    pub async fn search_track(
        &self,
        track_name: &str,
        artist: &str,
    ) -> Result<Option<TrackRef>, ProviderError> {
        let query = format!("track:{track_name} artist:{artist}");
        let hits = self.api.search_tracks(&query, TRACK_SEARCH_LIMIT).await?;
        debug!("track search {:?}: {} hit(s)", query, hits.len());
        Ok(hits.into_iter().next())
    }

    /// Album id of the best match.
    pub async fn search_album(
        &self,
        album_name: &str,
        artist: &str,
    ) -> Result<Option<String>, ProviderError> {
        let query = format!("album:{album_name} artist:{artist}");
        let hits = self.api.search_albums(&query, ALBUM_SEARCH_LIMIT).await?;
        debug!("album search {:?}: {} hit(s)", query, hits.len());
        Ok(hits.into_iter().next().map(|a| a.id))
    }

    pub async fn album_tracks(&self, album_id: &str) -> Result<Vec<TrackRef>, ProviderError> {
        self.api.album_tracks(album_id).await
    }

    /// Top tracks of the best artist match; empty when no artist matches.
    pub async fn artist_top_tracks(
        &self,
        artist_name: &str,
    ) -> Result<Vec<TrackRef>, ProviderError> {
        let query = format!("artist:{artist_name}");
        let artists = self.api.search_artists(&query, ARTIST_SEARCH_LIMIT).await?;
        match artists.into_iter().next() {
            Some(artist) => self.api.artist_top_tracks(&artist.id).await,
            None => {
                debug!("no artist id for {:?}", artist_name);
                Ok(Vec::new())
            }
        }
    }

    /// Refetched on every call; never cached across turns.
    pub async fn user_playlists(&self) -> Result<Vec<PlaylistRef>, ProviderError> {
        self.api.current_user_playlists(PLAYLIST_LIMIT).await
    }

    pub async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<TrackRef>, ProviderError> {
        self.api.playlist_tracks(playlist_id).await
    }

    pub async fn current_user_id(&self) -> Result<String, ProviderError> {
        Ok(self.api.current_user().await?.id)
    }

    /// Search each request in order, dropping the ones without a hit.
    pub async fn resolve_tracks(
        &self,
        requests: &[TrackRequest],
    ) -> Result<Vec<TrackRef>, ProviderError> {
        let mut found = Vec::with_capacity(requests.len());
        for req in requests {
            if let Some(track) = self.search_track(&req.track_name, &req.artist).await? {
                found.push(track);
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::{Call, FakeSpotify};

    fn req(track: &str, artist: &str) -> TrackRequest {
        TrackRequest {
            track_name: track.into(),
            artist: artist.into(),
        }
    }

    #[tokio::test]
    async fn test_search_track_takes_first_hit() {
        let fake = Arc::new(
            FakeSpotify::new()
                .with_track("Fame", "David Bowie", "fame-remaster")
                .with_track("Fame", "David Bowie", "fame-live"),
        );
        let catalog = CatalogClient::new(fake.clone());
        let hit = catalog.search_track("Fame", "David Bowie").await.unwrap();
        assert_eq!(hit.unwrap().id, "fame-remaster");
        assert_eq!(
            fake.calls(),
            vec![Call::SearchTracks("track:Fame artist:David Bowie".into())]
        );
    }

    #[tokio::test]
    async fn test_resolve_tracks_drops_misses() {
        let fake = Arc::new(
            FakeSpotify::new()
                .with_track("Helpless", "Neil Young", "helpless")
                .with_track("On the Beach", "Neil Young", "beach"),
        );
        let catalog = CatalogClient::new(fake);
        let found = catalog
            .resolve_tracks(&[
                req("Helpless", "Neil Young"),
                req("Not A Real Song", "Neil Young"),
                req("On the Beach", "Neil Young"),
            ])
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["helpless", "beach"]);
    }

    #[tokio::test]
    async fn test_top_tracks_without_artist_is_empty() {
        let fake = Arc::new(FakeSpotify::new());
        let catalog = CatalogClient::new(fake.clone());
        assert!(catalog.artist_top_tracks("David Bowie").await.unwrap().is_empty());
        assert_eq!(fake.calls(), vec![Call::SearchArtists("artist:David Bowie".into())]);
    }

    #[tokio::test]
    async fn test_search_album_returns_id() {
        let fake = Arc::new(FakeSpotify::new().with_album(
            "Communique",
            "Dire Straits",
            "communique",
            &[("t1", "Once Upon a Time in the West")],
        ));
        let catalog = CatalogClient::new(fake);
        assert_eq!(
            catalog.search_album("Communique", "Dire Straits").await.unwrap(),
            Some("communique".to_string())
        );
        assert_eq!(catalog.search_album("Communique", "Nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let catalog = CatalogClient::new(Arc::new(FakeSpotify::new().offline()));
        let err = catalog.user_playlists().await.unwrap_err();
        assert!(err.is_transient());
    }
}
