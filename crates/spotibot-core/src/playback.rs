//! Transport control on the user's active device.
//!
//! Every mutating call is gated on [`PlaybackClient::active_device_exists`].
//! A failed gate is `Ok(false)` and nothing is sent to the transport API.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::ProviderError;
use crate::spotify::{track_uri, SpotifyApi, StartPlayback};

#[derive(Clone)]
pub struct PlaybackClient {
    api: Arc<dyn SpotifyApi>,
}

impl PlaybackClient {
    pub fn new(api: Arc<dyn SpotifyApi>) -> Self {
        Self { api }
    }

    /// Only the first reported device is considered.
    pub async fn active_device_exists(&self) -> Result<bool, ProviderError> {
        let devices = self.api.devices().await?;
        let active = devices.first().is_some_and(|d| d.is_active);
        if !active {
            debug!("no active device ({} reported)", devices.len());
        }
        Ok(active)
    }

    /// Nothing loaded counts as not playing.
    pub async fn is_playing(&self) -> Result<bool, ProviderError> {
        Ok(self
            .api
            .currently_playing()
            .await?
            .is_some_and(|c| c.is_playing))
    }

    /// Fails (without a transport call) when already paused.
    pub async fn pause(&self) -> Result<bool, ProviderError> {
        if !self.active_device_exists().await? || !self.is_playing().await? {
            return Ok(false);
        }
        self.api.pause_playback().await?;
        Ok(true)
    }

    /// Fails (without a transport call) when already playing.
    pub async fn resume(&self) -> Result<bool, ProviderError> {
        if !self.active_device_exists().await? || self.is_playing().await? {
            return Ok(false);
        }
        self.api.start_playback(StartPlayback::Resume).await?;
        Ok(true)
    }

    pub async fn play_uri(&self, uri: &str) -> Result<bool, ProviderError> {
        if !self.active_device_exists().await? {
            return Ok(false);
        }
        info!("starting {}", uri);
        self.api
            .start_playback(StartPlayback::Uris(vec![uri.to_string()]))
            .await?;
        Ok(true)
    }

    pub async fn play_context(&self, context_uri: &str) -> Result<bool, ProviderError> {
        if !self.active_device_exists().await? {
            return Ok(false);
        }
        info!("starting context {}", context_uri);
        self.api
            .start_playback(StartPlayback::Context(context_uri.to_string()))
            .await?;
        Ok(true)
    }

    /// Queue each track id in order. Needs at least one id.
    pub async fn enqueue(&self, track_ids: &[String]) -> Result<bool, ProviderError> {
        if track_ids.is_empty() || !self.active_device_exists().await? {
            return Ok(false);
        }
        for id in track_ids {
            self.api.add_to_queue(&track_uri(id)).await?;
        }
        Ok(true)
    }

    /// There is no clear-queue endpoint, so skip through it instead.
    ///
    /// Issues exactly `len - 1` skips, which leaves the last queued track in
    /// place. Succeeds only when the queue is non-empty and something is
    /// loaded on the device.
    pub async fn advance_past_queue(&self) -> Result<bool, ProviderError> {
        if !self.active_device_exists().await? {
            return Ok(false);
        }
        let current = self.api.currently_playing().await?;
        let queue = self.api.queue().await?;
        if queue.queue.is_empty() || current.is_none() {
            debug!("queue empty or nothing loaded");
            return Ok(false);
        }
        let skips = queue.queue.len() - 1;
        info!("skipping {} queued track(s)", skips);
        for _ in 0..skips {
            self.api.next_track().await?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::{Call, FakeSpotify};

    #[tokio::test]
    async fn test_pause_while_playing() {
        let fake = Arc::new(FakeSpotify::new().with_active_device(true));
        let playback = PlaybackClient::new(fake.clone());
        assert!(playback.pause().await.unwrap());
        assert_eq!(fake.mutating_calls(), vec![Call::Pause]);
        assert!(!fake.is_playing());
    }

    #[tokio::test]
    async fn test_pause_when_already_paused_is_noop() {
        let fake = Arc::new(FakeSpotify::new().with_active_device(false));
        let playback = PlaybackClient::new(fake.clone());
        assert!(!playback.pause().await.unwrap());
        assert!(fake.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn test_resume_when_already_playing_is_noop() {
        let fake = Arc::new(FakeSpotify::new().with_active_device(true));
        let playback = PlaybackClient::new(fake.clone());
        assert!(!playback.resume().await.unwrap());
        assert!(fake.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_active_device_blocks_everything() {
        let fake = Arc::new(FakeSpotify::new().with_inactive_device().with_queue(3));
        let playback = PlaybackClient::new(fake.clone());
        assert!(!playback.pause().await.unwrap());
        assert!(!playback.resume().await.unwrap());
        assert!(!playback.play_uri("spotify:track:x").await.unwrap());
        assert!(!playback.play_context("spotify:album:y").await.unwrap());
        assert!(!playback.enqueue(&["x".to_string()]).await.unwrap());
        assert!(!playback.advance_past_queue().await.unwrap());
        assert!(fake.mutating_calls().is_empty());
        // No device at all behaves the same.
        let empty = Arc::new(FakeSpotify::new());
        assert!(!PlaybackClient::new(empty).active_device_exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_advance_past_queue_skips_len_minus_one() {
        let fake = Arc::new(FakeSpotify::new().with_active_device(true).with_queue(4));
        let playback = PlaybackClient::new(fake.clone());
        assert!(playback.advance_past_queue().await.unwrap());
        assert_eq!(fake.count(&Call::Next), 3);
    }

    #[tokio::test]
    async fn test_advance_past_empty_queue_fails() {
        let fake = Arc::new(FakeSpotify::new().with_active_device(true));
        let playback = PlaybackClient::new(fake.clone());
        assert!(!playback.advance_past_queue().await.unwrap());
        assert_eq!(fake.count(&Call::Next), 0);
    }

    #[tokio::test]
    async fn test_advance_past_queue_needs_something_loaded() {
        // Active device and a full queue, but nothing loaded on the player.
        let fake = Arc::new(FakeSpotify::new().with_active_device(false).with_queue(3));
        let playback = PlaybackClient::new(fake.clone());
        assert!(!playback.advance_past_queue().await.unwrap());
        assert_eq!(fake.count(&Call::Next), 0);
        assert!(fake.calls().contains(&Call::CurrentlyPlaying));
    }

    #[tokio::test]
    async fn test_enqueue_in_order() {
        let fake = Arc::new(FakeSpotify::new().with_active_device(true));
        let playback = PlaybackClient::new(fake.clone());
        assert!(playback
            .enqueue(&["a".to_string(), "b".to_string()])
            .await
            .unwrap());
        assert_eq!(
            fake.mutating_calls(),
            vec![
                Call::AddToQueue("spotify:track:a".into()),
                Call::AddToQueue("spotify:track:b".into()),
            ]
        );
        assert!(!playback.enqueue(&[]).await.unwrap());
    }
}
