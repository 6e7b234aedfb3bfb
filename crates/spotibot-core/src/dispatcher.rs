//! Routes one decoded function call to its handler and renders the fixed
//! success/failure messages.

use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::{CatalogClient, TrackRef};
use crate::error::ProviderError;
use crate::operation::{AlbumRequest, FunctionCall, Operation, TrackRequest};
use crate::playback::PlaybackClient;
use crate::reconciler::{resolve_playlist_name, PlaylistReconciler};
use crate::spotify::{album_uri, playlist_uri, track_uri, SpotifyApi};

/// What the model's reply asks for this turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    NoAction,
    Narrate(String),
    Execute {
        narration: Option<String>,
        call: FunctionCall,
    },
}

impl Turn {
    pub fn new(text: Option<String>, call: Option<FunctionCall>) -> Self {
        let text = text.filter(|t| !t.trim().is_empty());
        match (text, call) {
            (narration, Some(call)) => Self::Execute { narration, call },
            (Some(text), None) => Self::Narrate(text),
            (None, None) => Self::NoAction,
        }
    }
}

/// A clickable catalog entry in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub name: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Shown and recorded as-is.
    Text(String),
    /// Shown as `heading` plus links; `summary` is what later turns see.
    Listing {
        heading: String,
        items: Vec<Link>,
        summary: String,
    },
}

impl Reply {
    /// The text appended to the message history for this reply.
    pub fn history_text(&self) -> &str {
        match self {
            Reply::Text(text) => text,
            Reply::Listing { summary, .. } => summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub operation: &'static str,
    pub success: bool,
    pub replies: Vec<Reply>,
    pub reset_history: bool,
}

enum Handled {
    Done(Vec<Reply>),
    Failed,
}

impl Handled {
    fn text(s: String) -> Self {
        Handled::Done(vec![Reply::Text(s)])
    }

    fn from_flag(ok: bool, success: impl FnOnce() -> String) -> Self {
        if ok {
            Self::text(success())
        } else {
            Handled::Failed
        }
    }
}

mod templates {
    pub const CLEAR_QUEUE_NOTICE: &str = "Note: there is no clear queue function so as a workaround I'm going to try to skip through the whole queue.";
    pub const ADD_TO_QUEUE_NOTICE: &str = "OK I'm adding the tracks. This can take a minute.";

    pub const CLEAR_QUEUE_OK: &str = "OK I think I successfully skipped the queue.";
    pub const ADD_TO_PLAYLIST_OK: &str = "OK I added those tracks to the playlist.";
    pub const ADD_TO_QUEUE_OK: &str = "OK I added those tracks to your queue.";
    pub const PAUSE_OK: &str = "OK I successfully paused playback.";
    pub const START_OK: &str = "OK I successfully started playback.";
    pub const PLAY_PLAYLIST_OK: &str = "OK I successfully started the playlist.";
    pub const PLAYLISTS_HEADING: &str = "These are your current playlists:";

    pub const ALBUM_TRACKS_FAIL: &str =
        "I wasn't able to find that album/artist combination. Please try again.";
    pub const PLAY_TRACK_FAIL: &str = "I wasn't able to start that track. Please check your spelling ensure Spotify is running on this device.";
    pub const PLAY_ALBUM_FAIL: &str = "I wasn't able to start that album. Please check your spelling ensure Spotify is running on this device.";
    pub const CLEAR_QUEUE_FAIL: &str = "I wasn't able to clear the queue. Perhaps it was already empty or Spotify was not running on this device.";
    pub const LOOKUP_FAIL: &str = "I wasn't able to look that up on Spotify.";
    pub const ADD_TO_PLAYLIST_FAIL: &str = "I had a problem adding those tracks to your playlist.";
    pub const ADD_TO_QUEUE_FAIL: &str = "I had a problem adding those tracks to your queue. Please ensure Spotify is running on this device.";
    pub const PAUSE_FAIL: &str =
        "I wasn't able to pause playback. Please ensure Spotify is running on this device.";
    pub const START_FAIL: &str =
        "I wasn't able to start playback. Please ensure Spotify is running on this device.";
    pub const GET_PLAYLISTS_FAIL: &str =
        "I wasn't able to get your playlists. Please ensure Spotify is running on this device.";
    pub const PLAY_PLAYLIST_FAIL: &str = "I wasn't able to start playback. Please check the playlist name and ensure Spotify is running on this device.";
}

pub use templates::*;

fn notice(op: &Operation) -> Option<&'static str> {
    match op {
        Operation::ClearQueue => Some(CLEAR_QUEUE_NOTICE),
        Operation::AddToQueue { .. } => Some(ADD_TO_QUEUE_NOTICE),
        _ => None,
    }
}

fn failure_text(op: &Operation) -> Option<&'static str> {
    let text = match op {
        Operation::AlbumTracks { .. } => ALBUM_TRACKS_FAIL,
        Operation::PlayTrack { .. } => PLAY_TRACK_FAIL,
        Operation::PlayAlbum { .. } => PLAY_ALBUM_FAIL,
        Operation::ClearQueue => CLEAR_QUEUE_FAIL,
        Operation::TopTracks { .. } | Operation::PlaylistTracks { .. } => LOOKUP_FAIL,
        Operation::AddToPlaylist { .. } => ADD_TO_PLAYLIST_FAIL,
        Operation::AddToQueue { .. } => ADD_TO_QUEUE_FAIL,
        Operation::Pause => PAUSE_FAIL,
        Operation::Start => START_FAIL,
        Operation::GetPlaylists => GET_PLAYLISTS_FAIL,
        Operation::PlayPlaylist { .. } => PLAY_PLAYLIST_FAIL,
        Operation::Reset => return None,
    };
    Some(text)
}

/// Names joined the way the chat history has always carried them.
fn name_block(names: impl Iterator<Item = String>) -> String {
    names.map(|n| n + "  \n").collect()
}

fn track_listing(heading: String, summary_prefix: &str, tracks: Vec<TrackRef>) -> Handled {
    if tracks.is_empty() {
        return Handled::Failed;
    }
    let summary = format!(
        "{summary_prefix}{}",
        name_block(tracks.iter().map(|t| t.name.clone()))
    );
    let items = tracks
        .into_iter()
        .map(|t| Link {
            uri: track_uri(&t.id),
            name: t.name,
        })
        .collect();
    Handled::Done(vec![Reply::Listing {
        heading,
        items,
        summary,
    }])
}

#[derive(Clone)]
pub struct Dispatcher {
    catalog: CatalogClient,
    playback: PlaybackClient,
    reconciler: PlaylistReconciler,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn SpotifyApi>) -> Self {
        Self {
            catalog: CatalogClient::new(api.clone()),
            playback: PlaybackClient::new(api.clone()),
            reconciler: PlaylistReconciler::new(api),
        }
    }

    /// Decode and run a function call. `None` means the call did not fit the
    /// operation schema and the turn is treated as no action.
    pub async fn dispatch(&self, call: &FunctionCall) -> Option<Outcome> {
        info!("function call {} {}", call.name, call.arguments);
        match Operation::decode(call) {
            Ok(op) => Some(self.execute(&op).await),
            Err(e) => {
                warn!("ignoring function call: {}", e);
                None
            }
        }
    }

    pub async fn execute(&self, op: &Operation) -> Outcome {
        let mut replies: Vec<Reply> = notice(op)
            .map(|n| Reply::Text(n.to_string()))
            .into_iter()
            .collect();

        let handled = match self.handle(op).await {
            Ok(handled) => handled,
            Err(e) => {
                warn!("{} failed: {}", op.name(), e);
                Handled::Failed
            }
        };

        let success = match handled {
            Handled::Done(mut done) => {
                replies.append(&mut done);
                true
            }
            Handled::Failed => {
                warn!("{} reported failure", op.name());
                replies.extend(failure_text(op).map(|t| Reply::Text(t.to_string())));
                false
            }
        };

        Outcome {
            operation: op.name(),
            success,
            replies,
            reset_history: matches!(op, Operation::Reset),
        }
    }

    async fn handle(&self, op: &Operation) -> Result<Handled, ProviderError> {
        match op {
            Operation::AlbumTracks { album } => self.album_tracks(album).await,
            Operation::PlayTrack { tracks } => self.play_track(tracks).await,
            Operation::PlayAlbum { albums } => self.play_album(albums).await,
            Operation::ClearQueue => Ok(Handled::from_flag(
                self.playback.advance_past_queue().await?,
                || CLEAR_QUEUE_OK.to_string(),
            )),
            Operation::TopTracks { artist_name } => {
                let tracks = self.catalog.artist_top_tracks(artist_name).await?;
                Ok(track_listing(
                    format!("The top tracks by {artist_name} are:"),
                    "These are the tracks:   \n ",
                    tracks,
                ))
            }
            Operation::AddToPlaylist {
                new_flag,
                playlist_name,
                tracks,
            } => self.add_to_playlist(*new_flag, playlist_name, tracks).await,
            Operation::AddToQueue { tracks } => {
                let ids = self.resolve_ids(tracks).await?;
                Ok(Handled::from_flag(self.playback.enqueue(&ids).await?, || {
                    ADD_TO_QUEUE_OK.to_string()
                }))
            }
            Operation::Pause => Ok(Handled::from_flag(self.playback.pause().await?, || {
                PAUSE_OK.to_string()
            })),
            Operation::Start => Ok(Handled::from_flag(self.playback.resume().await?, || {
                START_OK.to_string()
            })),
            Operation::GetPlaylists => self.get_playlists().await,
            Operation::PlaylistTracks { playlist_name } => {
                self.playlist_tracks(playlist_name).await
            }
            Operation::PlayPlaylist { playlist_name } => self.play_playlist(playlist_name).await,
            Operation::Reset => Ok(Handled::Done(Vec::new())),
        }
    }

    async fn resolve_ids(&self, tracks: &[TrackRequest]) -> Result<Vec<String>, ProviderError> {
        Ok(self
            .catalog
            .resolve_tracks(tracks)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect())
    }

    async fn album_tracks(&self, album: &[AlbumRequest]) -> Result<Handled, ProviderError> {
        let Some(req) = album.first() else {
            return Ok(Handled::Failed);
        };
        let Some(album_id) = self.catalog.search_album(&req.album_name, &req.artist).await? else {
            return Ok(Handled::Failed);
        };
        let tracks = self.catalog.album_tracks(&album_id).await?;
        Ok(track_listing(
            format!(
                "The tracks on the album {} by {} are:",
                req.album_name, req.artist
            ),
            "These are the tracks: ",
            tracks,
        ))
    }

    /// Needs exactly one resolved track.
    async fn play_track(&self, tracks: &[TrackRequest]) -> Result<Handled, ProviderError> {
        let ids = self.resolve_ids(tracks).await?;
        let (Some(req), [id]) = (tracks.first(), ids.as_slice()) else {
            return Ok(Handled::Failed);
        };
        let ok = self.playback.play_uri(&track_uri(id)).await?;
        Ok(Handled::from_flag(ok, || {
            format!(
                "OK I successfully started the track {} by {}.",
                req.track_name, req.artist
            )
        }))
    }

    async fn play_album(&self, albums: &[AlbumRequest]) -> Result<Handled, ProviderError> {
        let Some(req) = albums.first() else {
            return Ok(Handled::Failed);
        };
        let Some(album_id) = self.catalog.search_album(&req.album_name, &req.artist).await? else {
            return Ok(Handled::Failed);
        };
        let ok = self.playback.play_context(&album_uri(&album_id)).await?;
        Ok(Handled::from_flag(ok, || {
            format!(
                "OK I successfully started the album {} by {}.",
                req.album_name, req.artist
            )
        }))
    }

    async fn add_to_playlist(
        &self,
        new_flag: bool,
        playlist_name: &str,
        tracks: &[TrackRequest],
    ) -> Result<Handled, ProviderError> {
        if !self.playback.active_device_exists().await? {
            return Ok(Handled::Failed);
        }
        let ids = self.resolve_ids(tracks).await?;
        let ok = self
            .reconciler
            .append_tracks(playlist_name, new_flag, &ids)
            .await?;
        Ok(Handled::from_flag(ok, || ADD_TO_PLAYLIST_OK.to_string()))
    }

    async fn get_playlists(&self) -> Result<Handled, ProviderError> {
        let playlists = self.catalog.user_playlists().await?;
        if playlists.is_empty() {
            return Ok(Handled::Failed);
        }
        let summary = format!(
            "{PLAYLISTS_HEADING}   \n {}",
            name_block(playlists.iter().map(|p| p.name.clone()))
        );
        let items = playlists
            .into_iter()
            .map(|p| Link {
                uri: playlist_uri(&p.id),
                name: p.name,
            })
            .collect();
        Ok(Handled::Done(vec![Reply::Listing {
            heading: PLAYLISTS_HEADING.to_string(),
            items,
            summary,
        }]))
    }

    async fn playlist_tracks(&self, playlist_name: &str) -> Result<Handled, ProviderError> {
        let playlists = self.catalog.user_playlists().await?;
        let Some(playlist) = resolve_playlist_name(playlist_name, &playlists) else {
            return Ok(Handled::Failed);
        };
        let tracks = self.catalog.playlist_tracks(&playlist.id).await?;
        Ok(track_listing(
            format!("The tracks in the playlist {playlist_name} are:"),
            "These are the tracks:   \n ",
            tracks,
        ))
    }

    async fn play_playlist(&self, playlist_name: &str) -> Result<Handled, ProviderError> {
        let playlists = self.catalog.user_playlists().await?;
        let Some(playlist) = resolve_playlist_name(playlist_name, &playlists) else {
            return Ok(Handled::Failed);
        };
        let ok = self.playback.play_context(&playlist_uri(&playlist.id)).await?;
        Ok(Handled::from_flag(ok, || PLAY_PLAYLIST_OK.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::{Call, FakeSpotify, StartPlayback};
    use serde_json::json;

    fn dispatcher(fake: &Arc<FakeSpotify>) -> Dispatcher {
        Dispatcher::new(fake.clone())
    }

    fn texts(outcome: &Outcome) -> Vec<&str> {
        outcome.replies.iter().map(Reply::history_text).collect()
    }

    #[test]
    fn test_turn_classification() {
        assert_eq!(Turn::new(None, None), Turn::NoAction);
        assert_eq!(Turn::new(Some("  ".into()), None), Turn::NoAction);
        assert_eq!(
            Turn::new(Some("Fame was co-written in 1975.".into()), None),
            Turn::Narrate("Fame was co-written in 1975.".into())
        );
        let call = FunctionCall {
            name: "pause".into(),
            arguments: json!({}),
        };
        assert!(matches!(
            Turn::new(None, Some(call)),
            Turn::Execute { narration: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_call_is_no_action() {
        let fake = Arc::new(FakeSpotify::new().with_active_device(true));
        let call = FunctionCall {
            name: "shuffle".into(),
            arguments: json!({}),
        };
        assert!(dispatcher(&fake).dispatch(&call).await.is_none());
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_play_track_success() {
        let fake = Arc::new(
            FakeSpotify::new()
                .with_active_device(false)
                .with_track("Fame", "David Bowie", "fame"),
        );
        let outcome = dispatcher(&fake)
            .execute(&Operation::PlayTrack {
                tracks: vec![TrackRequest {
                    track_name: "Fame".into(),
                    artist: "David Bowie".into(),
                }],
            })
            .await;
        assert!(outcome.success);
        assert_eq!(texts(&outcome), vec!["OK I successfully started the track Fame by David Bowie."]);
        assert_eq!(
            fake.mutating_calls(),
            vec![Call::Start(StartPlayback::Uris(vec!["spotify:track:fame".into()]))]
        );
    }

    #[tokio::test]
    async fn test_play_track_needs_exactly_one_hit() {
        let fake = Arc::new(
            FakeSpotify::new()
                .with_active_device(false)
                .with_track("Fame", "David Bowie", "fame")
                .with_track("Heroes", "David Bowie", "heroes"),
        );
        let req = |name: &str| TrackRequest {
            track_name: name.into(),
            artist: "David Bowie".into(),
        };
        let outcome = dispatcher(&fake)
            .execute(&Operation::PlayTrack {
                tracks: vec![req("Fame"), req("Heroes")],
            })
            .await;
        assert!(!outcome.success);
        assert_eq!(texts(&outcome), vec![PLAY_TRACK_FAIL]);
        assert!(fake.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn test_album_tracks_listing() {
        let fake = Arc::new(FakeSpotify::new().with_album(
            "Communique",
            "Dire Straits",
            "comm",
            &[("t1", "Once Upon a Time in the West"), ("t2", "News")],
        ));
        let outcome = dispatcher(&fake)
            .execute(&Operation::AlbumTracks {
                album: vec![AlbumRequest {
                    album_name: "Communique".into(),
                    artist: "Dire Straits".into(),
                }],
            })
            .await;
        assert!(outcome.success);
        match &outcome.replies[0] {
            Reply::Listing {
                heading,
                items,
                summary,
            } => {
                assert_eq!(heading, "The tracks on the album Communique by Dire Straits are:");
                assert_eq!(items[1].uri, "spotify:track:t2");
                assert_eq!(
                    summary,
                    "These are the tracks: Once Upon a Time in the West  \nNews  \n"
                );
            }
            other => panic!("expected listing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_clear_queue_notice_precedes_result() {
        let fake = Arc::new(FakeSpotify::new().with_active_device(true).with_queue(3));
        let outcome = dispatcher(&fake).execute(&Operation::ClearQueue).await;
        assert_eq!(texts(&outcome), vec![CLEAR_QUEUE_NOTICE, CLEAR_QUEUE_OK]);
        assert_eq!(fake.count(&Call::Next), 2);
    }

    #[tokio::test]
    async fn test_add_to_queue_without_hits_fails() {
        let fake = Arc::new(FakeSpotify::new().with_active_device(true));
        let outcome = dispatcher(&fake)
            .execute(&Operation::AddToQueue {
                tracks: vec![TrackRequest {
                    track_name: "Nothing".into(),
                    artist: "Nobody".into(),
                }],
            })
            .await;
        assert_eq!(texts(&outcome), vec![ADD_TO_QUEUE_NOTICE, ADD_TO_QUEUE_FAIL]);
        assert!(fake.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_to_playlist_requires_device() {
        let fake = Arc::new(
            FakeSpotify::new()
                .with_inactive_device()
                .with_track("Helpless", "Neil Young", "helpless"),
        );
        let outcome = dispatcher(&fake)
            .execute(&Operation::AddToPlaylist {
                new_flag: true,
                playlist_name: "Deep Neil".into(),
                tracks: vec![TrackRequest {
                    track_name: "Helpless".into(),
                    artist: "Neil Young".into(),
                }],
            })
            .await;
        assert!(!outcome.success);
        assert_eq!(texts(&outcome), vec![ADD_TO_PLAYLIST_FAIL]);
        assert!(fake.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn test_play_playlist_uses_fuzzy_match() {
        let fake = Arc::new(
            FakeSpotify::new()
                .with_active_device(false)
                .with_playlist("Chill Vibes", "chill", &[]),
        );
        let outcome = dispatcher(&fake)
            .execute(&Operation::PlayPlaylist {
                playlist_name: "Chill vibes".into(),
            })
            .await;
        assert!(outcome.success);
        assert_eq!(
            fake.mutating_calls(),
            vec![Call::Start(StartPlayback::Context("spotify:playlist:chill".into()))]
        );
    }

    #[tokio::test]
    async fn test_get_playlists_summary() {
        let fake = Arc::new(
            FakeSpotify::new()
                .with_playlist("Deep Neil", "dn", &[])
                .with_playlist("Chillwave", "cw", &[]),
        );
        let outcome = dispatcher(&fake).execute(&Operation::GetPlaylists).await;
        assert_eq!(
            texts(&outcome),
            vec!["These are your current playlists:   \n Deep Neil  \nChillwave  \n"]
        );
    }

    #[tokio::test]
    async fn test_provider_error_renders_failure() {
        let fake = Arc::new(FakeSpotify::new().offline());
        let outcome = dispatcher(&fake).execute(&Operation::Pause).await;
        assert!(!outcome.success);
        assert_eq!(texts(&outcome), vec![PAUSE_FAIL]);
    }

    #[tokio::test]
    async fn test_reset_renders_nothing() {
        let fake = Arc::new(FakeSpotify::new());
        let outcome = dispatcher(&fake).execute(&Operation::Reset).await;
        assert!(outcome.success);
        assert!(outcome.reset_history);
        assert!(outcome.replies.is_empty());
        assert!(fake.calls().is_empty());
    }
}
