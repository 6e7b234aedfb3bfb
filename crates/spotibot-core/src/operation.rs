//! Typed view of a model function call.
//!
//! The model hands back `(name, arguments-json)`. It is decoded exactly once
//! into [`Operation`], and everything downstream matches exhaustively.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OperationError;

/// Operation names in schema order.
pub const OPERATION_NAMES: [&str; 13] = [
    "add_to_playlist",
    "add_to_queue",
    "pause",
    "start",
    "get_playlists",
    "reset",
    "clear_queue",
    "top_tracks",
    "playlist_tracks",
    "album_tracks",
    "play_track",
    "play_album",
    "play_playlist",
];

/// A function call exactly as the model produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRequest {
    pub track_name: String,
    pub artist: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRequest {
    pub album_name: String,
    pub artist: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    AddToPlaylist {
        new_flag: bool,
        playlist_name: String,
        tracks: Vec<TrackRequest>,
    },
    AddToQueue {
        tracks: Vec<TrackRequest>,
    },
    Pause,
    Start,
    GetPlaylists,
    Reset,
    ClearQueue,
    TopTracks {
        artist_name: String,
    },
    PlaylistTracks {
        playlist_name: String,
    },
    AlbumTracks {
        album: Vec<AlbumRequest>,
    },
    PlayTrack {
        tracks: Vec<TrackRequest>,
    },
    PlayAlbum {
        albums: Vec<AlbumRequest>,
    },
    PlayPlaylist {
        playlist_name: String,
    },
}

#[derive(Deserialize)]
struct AddToPlaylistArgs {
    new_flag: bool,
    playlist_name: String,
    tracks: Vec<TrackRequest>,
}

#[derive(Deserialize)]
struct TracksArgs {
    tracks: Vec<TrackRequest>,
}

#[derive(Deserialize)]
struct ArtistArgs {
    artist_name: String,
}

#[derive(Deserialize)]
struct PlaylistArgs {
    playlist_name: String,
}

#[derive(Deserialize)]
struct AlbumArgs {
    album: Vec<AlbumRequest>,
}

#[derive(Deserialize)]
struct AlbumsArgs {
    albums: Vec<AlbumRequest>,
}

fn args<T: DeserializeOwned>(name: &str, arguments: &Value) -> Result<T, OperationError> {
    T::deserialize(arguments).map_err(|e| OperationError::InvalidArguments {
        name: name.to_string(),
        message: e.to_string(),
    })
}

impl Operation {
    pub fn decode(call: &FunctionCall) -> Result<Self, OperationError> {
        let name = call.name.as_str();
        let a = &call.arguments;
        let op = match name {
            "add_to_playlist" => {
                let AddToPlaylistArgs {
                    new_flag,
                    playlist_name,
                    tracks,
                } = args(name, a)?;
                Self::AddToPlaylist {
                    new_flag,
                    playlist_name,
                    tracks,
                }
            }
            "add_to_queue" => Self::AddToQueue {
                tracks: args::<TracksArgs>(name, a)?.tracks,
            },
            "pause" => Self::Pause,
            "start" => Self::Start,
            "get_playlists" => Self::GetPlaylists,
            "reset" => Self::Reset,
            "clear_queue" => Self::ClearQueue,
            "top_tracks" => Self::TopTracks {
                artist_name: args::<ArtistArgs>(name, a)?.artist_name,
            },
            "playlist_tracks" => Self::PlaylistTracks {
                playlist_name: args::<PlaylistArgs>(name, a)?.playlist_name,
            },
            "album_tracks" => Self::AlbumTracks {
                album: args::<AlbumArgs>(name, a)?.album,
            },
            "play_track" => Self::PlayTrack {
                tracks: args::<TracksArgs>(name, a)?.tracks,
            },
            "play_album" => Self::PlayAlbum {
                albums: args::<AlbumsArgs>(name, a)?.albums,
            },
            "play_playlist" => Self::PlayPlaylist {
                playlist_name: args::<PlaylistArgs>(name, a)?.playlist_name,
            },
            other => return Err(OperationError::Unknown(other.to_string())),
        };
        Ok(op)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AddToPlaylist { .. } => "add_to_playlist",
            Self::AddToQueue { .. } => "add_to_queue",
            Self::Pause => "pause",
            Self::Start => "start",
            Self::GetPlaylists => "get_playlists",
            Self::Reset => "reset",
            Self::ClearQueue => "clear_queue",
            Self::TopTracks { .. } => "top_tracks",
            Self::PlaylistTracks { .. } => "playlist_tracks",
            Self::AlbumTracks { .. } => "album_tracks",
            Self::PlayTrack { .. } => "play_track",
            Self::PlayAlbum { .. } => "play_album",
            Self::PlayPlaylist { .. } => "play_playlist",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, arguments: Value) -> FunctionCall {
        FunctionCall {
            name: name.to_string(),
            arguments,
        }
    }

    #[test]
    fn test_decode_add_to_playlist() {
        let op = Operation::decode(&call(
            "add_to_playlist",
            json!({
                "new_flag": false,
                "playlist_name": "Deep Neil",
                "tracks": [{"track_name": "Ambulance Blues", "artist": "Neil Young"}]
            }),
        ))
        .unwrap();
        assert_eq!(
            op,
            Operation::AddToPlaylist {
                new_flag: false,
                playlist_name: "Deep Neil".into(),
                tracks: vec![TrackRequest {
                    track_name: "Ambulance Blues".into(),
                    artist: "Neil Young".into(),
                }],
            }
        );
    }

    #[test]
    fn test_argumentless_ignore_payload() {
        // Providers send "{}" or nothing at all for parameterless tools.
        assert_eq!(Operation::decode(&call("pause", json!({}))).unwrap(), Operation::Pause);
        assert_eq!(Operation::decode(&call("reset", Value::Null)).unwrap(), Operation::Reset);
    }

    #[test]
    fn test_unknown_name() {
        let err = Operation::decode(&call("shuffle", json!({}))).unwrap_err();
        assert_eq!(err, OperationError::Unknown("shuffle".into()));
    }

    #[test]
    fn test_missing_field_is_invalid() {
        let err = Operation::decode(&call("top_tracks", json!({"artist": "Bowie"}))).unwrap_err();
        assert!(matches!(err, OperationError::InvalidArguments { ref name, .. } if name == "top_tracks"));
    }

    #[test]
    fn test_name_round_trips_for_every_operation() {
        let samples = [
            call("add_to_playlist", json!({"new_flag": true, "playlist_name": "x", "tracks": []})),
            call("add_to_queue", json!({"tracks": []})),
            call("pause", json!({})),
            call("start", json!({})),
            call("get_playlists", json!({})),
            call("reset", json!({})),
            call("clear_queue", json!({})),
            call("top_tracks", json!({"artist_name": "David Bowie"})),
            call("playlist_tracks", json!({"playlist_name": "x"})),
            call("album_tracks", json!({"album": [{"album_name": "Communique", "artist": "Dire Straits"}]})),
            call("play_track", json!({"tracks": [{"track_name": "Fame", "artist": "David Bowie"}]})),
            call("play_album", json!({"albums": [{"album_name": "Outlandos d'Amour", "artist": "The Police"}]})),
            call("play_playlist", json!({"playlist_name": "x"})),
        ];
        for (sample, expected) in samples.iter().zip(OPERATION_NAMES) {
            assert_eq!(Operation::decode(sample).unwrap().name(), expected);
        }
    }
}
