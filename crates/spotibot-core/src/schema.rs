//! The closed catalog of operations offered to the model for function calling.
//!
//! Names and argument shapes must stay exactly as they are: the model's
//! structured output is decoded against them by [`crate::operation`].

use serde_json::{json, Value};

fn track_items(description: &str) -> Value {
    json!({
        "type": "array",
        "description": description,
        "items": {
            "type": "object",
            "properties": {
                "track_name": {
                    "type": "string",
                    "description": "The name of the track or song."
                },
                "artist": {
                    "type": "string",
                    "description": "The artist that recorded the track or song."
                }
            },
            "required": ["track_name", "artist"]
        }
    })
}

fn album_items(description: &str, artist_description: &str) -> Value {
    json!({
        "type": "array",
        "description": description,
        "items": {
            "type": "object",
            "properties": {
                "album_name": {
                    "type": "string",
                    "description": "The name of the album."
                },
                "artist": {
                    "type": "string",
                    "description": artist_description
                }
            },
            "required": ["album_name", "artist"]
        }
    })
}

fn bare(name: &str, description: &str) -> Value {
    json!({
        "type": "function",
        "name": name,
        "description": description
    })
}

fn single_string(name: &str, description: &str, field: &str, field_description: &str) -> Value {
    json!({
        "type": "function",
        "name": name,
        "description": description,
        "parameters": {
            "type": "object",
            "properties": {
                field: {
                    "type": "string",
                    "description": field_description
                }
            },
            "required": [field]
        }
    })
}

/// Tool definitions in the Responses API flat format.
pub fn operation_schema() -> Value {
    json!([
        {
            "type": "function",
            "name": "add_to_playlist",
            "description": "Function to add several Spotify tracks to a Spotify playlist. If the playlist is new, create it before adding the tracks. ",
            "parameters": {
                "type": "object",
                "properties": {
                    "new_flag": {
                        "type": "boolean",
                        "description": "True when playlist is new, and False when playlist already exists."
                    },
                    "playlist_name": {
                        "type": "string",
                        "description": "The name of the Spotify playlist the user wants to use."
                    },
                    "tracks": track_items("A list of tracks to be added to the playlist.")
                },
                "required": ["new_flag", "playlist_name", "tracks"],
                "additionalProperties": false
            }
        },
        {
            "type": "function",
            "name": "add_to_queue",
            "description": "Add a several Spotify tracks to the user's queue for playback.",
            "parameters": {
                "type": "object",
                "properties": {
                    "tracks": track_items("A list of tracks to be added to the queue.")
                },
                "required": ["tracks"],
                "additionalProperties": false
            }
        },
        bare(
            "pause",
            "Pause or stop playing on the current device. The user will use words like 'pause', 'pause play' or 'stop'"
        ),
        bare(
            "start",
            "Start playing on the current device. The user will use words like 'start', 'play', 'play now' or 'go'"
        ),
        bare("get_playlists", "Get the user's private playlists from Spotify."),
        bare(
            "reset",
            "Clear all messages and start again. The user wants to start over with a fresh chat session. The user will use words like 'reset, or 'clear history'"
        ),
        bare(
            "clear_queue",
            "Clear all tracks from the queue. The user will use words like 'clear queue'."
        ),
        single_string(
            "top_tracks",
            "Get the top (or best) tracks for an artist from Spotify. This function should be used to get the top tracks, rather than general knowledge.",
            "artist_name",
            "The name of the artist the user provided."
        ),
        single_string(
            "playlist_tracks",
            "Get the tracks in one Spotify playlist .",
            "playlist_name",
            "The name of the playlist the user provided."
        ),
        {
            "type": "function",
            "name": "album_tracks",
            "description": "Find the tracks on an album.",
            "parameters": {
                "type": "object",
                "properties": {
                    "album": album_items(
                        "An album whose tracks the user wants to look up.",
                        "The main artist that recorded the album."
                    )
                },
                "required": ["album"],
                "additionalProperties": false
            }
        },
        {
            "type": "function",
            "name": "play_track",
            "description": "Play a single Spotify track.",
            "parameters": {
                "type": "object",
                "properties": {
                    "tracks": track_items("A list of tracks to be added to the queue. There should only be one track in this case.")
                },
                "required": ["tracks"],
                "additionalProperties": false
            }
        },
        {
            "type": "function",
            "name": "play_album",
            "description": "Play a single Spotify album.",
            "parameters": {
                "type": "object",
                "properties": {
                    "albums": album_items(
                        "A list of albums to play. There should only be one album in this case.",
                        "The artist that recorded the album."
                    )
                },
                "required": ["albums"],
                "additionalProperties": false
            }
        },
        single_string(
            "play_playlist",
            "Play one Spotify playlist .",
            "playlist_name",
            "The name of the playlist the user wants to play."
        )
    ])
}
