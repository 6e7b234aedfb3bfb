pub mod api;
pub mod fake;
pub mod web;

pub use api::{
    album_uri, playlist_uri, track_uri, Album, Artist, CurrentlyPlaying, Device, NewPlaylist,
    Playlist, Queue, SpotifyApi, StartPlayback, Track, User,
};
pub use fake::{Call, FakeSpotify};
pub use web::SpotifyWeb;
