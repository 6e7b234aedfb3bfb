//! Natural-language control of a Spotify playback session.
//!
//! A [`session::Session`] sends the chat history and the operation schema to
//! a [`openai::ChatModel`], decodes any function call into an
//! [`operation::Operation`] and runs it through the
//! [`dispatcher::Dispatcher`], which talks to Spotify via
//! [`spotify::SpotifyApi`].

pub mod auth;
pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod history;
pub mod openai;
pub mod operation;
pub mod platform;
pub mod playback;
pub mod reconciler;
pub mod retry;
pub mod schema;
pub mod session;
pub mod spotify;

pub use config::Config;
pub use error::{OperationError, ProviderError};
pub use session::{Session, TurnReport};
