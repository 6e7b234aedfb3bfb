//! Error taxonomy shared by both external providers.
//!
//! Only genuine transport/protocol failures are errors. "Nothing matched",
//! "no active device" and "no such playlist" are ordinary results
//! (`None`, an empty list, or `Ok(false)`).

use rspotify::http::HttpError;
use rspotify::ClientError;
use thiserror::Error;

/// Failure talking to the chat-completion provider or the Spotify Web API.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Could not reach the provider (DNS, connect, TLS, timeout).
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
        timeout: bool,
    },
    /// The provider answered with a non-success status.
    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    /// The response body did not have the expected shape.
    #[error("could not decode {provider} response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
    /// OAuth exchange/refresh failed.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// No Spotify token is available for this session.
    #[error("not logged in to Spotify")]
    NotLoggedIn,
    /// A required setting (API key, client id) is missing.
    #[error("missing configuration: {0}")]
    Config(String),
}

impl ProviderError {
    pub fn transport(provider: &'static str, err: reqwest::Error) -> Self {
        Self::Transport {
            provider,
            timeout: err.is_timeout(),
            message: err.to_string(),
        }
    }

    pub fn decode(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            provider,
            message: message.into(),
        }
    }

    /// Worth another attempt: network hiccups, rate limiting and server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

const SPOTIFY: &str = "spotify";

impl From<ClientError> for ProviderError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(http) => match *http {
                HttpError::StatusCode(resp) => Self::Status {
                    provider: SPOTIFY,
                    status: resp.status().as_u16(),
                    body: String::new(),
                },
                HttpError::Client(e) => Self::Transport {
                    provider: SPOTIFY,
                    timeout: e.is_timeout(),
                    message: e.to_string(),
                },
            },
            ClientError::ParseJson(e) => Self::decode(SPOTIFY, e.to_string()),
            ClientError::InvalidToken => Self::NotLoggedIn,
            other => Self::Auth(other.to_string()),
        }
    }
}

/// The model produced a function call that does not fit the operation schema.
#[derive(Debug, Error, PartialEq)]
pub enum OperationError {
    #[error("unknown operation `{0}`")]
    Unknown(String),
    #[error("invalid arguments for `{name}`: {message}")]
    InvalidArguments { name: String, message: String },
}
