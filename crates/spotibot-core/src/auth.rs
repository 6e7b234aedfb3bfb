//! Spotify authorization-code flow on top of `rspotify::AuthCodeSpotify`.
//!
//! rspotify owns the token exchange, refresh and the on-disk cache. This
//! module adds the login-attempt bookkeeping: each attempt gets a random
//! `state` nonce that the redirect callback consumes exactly once, so a
//! reloaded or replayed callback URL is ignored.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use rand::distributions::Alphanumeric;
use rand::Rng;
use rspotify::prelude::*;
use rspotify::{AuthCodeSpotify, Credentials, OAuth};
use tracing::{debug, info, warn};

use crate::config::SpotifyConfig;
use crate::error::ProviderError;

const STATE_LEN: usize = 16;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Build the rspotify client for `config`, caching tokens at `cache_path`
/// and refreshing them transparently before they expire.
pub fn spotify_client(config: &SpotifyConfig, cache_path: PathBuf) -> AuthCodeSpotify {
    let creds = Credentials::new(&config.client_id, &config.client_secret);
    let oauth = OAuth {
        redirect_uri: config.redirect_uri.clone(),
        scopes: config.scope.split_whitespace().map(str::to_string).collect(),
        ..Default::default()
    };
    let rs_config = rspotify::Config {
        cache_path,
        token_cached: true,
        token_refreshing: true,
        ..Default::default()
    };
    AuthCodeSpotify::with_config(creds, oauth, rs_config)
}

pub struct Authenticator {
    client: AuthCodeSpotify,
    client_id: String,
    logged_in: AtomicBool,
    pending_state: Mutex<Option<String>>,
}

impl Authenticator {
    pub fn new(config: SpotifyConfig, cache_path: PathBuf) -> Self {
        Self {
            client: spotify_client(&config, cache_path),
            client_id: config.client_id,
            logged_in: AtomicBool::new(false),
            pending_state: Mutex::new(None),
        }
    }

    /// A handle sharing this authenticator's token.
    pub fn client(&self) -> AuthCodeSpotify {
        self.client.clone()
    }

    /// Pick up a token left by a previous run. Expired tokens are kept;
    /// rspotify refreshes them on first use.
    pub async fn restore_cached(&self) -> bool {
        let token = match self.client.read_token_cache(true).await {
            Ok(Some(token)) => token,
            Ok(None) => return false,
            Err(e) => {
                debug!("no usable token cache: {}", e);
                return false;
            }
        };
        match self.client.get_token().lock().await {
            Ok(mut slot) => *slot = Some(token),
            Err(_) => {
                warn!("token slot unavailable; not restoring cache");
                return false;
            }
        }
        self.logged_in.store(true, Ordering::SeqCst);
        info!("loaded cached Spotify token");
        true
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    pub fn redirect_uri(&self) -> &str {
        &self.client.oauth.redirect_uri
    }

    /// Start a login attempt. Any earlier pending attempt is abandoned.
    pub fn authorize_url(&self) -> Result<String, ProviderError> {
        if self.client_id.trim().is_empty() {
            return Err(ProviderError::Config("spotify.client_id".into()));
        }
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(STATE_LEN)
            .map(char::from)
            .collect();
        let mut attempt = self.client.clone();
        attempt.oauth.state = state.clone();
        let url = attempt.get_authorize_url(false)?;
        *lock(&self.pending_state) = Some(state);
        Ok(url)
    }

    /// Finish the pending login with the code from the redirect.
    ///
    /// Never fails loudly: problems are logged and `false` is returned so the
    /// caller can simply offer the login again.
    pub async fn handle_callback(&self, code: &str, state: Option<&str>) -> bool {
        let pending = lock(&self.pending_state).take();
        let Some(expected) = pending else {
            debug!("callback without a pending login; ignoring");
            return false;
        };
        if state != Some(expected.as_str()) {
            warn!("callback state mismatch; ignoring");
            return false;
        }
        match self.client.request_token(code).await {
            Ok(()) => {
                self.logged_in.store(true, Ordering::SeqCst);
                info!("logged in to Spotify");
                true
            }
            Err(e) => {
                warn!("token exchange failed: {}", ProviderError::from(e));
                false
            }
        }
    }

    /// Forget the token here and on disk.
    pub async fn logout(&self) {
        self.logged_in.store(false, Ordering::SeqCst);
        *lock(&self.pending_state) = None;
        if let Ok(mut slot) = self.client.get_token().lock().await {
            *slot = None;
        }
        match std::fs::remove_file(&self.client.config.cache_path) {
            Ok(()) => info!("removed token cache"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("could not remove token cache: {}", e),
        }
    }
}
