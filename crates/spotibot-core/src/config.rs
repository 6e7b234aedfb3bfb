use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// `[spotipy]` is accepted for config files written for the Python tool.
    #[serde(default, alias = "spotipy")]
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Spotify application credentials for the authorization-code flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_scope")]
    pub scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Falls back to `OPENAI_API_KEY` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_multiplier_secs")]
    pub multiplier_secs: f64,
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where the OAuth token survives the redirect round-trip and restarts.
    #[serde(default = "platform::default_token_cache")]
    pub token_cache: PathBuf,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: default_redirect_uri(),
            scope: default_scope(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            multiplier_secs: default_multiplier_secs(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            token_cache: platform::default_token_cache(),
        }
    }
}

fn default_redirect_uri() -> String {
    "http://127.0.0.1:8888/callback".to_string()
}

fn default_scope() -> String {
    [
        "user-read-playback-state",
        "user-modify-playback-state",
        "user-read-currently-playing",
        "playlist-read-private",
        "playlist-modify-private",
        "playlist-modify-public",
    ]
    .join(" ")
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_attempts() -> u32 {
    3
}

fn default_multiplier_secs() -> f64 {
    1.0
}

fn default_max_wait_secs() -> f64 {
    40.0
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_secs_f64(self.multiplier_secs.max(0.0)),
            Duration::from_secs_f64(self.max_wait_secs.max(0.0)),
        )
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env();
        Ok(config)
    }

    /// Read `path`, writing a default config there first if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    /// Environment variables win over the file, the way the Python tool read
    /// its key from `OPENAI_API_KEY` and spotipy read `SPOTIPY_*`.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| lookup(k))
                .filter(|v| !v.trim().is_empty())
        };
        if let Some(key) = first(&["OPENAI_API_KEY"]) {
            self.openai.api_key = Some(key);
        }
        if let Some(id) = first(&["SPOTIFY_CLIENT_ID", "SPOTIPY_CLIENT_ID"]) {
            self.spotify.client_id = id;
        }
        if let Some(secret) = first(&["SPOTIFY_CLIENT_SECRET", "SPOTIPY_CLIENT_SECRET"]) {
            self.spotify.client_secret = secret;
        }
        if let Some(uri) = first(&["SPOTIFY_REDIRECT_URI", "SPOTIPY_REDIRECT_URI"]) {
            self.spotify.redirect_uri = uri;
        }
    }

    /// Names of settings that must be filled in before the app can talk to
    /// either provider.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.spotify.client_id.trim().is_empty() {
            missing.push("spotify.client_id");
        }
        if self.spotify.client_secret.trim().is_empty() {
            missing.push("spotify.client_secret");
        }
        if self
            .openai
            .api_key
            .as_deref()
            .map_or(true, |k| k.trim().is_empty())
        {
            missing.push("openai.api_key");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert!((config.openai.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.spotify.redirect_uri, "http://127.0.0.1:8888/callback");
        assert!(config.spotify.scope.contains("user-modify-playback-state"));
        assert!(config.paths.token_cache.ends_with("spotibot/token.json"));
    }

    #[test]
    fn test_spotipy_section_alias() {
        let toml_str = r#"
            [spotipy]
            client_id = "abc"
            client_secret = "shh"
            redirect_uri = "http://localhost:8501"
            scope = "user-read-playback-state"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.spotify.client_id, "abc");
        assert_eq!(config.spotify.redirect_uri, "http://localhost:8501");
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_load_writes_default_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.retry.max_wait_secs, 40.0);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.openai.model, config.openai.model);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::default();
        config.apply_env_with(|key| match key {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "SPOTIPY_CLIENT_ID" => Some("legacy-id".to_string()),
            "SPOTIFY_CLIENT_SECRET" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.spotify.client_id, "legacy-id");
        assert!(config.spotify.client_secret.is_empty());
        assert_eq!(config.missing_settings(), vec!["spotify.client_secret"]);
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = RetryConfig::default().policy();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.max_wait(), Duration::from_secs(40));
    }
}
