use std::path::PathBuf;

const APP_DIR: &str = "spotibot";

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/spotibot/ (XDG standard)
    // instead of macOS Application Support for consistency
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join(APP_DIR)
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn config_dir() -> PathBuf {
    // On macOS and Linux, always use ~/.config/spotibot/
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join(APP_DIR)
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn temp_dir() -> PathBuf {
    std::env::temp_dir()
}

pub const LOG_FILE: &str = "spotibot.log";

pub fn log_path() -> PathBuf {
    data_dir().join(LOG_FILE)
}

/// Used when the data dir cannot be created.
pub fn fallback_log_path() -> PathBuf {
    temp_dir().join(APP_DIR).join(LOG_FILE)
}

pub fn default_token_cache() -> PathBuf {
    data_dir().join("token.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_are_app_scoped() {
        assert!(data_dir().ends_with(APP_DIR));
        assert!(config_dir().ends_with(APP_DIR));
        assert!(default_token_cache().ends_with("spotibot/token.json"));
        assert!(log_path().ends_with("spotibot/spotibot.log"));
        assert!(fallback_log_path().starts_with(temp_dir()));
    }
}
