//! Default locations for stratagem files.
//!
//! - `~/.stratagem/config.toml` - engine configuration

use std::path::PathBuf;

/// Returns the stratagem home directory (`~/.stratagem/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".stratagem")
}

/// Returns the default config file path (`~/.stratagem/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_lives_under_stratagem_home() {
        let config = default_config();
        assert!(config.starts_with(home_dir()));
        assert!(config.to_string_lossy().ends_with("config.toml"));
    }
}
