use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub process: ProcessConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Executable name, also used to look the process up.
    pub name: String,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            name: "spotify".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub bus_name: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            bus_name: "org.mpris.MediaPlayer2.spotify".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub page_size: u32,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.spotify.com/v1/".to_string(),
            page_size: 50,
            timeout_secs: 30,
            token: None,
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sscc")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Reads `path`, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| "Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config.process.name, "spotify");
        assert_eq!(config.player.bus_name, "org.mpris.MediaPlayer2.spotify");
        assert_eq!(config.search.endpoint, "https://api.spotify.com/v1/");
        assert_eq!(config.search.page_size, 50);
        assert_eq!(config.search.timeout(), Duration::from_secs(30));
        assert!(config.search.token.is_none());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [process]
            name = "spotify-launcher"

            [search]
            endpoint = "http://localhost:8080/v1/"
            page_size = 20
            timeout_secs = 5
            token = "secret"
            "#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.process.name, "spotify-launcher");
        assert_eq!(config.player.bus_name, "org.mpris.MediaPlayer2.spotify");
        assert_eq!(config.search.page_size, 20);
        assert_eq!(config.search.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[search]\npage_size = \"many\"\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
