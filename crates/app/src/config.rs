//! Client configuration
//!
//! Loaded from `colloquy.toml`, either at an explicit path or in the
//! platform config directory. A missing default file means defaults. The
//! bearer token is never read from here.

use std::path::{Path, PathBuf};

use colloquy_net::{Endpoint, DEFAULT_HOST};
use directories::ProjectDirs;
use serde::Deserialize;

/// File name looked up in the config directory
pub const CONFIG_FILE: &str = "colloquy.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config {0}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("Failed to parse config {0}: {1}")]
    Parse(PathBuf, toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// `host[:port]`
    pub host: String,
    pub secure: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            secure: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserSection {
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub user: UserSection,
}

impl AppConfig {
    /// Load from `path`, or from the default location when `None`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::load_file(path)
            }
            None => match default_path() {
                Some(path) if path.exists() => Self::load_file(&path),
                _ => {
                    tracing::debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.server.host.clone(), self.server.secure)
    }
}

/// `<config dir>/colloquy.toml`, if the platform has a config dir
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "colloquy", "colloquy").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
