use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::TmsuResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tmsu: TmsuConfig,
    pub notifications: NotificationConfig,
    pub column: ColumnConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmsuConfig {
    /// Program name or path of the tmsu executable
    pub program: String,
    /// Directories searched before $PATH
    pub search_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub timeout_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub separator: String,
}

impl Default for TmsuConfig {
    fn default() -> Self {
        Self {
            program: "tmsu".to_string(),
            search_paths: Vec::new(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 5000,
        }
    }
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            separator: ", ".to_string(),
        }
    }
}

impl TmsuConfig {
    /// Search paths with `~` and environment variables expanded
    pub fn expanded_search_paths(&self) -> Vec<PathBuf> {
        self.search_paths
            .iter()
            .map(|p| match shellexpand::full(p) {
                Ok(expanded) => PathBuf::from(expanded.into_owned()),
                Err(e) => {
                    tracing::warn!("cannot expand search path {}: {}", p, e);
                    PathBuf::from(p)
                }
            })
            .collect()
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config"))
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
            })
            .join("nautilus-tmsu")
            .join("config.toml")
    }

    /// Load config from the default location, or return defaults if not found
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`; unreadable or invalid files fall back to defaults
    pub fn load_from(path: &Path) -> Self {
        let mut config = if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match Self::parse(&content) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), "failed to parse config: {}", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), "failed to read config: {}", e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        config.validate();
        config
    }

    pub fn parse(content: &str) -> TmsuResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate and clamp config values to acceptable ranges
    fn validate(&mut self) {
        if self.tmsu.program.trim().is_empty() {
            self.tmsu.program = TmsuConfig::default().program;
        }

        self.notifications.timeout_ms = self.notifications.timeout_ms.clamp(1000, 60_000);

        if self.column.separator.is_empty() {
            self.column.separator = ColumnConfig::default().separator;
        }
    }
}
