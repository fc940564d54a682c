use crate::event::Field;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration: {source}")]
    Read {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {source}")]
    Parse {
        #[from]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub listener: ListenerConfig,
    pub watcher: WatcherConfig,
}

/// Where window events are forwarded to, and in which shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    pub service: String,
    pub path: String,
    /// Defaults to the service name when unset.
    pub interface: Option<String>,
    pub method: String,
    /// Call arguments, in wire order.
    pub fields: Vec<Field>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            service: "io.focuswire.Listener".to_string(),
            path: "/Monitor".to_string(),
            interface: None,
            method: "ActiveWindowChanged".to_string(),
            fields: vec![Field::AppId, Field::WindowId],
        }
    }
}

impl ListenerConfig {
    pub fn interface(&self) -> &str {
        self.interface.as_deref().unwrap_or(&self.service)
    }

    /// The effective projection: duplicates collapsed keeping first
    /// position, empty list replaced by the default projection.
    pub fn call_fields(&self) -> Vec<Field> {
        let mut fields: Vec<Field> = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            if !fields.contains(field) {
                fields.push(*field);
            }
        }

        if fields.is_empty() {
            fields = ListenerConfig::default().fields;
        }

        fields
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    pub backend: Backend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Auto,
    Wayland,
    X11,
    None,
}

impl Config {
    /// Load from the default location. A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load from an explicit path. A missing file is an error here.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("focuswire")
            .join("config.toml")
    }
}
