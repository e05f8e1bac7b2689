use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Min/max bounds for pointer-driven block resizing, in pixels.
///
/// These are configuration, not policy: hosts embedding the editor in a
/// narrow column tune them down without touching the resize controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizeBounds {
    pub min_width: f64,
    pub max_width: f64,
    pub min_height: f64,
    pub max_height: f64,
}

impl Default for ResizeBounds {
    fn default() -> Self {
        Self {
            min_width: 100.0,
            max_width: 800.0,
            min_height: 75.0,
            max_height: 600.0,
        }
    }
}

/// Storage keys the editor owns. Opaque strings; hosts only need them to
/// namespace multiple editors sharing one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageKeys {
    pub content: String,
    pub last_saved: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            content: "blockpad-notebook-data".to_string(),
            last_saved: "blockpad-last-saved".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Quiet period before a burst of edits is autosaved, in milliseconds.
    pub autosave_debounce_ms: u64,
    /// Drawing canvases resize height-only and have no upper bound.
    pub drawing_min_height: f64,
    /// Export files are named `<prefix>-YYYY-MM-DD.json`.
    pub export_prefix: String,
    /// Bounds applied to image resizing.
    pub image_bounds: ResizeBounds,
    pub storage: StorageKeys,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autosave_debounce_ms: 2000,
            drawing_min_height: 200.0,
            export_prefix: "notebook".to_string(),
            image_bounds: ResizeBounds::default(),
            storage: StorageKeys::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/blockpad");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }
}
