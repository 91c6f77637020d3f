//! Configuration file loading.
//!
//! Every field is optional in the file; missing ones keep their defaults.
//! Command-line flags are applied on top by the caller.

use std::path::{Path, PathBuf};

use bpview_render::RenderConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Parameters of the generated demo graph.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    pub segments: u32,
    pub seed: u64,
    pub min_segment_bp: u32,
    pub max_segment_bp: u32,
    /// Generate a base sequence when the total extent stays under this.
    pub max_sequence_bp: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            segments: 400,
            seed: 7,
            min_segment_bp: 20,
            max_segment_bp: 5_000,
            max_sequence_bp: 4_000_000,
        }
    }
}

/// Step sizes of the keyboard gestures.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavigationConfig {
    /// Scale applied per zoom key press; zooming in uses its inverse.
    pub zoom_step: f64,
    /// Pan distance per key press as a fraction of the visible extent.
    pub pan_step: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            zoom_step: 1.25,
            pan_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub render: RenderConfig,
    pub demo: DemoConfig,
    pub navigation: NavigationConfig,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load `path`, or the defaults when no path is given or the file does
    /// not exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Ok(load_config_file(path)?.unwrap_or_default()),
            None => Ok(Self::default()),
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(default_log_path)
    }
}

/// `bpview.log` in the system temp directory.
pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join("bpview").join("bpview.log")
}

/// Returns `Ok(None)` when the file does not exist.
pub fn load_config_file(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, path).map(Some)
}

fn parse(contents: &str, path: &Path) -> Result<AppConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
