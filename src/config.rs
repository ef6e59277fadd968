//! Configuration handling

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the store directory
pub const STORE_ENV: &str = "FORMBIND_STORE";

/// Default passes allowed when iterating to a fixed point
pub const DEFAULT_MAX_PASSES: usize = 16;

/// How far the condition resolver chases computed values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResolutionMode {
    /// One full pass, a second wave over computed values, and at most one
    /// extra full pass
    #[default]
    Bounded,
    /// Full passes until no component value changes, up to `max_passes`
    FixedPoint {
        #[serde(default = "default_max_passes")]
        max_passes: usize,
    },
}

fn default_max_passes() -> usize {
    DEFAULT_MAX_PASSES
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Directory holding `forms/` and `data/`
    pub store_dir: Option<PathBuf>,
    /// Condition resolution strategy
    pub resolution: Option<ResolutionMode>,
}

impl EngineConfig {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "formbind", "formbind")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to the default location, returning where it went
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path().context("no configuration directory available")?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }

    pub fn resolution(&self) -> ResolutionMode {
        self.resolution.unwrap_or_default()
    }

    /// Store directory: environment, then config file, then the platform data dir
    pub fn store_dir(&self) -> PathBuf {
        if let Some(dir) = std::env::var_os(STORE_ENV).filter(|v| !v.is_empty()) {
            return PathBuf::from(dir);
        }
        if let Some(dir) = &self.store_dir {
            return dir.clone();
        }
        ProjectDirs::from("io", "formbind", "formbind")
            .map(|dirs| dirs.data_dir().join("store"))
            .unwrap_or_else(|| PathBuf::from("formbind-store"))
    }
}
