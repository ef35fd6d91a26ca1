//! Configuration management for Strata
//!
//! This module handles loading, parsing, and validating configuration
//! from TOML files: manager strides and wait limits, the UI root,
//! asset location, logging, and optional window type declarations.

use crate::logging;
use crate::window::WindowDescriptor;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct containing all Strata settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StrataConfig {
    /// Ordering strides and await limits
    #[serde(default)]
    pub manager: ManagerConfig,

    /// Canvas and camera settings for the UI root
    #[serde(default)]
    pub root: RootConfig,

    /// Where file-backed window assets live
    #[serde(default)]
    pub assets: AssetsConfig,

    /// Log output
    #[serde(default)]
    pub logging: LogConfig,

    /// Declared window types, keyed by type name
    #[serde(default)]
    pub windows: HashMap<String, WindowDescriptor>,
}

/// Window manager tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ManagerConfig {
    /// Sorting-order distance between consecutive layers
    pub layer_stride: i32,

    /// Sorting-order distance between windows within a layer
    pub window_stride: i32,

    /// Longest a show/get-and-await call waits for a load (seconds)
    pub await_ceiling_secs: f64,

    /// How long an await yields between checks (milliseconds)
    pub await_poll_interval_ms: u64,
}

/// UI root (canvas and camera) configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RootConfig {
    pub reference_width: u32,
    pub reference_height: u32,
    pub camera_depth: i32,
}

/// Asset location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory file-backed assets are resolved against
    pub root: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter ("error", "warn", "info", "debug", "trace", "off")
    pub level: String,
}

const DEFAULT_LAYER_STRIDE: i32 = 2000;
const DEFAULT_WINDOW_STRIDE: i32 = 100;
const DEFAULT_AWAIT_CEILING: Duration = Duration::from_secs(60);

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            layer_stride: DEFAULT_LAYER_STRIDE,
            window_stride: DEFAULT_WINDOW_STRIDE,
            await_ceiling_secs: DEFAULT_AWAIT_CEILING.as_secs_f64(),
            await_poll_interval_ms: 16,
        }
    }
}

/// The fields are public, so a manager can be handed values that never went
/// through [`ManagerConfig::validate`]. The accessors below are total: any
/// out-of-range value reads back as its default.
impl ManagerConfig {
    /// Sorting-order distance between layers
    pub fn layer_stride(&self) -> i32 {
        if self.layer_stride > 0 {
            self.layer_stride
        } else {
            DEFAULT_LAYER_STRIDE
        }
    }

    /// Sorting-order distance between windows of one layer
    pub fn window_stride(&self) -> i32 {
        if self.window_stride > 0 {
            self.window_stride
        } else {
            DEFAULT_WINDOW_STRIDE
        }
    }

    /// Ceiling for bounded waits
    pub fn await_ceiling(&self) -> Duration {
        Duration::try_from_secs_f64(self.await_ceiling_secs)
            .ok()
            .filter(|ceiling| !ceiling.is_zero())
            .unwrap_or(DEFAULT_AWAIT_CEILING)
    }

    /// Yield interval for bounded waits, at least one millisecond
    pub fn await_poll_interval(&self) -> Duration {
        Duration::from_millis(self.await_poll_interval_ms.max(1))
    }

    /// Windows a single layer can hold before its sorting range runs into the next layer
    pub fn windows_per_layer(&self) -> usize {
        (self.layer_stride() / self.window_stride()) as usize
    }

    /// Check strides and wait limits
    pub fn validate(&self) -> Result<()> {
        if self.layer_stride <= 0 || self.window_stride <= 0 {
            anyhow::bail!(
                "Invalid strides: layer_stride ({}) and window_stride ({}) must be positive",
                self.layer_stride,
                self.window_stride
            );
        }

        if self.window_stride > self.layer_stride {
            anyhow::bail!(
                "Invalid strides: window_stride ({}) exceeds layer_stride ({})",
                self.window_stride,
                self.layer_stride
            );
        }

        if !self.await_ceiling_secs.is_finite() || self.await_ceiling_secs <= 0.0 {
            anyhow::bail!("Invalid await_ceiling_secs: must be a positive number of seconds");
        }

        if self.await_poll_interval_ms == 0 {
            anyhow::bail!("Invalid await_poll_interval_ms: must be at least 1");
        }

        Ok(())
    }
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            reference_width: 1920,
            reference_height: 1080,
            camera_depth: 100,
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl StrataConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Expand ~ to home directory
        let expanded_path = if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            let rest = path.strip_prefix("~").unwrap_or(path);
            Path::new(&home).join(rest)
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: StrataConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.manager.validate()?;

        if logging::parse_level(&self.logging.level).is_none() {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        for (name, descriptor) in &self.windows {
            if descriptor.asset.trim().is_empty() {
                anyhow::bail!("Window type '{}' has an empty asset location", name);
            }
            if descriptor.hide_time_to_close.is_nan() {
                anyhow::bail!("Window type '{}' has a NaN hide_time_to_close", name);
            }
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }
}


#[cfg(test)]
mod property_tests;
