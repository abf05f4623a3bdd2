// src/config.rs - Analysis configuration loaded from TOML

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{Result, SkeletonError};

/// Configuration for skeleton topology analysis
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    pub input_path: String,
    pub output_base_dir: String,

    /// Run 8-connected thinning before analysis; disable for masks that are already skeletons
    #[serde(default = "default_skeletonize")]
    pub skeletonize: bool,

    /// Gray values above this become foreground when loading mask images
    #[serde(default = "default_foreground_threshold")]
    pub foreground_threshold: u8,

    #[serde(default = "default_prune_junctions")]
    pub prune_junctions: bool,

    /// Lines shorter than this (in pixels) are left out of the report, not deleted
    #[serde(default)]
    pub min_line_length: f64,

    /// Safety bound on pruning iterations
    #[serde(default = "default_max_prune_iterations")]
    pub max_prune_iterations: usize,

    /// Physical size of one pixel, applied only when writing reports
    #[serde(default = "default_pixel_scale")]
    pub pixel_scale: f64,

    #[serde(default = "default_unit")]
    pub unit: String,

    #[serde(default = "default_parallel")]
    pub use_parallel: bool,

    /// Write chain-coded pixel paths into the JSON report
    #[serde(default)]
    pub include_paths: bool,

    #[serde(default = "default_save_label_image")]
    pub save_label_image: bool,
}

fn default_skeletonize() -> bool {
    true
}

fn default_foreground_threshold() -> u8 {
    127
}

fn default_prune_junctions() -> bool {
    true
}

fn default_max_prune_iterations() -> usize {
    100_000
}

fn default_pixel_scale() -> f64 {
    1.0
}

fn default_unit() -> String {
    "pixel".to_string()
}

fn default_parallel() -> bool {
    true
}

fn default_save_label_image() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: "./input".to_string(),
            output_base_dir: "./output".to_string(),
            skeletonize: default_skeletonize(),
            foreground_threshold: default_foreground_threshold(),
            prune_junctions: default_prune_junctions(),
            min_line_length: 0.0,
            max_prune_iterations: default_max_prune_iterations(),
            pixel_scale: default_pixel_scale(),
            unit: default_unit(),
            use_parallel: default_parallel(),
            include_paths: false,
            save_label_image: default_save_label_image(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SkeletonError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|source| SkeletonError::ConfigLoad {
            source,
            path: path.to_path_buf(),
        })
    }

    /// Like `from_file`, but a missing file yields the defaults
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let input_path = PathBuf::from(&self.input_path);
        if !input_path.exists() {
            return Err(SkeletonError::InvalidPath(input_path));
        }

        if !self.min_line_length.is_finite() || self.min_line_length < 0.0 {
            return Err(SkeletonError::Config(
                "min_line_length must be a finite value >= 0.0".to_string(),
            ));
        }

        if self.max_prune_iterations == 0 && self.prune_junctions {
            return Err(SkeletonError::Config(
                "max_prune_iterations must be > 0 when prune_junctions is enabled".to_string(),
            ));
        }

        if !self.pixel_scale.is_finite() || self.pixel_scale <= 0.0 {
            return Err(SkeletonError::Config(
                "pixel_scale must be a finite value > 0.0".to_string(),
            ));
        }

        if self.unit.trim().is_empty() {
            return Err(SkeletonError::Config("unit must not be empty".to_string()));
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            SkeletonError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            input_path = "frames"
            output_base_dir = "out"
            min_line_length = 3.5
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.input_path, "frames");
        assert_eq!(config.min_line_length, 3.5);
        assert!(config.prune_junctions);
        assert!(config.skeletonize);
        assert_eq!(config.pixel_scale, 1.0);
        assert_eq!(config.unit, "pixel");
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = Config::default();
        config.prune_junctions = false;
        config.pixel_scale = 0.065;
        config.unit = "um".to_string();

        let text = toml::to_string_pretty(&config).expect("serializable");
        let parsed: Config = toml::from_str(&text).expect("parsable");
        assert_eq!(parsed, config);
    }

    #[test]
    fn rejects_negative_min_length() {
        let mut config = Config::default();
        config.input_path = ".".to_string();
        config.min_line_length = -1.0;
        assert!(matches!(config.validate(), Err(SkeletonError::Config(_))));
    }

    #[test]
    fn rejects_missing_input() {
        let mut config = Config::default();
        config.input_path = "./definitely/not/here".to_string();
        assert!(matches!(config.validate(), Err(SkeletonError::InvalidPath(_))));
    }

    #[test]
    fn rejects_zero_scale() {
        let mut config = Config::default();
        config.input_path = ".".to_string();
        config.pixel_scale = 0.0;
        assert!(config.validate().is_err());
    }
}
