//! Configuration management for retriage
//!
//! Holds the similarity thresholds, component weights, and clustering
//! settings, with TOML persistence and environment-variable overrides.

use crate::error::{Result, RetriageError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

use crate::similarity::SimilarityWeights;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub weights: SimilarityWeights,
    #[serde(default)]
    pub clustering: ClusteringConfig,
}

/// Named similarity cut-offs
///
/// `overall` drives duplicate classification; the per-component cut-offs
/// are surfaced to hosts for their own policy decisions (e.g. flagging a
/// title-only match for manual review).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    pub title: f64,
    pub description: f64,
    pub code: f64,
    pub url: f64,
    pub overall: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            title: 0.5,
            description: 0.5,
            code: 0.5,
            url: 0.5,
            overall: 0.65,
        }
    }
}

/// Partial threshold update: only the provided fields change
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ThresholdUpdate {
    pub title: Option<f64>,
    pub description: Option<f64>,
    pub code: Option<f64>,
    pub url: Option<f64>,
    pub overall: Option<f64>,
}

impl ThresholdUpdate {
    pub fn apply(&self, thresholds: &mut Thresholds) {
        if let Some(v) = self.title {
            thresholds.title = v;
        }
        if let Some(v) = self.description {
            thresholds.description = v;
        }
        if let Some(v) = self.code {
            thresholds.code = v;
        }
        if let Some(v) = self.url {
            thresholds.url = v;
        }
        if let Some(v) = self.overall {
            thresholds.overall = v;
        }
    }
}

/// Cluster discovery settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Minimum overall score for two reports to share a cluster
    pub threshold: f64,
    /// Per-node detection limit during breadth-first expansion
    pub expansion_limit: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            expansion_limit: 50,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RetriageError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| RetriageError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| RetriageError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: RETRIAGE_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("RETRIAGE_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        let parse = |value: &str| -> Result<f64> {
            value.parse().map_err(|_| RetriageError::InvalidConfigValue {
                path: path.to_string(),
                message: format!("Cannot parse '{}' as float", value),
            })
        };

        match path {
            "THRESHOLDS__OVERALL" => self.thresholds.overall = parse(value)?,
            "THRESHOLDS__TITLE" => self.thresholds.title = parse(value)?,
            "THRESHOLDS__DESCRIPTION" => self.thresholds.description = parse(value)?,
            "THRESHOLDS__CODE" => self.thresholds.code = parse(value)?,
            "THRESHOLDS__URL" => self.thresholds.url = parse(value)?,
            "CLUSTERING__THRESHOLD" => self.clustering.threshold = parse(value)?,
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            RetriageError::Config("Cannot determine config directory".to_string())
        })?;

        Ok(config_dir.join("retriage").join("config.toml"))
    }
}
