//! CLI configuration, parsed from TOML file + environment variable overrides.
//!
//! Priority: command-line flags > environment variables > config file > defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use ssss_shamir::{SecretEncoding, ShamirConfig, ThresholdPolicy, MAX_PREFIX_LEN};
use std::path::Path;

/// Top-level CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Split/combine parameters used when no flag is given
    #[serde(default)]
    pub defaults: DefaultsSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// Default sharing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsSection {
    /// Shares needed to reconstruct
    #[serde(default = "default_threshold")]
    pub threshold: usize,

    /// Shares to generate
    #[serde(default = "default_number_of_keys")]
    pub number_of_keys: usize,

    /// Token prepended to generated shares
    #[serde(default)]
    pub prefix: Option<String>,

    /// Treat secrets as hex digits instead of text
    #[serde(default)]
    pub hex: bool,

    /// "reject" or "clamp" when threshold > number_of_keys
    #[serde(default)]
    pub threshold_policy: ThresholdPolicy,
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            number_of_keys: default_number_of_keys(),
            prefix: None,
            hex: false,
            threshold_policy: ThresholdPolicy::Reject,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace, off)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_threshold() -> usize {
    2
}

fn default_number_of_keys() -> usize {
    3
}

fn default_log_level() -> String {
    "warn".to_string()
}

const LOG_LEVELS: [&str; 6] = ["error", "warn", "info", "debug", "trace", "off"];

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_policy(v: &str) -> Option<ThresholdPolicy> {
    match v.to_ascii_lowercase().as_str() {
        "reject" => Some(ThresholdPolicy::Reject),
        "clamp" => Some(ThresholdPolicy::Clamp),
        _ => None,
    }
}

// ============================================================================
// Loading & environment override
// ============================================================================

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `SSSS_THRESHOLD`
    /// - `SSSS_NUMBER_OF_KEYS`
    /// - `SSSS_PREFIX`
    /// - `SSSS_HEX`
    /// - `SSSS_THRESHOLD_POLICY`
    /// - `SSSS_LOG_LEVEL`
    ///
    /// Values that don't parse are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SSSS_THRESHOLD") {
            if let Ok(threshold) = v.parse::<usize>() {
                self.defaults.threshold = threshold;
            }
        }
        if let Ok(v) = std::env::var("SSSS_NUMBER_OF_KEYS") {
            if let Ok(n) = v.parse::<usize>() {
                self.defaults.number_of_keys = n;
            }
        }
        if let Ok(v) = std::env::var("SSSS_PREFIX") {
            self.defaults.prefix = Some(v).filter(|p| !p.is_empty());
        }
        if let Ok(v) = std::env::var("SSSS_HEX") {
            if let Some(hex) = parse_bool(&v) {
                self.defaults.hex = hex;
            }
        }
        if let Ok(v) = std::env::var("SSSS_THRESHOLD_POLICY") {
            if let Some(policy) = parse_policy(&v) {
                self.defaults.threshold_policy = policy;
            }
        }
        if let Ok(v) = std::env::var("SSSS_LOG_LEVEL") {
            self.logging.level = v;
        }
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.defaults.threshold >= 1,
            "defaults.threshold must be >= 1"
        );

        if let Some(ref prefix) = self.defaults.prefix {
            anyhow::ensure!(
                prefix.chars().count() <= MAX_PREFIX_LEN,
                "defaults.prefix must be at most {} characters",
                MAX_PREFIX_LEN
            );
        }

        anyhow::ensure!(
            LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()),
            "logging.level must be one of: {}",
            LOG_LEVELS.join(", ")
        );

        Ok(())
    }

    /// Sharing parameters for the library
    pub fn shamir_config(&self) -> ShamirConfig {
        let encoding = if self.defaults.hex {
            SecretEncoding::Hex
        } else {
            SecretEncoding::Text
        };
        ShamirConfig {
            threshold: self.defaults.threshold,
            number_of_keys: self.defaults.number_of_keys,
            prefix: self.defaults.prefix.clone(),
            encoding,
            policy: self.defaults.threshold_policy,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
