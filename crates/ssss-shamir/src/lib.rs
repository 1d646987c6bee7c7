//! SSSS Shamir Module
//!
//! Shamir's Secret Sharing over GF(2^n), share-compatible with the classic
//! `ssss-split`/`ssss-combine` tools.
//!
//! # Layers
//!
//! - [`bits`]: arbitrary-precision integers with two's complement bit ops
//! - [`field`]: GF(2^n) arithmetic for 8..=1024 bit fields, secret I/O
//! - [`diffusion`]: whitening cipher applied to the secret before sharing
//! - [`solver`]: Gaussian elimination recovering the whole share polynomial
//! - [`share`]: the `[prefix-]index-hex` share codec
//! - [`shamir`]: split, combine, resplit, extend and regenerate
//!
//! # Example
//!
//! ```
//! use ssss_shamir::{combine, split, SecretEncoding, ShamirConfig, SplitOptions};
//!
//! let config = ShamirConfig::three_of_five().with_prefix("vault");
//! let output = split("correct horse", &config, &SplitOptions::default()).unwrap();
//! assert_eq!(output.shares.len(), 5);
//!
//! // Any 3 shares recover the secret
//! let recovered = combine(&output.shares[1..4], 3, SecretEncoding::Text).unwrap();
//! assert_eq!(recovered.as_str(), "correct horse");
//! ```

pub mod bits;
pub mod diffusion;
pub mod field;
pub mod shamir;
pub mod share;
pub mod solver;

// Re-exports
pub use bits::{Bits, BitsError};
pub use field::Field;
pub use shamir::{
    combine, combine_to_bytes, extend, regenerate, resplit, split, split_bytes, split_with_rng,
    SplitOptions, SplitOutput,
};
pub use share::{parse_share, Share, MAX_PREFIX_LEN};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShamirError {
    #[error("Invalid threshold: need at least 1")]
    InvalidThreshold,
    #[error("Threshold {threshold} exceeds share count {number_of_keys}")]
    ThresholdExceedsShares {
        threshold: usize,
        number_of_keys: usize,
    },
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
    #[error("Token too long: {len} characters (max {max})")]
    TokenTooLong { len: usize, max: usize },
    #[error("Security level invalid (secret too long?): {0} bits")]
    InvalidDegree(usize),
    #[error("Raw entropy must be a hexadecimal string of length: {expected} (got {actual})")]
    EntropyLength { expected: usize, actual: usize },
    #[error("Invalid entropy: {0}")]
    InvalidEntropy(String),
    #[error("Invalid secret: {0}")]
    InvalidSecret(String),
    #[error("Not enough shares to reconstruct: need {needed}, got {got}")]
    InsufficientShares { needed: usize, got: usize },
    #[error("Shares have different security levels")]
    MixedSecurityLevels,
    #[error("Invalid share format: {0}")]
    InvalidShare(String),
    #[error("Shares inconsistent. Perhaps a single share was used twice.")]
    SingularSystem,
    #[error("Random source failure: {0}")]
    RandomSource(String),
    #[error(transparent)]
    Bits(#[from] BitsError),
}

/// How a secret string maps onto a field element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretEncoding {
    /// Raw bytes of the string, 8 bits per byte
    #[default]
    Text,
    /// Hexadecimal digits, 4 bits per digit (rounded up to whole bytes)
    Hex,
}

/// What to do when the threshold exceeds the number of keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdPolicy {
    /// Fail with [`ShamirError::ThresholdExceedsShares`]
    #[default]
    Reject,
    /// Lower the threshold to the number of keys, with a warning
    Clamp,
}

/// Configuration for a split or resplit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShamirConfig {
    /// Minimum shares needed to reconstruct (K)
    pub threshold: usize,
    /// Total shares to generate (N)
    pub number_of_keys: usize,
    /// Optional token prepended to every share
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub encoding: SecretEncoding,
    #[serde(default)]
    pub policy: ThresholdPolicy,
}

impl ShamirConfig {
    pub fn new(threshold: usize, number_of_keys: usize) -> Self {
        Self {
            threshold,
            number_of_keys,
            prefix: None,
            encoding: SecretEncoding::Text,
            policy: ThresholdPolicy::Reject,
        }
    }

    /// Common 2-of-3 setup
    pub fn two_of_three() -> Self {
        Self::new(2, 3)
    }

    /// Common 3-of-5 setup
    pub fn three_of_five() -> Self {
        Self::new(3, 5)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_encoding(mut self, encoding: SecretEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_policy(mut self, policy: ThresholdPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Validate configuration and return the threshold to use.
    ///
    /// A `number_of_keys` of zero is accepted (it produces no shares).
    pub fn validate(&self) -> Result<usize, ShamirError> {
        if self.threshold < 1 {
            return Err(ShamirError::InvalidThreshold);
        }
        if let Some(prefix) = &self.prefix {
            share::check_prefix(prefix)?;
        }
        if self.number_of_keys > 0 && self.threshold > self.number_of_keys {
            return match self.policy {
                ThresholdPolicy::Reject => Err(ShamirError::ThresholdExceedsShares {
                    threshold: self.threshold,
                    number_of_keys: self.number_of_keys,
                }),
                ThresholdPolicy::Clamp => {
                    log::warn!(
                        "Threshold {} exceeds number of keys {}, using {}",
                        self.threshold,
                        self.number_of_keys,
                        self.number_of_keys
                    );
                    Ok(self.number_of_keys)
                }
            };
        }
        Ok(self.threshold)
    }
}

impl Default for ShamirConfig {
    fn default() -> Self {
        Self::two_of_three()
    }
}
