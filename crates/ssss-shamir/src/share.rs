//! Share text format
//!
//! A share is written `[prefix-]index-value`: an optional token naming the
//! secret, the decimal evaluation point zero-padded to the width of the
//! largest index in its batch, and the field element as `degree / 4`
//! lowercase hex digits.
//!
//! ```
//! use ssss_shamir::parse_share;
//!
//! let share = parse_share("vault-03-7bcd123411223344").unwrap();
//! assert_eq!(share.prefix.as_deref(), Some("vault"));
//! assert_eq!(share.index, 3);
//! assert_eq!(share.value, "7bcd123411223344");
//! assert_eq!(share.to_string(), "vault-03-7bcd123411223344");
//! ```

use crate::bits::Bits;
use crate::field::Field;
use crate::ShamirError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest accepted prefix, in characters
pub const MAX_PREFIX_LEN: usize = 128;

/// A single parsed share
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Share {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Evaluation point (0 is never issued, but parses)
    pub index: u64,
    /// Field element as hex digits
    pub value: String,
    /// Zero-padded width of the index text
    #[serde(skip)]
    width: usize,
}

impl Share {
    pub fn new(prefix: Option<&str>, index: u64, value: impl Into<String>, width: usize) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            index,
            value: value.into(),
            width,
        }
    }

    /// Field size implied by the value length
    pub fn degree(&self) -> usize {
        4 * self.value.len()
    }

    /// Width the index was written with
    pub fn width(&self) -> usize {
        self.width.max(index_width(self.index))
    }

    /// The value as an element of `field`
    pub fn element(&self, field: &Field) -> Result<Bits, ShamirError> {
        if self.degree() != field.degree() {
            return Err(ShamirError::MixedSecurityLevels);
        }
        field
            .import_hex(&self.value)
            .map_err(|_| ShamirError::InvalidShare(format!("invalid value {:?}", self.value)))
    }
}

impl PartialEq for Share {
    fn eq(&self, other: &Self) -> bool {
        self.prefix == other.prefix && self.index == other.index && self.value == other.value
    }
}

impl Eq for Share {}

impl fmt::Display for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, "{}-", prefix)?;
        }
        write!(f, "{:0width$}-{}", self.index, self.value, width = self.width())
    }
}

impl FromStr for Share {
    type Err = ShamirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_share(s)
    }
}

/// Split a share into prefix, index and value.
///
/// The last two `-`-separated segments are the index and the value; any
/// segments before them are joined back together as the prefix. The value
/// is not checked here, see [`Share::element`].
pub fn parse_share(s: &str) -> Result<Share, ShamirError> {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() < 2 {
        return Err(ShamirError::InvalidShare("invalid share".into()));
    }
    let index_text = parts[parts.len() - 2];
    let value = parts[parts.len() - 1];

    if index_text.is_empty() || !index_text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ShamirError::InvalidShare(format!(
            "invalid share index {:?}",
            index_text
        )));
    }
    let index = index_text
        .parse::<u64>()
        .map_err(|e| ShamirError::InvalidShare(format!("invalid share index: {}", e)))?;
    if value.is_empty() {
        return Err(ShamirError::InvalidShare("empty share value".into()));
    }

    let prefix = (parts.len() > 2).then(|| parts[..parts.len() - 2].join("-"));
    Ok(Share {
        prefix,
        index,
        value: value.to_string(),
        width: index_text.len(),
    })
}

/// Reject prefixes longer than [`MAX_PREFIX_LEN`] characters
pub fn check_prefix(prefix: &str) -> Result<(), ShamirError> {
    let len = prefix.chars().count();
    if len > MAX_PREFIX_LEN {
        return Err(ShamirError::TokenTooLong {
            len,
            max: MAX_PREFIX_LEN,
        });
    }
    Ok(())
}

/// Decimal digit count of `n`
pub fn index_width(n: u64) -> usize {
    let mut width = 1;
    let mut rest = n;
    while rest >= 10 {
        rest /= 10;
        width += 1;
    }
    width
}
