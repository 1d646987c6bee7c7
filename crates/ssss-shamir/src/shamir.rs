//! Share lifecycle: split, combine, resplit, extend and regenerate
//!
//! Every call builds its own [`Field`] sized to the secret (or to the share
//! values) and drops it on return.

use crate::bits::{self, Bits, Endianness, WordOrder};
use crate::diffusion;
use crate::field::{field_size_valid, Field};
use crate::share::{check_prefix, index_width, parse_share, Share};
use crate::solver::LinearSystem;
use crate::{SecretEncoding, ShamirConfig, ShamirError};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

/// Options that only apply to [`split`]
#[derive(Debug, Clone, Default)]
pub struct SplitOptions {
    /// Hex digits replacing the random coefficients, `degree / 4` per
    /// coefficient. Makes the split deterministic.
    pub entropy: Option<String>,
    /// Return the coefficients that were used as hex
    pub export_entropy: bool,
}

impl SplitOptions {
    pub fn with_entropy(entropy: impl Into<String>) -> Self {
        Self {
            entropy: Some(entropy.into()),
            export_entropy: false,
        }
    }

    pub fn exporting_entropy() -> Self {
        Self {
            entropy: None,
            export_entropy: true,
        }
    }
}

/// Result of a split
#[derive(Debug, Clone)]
pub struct SplitOutput {
    pub shares: Vec<String>,
    /// Present when [`SplitOptions::export_entropy`] was set
    pub entropy: Option<Zeroizing<String>>,
}

/// Field size for a secret in the given encoding
fn secret_degree(secret: &str, encoding: SecretEncoding) -> usize {
    match encoding {
        SecretEncoding::Hex => 4 * ((secret.len() + 1) & !1),
        SecretEncoding::Text => 8 * secret.len(),
    }
}

fn normalize_prefix(prefix: Option<&str>) -> Result<Option<&str>, ShamirError> {
    match prefix {
        Some(p) if !p.is_empty() => {
            check_prefix(p)?;
            Ok(Some(p))
        }
        _ => Ok(None),
    }
}

/// Draw one coefficient of `degree` bits
fn random_coefficient<R: RngCore + CryptoRng>(
    rng: &mut R,
    degree: usize,
) -> Result<Bits, ShamirError> {
    let mut buf = Zeroizing::new(vec![0u8; degree / 8]);
    rng.try_fill_bytes(&mut buf)
        .map_err(|e| ShamirError::RandomSource(e.to_string()))?;
    Ok(bits::import_bytes(
        WordOrder::MostSignificantFirst,
        1,
        Endianness::MostSignificantByteFirst,
        &buf,
    )?)
}

/// Evaluate the polynomial at `index` and format the share
fn issue_share(
    field: &Field,
    coeffs: &[Bits],
    prefix: Option<&str>,
    index: u64,
    width: usize,
) -> Result<String, ShamirError> {
    let x = field.element_from_index(index).ok_or_else(|| {
        ShamirError::InvalidParams(format!(
            "share index {} does not fit in a {}-bit field",
            index,
            field.degree()
        ))
    })?;
    let y = field.horner(&x, coeffs);
    Ok(Share::new(prefix, index, field.print_hex(&y), width).to_string())
}

/// Split a secret using the operating system's CSPRNG
pub fn split(
    secret: &str,
    config: &ShamirConfig,
    options: &SplitOptions,
) -> Result<SplitOutput, ShamirError> {
    split_with_rng(&mut OsRng, secret, config, options)
}

/// Split a secret into `config.number_of_keys` shares, any
/// `config.threshold` of which recover it.
///
/// The field size follows the secret: 8 bits per byte in text mode, 4 bits
/// per digit (rounded up to a whole byte) in hex mode.
pub fn split_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
    secret: &str,
    config: &ShamirConfig,
    options: &SplitOptions,
) -> Result<SplitOutput, ShamirError> {
    let threshold = config.validate()?;
    let prefix = normalize_prefix(config.prefix.as_deref())?;

    let degree = secret_degree(secret, config.encoding);
    let field = Field::new(degree)?;

    let chunk = degree / 4;
    if let Some(entropy) = &options.entropy {
        let expected = chunk.checked_mul(threshold - 1).ok_or_else(|| {
            ShamirError::InvalidParams(format!("threshold {} is too large", threshold))
        })?;
        if entropy.len() != expected {
            return Err(ShamirError::EntropyLength {
                expected,
                actual: entropy.len(),
            });
        }
        if !entropy.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ShamirError::InvalidEntropy(
                "expected hexadecimal digits".into(),
            ));
        }
    }

    log::debug!(
        "Splitting {}-bit secret into {} shares, threshold {}",
        degree,
        config.number_of_keys,
        threshold
    );

    let encoded = match config.encoding {
        SecretEncoding::Hex => field.import_hex(secret)?,
        SecretEncoding::Text => field.import_text(secret.as_bytes())?,
    };
    let mut coeffs = Zeroizing::new(vec![diffusion::encode(&encoded, degree)?]);
    let mut exported = options.export_entropy.then(|| Zeroizing::new(String::new()));

    // Nothing is evaluated, so no coefficients are drawn
    if config.number_of_keys == 0 {
        return Ok(SplitOutput {
            shares: Vec::new(),
            entropy: exported,
        });
    }

    for i in 1..threshold {
        let coeff = match &options.entropy {
            Some(entropy) => Bits::from_str_radix(&entropy[chunk * (i - 1)..chunk * i], 16)?,
            None => random_coefficient(rng, degree)?,
        };
        if let Some(out) = exported.as_mut() {
            out.push_str(&field.print_hex(&coeff));
        }
        coeffs.push(coeff);
    }

    let width = index_width(config.number_of_keys as u64);
    let shares = (1..=config.number_of_keys as u64)
        .map(|index| issue_share(&field, &coeffs, prefix, index, width))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SplitOutput {
        shares,
        entropy: exported,
    })
}

/// Split raw bytes. The secret is carried in hex mode, so
/// [`combine_to_bytes`] returns exactly the input, leading zeros included.
pub fn split_bytes(
    secret: &[u8],
    config: &ShamirConfig,
    options: &SplitOptions,
) -> Result<SplitOutput, ShamirError> {
    let hex_secret = Zeroizing::new(hex::encode(secret));
    let config = config.clone().with_encoding(SecretEncoding::Hex);
    split(&hex_secret, &config, options)
}

/// Parse the first `threshold` shares and solve for the share polynomial.
///
/// Returns the field and the coefficients indexed by power; `coeffs[0]` is
/// the diffused secret.
fn recover<S: AsRef<str>>(
    shares: &[S],
    threshold: usize,
) -> Result<(Field, Zeroizing<Vec<Bits>>), ShamirError> {
    if threshold < 1 {
        return Err(ShamirError::InvalidThreshold);
    }
    if shares.len() < threshold {
        return Err(ShamirError::InsufficientShares {
            needed: threshold,
            got: shares.len(),
        });
    }

    let parsed = shares[..threshold]
        .iter()
        .map(|s| parse_share(s.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let degree = parsed[0].degree();
    if !field_size_valid(degree) {
        return Err(ShamirError::InvalidShare(format!(
            "share has illegal length: {} hex digits",
            parsed[0].value.len()
        )));
    }
    if parsed.iter().any(|share| share.degree() != degree) {
        return Err(ShamirError::MixedSecurityLevels);
    }
    let field = Field::new(degree)?;

    let points = parsed
        .iter()
        .map(|share| {
            let x = field.element_from_index(share.index).ok_or_else(|| {
                ShamirError::InvalidShare(format!(
                    "index {} does not fit in a {}-bit field",
                    share.index, degree
                ))
            })?;
            Ok((x, share.element(&field)?))
        })
        .collect::<Result<Vec<_>, ShamirError>>()?;

    log::debug!("Combining {} shares in GF(2^{})", threshold, degree);
    let coeffs = LinearSystem::from_points(&field, &points).solve(&field)?;
    Ok((field, coeffs))
}

/// Recover a secret from shares.
///
/// Only the first `threshold` shares are used; any further shares are
/// ignored, not cross-checked.
pub fn combine<S: AsRef<str>>(
    shares: &[S],
    threshold: usize,
    encoding: SecretEncoding,
) -> Result<Zeroizing<String>, ShamirError> {
    let (field, coeffs) = recover(shares, threshold)?;
    let secret = Zeroizing::new(diffusion::decode(&coeffs[0], field.degree())?);
    match encoding {
        SecretEncoding::Hex => Ok(Zeroizing::new(field.print_hex(&secret))),
        SecretEncoding::Text => field.print_text(&secret),
    }
}

/// Recover a secret split with [`split_bytes`]
pub fn combine_to_bytes<S: AsRef<str>>(
    shares: &[S],
    threshold: usize,
) -> Result<Zeroizing<Vec<u8>>, ShamirError> {
    let hex_secret = combine(shares, threshold, SecretEncoding::Hex)?;
    hex::decode(hex_secret.as_str())
        .map(Zeroizing::new)
        .map_err(|e| ShamirError::InvalidSecret(e.to_string()))
}

/// Issue a fresh batch of `config.number_of_keys` shares of the same
/// polynomial, without exposing the secret.
pub fn resplit<S: AsRef<str>>(
    shares: &[S],
    config: &ShamirConfig,
) -> Result<Vec<String>, ShamirError> {
    if config.number_of_keys <= config.threshold {
        return Err(ShamirError::InvalidParams(
            "numberOfKeys must be greater than threshold".into(),
        ));
    }
    let threshold = config.validate()?;
    let prefix = normalize_prefix(config.prefix.as_deref())?;

    let (field, coeffs) = recover(shares, threshold)?;
    let width = index_width(config.number_of_keys as u64);
    (1..=config.number_of_keys as u64)
        .map(|index| issue_share(&field, &coeffs, prefix, index, width))
        .collect()
}

/// Parse every share, enforce `prefix` on all of them, and work out the
/// prefix and index width of a new share.
fn reissue_context<S: AsRef<str>>(
    shares: &[S],
    prefix: Option<&str>,
) -> Result<(Vec<Share>, Option<String>, usize), ShamirError> {
    let prefix = normalize_prefix(prefix)?;
    let parsed = shares
        .iter()
        .map(|s| parse_share(s.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(expected) = prefix {
        if let Some(other) = parsed.iter().find(|s| s.prefix.as_deref() != Some(expected)) {
            return Err(ShamirError::InvalidShare(format!(
                "share {} does not carry prefix {:?}",
                other, expected
            )));
        }
    }

    let prefix = prefix
        .map(str::to_string)
        .or_else(|| parsed.first().and_then(|s| s.prefix.clone()));
    let width = parsed.iter().map(Share::width).max().unwrap_or(1);
    Ok((parsed, prefix, width))
}

/// Issue one new share at the lowest positive index not used by any of
/// `shares`.
///
/// Without an explicit `prefix` the new share takes the first share's.
pub fn extend<S: AsRef<str>>(
    shares: &[S],
    threshold: usize,
    prefix: Option<&str>,
) -> Result<String, ShamirError> {
    let (parsed, prefix, width) = reissue_context(shares, prefix)?;

    let mut used: Vec<u64> = parsed.iter().map(|s| s.index).collect();
    used.sort_unstable();
    used.dedup();
    let mut next = 1u64;
    for index in used {
        if index == next {
            next += 1;
        } else if index > next {
            break;
        }
    }

    let (field, coeffs) = recover(shares, threshold)?;
    log::debug!("Extending share set with index {}", next);
    issue_share(
        &field,
        &coeffs,
        prefix.as_deref(),
        next,
        width.max(index_width(next)),
    )
}

/// Issue the share at a chosen `index`. For an index that was already
/// issued this reproduces the original share exactly.
pub fn regenerate<S: AsRef<str>>(
    shares: &[S],
    threshold: usize,
    index: u64,
    prefix: Option<&str>,
) -> Result<String, ShamirError> {
    if index == 0 {
        return Err(ShamirError::InvalidParams(
            "share index must be positive".into(),
        ));
    }
    let (_, prefix, width) = reissue_context(shares, prefix)?;
    let (field, coeffs) = recover(shares, threshold)?;
    issue_share(
        &field,
        &coeffs,
        prefix.as_deref(),
        index,
        width.max(index_width(index)),
    )
}
