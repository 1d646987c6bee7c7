//! Arbitrary-precision integers for GF(2^n) arithmetic
//!
//! [`Bits`] wraps a [`num_bigint::BigInt`]. Field elements are always
//! non-negative; the signed operations exist so the bit-level primitives
//! behave the way the classic GMP-based ssss tooling does on negative
//! operands.
//!
//! # Two's complement view
//!
//! Bit tests and the OR/XOR operators look at negative values in two's
//! complement. The view of `-6` is the digit string `1010` (sign-extended:
//! `...11010`), the view of `-9` is `10111`. When two operands have digit
//! strings of different lengths, the shorter one is padded with its sign bit
//! and the combined digits are read back as a non-negative value:
//!
//! ```
//! use ssss_shamir::bits::Bits;
//!
//! let a = Bits::from(-11i64);
//! let b = Bits::from(3i64);
//! assert_eq!(a.bitwise_or(&b), Bits::from(23i64));
//! ```

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};
use std::fmt;
use std::ops::{BitXorAssign, ShlAssign};
use thiserror::Error;
use zeroize::Zeroize;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitsError {
    #[error("Host-native endianness is not supported")]
    HostEndianness,
    #[error("Invalid word size: {0}")]
    InvalidWordSize(usize),
    #[error("Buffer of {len} bytes is not a whole number of {word_size}-byte words")]
    PartialWord { len: usize, word_size: usize },
    #[error("Unsupported base: {0}")]
    InvalidBase(u32),
    #[error("Invalid digit {digit:?} for base {base}")]
    InvalidDigit { digit: char, base: u32 },
    #[error("Empty digit string")]
    Empty,
}

/// Order of the words in an imported/exported buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordOrder {
    MostSignificantFirst,
    LeastSignificantFirst,
}

/// Order of the bytes inside each word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    MostSignificantByteFirst,
    LeastSignificantByteFirst,
    /// Native CPU order. Rejected: buffers must be portable.
    Host,
}

/// Signed arbitrary-precision integer with two's complement bit semantics.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Bits(BigInt);

/// `2^width - 1`
fn low_mask(width: usize) -> BigUint {
    (BigUint::one() << width) - 1u32
}

impl Bits {
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    pub fn one() -> Self {
        Self(BigInt::one())
    }

    fn from_magnitude(negative: bool, magnitude: BigUint) -> Self {
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        Self(BigInt::from_biguint(sign, magnitude))
    }

    fn magnitude(&self) -> &BigUint {
        self.0.magnitude()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_one(&self) -> bool {
        self.0.is_one()
    }

    pub fn is_negative(&self) -> bool {
        self.0.sign() == Sign::Minus
    }

    pub fn abs(&self) -> Self {
        Self::from_magnitude(false, self.magnitude().clone())
    }

    /// Number of significant bits in the magnitude; `0` for zero.
    pub fn size_in_bits(&self) -> usize {
        self.magnitude().bits() as usize
    }

    /// Number of digits of the magnitude in `base` (2..=36); `1` for zero.
    pub fn size_in_base(&self, base: u32) -> Result<usize, BitsError> {
        check_base(base)?;
        if self.is_zero() {
            return Ok(1);
        }
        if base.is_power_of_two() {
            let per_digit = base.trailing_zeros() as usize;
            return Ok(self.size_in_bits().div_ceil(per_digit));
        }
        Ok(self.magnitude().to_str_radix(base).len())
    }

    /// Two's complement view of the value.
    ///
    /// Non-negative values (and `-1`) come back unchanged. For any other
    /// negative value the result is negative and its magnitude's binary
    /// digits are the minimal two's complement digit string of the input,
    /// e.g. `-6` becomes `-0b1010` and `-9` becomes `-0b10111`.
    pub fn twos_complement_view(&self) -> Self {
        if !self.is_negative() {
            return self.clone();
        }
        // |v| - 1, then invert every significant digit and put the sign bit on top
        let reduced = self.magnitude().clone() - 1u32;
        let len = reduced.bits() as usize;
        let inverted = reduced ^ low_mask(len);
        Self::from_magnitude(true, inverted | (BigUint::one() << len))
    }

    /// Test bit `index` of the two's complement view.
    ///
    /// Positions past the digit string read as the sign-extension bit.
    pub fn test_bit(&self, index: usize) -> bool {
        if !self.is_negative() {
            return self.magnitude().bit(index as u64);
        }
        let view = self.twos_complement_view();
        if index >= view.size_in_bits() {
            return true;
        }
        view.magnitude().bit(index as u64)
    }

    pub fn bitwise_or(&self, other: &Self) -> Self {
        self.combine_digits(other, |a, b| a | b)
    }

    pub fn bitwise_xor(&self, other: &Self) -> Self {
        self.combine_digits(other, |a, b| a ^ b)
    }

    /// Set bit `index`, equivalent to OR-ing in `1 << index`; a negative
    /// input keeps its sign.
    pub fn set_bit(&self, index: usize) -> Self {
        let mask = Self::from_magnitude(false, BigUint::one() << index);
        let result = self.bitwise_or(&mask);
        Self::from_magnitude(self.is_negative(), result.magnitude().clone())
    }

    /// `self * 2^count`, sign preserved.
    pub fn shifted_left(&self, count: usize) -> Self {
        Self(&self.0 << count)
    }

    fn combine_digits(&self, other: &Self, op: impl Fn(&BigUint, &BigUint) -> BigUint) -> Self {
        if !self.is_negative() && !other.is_negative() {
            return Self::from_magnitude(false, op(self.magnitude(), other.magnitude()));
        }

        let a = self.twos_complement_view();
        let b = other.twos_complement_view();
        let width = a.size_in_bits().max(b.size_in_bits()).max(1);
        let combined = op(&a.sign_extended(width), &b.sign_extended(width));
        Self::from_magnitude(false, combined & low_mask(width))
    }

    /// Digits of a view padded to `width` bits with its sign-extension bit
    fn sign_extended(&self, width: usize) -> BigUint {
        let digits = self.magnitude().clone();
        if !self.is_negative() {
            return digits;
        }
        let from = self.size_in_bits();
        if from >= width {
            return digits;
        }
        digits | (low_mask(width) ^ low_mask(from))
    }

    /// Parse digits in `base` (2..=36) with an optional leading `-`.
    pub fn from_str_radix(s: &str, base: u32) -> Result<Self, BitsError> {
        check_base(base)?;
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if digits.is_empty() {
            return Err(BitsError::Empty);
        }
        if let Some(digit) = digits.chars().find(|c| c.to_digit(base).is_none()) {
            return Err(BitsError::InvalidDigit { digit, base });
        }
        let magnitude = BigUint::parse_bytes(digits.as_bytes(), base).ok_or(BitsError::Empty)?;
        Ok(Self::from_magnitude(negative, magnitude))
    }

    /// Render in `base` (2..=36), lowercase, `-` prefixed when negative.
    pub fn to_str_radix(&self, base: u32) -> Result<String, BitsError> {
        check_base(base)?;
        Ok(self.0.to_str_radix(base))
    }

    /// Lowercase hexadecimal digits of the value, without padding.
    pub fn to_hex(&self) -> String {
        self.0.to_str_radix(16)
    }
}

fn check_base(base: u32) -> Result<(), BitsError> {
    if !(2..=36).contains(&base) {
        return Err(BitsError::InvalidBase(base));
    }
    Ok(())
}

impl From<u64> for Bits {
    fn from(value: u64) -> Self {
        Self(BigInt::from(value))
    }
}

impl From<i64> for Bits {
    fn from(value: i64) -> Self {
        Self(BigInt::from(value))
    }
}

impl ShlAssign<usize> for Bits {
    fn shl_assign(&mut self, count: usize) {
        self.0 <<= count;
    }
}

impl BitXorAssign<&Bits> for Bits {
    fn bitxor_assign(&mut self, rhs: &Bits) {
        if self.is_negative() || rhs.is_negative() {
            *self = self.bitwise_xor(rhs);
            return;
        }
        self.0 ^= &rhs.0;
    }
}

impl Zeroize for Bits {
    /// Overwrite the digit buffer in place before dropping to zero
    fn zeroize(&mut self) {
        let words = vec![0u32; self.size_in_bits().div_ceil(32)];
        self.0.assign_from_slice(Sign::Plus, &words);
    }
}

impl fmt::Debug for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bits({})", self.to_hex())
    }
}

impl fmt::LowerHex for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.magnitude().to_str_radix(16);
        f.pad_integral(!self.is_negative(), "0x", &digits)
    }
}

fn check_format(word_size: usize, endianness: Endianness) -> Result<(), BitsError> {
    if word_size == 0 {
        return Err(BitsError::InvalidWordSize(word_size));
    }
    if endianness == Endianness::Host {
        return Err(BitsError::HostEndianness);
    }
    Ok(())
}

/// Append one word to a little-endian byte stream
fn push_word_le(out: &mut Vec<u8>, word: &[u8], endianness: Endianness) {
    match endianness {
        Endianness::MostSignificantByteFirst => out.extend(word.iter().rev()),
        _ => out.extend_from_slice(word),
    }
}

/// Build a non-negative value from a buffer of `word_size`-byte words.
///
/// No sign is taken from the data.
pub fn import_bytes(
    order: WordOrder,
    word_size: usize,
    endianness: Endianness,
    bytes: &[u8],
) -> Result<Bits, BitsError> {
    check_format(word_size, endianness)?;
    if bytes.len() % word_size != 0 {
        return Err(BitsError::PartialWord {
            len: bytes.len(),
            word_size,
        });
    }

    let mut le = Vec::with_capacity(bytes.len());
    match order {
        WordOrder::MostSignificantFirst => {
            for word in bytes.chunks(word_size).rev() {
                push_word_le(&mut le, word, endianness);
            }
        }
        WordOrder::LeastSignificantFirst => {
            for word in bytes.chunks(word_size) {
                push_word_le(&mut le, word, endianness);
            }
        }
    }
    let value = Bits::from_magnitude(false, BigUint::from_bytes_le(&le));
    le.zeroize();
    Ok(value)
}

/// Write the magnitude of `value` as the minimal number of
/// `word_size`-byte words. Zero exports as an empty buffer.
pub fn export_bytes(
    order: WordOrder,
    word_size: usize,
    endianness: Endianness,
    value: &Bits,
) -> Result<Vec<u8>, BitsError> {
    check_format(word_size, endianness)?;

    if value.is_zero() {
        return Ok(Vec::new());
    }
    let mut le = value.magnitude().to_bytes_le();
    le.resize(le.len().div_ceil(word_size) * word_size, 0);

    // push_word_le reverses MSB-first words, which is its own inverse
    let mut out = Vec::with_capacity(le.len());
    match order {
        WordOrder::MostSignificantFirst => {
            for word in le.chunks(word_size).rev() {
                push_word_le(&mut out, word, endianness);
            }
        }
        WordOrder::LeastSignificantFirst => {
            for word in le.chunks(word_size) {
                push_word_le(&mut out, word, endianness);
            }
        }
    }
    le.zeroize();
    Ok(out)
}
