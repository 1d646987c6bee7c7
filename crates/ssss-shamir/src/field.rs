//! Galois Field GF(2^n) arithmetic for Shamir's Secret Sharing
//!
//! Supports every degree from 8 to 1024 bits in steps of 8. Each degree uses
//! the irreducible pentanomial `x^n + x^a + x^b + x^c + 1` from the table
//! published with the original ssss tools, so shares interoperate with them.

use crate::bits::{self, Bits, Endianness, WordOrder};
use crate::ShamirError;
use zeroize::Zeroizing;

pub const MIN_DEGREE: usize = 8;
pub const MAX_DEGREE: usize = 1024;

/// Tap positions `(a, b, c)` per degree, indexed by `degree / 8 - 1`
static IRRED_COEFF: [u16; 384] = [
    4, 3, 1, 5, 3, 1, 4, 3, 1, 7, 3, 2, 5, 4, 3, 5, 3, 2, 7, 4, 2, 4, 3, 1, 10, 9, 3, 9, 4, 2, 7,
    6, 2, 10, 9, 6, 4, 3, 1, 5, 4, 3, 4, 3, 1, 7, 2, 1, 5, 3, 2, 7, 4, 2, 6, 3, 2, 5, 3, 2, 15, 3,
    2, 11, 3, 2, 9, 8, 7, 7, 2, 1, 5, 3, 2, 9, 3, 1, 7, 3, 1, 9, 8, 3, 9, 4, 2, 8, 5, 3, 15, 14,
    10, 10, 5, 2, 9, 6, 2, 9, 3, 2, 9, 5, 2, 11, 10, 1, 7, 3, 2, 11, 2, 1, 9, 7, 4, 4, 3, 1, 8, 3,
    1, 7, 4, 1, 7, 2, 1, 13, 11, 6, 5, 3, 2, 7, 3, 2, 8, 7, 5, 12, 3, 2, 13, 10, 6, 5, 3, 2, 5, 3,
    2, 9, 5, 2, 9, 7, 2, 13, 4, 3, 4, 3, 1, 11, 6, 4, 18, 9, 6, 19, 18, 13, 11, 3, 2, 15, 9, 6, 4,
    3, 1, 16, 5, 2, 15, 14, 6, 8, 5, 2, 15, 11, 2, 11, 6, 2, 7, 5, 3, 8, 3, 1, 19, 16, 9, 11, 9,
    6, 15, 7, 6, 13, 4, 3, 14, 13, 3, 13, 6, 3, 9, 5, 2, 19, 13, 6, 19, 10, 3, 11, 6, 5, 9, 2, 1,
    14, 3, 2, 13, 3, 1, 7, 5, 4, 11, 9, 8, 11, 6, 5, 23, 16, 9, 19, 14, 6, 23, 10, 2, 8, 3, 2, 5,
    4, 3, 9, 6, 4, 4, 3, 2, 13, 8, 6, 13, 11, 1, 13, 10, 3, 11, 6, 5, 19, 17, 4, 15, 14, 7, 13, 9,
    6, 9, 7, 3, 9, 7, 1, 14, 3, 2, 11, 8, 2, 11, 6, 4, 13, 5, 2, 11, 5, 1, 11, 4, 1, 19, 10, 3,
    21, 10, 6, 13, 3, 1, 15, 7, 5, 19, 18, 10, 7, 5, 3, 12, 7, 2, 7, 5, 1, 14, 9, 6, 10, 3, 2, 15,
    13, 12, 12, 11, 9, 16, 9, 7, 12, 9, 3, 9, 5, 2, 17, 10, 6, 24, 9, 3, 17, 15, 13, 5, 4, 3, 19,
    17, 8, 15, 6, 3, 19, 6, 1,
];

/// True for multiples of 8 in `MIN_DEGREE..=MAX_DEGREE`
pub fn field_size_valid(degree: usize) -> bool {
    (MIN_DEGREE..=MAX_DEGREE).contains(&degree) && degree % 8 == 0
}

fn is_printable(byte: u8) -> bool {
    (32..127).contains(&byte)
}

/// A GF(2^degree) context. Created per operation, never shared between
/// secrets of different lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    degree: usize,
    poly: Bits,
}

impl Field {
    pub fn new(degree: usize) -> Result<Self, ShamirError> {
        if !field_size_valid(degree) {
            return Err(ShamirError::InvalidDegree(degree));
        }
        let taps = &IRRED_COEFF[3 * (degree / 8 - 1)..3 * (degree / 8)];
        let poly = taps
            .iter()
            .fold(Bits::zero().set_bit(degree), |p, &tap| p.set_bit(tap as usize))
            .set_bit(0);
        Ok(Self { degree, poly })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// The reduction polynomial, including the `x^degree` term
    pub fn polynomial(&self) -> &Bits {
        &self.poly
    }

    /// Add two elements (XOR)
    pub fn add(&self, a: &Bits, b: &Bits) -> Bits {
        let mut sum = a.clone();
        sum ^= b;
        sum
    }

    /// Multiply two elements.
    ///
    /// Shift-and-add over the bits of `b`, reducing the running multiplicand
    /// whenever it reaches `x^degree`. Always runs `degree` iterations.
    pub fn mul(&self, a: &Bits, b: &Bits) -> Bits {
        let mut product = if b.test_bit(0) { a.clone() } else { Bits::zero() };
        let mut shifted = a.clone();
        for i in 1..self.degree {
            shifted <<= 1;
            if shifted.test_bit(self.degree) {
                shifted ^= &self.poly;
            }
            if b.test_bit(i) {
                product ^= &shifted;
            }
        }
        product
    }

    /// Multiplicative inverse via the binary extended Euclidean algorithm.
    ///
    /// # Panics
    /// Panics if `x` is zero.
    pub fn invert(&self, x: &Bits) -> Bits {
        assert!(!x.is_zero(), "Inverse of zero in GF(2^n)");
        let mut u = x.clone();
        let mut v = self.poly.clone();
        let mut g = Bits::zero();
        let mut z = Bits::one();
        while !u.is_one() {
            let (mut ub, mut vb) = (u.size_in_bits(), v.size_in_bits());
            if ub < vb {
                std::mem::swap(&mut u, &mut v);
                std::mem::swap(&mut z, &mut g);
                std::mem::swap(&mut ub, &mut vb);
            }
            let shift = ub - vb;
            u ^= &v.shifted_left(shift);
            z ^= &g.shifted_left(shift);
        }
        z
    }

    /// Evaluate the monic polynomial
    /// `x^t + c[t-1]·x^(t-1) + ... + c[1]·x + c[0]` at `x`, where
    /// `t = coeffs.len()`.
    ///
    /// The leading `x^t` term is implicit: the accumulator starts at `x`.
    pub fn horner(&self, x: &Bits, coeffs: &[Bits]) -> Bits {
        let mut y = x.clone();
        for coeff in coeffs.iter().skip(1).rev() {
            y ^= coeff;
            y = self.mul(&y, x);
        }
        if let Some(constant) = coeffs.first() {
            y ^= constant;
        }
        y
    }

    /// Share index as an evaluation point, if it fits in the field
    pub fn element_from_index(&self, index: u64) -> Option<Bits> {
        let x = Bits::from(index);
        (x.size_in_bits() <= self.degree).then_some(x)
    }

    /// Parse up to `degree / 4` hex digits. Shorter input is left-padded
    /// with zeros.
    pub fn import_hex(&self, s: &str) -> Result<Bits, ShamirError> {
        if s.len() > self.degree / 4 {
            return Err(ShamirError::InvalidSecret("input string too long".into()));
        }
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ShamirError::InvalidSecret("invalid syntax".into()));
        }
        if s.len() < self.degree / 4 {
            log::warn!("Input string too short, adding null padding on the left");
        }
        Ok(Bits::from_str_radix(s, 16)?)
    }

    /// Import up to `degree / 8` raw bytes, most significant first
    pub fn import_text(&self, bytes: &[u8]) -> Result<Bits, ShamirError> {
        if bytes.len() > self.degree / 8 {
            return Err(ShamirError::InvalidSecret("input string too long".into()));
        }
        if !bytes.iter().all(|&b| is_printable(b)) {
            log::warn!("Non-ASCII data detected, use hex mode instead");
        }
        Ok(bits::import_bytes(
            WordOrder::MostSignificantFirst,
            1,
            Endianness::MostSignificantByteFirst,
            bytes,
        )?)
    }

    /// Hex digits zero-padded to `degree / 4` characters
    pub fn print_hex(&self, x: &Bits) -> String {
        format!("{:0>width$}", x.to_hex(), width = self.degree / 4)
    }

    /// Bytes of `x`, most significant first, without leading zero bytes
    pub fn print_bytes(&self, x: &Bits) -> Result<Zeroizing<Vec<u8>>, ShamirError> {
        Ok(Zeroizing::new(bits::export_bytes(
            WordOrder::MostSignificantFirst,
            1,
            Endianness::MostSignificantByteFirst,
            x,
        )?))
    }

    /// Bytes of `x` decoded as UTF-8 (lossy)
    pub fn print_text(&self, x: &Bits) -> Result<Zeroizing<String>, ShamirError> {
        let bytes = self.print_bytes(x)?;
        if !bytes.iter().all(|&b| is_printable(b)) {
            log::warn!("Non-ASCII data detected, use hex mode instead");
        }
        Ok(Zeroizing::new(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Bits {
        Bits::from_str_radix(s, 16).unwrap()
    }

    #[test]
    fn test_field_size_valid() {
        assert!(field_size_valid(8));
        assert!(field_size_valid(64));
        assert!(field_size_valid(1024));
        assert!(!field_size_valid(0));
        assert!(!field_size_valid(12));
        assert!(!field_size_valid(1032));
        assert_eq!(Field::new(12), Err(ShamirError::InvalidDegree(12)));
    }

    #[test]
    fn test_polynomial() {
        // x^8 + x^4 + x^3 + x + 1, the AES polynomial
        assert_eq!(Field::new(8).unwrap().polynomial(), &hex("11b"));
        assert_eq!(Field::new(64).unwrap().polynomial(), &hex("1000000000000001b"));

        let poly = Field::new(1024).unwrap().polynomial().clone();
        assert_eq!(poly.size_in_bits(), 1025);
        // taps 19, 6, 1
        assert_eq!(poly.bitwise_xor(&Bits::one().shifted_left(1024)), hex("80043"));
    }

    #[test]
    fn test_add_is_xor() {
        let field = Field::new(8).unwrap();
        assert_eq!(field.add(&hex("53"), &hex("ca")), hex("99"));
        assert_eq!(field.add(&hex("53"), &hex("53")), Bits::zero());
    }

    #[test]
    fn test_mul_gf256() {
        let field = Field::new(8).unwrap();
        // 0x53 and 0xCA are inverses in the AES field
        assert_eq!(field.mul(&hex("53"), &hex("ca")), Bits::one());
        assert_eq!(field.mul(&hex("53"), &Bits::one()), hex("53"));
        assert_eq!(field.mul(&hex("53"), &Bits::zero()), Bits::zero());
        assert_eq!(field.mul(&hex("02"), &hex("80")), hex("1b"));
    }

    #[test]
    fn test_mul_known_answer() {
        let field = Field::new(64).unwrap();
        assert_eq!(
            field.mul(&hex("0123456789abcdef"), &hex("fedcba9876543210")),
            hex("48827ab55d976fa0")
        );
    }

    #[test]
    fn test_mul_commutative() {
        for degree in [8, 16, 72, 256, 1024] {
            let field = Field::new(degree).unwrap();
            let a = hex(&"9e".repeat(degree / 8));
            let b = hex(&"a7".repeat(degree / 16 + 1));
            assert_eq!(field.mul(&a, &b), field.mul(&b, &a), "degree {}", degree);
            assert!(field.mul(&a, &b).size_in_bits() <= degree);
        }
    }

    #[test]
    fn test_invert() {
        let field = Field::new(8).unwrap();
        assert_eq!(field.invert(&hex("53")), hex("ca"));
        assert_eq!(field.invert(&Bits::one()), Bits::one());
        for a in 1u64..=255 {
            let a = Bits::from(a);
            assert_eq!(field.mul(&a, &field.invert(&a)), Bits::one());
        }

        let field = Field::new(64).unwrap();
        assert_eq!(field.invert(&hex("123456789")), hex("2fb926b365da4524"));
    }

    #[test]
    fn test_invert_large_field() {
        let field = Field::new(1024).unwrap();
        let a = hex("7bcd1234112233445566778899aabbccddeeff").shifted_left(700);
        assert_eq!(field.mul(&a, &field.invert(&a)), Bits::one());
    }

    #[test]
    #[should_panic(expected = "Inverse of zero")]
    fn test_invert_zero_panics() {
        Field::new(8).unwrap().invert(&Bits::zero());
    }

    #[test]
    fn test_horner_is_monic() {
        let field = Field::new(64).unwrap();
        // t = 1: p(x) = x + c0
        assert_eq!(field.horner(&Bits::from(5u64), &[hex("1234")]), hex("1231"));
        // p(0) = c0
        let coeffs = [hex("abcdef"), hex("123"), hex("456")];
        assert_eq!(field.horner(&Bits::zero(), &coeffs), hex("abcdef"));
        // t = 2: p(x) = x^2 + c1·x + c0
        let x = Bits::from(3u64);
        let expected = field.add(
            &field.add(&field.mul(&x, &x), &field.mul(&coeffs[1], &x)),
            &coeffs[0],
        );
        assert_eq!(field.horner(&x, &coeffs[..2]), expected);
    }

    #[test]
    fn test_element_from_index() {
        let field = Field::new(8).unwrap();
        assert_eq!(field.element_from_index(255), Some(Bits::from(255u64)));
        assert_eq!(field.element_from_index(256), None);
        assert!(Field::new(64).unwrap().element_from_index(u64::MAX).is_some());
    }

    #[test]
    fn test_import_hex() {
        let field = Field::new(32).unwrap();
        assert_eq!(field.import_hex("deadbeef").unwrap(), hex("deadbeef"));
        assert_eq!(field.import_hex("beef").unwrap(), hex("beef"));
        assert!(field.import_hex("deadbeef0").is_err());
        assert!(field.import_hex("-beef").is_err());
        assert!(field.import_hex("xyz").is_err());
        assert!(field.import_hex("").is_err());
    }

    #[test]
    fn test_import_text() {
        let field = Field::new(48).unwrap();
        let x = field.import_text(b"abcdef").unwrap();
        assert_eq!(x.to_str_radix(10).unwrap(), "107075202213222");
        assert!(field.import_text(b"abcdefg").is_err());
        // Non-printable input only warns
        assert!(field.import_text(&[0x01, 0xff]).is_ok());
    }

    #[test]
    fn test_print() {
        let field = Field::new(64).unwrap();
        assert_eq!(field.print_hex(&hex("beef")), "000000000000beef");
        assert_eq!(field.print_hex(&Bits::zero()), "0000000000000000");

        let x = field.import_text(b"abcdefgh").unwrap();
        assert_eq!(field.print_text(&x).unwrap().as_str(), "abcdefgh");
        assert_eq!(field.print_bytes(&x).unwrap().as_slice(), b"abcdefgh");

        // Leading zero bytes are not part of the text
        let short = field.import_text(b"\0\0hi").unwrap();
        assert_eq!(field.print_text(&short).unwrap().as_str(), "hi");
    }
}
