//! Recover the share polynomial from `threshold` points
//!
//! Shares are evaluations of the monic polynomial
//! `p(x) = x^t + c[t-1]·x^(t-1) + ... + c[0]`. Moving the known `x^t` term
//! to the right-hand side leaves a `t × t` Vandermonde system in the
//! unknown coefficients, solved here by Gaussian elimination in GF(2^n).
//!
//! The matrix is stored transposed: `rows[p][s]` is `x_s^(t-1-p)` for share
//! `s`, and pivoting swaps share columns. Elimination keeps every entry a
//! field element (rows are cross-multiplied rather than divided), and only
//! back-substitution inverts the diagonal.

use crate::bits::Bits;
use crate::field::Field;
use crate::ShamirError;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

#[derive(Debug, Zeroize, ZeroizeOnDrop)]
pub struct LinearSystem {
    rows: Vec<Vec<Bits>>,
    rhs: Vec<Bits>,
}

impl LinearSystem {
    /// Build the system from `(x, y)` share points
    pub fn from_points(field: &Field, points: &[(Bits, Bits)]) -> Self {
        let t = points.len();
        let mut rows = vec![vec![Bits::zero(); t]; t];
        let mut rhs = Vec::with_capacity(t);
        for (s, (x, y)) in points.iter().enumerate() {
            rows[t - 1][s] = Bits::one();
            for p in (0..t - 1).rev() {
                rows[p][s] = field.mul(&rows[p + 1][s], x);
            }
            // y - x^t
            rhs.push(field.add(y, &field.mul(x, &rows[0][s])));
        }
        Self { rows, rhs }
    }

    pub fn len(&self) -> usize {
        self.rhs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }

    /// Solve in place and return the coefficients, `coefficients[k]` being
    /// the coefficient of `x^k`.
    ///
    /// Fails with [`ShamirError::SingularSystem`] when two points share an
    /// evaluation point.
    pub fn solve(&mut self, field: &Field) -> Result<Zeroizing<Vec<Bits>>, ShamirError> {
        let n = self.len();
        if n == 0 {
            return Err(ShamirError::InsufficientShares { needed: 1, got: 0 });
        }
        let a = &mut self.rows;
        let b = &mut self.rhs;

        for i in 0..n {
            if a[i][i].is_zero() {
                let j = (i + 1..n)
                    .find(|&j| !a[i][j].is_zero())
                    .ok_or(ShamirError::SingularSystem)?;
                for row in a.iter_mut().skip(i) {
                    row.swap(i, j);
                }
                b.swap(i, j);
            }
            for j in i + 1..n {
                if a[i][j].is_zero() {
                    continue;
                }
                let (pivot, factor) = (a[i][i].clone(), a[i][j].clone());
                for k in i + 1..n {
                    let h = field.mul(&a[k][i], &factor);
                    a[k][j] = field.add(&field.mul(&a[k][j], &pivot), &h);
                }
                let h = field.mul(&b[i], &factor);
                b[j] = field.add(&field.mul(&b[j], &pivot), &h);
            }
        }

        let mut coefficients = Zeroizing::new(Vec::with_capacity(n));
        for i in (0..n).rev() {
            for j in (i + 1..n).rev() {
                let h = field.mul(&b[j], &a[j][i]);
                b[i] ^= &h;
            }
            b[i] = field.mul(&b[i], &field.invert(&a[i][i]));
            coefficients.push(b[i].clone());
        }
        Ok(coefficients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Bits {
        Bits::from_str_radix(s, 16).unwrap()
    }

    fn points(field: &Field, coeffs: &[Bits], xs: &[u64]) -> Vec<(Bits, Bits)> {
        xs.iter()
            .map(|&x| {
                let x = Bits::from(x);
                let y = field.horner(&x, coeffs);
                (x, y)
            })
            .collect()
    }

    #[test]
    fn test_recovers_all_coefficients() {
        let field = Field::new(64).unwrap();
        let coeffs = vec![
            hex("732d5aea0e676da9"),
            hex("0011223344556677"),
            hex("8899aabbccddeeff"),
        ];
        let mut system = LinearSystem::from_points(&field, &points(&field, &coeffs, &[1, 2, 3]));
        assert_eq!(system.len(), 3);
        let solved = system.solve(&field).unwrap();
        assert_eq!(solved.as_slice(), coeffs.as_slice());
    }

    #[test]
    fn test_any_points_give_same_polynomial() {
        let field = Field::new(16).unwrap();
        let coeffs = vec![hex("beef"), hex("1234"), hex("0001"), hex("ffff")];
        for xs in [[1u64, 2, 3, 4], [6, 5, 4, 3], [2, 9, 17, 200]] {
            let mut system = LinearSystem::from_points(&field, &points(&field, &coeffs, &xs));
            assert_eq!(system.solve(&field).unwrap().as_slice(), coeffs.as_slice());
        }
    }

    #[test]
    fn test_single_point() {
        let field = Field::new(8).unwrap();
        let coeffs = vec![hex("41")];
        let mut system = LinearSystem::from_points(&field, &points(&field, &coeffs, &[7]));
        assert_eq!(system.solve(&field).unwrap().as_slice(), coeffs.as_slice());
    }

    #[test]
    fn test_pivot_swap() {
        // x = 0 first leaves a zero on the diagonal
        let field = Field::new(32).unwrap();
        let coeffs = vec![hex("cafebabe"), hex("01020304"), hex("a5a5a5a5")];
        let mut system = LinearSystem::from_points(&field, &points(&field, &coeffs, &[0, 4, 9]));
        assert_eq!(system.solve(&field).unwrap().as_slice(), coeffs.as_slice());
    }

    #[test]
    fn test_duplicate_points_are_singular() {
        let field = Field::new(64).unwrap();
        let coeffs = vec![hex("01"), hex("02"), hex("03")];
        let mut system = LinearSystem::from_points(&field, &points(&field, &coeffs, &[1, 2, 1]));
        assert!(matches!(
            system.solve(&field),
            Err(ShamirError::SingularSystem)
        ));
    }

    #[test]
    fn test_empty_system() {
        let field = Field::new(8).unwrap();
        let mut system = LinearSystem::from_points(&field, &[]);
        assert!(system.is_empty());
        assert!(matches!(
            system.solve(&field),
            Err(ShamirError::InsufficientShares { .. })
        ));
    }
}
