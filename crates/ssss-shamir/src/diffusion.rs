//! Diffusion layer for the secret
//!
//! Before a secret becomes the constant term of the share polynomial it is
//! whitened with an XTEA-style Feistel cipher (all-zero key, 32 rounds). The
//! cipher runs over overlapping 64-bit windows that step two bytes at a
//! time around the secret buffer, 40 × (degree / 8) times, so every output
//! byte depends on every input byte.
//!
//! Secrets shorter than one 64-bit block are passed through unchanged.

use crate::bits::{self, Bits, Endianness, WordOrder};
use crate::ShamirError;
use zeroize::Zeroizing;

/// Smallest field the cipher can run on (one 64-bit block)
pub const MIN_DIFFUSION_DEGREE: usize = 64;

const DELTA: u32 = 0x9E37_79B9;
const ROUNDS: u32 = 32;
const PASSES_PER_BYTE: usize = 40;

pub fn encipher_block(v: &mut [u32; 2]) {
    let mut sum: u32 = 0;
    for _ in 0..ROUNDS {
        v[0] = v[0].wrapping_add(((v[1] << 4) ^ (v[1] >> 5)).wrapping_add(v[1]) ^ sum);
        sum = sum.wrapping_add(DELTA);
        v[1] = v[1].wrapping_add(((v[0] << 4) ^ (v[0] >> 5)).wrapping_add(v[0]) ^ sum);
    }
}

pub fn decipher_block(v: &mut [u32; 2]) {
    let mut sum: u32 = DELTA.wrapping_mul(ROUNDS);
    for _ in 0..ROUNDS {
        v[1] = v[1].wrapping_sub(((v[0] << 4) ^ (v[0] >> 5)).wrapping_add(v[0]) ^ sum);
        sum = sum.wrapping_sub(DELTA);
        v[0] = v[0].wrapping_sub(((v[1] << 4) ^ (v[1] >> 5)).wrapping_add(v[1]) ^ sum);
    }
}

/// Run `cipher` on the 8 bytes starting at `start`, wrapping around `len`
fn process_window(data: &mut [u8], start: usize, len: usize, cipher: fn(&mut [u32; 2])) {
    let at = |k: usize| (start + k) % len;
    let mut block = [0u32; 2];
    for (i, word) in block.iter_mut().enumerate() {
        *word = u32::from_be_bytes([
            data[at(4 * i)],
            data[at(4 * i + 1)],
            data[at(4 * i + 2)],
            data[at(4 * i + 3)],
        ]);
    }
    cipher(&mut block);
    for (i, word) in block.iter().enumerate() {
        for (k, byte) in word.to_be_bytes().into_iter().enumerate() {
            data[at(4 * i + k)] = byte;
        }
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Encode,
    Decode,
}

fn transform(x: &Bits, degree: usize, direction: Direction) -> Result<Bits, ShamirError> {
    if degree < MIN_DIFFUSION_DEGREE {
        log::warn!("Security level too small for the diffusion layer. Secret too short.");
        return Ok(x.clone());
    }
    if x.size_in_bits() > degree {
        return Err(ShamirError::InvalidSecret(format!(
            "value does not fit in {} bits",
            degree
        )));
    }

    // 16-bit words, least significant word first, big-endian inside each word
    let len = degree / 8;
    let mut buf = Zeroizing::new(bits::export_bytes(
        WordOrder::LeastSignificantFirst,
        2,
        Endianness::MostSignificantByteFirst,
        x,
    )?);
    buf.resize((degree + 8) / 16 * 2, 0);

    // Odd word count: the top word holds a single byte in its low half
    let odd_words = degree % 16 == 8;
    if odd_words {
        buf[len - 1] = buf[len];
    }

    match direction {
        Direction::Encode => {
            for start in (0..PASSES_PER_BYTE * len).step_by(2) {
                process_window(&mut buf, start, len, encipher_block);
            }
        }
        Direction::Decode => {
            for start in (0..PASSES_PER_BYTE * len).step_by(2).rev() {
                process_window(&mut buf, start, len, decipher_block);
            }
        }
    }

    if odd_words {
        buf[len] = buf[len - 1];
        buf[len - 1] = 0;
    }

    Ok(bits::import_bytes(
        WordOrder::LeastSignificantFirst,
        2,
        Endianness::MostSignificantByteFirst,
        &buf,
    )?)
}

/// Whiten a secret of `degree` bits
pub fn encode(x: &Bits, degree: usize) -> Result<Bits, ShamirError> {
    transform(x, degree, Direction::Encode)
}

/// Invert [`encode`]
pub fn decode(x: &Bits, degree: usize) -> Result<Bits, ShamirError> {
    transform(x, degree, Direction::Decode)
}
