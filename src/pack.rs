//! Packing collaborator (§6): bits ↔ printable ASCII string over a fixed
//! 64-symbol alphabet, 6 bits per character, most-significant-bit first.
//! Not self-delimiting on its own; the coder's single trailing `1` bit
//! ([`crate::coder::Encoder::finish`]) is what lets a reader stop at the
//! right place once unpacked back into a bit stream.

use bitvec::prelude::*;

use crate::error::LlmZipError;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Strip trailing zero bits, zero-pad to a multiple of six, and map each
/// 6-bit chunk (MSB-first) to a character of [`ALPHABET`].
pub fn pack(bits: &BitSlice<u8, Msb0>) -> String {
    let mut trimmed = bits.len();
    while trimmed > 0 && !bits[trimmed - 1] {
        trimmed -= 1;
    }
    let padded_len = trimmed.div_ceil(6) * 6;

    let mut out = String::with_capacity(padded_len / 6);
    for chunk_start in (0..padded_len).step_by(6) {
        let mut value: u8 = 0;
        for i in 0..6 {
            let idx = chunk_start + i;
            let bit = if idx < trimmed { bits[idx] } else { false };
            value = (value << 1) | bit as u8;
        }
        out.push(ALPHABET[value as usize] as char);
    }
    out
}

/// Inverse of [`pack`]: every character of `s` must be in [`ALPHABET`], or
/// [`LlmZipError::InvalidCiphertext`] is returned. No padding is expected or
/// stripped on read; the caller stops consuming bits once it has decoded
/// enough symbols (signaled by the coder's terminator bit).
pub fn unpack(s: &str) -> Result<BitVec<u8, Msb0>, LlmZipError> {
    let mut bits = BitVec::with_capacity(s.len() * 6);
    for ch in s.chars() {
        let value = ALPHABET
            .iter()
            .position(|&a| a as char == ch)
            .ok_or(LlmZipError::InvalidCiphertext(ch))?;
        for i in (0..6).rev() {
            bits.push((value >> i) & 1 == 1);
        }
    }
    Ok(bits)
}

/// `true` iff every character of `s` is in the packing alphabet. Used by the
/// CLI and the interactive REPL to distinguish a compressed argument from
/// plain text to compress without attempting a full `unpack`.
pub fn is_valid_alphabet(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| ALPHABET.contains(&(c as u8)) && (c as u32) < 128)
}
