//! Arithmetic decoder (§4.3).

use bitvec::prelude::*;

use super::{update, Event, HALF, MASK, QUARTER, STATE_BITS};

/// Consumes a bit stream, yielding symbols given CDFs. Must perform the
/// identical sequence of `Shift`/`Underflow` reactions as the [`super::Encoder`]
/// that produced the stream, over the identical CDFs, for decoding to agree
/// with encoding.
pub struct Decoder {
    low: u64,
    high: u64,
    code: u64,
    bits: BitVec<u8, Msb0>,
    pos: usize,
}

impl Decoder {
    /// Build a decoder over `bits`. Reads the first [`STATE_BITS`] bits
    /// MSB-first into `code`; bits past the end of the stream read as 0.
    pub fn new(bits: BitVec<u8, Msb0>) -> Self {
        let mut decoder = Self {
            low: 0,
            high: MASK,
            code: 0,
            bits,
            pos: 0,
        };
        for _ in 0..STATE_BITS {
            let bit = decoder.read_bit();
            decoder.code = (decoder.code << 1) | bit;
        }
        decoder
    }

    fn read_bit(&mut self) -> u64 {
        let bit = self.bits.get(self.pos).map(|b| *b).unwrap_or(false);
        self.pos += 1;
        bit as u64
    }

    /// Decode the next symbol under `cdf`.
    pub fn decode_symbol(&mut self, cdf: &[u64]) -> usize {
        let total = *cdf.last().expect("cdf must be non-empty");
        let range = self.high - self.low + 1;
        let offset = self.code - self.low;
        let value = (((offset as u128 + 1) * total as u128 - 1) / range as u128) as u64;
        let symbol = upper_bound(cdf, value);

        let Self {
            low, high, code, bits, pos,
        } = self;
        update(low, high, cdf, symbol, |event| match event {
            Event::Shift(_) => {
                let bit = bits.get(*pos).map(|b| *b).unwrap_or(false) as u64;
                *pos += 1;
                *code = ((*code << 1) & MASK) | bit;
            }
            Event::Underflow => {
                let bit = bits.get(*pos).map(|b| *b).unwrap_or(false) as u64;
                *pos += 1;
                *code = (*code & HALF) | ((*code << 1) & (MASK >> 1)) | bit;
            }
        });
        symbol
    }
}

/// Smallest index `i` with `cdf[i] > value`. `value` must be `< cdf.last()`.
fn upper_bound(cdf: &[u64], value: u64) -> usize {
    cdf.partition_point(|&c| c <= value)
}
