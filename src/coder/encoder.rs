//! Arithmetic encoder (§4.2).

use bitvec::prelude::*;

use super::{update, Event, MASK};

/// Emits a bit stream given `(cdf, symbol)` pairs. Mirrors [`super::Decoder`]
/// bit for bit: the two must walk the identical sequence of `Shift`/
/// `Underflow` events for a round trip to hold.
pub struct Encoder {
    low: u64,
    high: u64,
    /// Count of pending opposite-polarity bits deferred by `Underflow`
    /// events, flushed the next time a bit settles.
    underflow_count: u64,
    output: BitVec<u8, Msb0>,
}

impl Encoder {
    /// A fresh encoder with `low = 0`, `high = MASK`.
    pub fn new() -> Self {
        Self {
            low: 0,
            high: MASK,
            underflow_count: 0,
            output: BitVec::new(),
        }
    }

    /// Encode `symbol` under `cdf`.
    pub fn encode_symbol(&mut self, cdf: &[u64], symbol: usize) {
        let Self {
            low,
            high,
            underflow_count,
            output,
        } = self;
        update(low, high, cdf, symbol, |event| match event {
            Event::Shift(bit) => {
                output.push(bit == 1);
                for _ in 0..*underflow_count {
                    output.push(bit == 0);
                }
                *underflow_count = 0;
            }
            Event::Underflow => {
                *underflow_count += 1;
            }
        });
    }

    /// Append the terminating `1` bit and return the finished bit stream.
    /// This guarantees the decoder can still recover the final symbol
    /// regardless of where the true code point falls within the last
    /// interval.
    pub fn finish(mut self) -> BitVec<u8, Msb0> {
        self.output.push(true);
        self.output
    }

    /// Number of bits emitted so far, not counting the not-yet-appended
    /// terminator.
    pub fn bits_written(&self) -> usize {
        self.output.len()
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::super::decoder::Decoder;
    use super::*;

    fn flat_cdf(n: usize) -> Vec<u64> {
        (1..=n as u64).map(|i| i * (1 << 20)).collect()
    }

    #[test]
    fn encode_decode_roundtrip_over_random_symbols() {
        let cdf = flat_cdf(17);
        let symbols = [0usize, 16, 8, 3, 3, 3, 15, 0, 9];

        let mut encoder = Encoder::new();
        for &s in &symbols {
            encoder.encode_symbol(&cdf, s);
        }
        let bits = encoder.finish();

        let mut decoder = Decoder::new(bits);
        let decoded: Vec<usize> = symbols.iter().map(|_| decoder.decode_symbol(&cdf)).collect();
        assert_eq!(decoded, symbols);
    }

    #[test]
    fn finish_always_appends_a_terminator_bit() {
        let encoder = Encoder::new();
        let bits = encoder.finish();
        assert!(bits[bits.len() - 1]);
    }
}
