//! CDF Builder (§4.4): turns a logits vector into the strictly monotonic
//! frequency table the coder requires.

use crate::coder::QUARTER;
use crate::error::LlmZipError;

/// Frequency scale factor `S = 2^32`.
pub const FREQ_SCALE: u64 = 1 << 32;

/// Builds CDFs for a fixed vocabulary size, asserting the total-mass
/// ceiling once at construction rather than on every call.
#[derive(Debug, Clone, Copy)]
pub struct CdfBuilder {
    vocab_size: usize,
}

impl CdfBuilder {
    /// Validate `vocab_size * FREQ_SCALE <= QUARTER` and return a builder.
    pub fn new(vocab_size: usize) -> Result<Self, LlmZipError> {
        if (vocab_size as u128) * (FREQ_SCALE as u128) > QUARTER as u128 {
            return Err(LlmZipError::VocabTooLarge { vocab_size });
        }
        Ok(Self { vocab_size })
    }

    /// Build the CDF for one step's log-probabilities. `logprobs.len()` must
    /// equal the vocabulary size this builder was constructed with.
    ///
    /// `freq[i] = max(1, round_ties_even(FREQ_SCALE * exp(logprobs[i])))`,
    /// `cdf[i] = sum(freq[0..=i])`. Round-half-to-even is used explicitly
    /// (rather than left to the platform default) so encoder and decoder
    /// compute bit-identical tables from bit-identical logits.
    pub fn build(&self, logprobs: &[f32]) -> Vec<u64> {
        debug_assert_eq!(logprobs.len(), self.vocab_size);
        let mut cdf = Vec::with_capacity(logprobs.len());
        let mut acc = 0u64;
        for &logprob in logprobs {
            let prob = f64::from(logprob).exp();
            let freq = (FREQ_SCALE as f64 * prob).round_ties_even().max(1.0) as u64;
            acc += freq;
            cdf.push(acc);
        }
        cdf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_vocab_too_large_for_the_ceiling() {
        let too_large = (QUARTER / FREQ_SCALE) as usize + 1;
        assert!(matches!(
            CdfBuilder::new(too_large),
            Err(LlmZipError::VocabTooLarge { .. })
        ));
    }

    #[test]
    fn builder_accepts_realistic_vocab_sizes() {
        assert!(CdfBuilder::new(32_000).is_ok());
        assert!(CdfBuilder::new(128_000).is_ok());
    }

    #[test]
    fn cdf_is_strictly_increasing_and_bounded() {
        let builder = CdfBuilder::new(4).unwrap();
        // Wildly skewed but every symbol still has non-zero probability mass.
        let logprobs = [-0.01f32, -20.0, -30.0, -40.0];
        let cdf = builder.build(&logprobs);
        assert_eq!(cdf.len(), 4);
        for w in cdf.windows(2) {
            assert!(w[0] < w[1]);
        }
        assert!(*cdf.last().unwrap() <= QUARTER);
    }

    #[test]
    fn vanishing_probability_still_gets_mass_one() {
        let builder = CdfBuilder::new(2).unwrap();
        let logprobs = [0.0f32, -1000.0];
        let cdf = builder.build(&logprobs);
        assert_eq!(cdf[0], cdf[0]); // first symbol's freq is whatever softmax gives
        assert_eq!(cdf[1] - cdf[0], 1); // second symbol still encodable
    }
}
