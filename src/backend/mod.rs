/*!

External LLM collaborator contract (§6). This module defines the interface;
it is realized twice in this repository: [`llama`] wraps a real local
inference engine, and [`stub`] is a small deterministic in-memory backend
used throughout the test suite (§11).

*/

#[cfg(feature = "llama")]
pub mod llama;
pub mod stub;

/// Token id, matching the narrow integer type real tokenizers use.
pub type Token = i32;

/// Everything the predictive loop needs from a causal LLM. Implementors own
/// their model state and KV cache; `reset`/`prefill`/`step` are the only
/// ways the loop mutates that state, keeping the loop itself backend-agnostic.
pub trait LlmBackend {
    /// Backend-specific error type (model load failures, inference errors).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Size of the vocabulary, `V`.
    fn vocab_size(&self) -> usize;

    /// Context window length, `W`, in tokens.
    fn context_length(&self) -> usize;

    /// The beginning-of-stream sentinel token.
    fn token_bos(&self) -> Token;

    /// The end-of-stream sentinel token.
    fn token_eos(&self) -> Token;

    /// Reset the KV cache and any other per-invocation state. Called once at
    /// the start of `compress`/`decompress`.
    fn reset(&mut self) -> Result<(), Self::Error>;

    /// Tokenize UTF-8 bytes. The core never asks for a leading BOS; BOS is
    /// threaded in explicitly by the predictive loop instead (§4.5).
    fn tokenize(&self, text: &[u8], add_bos: bool) -> Result<Vec<Token>, Self::Error>;

    /// Detokenize a run of tokens back to raw bytes.
    fn detokenize(&self, tokens: &[Token]) -> Result<Vec<u8>, Self::Error>;

    /// Clear the KV cache and feed `prefix`, returning logits for the
    /// position immediately following the last prefix token.
    fn prefill(&mut self, prefix: &[Token]) -> Result<Vec<f32>, Self::Error>;

    /// Append one token to the live context (advancing the KV cache) and
    /// return logits for the following position.
    fn step(&mut self, token: Token) -> Result<Vec<f32>, Self::Error>;

    /// Number of tokens currently held in the live KV cache/context, i.e.
    /// how far `prefill`/`step` calls have advanced the backend since the
    /// last `reset` or `prefill`.
    fn context_len_used(&self) -> usize;

    /// Numerically stable log-softmax. Exposed on the backend (rather than
    /// hardcoded in the CDF builder) so a backend can use a
    /// hardware-accelerated kernel; the default is a plain `f64` softmax.
    fn logits_to_logprobs(&self, logits: &[f32]) -> Vec<f32> {
        log_softmax(logits)
    }

    /// Whether this tokenizer marks the start of a word with a leading-space
    /// byte even when priming on a synthetic BOS-only context (common for
    /// BPE/SentencePiece vocabularies). When true, the predictive loop strips
    /// one spurious leading space from decompressed output (§4.5).
    fn adds_leading_space(&self) -> bool {
        false
    }
}

/// Numerically stable log-softmax: subtract the max logit before
/// exponentiating, sum in `f64`, and take the log of the normalizer once.
pub fn log_softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let sum: f64 = logits.iter().map(|&l| f64::from(l - max).exp()).sum();
    let log_sum = sum.ln();
    logits.iter().map(|&l| (f64::from(l - max) - log_sum) as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_softmax_sums_to_one_in_probability_space() {
        let logits = [1.0f32, 2.0, 0.5, -3.0];
        let logprobs = log_softmax(&logits);
        let total: f64 = logprobs.iter().map(|&lp| f64::from(lp).exp()).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn log_softmax_is_shift_invariant() {
        let a = log_softmax(&[1.0, 2.0, 3.0]);
        let b = log_softmax(&[101.0, 102.0, 103.0]);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-5);
        }
    }
}
