//! Error kinds for the library surface (§7 of the design).
//!
//! The CLI binary wraps these in `anyhow` for contextual messages; the
//! library crate itself never depends on `anyhow`.

use thiserror::Error;

/// Everything that can go wrong inside `llmzip`, from argument validation
/// down through the coder.
#[derive(Debug, Error)]
pub enum LlmZipError {
    /// Input bytes were not valid UTF-8.
    #[error("input is not valid UTF-8")]
    InputEncoding(#[from] std::str::Utf8Error),

    /// A compressed string contained a character outside the 64-symbol alphabet.
    #[error("invalid compressed string: character {0:?} is not in the packing alphabet")]
    InvalidCiphertext(char),

    /// `--window-overlap` (or its percentage form) normalized outside `[0, W)`.
    #[error("window overlap out of range: {0}")]
    ParameterRange(String),

    /// The vocabulary is too large for the coder's total-mass ceiling (§4.4).
    #[error("model vocabulary of {vocab_size} tokens exceeds the coder's total-mass ceiling")]
    VocabTooLarge {
        /// Size of the offending vocabulary.
        vocab_size: usize,
    },

    /// The LLM backend failed to load or to run inference.
    #[error("LLM backend error: {0}")]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// Standard I/O failure (stdin/stdout).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
