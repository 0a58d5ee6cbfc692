//! A small, deterministic, in-memory [`LlmBackend`] used by the test suite
//! (§11) to exercise the coder and predictive loop without a real model
//! file. Tokenization is byte-level (`token id == byte value`); "logits"
//! come from a pluggable, explicitly-programmed [`LogitStrategy`] rather
//! than a real forward pass.

use std::convert::Infallible;

use super::{LlmBackend, Token};

/// How [`StubBackend`] fabricates logits for the current step.
#[derive(Debug, Clone)]
pub enum LogitStrategy {
    /// Every symbol equally likely (E1: uniform logits over the vocabulary).
    Uniform,
    /// The same fixed logits vector on every step, regardless of context.
    Fixed(Vec<f32>),
    /// Give `sequence[position]` a large additive logit bias at the step
    /// predicting that position, where `position` is the number of
    /// "real" (non-BOS) tokens fed so far. A positive `bias` concentrates
    /// almost all mass on the true next token (E2); a large negative `bias`
    /// instead buries it in the least-probable bucket, while every other
    /// symbol stays equiprobable (E3, adversarial).
    Favor { sequence: Vec<Token>, bias: f32 },
}

/// Deterministic stand-in for a real causal LLM.
pub struct StubBackend {
    vocab_size: usize,
    context_length: usize,
    bos: Token,
    eos: Token,
    strategy: LogitStrategy,
    context: Vec<Token>,
}

impl StubBackend {
    /// `vocab_size` bytes `0..256` plus one EOS token (id `256`); BOS is the
    /// out-of-vocabulary sentinel `257`, since it is only ever fed as
    /// context and never predicted or coded.
    pub fn new(context_length: usize, strategy: LogitStrategy) -> Self {
        Self {
            vocab_size: 257,
            context_length,
            bos: 257,
            eos: 256,
            strategy,
            context: Vec::new(),
        }
    }

    fn logits_for_current_position(&self) -> Vec<f32> {
        match &self.strategy {
            LogitStrategy::Uniform => vec![0.0; self.vocab_size],
            LogitStrategy::Fixed(logits) => logits.clone(),
            LogitStrategy::Favor { sequence, bias } => {
                let mut logits = vec![0.0; self.vocab_size];
                let position = self.context.len().saturating_sub(1);
                if let Some(&token) = sequence.get(position) {
                    if (token as usize) < self.vocab_size {
                        logits[token as usize] = *bias;
                    }
                }
                logits
            }
        }
    }
}

impl LlmBackend for StubBackend {
    type Error = Infallible;

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn context_length(&self) -> usize {
        self.context_length
    }

    fn token_bos(&self) -> Token {
        self.bos
    }

    fn token_eos(&self) -> Token {
        self.eos
    }

    fn reset(&mut self) -> Result<(), Self::Error> {
        self.context.clear();
        Ok(())
    }

    fn tokenize(&self, text: &[u8], add_bos: bool) -> Result<Vec<Token>, Self::Error> {
        let mut tokens = if add_bos { vec![self.bos] } else { Vec::new() };
        tokens.extend(text.iter().map(|&b| b as Token));
        Ok(tokens)
    }

    fn detokenize(&self, tokens: &[Token]) -> Result<Vec<u8>, Self::Error> {
        Ok(tokens
            .iter()
            .filter(|&&t| t != self.bos && t != self.eos && t >= 0 && (t as usize) < 256)
            .map(|&t| t as u8)
            .collect())
    }

    fn prefill(&mut self, prefix: &[Token]) -> Result<Vec<f32>, Self::Error> {
        self.context = prefix.to_vec();
        Ok(self.logits_for_current_position())
    }

    fn step(&mut self, token: Token) -> Result<Vec<f32>, Self::Error> {
        self.context.push(token);
        Ok(self.logits_for_current_position())
    }

    fn context_len_used(&self) -> usize {
        self.context.len()
    }
}
