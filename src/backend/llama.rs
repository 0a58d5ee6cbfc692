//! Real [`LlmBackend`] adapter over a local llama.cpp-style inference
//! engine, following the same load/KV-cache/single-token-decode shape used
//! elsewhere in this codebase's lineage for local LLM inference.
//!
//! `LlamaContext` borrows from the `LlamaModel` it was created from; since
//! both need to live inside one long-lived backend struct, the borrow is
//! widened to `'static` with an unsafe transmute. This is sound only because
//! `model` is heap-allocated once and never moved or dropped before `ctx`
//! (`ctx` is declared after `model` and so drops first).

use std::num::NonZeroU32;
use std::path::Path;

use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::context::LlamaContext;
use llama_cpp_2::llama_backend::LlamaBackend as Backend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaModel, Special};
use llama_cpp_2::token::LlamaToken;
use thiserror::Error;

use super::{LlmBackend, Token};

/// Wraps whatever error `llama-cpp-2` produced with the operation that
/// triggered it; the underlying crate's own error enums vary by call site,
/// so the message is captured verbatim rather than re-typed here.
#[derive(Debug, Error)]
#[error("{context}: {message}")]
pub struct LlamaError {
    context: &'static str,
    message: String,
}

impl LlamaError {
    fn new(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self {
            context,
            message: err.to_string(),
        }
    }
}

pub struct LlamaCppBackend {
    #[allow(dead_code)] // kept alive for the backend's lifetime; never read directly
    backend: Backend,
    model: Box<LlamaModel>,
    ctx: LlamaContext<'static>,
    batch: LlamaBatch,
    n_tokens: usize,
    vocab_size: usize,
    bos: Token,
    eos: Token,
    context_length: usize,
    adds_leading_space: bool,
}

impl LlamaCppBackend {
    /// Load `model_path`, configuring the context window, GPU offload, and
    /// mlock per the CLI's `--n-ctx`, `--n-gpu-layers`, `--use-mlock` flags.
    pub fn load(model_path: &Path, n_ctx: u32, n_gpu_layers: i32, use_mlock: bool) -> Result<Self, LlamaError> {
        let backend = Backend::init().map_err(|e| LlamaError::new("initializing llama.cpp backend", e))?;

        let gpu_layers = if n_gpu_layers < 0 { u32::MAX } else { n_gpu_layers as u32 };
        let model_params = LlamaModelParams::default()
            .with_n_gpu_layers(gpu_layers)
            .with_use_mlock(use_mlock);
        let model = LlamaModel::load_from_file(&backend, model_path, &model_params)
            .map_err(|e| LlamaError::new("loading model", e))?;
        let model = Box::new(model);

        let n_ctx = NonZeroU32::new(n_ctx).unwrap_or_else(|| {
            NonZeroU32::new(model.n_ctx_train()).expect("trained context length is non-zero")
        });
        let ctx_params = LlamaContextParams::default().with_n_ctx(Some(n_ctx));

        // SAFETY: `model` is heap-allocated and never moved again; `ctx` is
        // declared after `model` in the struct so it drops first, before
        // the borrow it depends on would become dangling.
        let model_ref: &'static LlamaModel = unsafe { std::mem::transmute(&*model) };
        let ctx = model_ref
            .new_context(&backend, ctx_params)
            .map_err(|e| LlamaError::new("creating inference context", e))?;

        let context_length = ctx.n_ctx() as usize;
        let vocab_size = model.n_vocab() as usize;
        let bos = model.token_bos().0;
        let eos = model.token_eos().0;
        let batch = LlamaBatch::new(context_length.max(1), 1);

        // Probe whether the tokenizer injects a word-initial space marker:
        // tokenize a single space with no BOS, then detokenize it back. If
        // the round trip yields two spaces, the tokenizer is prepending one.
        let probe_tokens = model
            .str_to_token(" ", AddBos::Never)
            .map_err(|e| LlamaError::new("probing tokenizer", e))?;
        let mut probe_bytes = Vec::new();
        for token in &probe_tokens {
            probe_bytes.extend(
                model
                    .token_to_bytes(*token, Special::Tokenize)
                    .map_err(|e| LlamaError::new("probing tokenizer", e))?,
            );
        }
        let adds_leading_space = probe_bytes == b"  ";

        Ok(Self {
            backend,
            model,
            ctx,
            batch,
            n_tokens: 0,
            vocab_size,
            bos,
            eos,
            context_length,
            adds_leading_space,
        })
    }

    fn decode_tokens_from(&mut self, tokens: &[Token], start_pos: usize) -> Result<Vec<f32>, LlamaError> {
        self.batch.clear();
        for (i, &token) in tokens.iter().enumerate() {
            let want_logits = i + 1 == tokens.len();
            self.batch
                .add(LlamaToken(token), (start_pos + i) as i32, &[0], want_logits)
                .map_err(|e| LlamaError::new("queuing token for decode", e))?;
        }
        self.ctx.decode(&mut self.batch).map_err(|e| LlamaError::new("decoding batch", e))?;
        self.n_tokens = start_pos + tokens.len();
        let idx = (tokens.len() - 1) as i32;
        Ok(self.ctx.get_logits_ith(idx).to_vec())
    }
}

impl LlmBackend for LlamaCppBackend {
    type Error = LlamaError;

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
        self.ctx.clear_kv_cache();
        self.n_tokens = 0;
        Ok(())
    }

    fn tokenize(&self, text: &[u8], add_bos: bool) -> Result<Vec<Token>, Self::Error> {
        let text = std::str::from_utf8(text).map_err(|e| LlamaError::new("tokenizing", e))?;
        let add_bos = if add_bos { AddBos::Always } else { AddBos::Never };
        Ok(self
            .model
            .str_to_token(text, add_bos)
            .map_err(|e| LlamaError::new("tokenizing", e))?
            .into_iter()
            .map(|t| t.0)
            .collect())
    }

    fn detokenize(&self, tokens: &[Token]) -> Result<Vec<u8>, Self::Error> {
        let mut bytes = Vec::new();
        for &token in tokens {
            bytes.extend(
                self.model
                    .token_to_bytes(LlamaToken(token), Special::Tokenize)
                    .map_err(|e| LlamaError::new("detokenizing", e))?,
            );
        }
        Ok(bytes)
    }

    fn prefill(&mut self, prefix: &[Token]) -> Result<Vec<f32>, Self::Error> {
        self.ctx.clear_kv_cache();
        self.n_tokens = 0;
        self.decode_tokens_from(prefix, 0)
    }

    fn step(&mut self, token: Token) -> Result<Vec<f32>, Self::Error> {
        let pos = self.n_tokens;
        self.decode_tokens_from(&[token], pos)
    }

    fn context_len_used(&self) -> usize {
        self.n_tokens
    }

    fn adds_leading_space(&self) -> bool {
        self.adds_leading_space
    }
}
