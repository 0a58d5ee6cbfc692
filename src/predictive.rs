//! The predictive loop (§4.5): drives [`crate::coder::Encoder`]/
//! [`crate::coder::Decoder`] against an [`LlmBackend`]'s next-token
//! distribution, one symbol at a time, sliding the model's context window
//! forward with `overlap` tokens of carry-over whenever it fills.
//!
//! The original drove this from inside the model's own `generate()`
//! callback; here the loop owns the control flow and calls `prefill`/`step`
//! itself, so a caller can interrupt it (via [`CancellationToken`]) between
//! any two symbols without the backend needing to know about cancellation
//! at all.

use log::{debug, info};

use crate::backend::{LlmBackend, Token};
use crate::cancel::CancellationToken;
use crate::cdf::CdfBuilder;
use crate::coder::{Decoder, Encoder};
use crate::error::LlmZipError;
use crate::overlap::parse_overlap;
use crate::pack::{pack, unpack};

fn backend_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> LlmZipError {
    LlmZipError::Backend(Box::new(e))
}

/// Slide the context window forward, keeping the last `overlap` tokens of
/// `tokens[..upto]` and re-priming the backend on `[BOS] + that tail`.
/// Returns the new window start and the freshly primed logits.
fn rebuild_window<B: LlmBackend>(
    backend: &mut B,
    bos: Token,
    tokens: &[Token],
    upto: usize,
    overlap: usize,
) -> Result<(usize, Vec<f32>), LlmZipError> {
    let window_start = upto.saturating_sub(overlap);
    let mut prefix = Vec::with_capacity(overlap + 1);
    prefix.push(bos);
    prefix.extend_from_slice(&tokens[window_start..upto]);
    debug!("context window full; rebuilding with {overlap} tokens of overlap");
    let logits = backend.prefill(&prefix).map_err(backend_err)?;
    Ok((window_start, logits))
}

/// Compress `text` against `backend`, returning the packed ciphertext
/// string. `overlap_spec` is the raw `--window-overlap` argument.
pub fn compress<B: LlmBackend>(
    backend: &mut B,
    text: &[u8],
    overlap_spec: &str,
    cancel: &CancellationToken,
) -> Result<String, LlmZipError> {
    compress_with_progress(backend, text, overlap_spec, cancel, |_, _| {})
}

/// Like [`compress`], but calls `on_progress(tokens_coded, total_tokens)`
/// once per symbol, for a caller (the CLI's progress bar) to report
/// advancement against a known total.
pub fn compress_with_progress<B: LlmBackend>(
    backend: &mut B,
    text: &[u8],
    overlap_spec: &str,
    cancel: &CancellationToken,
    mut on_progress: impl FnMut(usize, usize),
) -> Result<String, LlmZipError> {
    backend.reset().map_err(backend_err)?;
    let w = backend.context_length();
    let overlap = parse_overlap(overlap_spec, w)?;
    let cdf_builder = CdfBuilder::new(backend.vocab_size())?;

    let bos = backend.token_bos();
    let eos = backend.token_eos();
    let mut tokens = backend.tokenize(text, false).map_err(backend_err)?;
    tokens.push(eos);
    info!("compressing {} bytes as {} tokens", text.len(), tokens.len());

    let mut encoder = Encoder::new();
    let mut window_start = 0usize;
    let mut logits = backend.prefill(&[bos]).map_err(backend_err)?;

    let mut i = 0;
    while i < tokens.len() {
        if i - window_start >= w.saturating_sub(1) {
            let (new_start, new_logits) = rebuild_window(backend, bos, &tokens, i, overlap)?;
            window_start = new_start;
            logits = new_logits;
        }

        let logprobs = backend.logits_to_logprobs(&logits);
        let cdf = cdf_builder.build(&logprobs);

        let interrupted = cancel.is_cancelled();
        let symbol = if interrupted { eos as usize } else { tokens[i] as usize };
        encoder.encode_symbol(&cdf, symbol);
        on_progress(i + 1, tokens.len());

        if interrupted {
            info!("compression interrupted; truncating stream at token {i}");
            break;
        }
        if symbol as Token == eos {
            break;
        }

        logits = backend.step(tokens[i]).map_err(backend_err)?;
        i += 1;
    }

    Ok(pack(&encoder.finish()))
}

/// Decompress `packed` against `backend`, returning the reconstructed bytes.
/// `overlap_spec` must match the value used to produce `packed`.
pub fn decompress<B: LlmBackend>(
    backend: &mut B,
    packed: &str,
    overlap_spec: &str,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, LlmZipError> {
    backend.reset().map_err(backend_err)?;
    let w = backend.context_length();
    let overlap = parse_overlap(overlap_spec, w)?;
    let cdf_builder = CdfBuilder::new(backend.vocab_size())?;

    let bos = backend.token_bos();
    let eos = backend.token_eos();
    let mut decoder = Decoder::new(unpack(packed)?);

    let mut tokens: Vec<Token> = Vec::new();
    let mut window_start = 0usize;
    let mut logits = backend.prefill(&[bos]).map_err(backend_err)?;

    loop {
        if cancel.is_cancelled() {
            info!("decompression interrupted after {} tokens", tokens.len());
            break;
        }
        if tokens.len() - window_start >= w.saturating_sub(1) {
            let (new_start, new_logits) = rebuild_window(backend, bos, &tokens, tokens.len(), overlap)?;
            window_start = new_start;
            logits = new_logits;
        }

        let logprobs = backend.logits_to_logprobs(&logits);
        let cdf = cdf_builder.build(&logprobs);
        let symbol = decoder.decode_symbol(&cdf) as Token;

        if symbol == eos {
            break;
        }
        tokens.push(symbol);
        logits = backend.step(symbol).map_err(backend_err)?;
    }

    let mut bytes = backend.detokenize(&tokens).map_err(backend_err)?;
    if backend.adds_leading_space() && bytes.first() == Some(&b' ') {
        bytes.remove(0);
    }
    Ok(bytes)
}
