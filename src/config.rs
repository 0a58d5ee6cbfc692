//! Run configuration (§3): the fully-validated set of knobs the predictive
//! loop and CLI share, independent of how they were supplied (command-line
//! flags here; a library embedder could build one directly).

use std::path::PathBuf;

/// What a single invocation should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Compress,
    Decompress,
    /// Read-eval-print loop: alternately compress and decompress lines from
    /// stdin, round-tripping each one, useful for exercising a model
    /// interactively without a file round trip.
    Interactive,
}

/// Everything needed to construct a backend and drive the predictive loop
/// for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the local model file.
    pub model_path: PathBuf,
    pub mode: Mode,
    /// Raw `--window-overlap` string, resolved against the backend's
    /// context length once it's known (see [`crate::overlap::parse_overlap`]).
    pub window_overlap: String,
    /// `0` means "use the model's trained context length".
    pub n_ctx: u32,
    /// `-1` means "offload every layer".
    pub n_gpu_layers: i32,
    pub use_mlock: bool,
    /// `-v`/`-vv` count: 0 = warnings only, 1 = info, 2+ = debug. Also
    /// gates the CLI's progress bar, which is otherwise disabled.
    pub verbosity: u8,
}
