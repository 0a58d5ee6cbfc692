//! Command-line surface (§6), mirroring the original's argparse layout:
//! a positional model path, a required mutually-exclusive mode flag, and
//! the coder/backend tuning flags.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::config::{Config, Mode};

#[derive(Debug, Parser)]
#[command(
    name = "llmzip",
    about = "Lossless text compression via arithmetic coding against a predictive LLM",
    group(ArgGroup::new("mode").required(true).args(["compress", "decompress", "interactive"]))
)]
pub struct Cli {
    /// Path to a local GGUF model file.
    pub model_path: PathBuf,

    /// Text to compress, or a ciphertext string to decompress. Read from
    /// stdin when omitted.
    pub text: Option<String>,

    /// Compress `text` (or stdin).
    #[arg(short = 'c', long)]
    pub compress: bool,

    /// Decompress `text` (or stdin).
    #[arg(short = 'd', long)]
    pub decompress: bool,

    /// Run an interactive read-eval-print loop, compressing and
    /// decompressing each line in turn.
    #[arg(short = 'i', long)]
    pub interactive: bool,

    /// Tokens of context to carry over when the window fills, either a raw
    /// count or a `%` of the model's context length.
    #[arg(short = 'w', long = "window-overlap", default_value = "0%")]
    pub window_overlap: String,

    /// Context length in tokens. `0` uses the model's trained maximum.
    #[arg(long = "n-ctx", default_value_t = 0)]
    pub n_ctx: u32,

    /// Number of model layers to offload to the GPU. `-1` offloads all of them.
    #[arg(long = "n-gpu-layers", default_value_t = -1)]
    pub n_gpu_layers: i32,

    /// Lock the model into physical RAM, preventing it from being swapped out.
    #[arg(long = "use-mlock")]
    pub use_mlock: bool,

    /// Increase logging verbosity (-v, -vv).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.compress {
            Mode::Compress
        } else if self.decompress {
            Mode::Decompress
        } else {
            Mode::Interactive
        }
    }

    pub fn to_config(&self) -> Config {
        Config {
            model_path: self.model_path.clone(),
            mode: self.mode(),
            window_overlap: self.window_overlap.clone(),
            n_ctx: self.n_ctx,
            n_gpu_layers: self.n_gpu_layers,
            use_mlock: self.use_mlock,
            verbosity: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("llmzip").chain(args.iter().copied()))
    }

    #[test]
    fn requires_exactly_one_mode_flag() {
        assert!(parse(&["model.gguf"]).is_err());
        assert!(parse(&["model.gguf", "-c", "-d"]).is_err());
        assert!(parse(&["model.gguf", "-c"]).is_ok());
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let cli = parse(&["model.gguf", "-c"]).unwrap();
        assert_eq!(cli.window_overlap, "0%");
        assert_eq!(cli.n_ctx, 0);
        assert_eq!(cli.n_gpu_layers, -1);
        assert!(!cli.use_mlock);
    }

    #[test]
    fn positional_text_is_optional() {
        let cli = parse(&["model.gguf", "-d"]).unwrap();
        assert_eq!(cli.text, None);
        let cli = parse(&["model.gguf", "-d", "some ciphertext"]).unwrap();
        assert_eq!(cli.text.as_deref(), Some("some ciphertext"));
    }

    #[test]
    fn mode_reflects_the_selected_flag() {
        assert_eq!(parse(&["model.gguf", "-i"]).unwrap().mode(), Mode::Interactive);
        assert_eq!(parse(&["model.gguf", "-c"]).unwrap().mode(), Mode::Compress);
        assert_eq!(parse(&["model.gguf", "-d"]).unwrap().mode(), Mode::Decompress);
    }
}
