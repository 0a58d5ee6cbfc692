use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

use llmzip::backend::llama::LlamaCppBackend;
use llmzip::cancel::CancellationToken;
use llmzip::cli::Cli;
use llmzip::config::Mode;
use llmzip::pack::is_valid_alphabet;
use llmzip::predictive::{compress_with_progress, decompress};

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(level).init();
}

fn read_text(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            Ok(buf.trim_end_matches('\n').to_string())
        }
    }
}

/// A "Compressing" bar in the teacher's verbose style, shown only when the
/// operator asked for it; silent (a hidden, zero-cost bar) otherwise.
fn progress_bar(verbosity: u8) -> ProgressBar {
    if verbosity == 0 {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{msg} {bar:40} {pos}/{len} tok")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message("Compressing");
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.to_config();
    init_logging(config.verbosity);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            log::warn!("interrupt received, finishing the current symbol and truncating output");
            cancel.cancel();
        })
        .context("installing SIGINT handler")?;
    }

    let mut backend = LlamaCppBackend::load(
        &config.model_path,
        config.n_ctx,
        config.n_gpu_layers,
        config.use_mlock,
    )
    .with_context(|| format!("loading model from {}", config.model_path.display()))?;

    match config.mode {
        Mode::Compress => {
            let text = read_text(cli.text.clone())?;
            let bar = progress_bar(config.verbosity);
            let packed = compress_with_progress(&mut backend, text.as_bytes(), &config.window_overlap, &cancel, |done, total| {
                bar.set_length(total as u64);
                bar.set_position(done as u64);
            })?;
            bar.finish_and_clear();
            println!("{packed}");
        }
        Mode::Decompress => {
            let packed = read_text(cli.text.clone())?;
            let bytes = decompress(&mut backend, &packed, &config.window_overlap, &cancel)?;
            io::stdout().write_all(&bytes).context("writing decompressed output")?;
        }
        Mode::Interactive => {
            let stdin = io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                if stdin.read_line(&mut line).context("reading stdin")? == 0 {
                    break;
                }
                let line = line.trim_end_matches('\n');
                if is_valid_alphabet(line) {
                    let bytes = decompress(&mut backend, line, &config.window_overlap, &cancel)?;
                    io::stdout().write_all(&bytes)?;
                    println!();
                } else {
                    let bar = progress_bar(config.verbosity);
                    let packed = compress_with_progress(&mut backend, line.as_bytes(), &config.window_overlap, &cancel, |done, total| {
                        bar.set_length(total as u64);
                        bar.set_position(done as u64);
                    })?;
                    bar.finish_and_clear();
                    println!("{packed}");
                }
                if cancel.is_cancelled() {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
