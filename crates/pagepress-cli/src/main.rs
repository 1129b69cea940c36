// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// images2pdf: convert images into a single A5 PDF, one image per page.
//
// Entry point. Parses arguments, initialises logging, runs the conversion and
// maps the outcome to an exit code.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pagepress_core::{ConversionConfig, PagepressError};
use pagepress_document::{ConversionSummary, convert};
use tracing_subscriber::EnvFilter;

/// Exit code for requests refused before any output is written.
const EXIT_USAGE: u8 = 2;
/// Exit code for decode, I/O and PDF failures.
const EXIT_FAILURE: u8 = 1;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Two photos, one page each
  images2pdf -f holiday.pdf beach.jpg sunset.png

  # Everything below a directory, depth-first
  images2pdf -f scans.pdf -r ./scans

Files are recognised by content, not extension; anything that is not a PNG,
JPEG, BMP, GIF, WEBP or AVIF image is skipped. Set RUST_LOG=info for progress."#;

/// Convert images into a single A5 PDF, one image per page.
#[derive(Debug, Parser)]
#[command(name = "images2pdf", version, about, after_help = AFTER_HELP)]
struct Cli {
    /// Output PDF file (must end in .pdf)
    #[arg(short = 'f', long = "file", value_name = "OUTPUT.pdf")]
    file: PathBuf,

    /// Descend into directories
    #[arg(short, long)]
    recursive: bool,

    /// Images, or directories together with -r
    #[arg(required = true, num_args = 1.., value_name = "IMAGE_OR_DIR")]
    images: Vec<PathBuf>,
}

impl Cli {
    fn config(&self) -> ConversionConfig {
        ConversionConfig::with_recursive(self.recursive)
    }
}

fn run(cli: &Cli) -> Result<ConversionSummary, PagepressError> {
    convert(&cli.config(), &cli.images, &cli.file)
}

fn exit_code(result: &Result<ConversionSummary, PagepressError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(err) if err.is_usage() => EXIT_USAGE,
        Err(_) => EXIT_FAILURE,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(&cli);
    match &result {
        Ok(summary) => {
            tracing::info!(pages = summary.pages, output = %summary.output.display(), "done");
        }
        // Usage problems are a single line on stdout, like a help message.
        Err(err) if err.is_usage() => println!("{err}"),
        Err(err) => {
            tracing::error!(error = %err, "conversion failed");
            eprintln!("images2pdf: {err}");
        }
    }
    ExitCode::from(exit_code(&result))
}
