//! livesrv CLI - development HTTP server with live reload.
//!
//! `livesrv [ROOT]` serves ROOT (default: current directory), injects a
//! reload client into HTML pages and reloads them when files change.

mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use commands::ServeArgs;
use output::Output;

/// Filter used when neither `--verbose` nor `RUST_LOG` is set.
const DEFAULT_FILTER: &str = "warn,livesrv=info";

/// livesrv - development HTTP server with live reload.
#[derive(Parser)]
#[command(name = "livesrv", version, about)]
struct Cli {
    #[command(flatten)]
    serve: ServeArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO for everything, otherwise RUST_LOG or the default
    let filter = if cli.serve.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(cli.serve.execute(&output)),
        Err(e) => Err(e.into()),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
