//! Serves the directory containing this executable for local browsing.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin serve          # Port 8000
//! cargo run --bin serve -- 9000  # Custom port
//! ```
//!
//! Exits with 0 after Ctrl+C, 2 for an invalid port and 1 when the server
//! cannot start.

use std::{error::Error, process::ExitCode};

use clap::Parser;
use site_serve::{Args, ServerConfig, serve};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let result = match ServerConfig::from_args(&args) {
        Ok(config) => serve(&config).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "server failed");
            eprintln!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
