//! Tessera - Template rendering CLI
//!
//! Renders a template against a JSON context with the default filters and
//! the bundled tag plugins, and prints the result to stdout.
//!
//! Logging goes to stderr and is controlled by `TESSERA_LOG` (falling back
//! to `RUST_LOG`). Render failures are printed to stderr as a JSON error
//! object.

mod cli;
mod error;
mod run;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Args;
use crate::error::AppError;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();
    match run::execute(args).await.and_then(|output| write_stdout(&output)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::Render(err)) => {
            match serde_json::to_string(&err) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("Error: {err}"),
            }
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TESSERA_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn write_stdout(output: &str) -> Result<(), AppError> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
