//! `envelope`: command-line entry point.
//!
//! Startup sequence:
//! 1. Parse command-line arguments.
//! 2. Load and validate [`EncrypterConfig`] from environment variables.
//! 3. Initialise structured JSON logging.
//! 4. Build the [`Encrypter`](encrypter::Encrypter) and run the command.

mod cli;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use encrypter::EncrypterConfig;
use tracing::debug;

fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Arguments
    // -----------------------------------------------------------------------
    let args = cli::Cli::parse();

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let cfg = EncrypterConfig::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: envelope configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;

    // -----------------------------------------------------------------------
    // 4. Command
    // -----------------------------------------------------------------------
    let enc = cfg
        .build()
        .context("failed to build encrypter from APP_KEY / APP_CIPHER")?;
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        cipher = %enc.cipher(),
        "encrypter ready"
    );

    let input = cli::read_input(args.command.input(), std::io::stdin().lock())?;
    cli::run(&enc, &args.command, &input, &mut std::io::stdout().lock())
}
