//! Argument parsing and command execution.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use encrypter::Encrypter;
use serde_json::Value;
use tracing::debug;

/// Encrypt and decrypt authenticated envelopes with the key from `APP_KEY`.
#[derive(Debug, Parser)]
#[command(name = "envelope", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encrypt INPUT (or stdin) and print the envelope.
    Encrypt {
        /// Parse the input as JSON and encrypt it as a structured value.
        #[arg(long)]
        serialize: bool,
        /// Plaintext. Read from stdin when omitted.
        input: Option<String>,
    },
    /// Decrypt an envelope given as INPUT (or stdin) and print the plaintext.
    Decrypt {
        /// Deserialise the plaintext as JSON and pretty-print it.
        #[arg(long)]
        unserialize: bool,
        /// Envelope. Read from stdin when omitted.
        input: Option<String>,
    },
}

impl Command {
    /// The positional input, if one was given.
    pub fn input(&self) -> Option<&str> {
        match self {
            Command::Encrypt { input, .. } | Command::Decrypt { input, .. } => input.as_deref(),
        }
    }
}

/// Return the positional input, or everything readable from `stdin`.
pub fn read_input(arg: Option<&str>, mut stdin: impl Read) -> Result<String> {
    if let Some(arg) = arg {
        return Ok(arg.to_owned());
    }
    let mut buf = String::new();
    stdin
        .read_to_string(&mut buf)
        .context("failed to read input from stdin")?;
    Ok(buf)
}

/// Execute `command` against `input` and write the result line to `out`.
///
/// Plaintext is used verbatim; envelopes are trimmed of surrounding whitespace.
pub fn run<W: Write>(enc: &Encrypter, command: &Command, input: &str, out: &mut W) -> Result<()> {
    let output = match command {
        Command::Encrypt { serialize: true, .. } => {
            let value: Value =
                serde_json::from_str(input).context("--serialize input must be valid JSON")?;
            enc.encrypt(&value)?
        }
        Command::Encrypt { serialize: false, .. } => enc.encrypt_string(input)?,
        Command::Decrypt { unserialize: true, .. } => {
            let value: Value = enc.decrypt(input.trim())?;
            serde_json::to_string_pretty(&value)?
        }
        Command::Decrypt { unserialize: false, .. } => enc.decrypt_string(input.trim())?,
    };
    debug!(cipher = %enc.cipher(), "command completed");
    writeln!(out, "{output}").context("failed to write output")?;
    Ok(())
}
