//! # Vericlaim CLI
//!
//! Entry point for the `vericlaim` binary. Parses CLI arguments, initializes
//! logging, and runs one subcommand:
//!
//! - `keygen`: generate a key pair (optionally with a key-file entry)
//! - `request`: build an unsigned request envelope
//! - `sign`: sign an envelope
//! - `inspect`: print an envelope's header and claims
//! - `verify`: check a signature against a key file
//! - `version`: print build version information
//!
//! Command output goes to stdout, logs to stderr. `verify` exits with status
//! 1 when the signature does not verify.

mod cli;
mod commands;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Commands, VericlaimCli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = VericlaimCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);

    match cli.command {
        Commands::Keygen(args) => {
            let generated = commands::keygen(&args)?;
            let out = serde_json::to_string_pretty(&generated).context("cannot render key")?;
            println!("{out}");
        }
        Commands::Request(args) => println!("{}", commands::request(&args)?),
        Commands::Sign(args) => println!("{}", commands::sign(&args).await?),
        Commands::Inspect(args) => {
            let inspected = commands::inspect(&args)?;
            println!("{}", serde_json::to_string_pretty(&inspected)?);
        }
        Commands::Verify(args) => {
            if commands::verify(&args).await? {
                println!("valid");
            } else {
                println!("invalid");
                tracing::warn!(endpoint = %args.endpoint, "signature verification failed");
                std::process::exit(1);
            }
        }
        Commands::Version => print_version(),
    }

    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("vericlaim {}", env!("CARGO_PKG_VERSION"));
    println!("envelope  {}", vericlaim_protocol::config::ENVELOPE_TYPE);
    println!("rustc     {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
