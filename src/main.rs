//! # Steward
//!
//! Steward is a host agent that keeps a machine in the state its
//! configuration describes: git working copies pinned to configured
//! refs, and periodic maintenance features running on their intervals.
//!
//! ## Usage
//!
//! **Daemon mode:**
//! ```sh
//! steward --config /etc/steward
//! ```
//!
//! **Single maintenance pass:**
//! ```sh
//! steward --config /etc/steward --once
//! ```
//!
//! See `steward --help` for the remaining run modes.

use anyhow::Result;
use clap::Parser as _;
use steward::cli::Args;
use steward::error::StewardError;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    let args = Args::parse();

    // Verbose flag only raises the default; RUST_LOG still wins
    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_target(false).with_env_filter(filter).init();

    match steward::run(args) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            error!("{err:#}");
            std::process::exit(
                err.downcast_ref::<StewardError>()
                    .map_or(1, StewardError::exit_code),
            );
        }
    }
}
