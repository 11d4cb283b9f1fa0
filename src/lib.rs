//! Steward - a configuration-driven host automation agent
//!
//! This library loads a layered YAML configuration, pins git working
//! copies to their configured refs, and supervises periodic
//! maintenance features until the process is stopped.

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod notes;
pub mod sync;
pub mod system;
pub mod utils;

use agent::Agent;
use anyhow::Result;
use cli::Args;
use config::Config;
use std::path::Path;
use std::sync::Arc;
use system::{RealSystem, System};

/// Main entry point for the steward library
pub fn run(args: Args) -> Result<()> {
    let system: Arc<dyn System> = Arc::new(RealSystem::new());
    let config = Config::load(system.as_ref(), Path::new(&args.config))?;
    let agent = Agent::new(config, system);

    if args.check {
        return agent.check();
    }
    if args.sync_only {
        return agent.sync_only();
    }
    if args.once {
        return agent.run_once();
    }
    agent.run_forever()
}
