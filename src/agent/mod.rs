//! Agent orchestration
//!
//! Builds the enabled features, synchronizes repositories and runs
//! one worker thread per feature until the last worker stops.

use crate::config::Config;
use crate::features::{self, Feature};
use crate::sync;
use crate::system::System;
use anyhow::{Context as _, Result, anyhow};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

/// Orchestrates repository sync and feature workers
pub struct Agent {
    config: Config,
    system: Arc<dyn System>,
}

impl Agent {
    #[must_use]
    pub fn new(config: Config, system: Arc<dyn System>) -> Self {
        Self { config, system }
    }

    /// Build every enabled feature in activation order
    ///
    /// Feature settings are parsed and validated here, in every run
    /// mode, so a bad table fails before any repository is touched.
    fn build_features(&self) -> Result<Vec<Box<dyn Feature>>> {
        self.config
            .enabled_features
            .iter()
            .map(|name| features::build_feature(name, &self.config, Arc::clone(&self.system)))
            .collect()
    }

    /// Validate the configuration and print a summary
    pub fn check(&self) -> Result<()> {
        let features = self.build_features()?;
        let names: Vec<&str> = features.iter().map(|feature| feature.key()).collect();

        println!("Configuration OK");
        if names.is_empty() {
            println!("  features: none");
        } else {
            println!("  features: {}", names.join(", "));
        }
        println!("  repositories: {}", self.config.repositories.len());
        Ok(())
    }

    /// Synchronize repositories and exit
    pub fn sync_only(&self) -> Result<()> {
        self.build_features()?;
        sync::sync_all(&self.config.repositories)
    }

    /// One sync pass followed by one pass of every feature
    pub fn run_once(&self) -> Result<()> {
        let mut features = self.build_features()?;
        sync::sync_all(&self.config.repositories)?;

        for feature in &mut features {
            info!("Running feature: {}", feature.key());
            feature.run_once()?;
        }
        Ok(())
    }

    /// Sync, then supervise feature workers until the last one stops
    pub fn run_forever(&self) -> Result<()> {
        if self.config.enabled_features.is_empty() && self.config.repositories.is_empty() {
            warn!("Nothing to do: no features enabled and no repositories configured");
            return Ok(());
        }

        let features = self.build_features()?;
        sync::sync_all(&self.config.repositories)?;

        if features.is_empty() {
            info!("No features enabled, exiting after sync");
            return Ok(());
        }

        let mut workers = Vec::new();
        for feature in features {
            let key = feature.key();
            let handle = thread::Builder::new()
                .name(format!("feature-{key}"))
                .spawn(move || worker_loop(feature))
                .with_context(|| format!("Failed to start worker for '{key}'"))?;
            workers.push(handle);
        }
        info!("Agent running with {} feature worker(s)", workers.len());

        loop {
            if workers.iter().all(|worker| worker.is_finished()) {
                return Err(anyhow!("All feature workers stopped"));
            }
            thread::sleep(Duration::from_secs(1));
        }
    }
}

/// Run one feature until its first error
fn worker_loop(mut feature: Box<dyn Feature>) {
    loop {
        if let Err(e) = feature.run_once() {
            error!("Feature crashed: {} | {e:#}", feature.key());
            return;
        }
        thread::sleep(feature.interval());
    }
}
