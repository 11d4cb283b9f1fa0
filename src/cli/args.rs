use clap::Parser;

/// Command-line arguments for steward
#[derive(Parser, Debug, Clone)]
#[command(name = "steward")]
#[command(about = "A host automation agent driven by layered YAML configuration")]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Configuration file or fragment directory
    #[arg(
        long,
        value_name = "PATH",
        env = "STEWARD_CONFIG",
        default_value = "/config"
    )]
    pub config: String,

    /// Run one sync and one pass of every feature, then exit
    #[arg(long, conflicts_with_all = ["check", "sync_only"])]
    pub once: bool,

    /// Validate the configuration and exit without running anything
    #[arg(long, conflicts_with_all = ["once", "sync_only"])]
    pub check: bool,

    /// Synchronize repositories and exit without starting features
    #[arg(long = "sync-only", conflicts_with_all = ["once", "check"])]
    pub sync_only: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_daemon_mode() {
        let args = Args::parse_from(["steward"]);
        assert_eq!(args.config, "/config");
        assert!(!args.once);
        assert!(!args.check);
        assert!(!args.sync_only);
        assert!(!args.verbose);
    }

    #[test]
    fn accepts_a_single_run_mode() {
        let args = Args::parse_from(["steward", "--once", "--config", "/etc/steward"]);
        assert!(args.once);
        assert_eq!(args.config, "/etc/steward");
    }

    #[test]
    fn rejects_conflicting_run_modes() {
        assert!(Args::try_parse_from(["steward", "--once", "--check"]).is_err());
        assert!(Args::try_parse_from(["steward", "--check", "--sync-only"]).is_err());
        assert!(Args::try_parse_from(["steward", "--once", "--sync-only"]).is_err());
    }
}
