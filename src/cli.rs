//! CLI definitions for catalog-cleaner
//!
//! No flag is required: credentials come from `KUBECONFIG` and everything
//! else has a default. Flags override values from `--config`. A missing
//! credentials path is reported by `main`, not by clap, so it exits like any
//! other startup failure.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "catalog-cleaner",
    version,
    about = "Removes the Service Catalog and everything it left behind",
    long_about = "Uninstalls the Service Catalog releases, strips finalizers and owner \
                  references\nfrom the resources they managed, then deletes those resources."
)]
pub struct Cli {
    /// Cluster credentials file
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// YAML file overriding the default cleanup configuration
    #[arg(long, env = "CLEANER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Namespace the releases are installed in
    #[arg(long, env = "RELEASE_NAMESPACE")]
    pub release_namespace: Option<String>,

    /// Per-release uninstall timeout (e.g. "90s", "2m")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub uninstall_timeout: Option<Duration>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
