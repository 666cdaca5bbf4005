use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "terradozer",
    about = "Destroys every managed resource described by an infrastructure state file",
    version
)]
pub struct Cli {
    /// Path to the state file to destroy.
    pub state_path: PathBuf,

    /// Refresh every resource but skip the destroy call.
    #[arg(long, conflicts_with = "force")]
    pub dry_run: bool,

    /// Skip the interactive confirmation prompt.
    #[arg(long, conflicts_with = "dry_run")]
    pub force: bool,

    /// Number of concurrent destroy workers.
    #[arg(long, default_value_t = 10)]
    pub parallel: usize,

    /// Per-resource destroy budget, in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Elevate plugin logger verbosity.
    #[arg(long)]
    pub debug: bool,
}
