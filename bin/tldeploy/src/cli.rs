use std::path::PathBuf;

use clap::Parser;
use timelock_deploy::Submission;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "tldeploy")]
#[command(
    author,
    version,
    about = "Deploy a Timelock and the TimelockTest contract bound to it"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "TLDEPLOY_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to a configuration file (tldeploy.toml) or a directory containing one.
    ///
    /// Values from the file are layered over the built-in defaults, and
    /// `TLDEPLOY_*` environment variables are layered over the file.
    #[arg(long, alias = "conf")]
    pub config: Option<PathBuf>,

    /// The JSON-RPC endpoint of the node to deploy to.
    #[arg(long)]
    pub rpc_url: Option<String>,

    /// Root directory of the compiled contract artifacts.
    #[arg(long)]
    pub artifacts: Option<PathBuf>,

    /// Blocks, counting the inclusion block, to wait for each deployment.
    #[arg(long)]
    pub confirmations: Option<u64>,

    /// How the two deployments are submitted (sequential, concurrent).
    ///
    /// Concurrent submission is only accepted when the second contract does not
    /// take the first one's address.
    #[arg(long)]
    pub submission: Option<Submission>,

    /// Write the resolved configuration to this file before deploying.
    #[arg(long)]
    pub save_config: Option<PathBuf>,

    /// Record the deployed addresses in this JSON file after a successful run.
    #[arg(long)]
    pub deployments_out: Option<PathBuf>,
}
