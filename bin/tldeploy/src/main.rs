//! tldeploy deploys a Timelock contract, then a TimelockTest contract pointing at it.

mod cli;

use anyhow::Result;
use clap::Parser;

use cli::Cli;
use timelock_deploy::{Deployer, write_deployments};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so that stdout only carries the addresses.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    let mut deployer = Deployer::load(cli.config.as_deref())?;

    if let Some(rpc_url) = cli.rpc_url {
        deployer.rpc_url = rpc_url;
    }
    if let Some(artifacts) = cli.artifacts {
        deployer.artifacts_dir = artifacts;
    }
    if let Some(confirmations) = cli.confirmations {
        deployer.confirmations = confirmations;
    }
    if let Some(submission) = cli.submission {
        deployer.submission = submission;
    }

    if let Some(path) = &cli.save_config {
        deployer.save_to_file(path)?;
    }

    let pair = deployer.deploy().await?;

    for contract in pair.contracts() {
        println!("{} address {}", contract.name, contract.address);
    }

    if let Some(path) = &cli.deployments_out {
        write_deployments(path, &pair)?;
    }

    Ok(())
}
