//! Deployment record written after a successful run.
//!
//! The file maps contract names to confirmed addresses:
//!
//! ```json
//! { "deployments": { "Timelock": "0x…", "TimelockTest": "0x…" } }
//! ```
//!
//! Existing entries for other contracts are kept, so one file can collect the
//! results of several runs. Nothing is ever read back to skip a deployment.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::DeployedPair;

/// The key under which addresses are stored.
pub const DEPLOYMENTS_KEY: &str = "deployments";

/// Merge the addresses of `pair` into the record at `path`, creating it if needed.
///
/// Fails without touching the file if both contracts share a name, since one
/// address would replace the other.
pub fn write_deployments(path: &Path, pair: &DeployedPair) -> Result<()> {
    if pair.first.name == pair.second.name {
        anyhow::bail!(
            "Both deployments are named {}, refusing to record only one of them",
            pair.first.name
        );
    }

    let mut record = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read deployments from {}", path.display()))?;
        serde_json::from_str::<Value>(&content).context("Failed to parse deployments JSON")?
    } else {
        Value::Object(Map::new())
    };

    let root = record
        .as_object_mut()
        .context("Deployments file must contain a JSON object")?;
    let deployments = root
        .entry(DEPLOYMENTS_KEY)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .with_context(|| format!("`{DEPLOYMENTS_KEY}` must be a JSON object"))?;

    for contract in pair.contracts() {
        deployments.insert(
            contract.name.clone(),
            Value::String(contract.address.to_string()),
        );
    }

    let json = serde_json::to_string_pretty(&record).context("Failed to serialize deployments")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write deployments to {}", path.display()))?;

    tracing::info!(path = %path.display(), "Deployments recorded");
    Ok(())
}
