use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::{
    ArgTemplate, ContractSpec, ContractTemplate, DeployError, DeployedPair, DeploymentPlan,
    RpcConfirmer, RpcDeployer, Submission,
    artifact::{ArtifactStore, DEFAULT_ARTIFACTS_DIR},
    rpc::{DEFAULT_REQUEST_TIMEOUT, RpcClient},
};

/// The default name for the configuration file.
pub const CONFIG_FILENAME: &str = "tldeploy.toml";

/// Prefix of environment variables overriding configuration keys.
///
/// Nested keys are separated by a double underscore, e.g. `TLDEPLOY_SECOND__NAME`.
pub const ENV_PREFIX: &str = "TLDEPLOY_";

/// The default RPC endpoint (a local Hardhat or Anvil node).
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// The contract deployed first.
pub const DEFAULT_FIRST_CONTRACT: &str = "Timelock";

/// The contract deployed second, taking the first contract's address.
pub const DEFAULT_SECOND_CONTRACT: &str = "TimelockTest";

/// One of the two contracts of a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Contract name, also used to locate its artifact.
    pub name: String,
    /// Explicit artifact path, overriding the default artifacts layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    /// Constructor arguments. `"first_address"` stands for the first contract's address.
    #[serde(default)]
    pub args: Vec<ArgTemplate>,
}

impl ContractConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artifact: None,
            args: Vec::new(),
        }
    }

    pub fn template(&self) -> ContractTemplate {
        ContractTemplate {
            name: self.name.clone(),
            args: self.args.clone(),
        }
    }
}

/// Everything needed to run a deployment.
///
/// Can be serialized to/from TOML and layered with environment overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployer {
    /// JSON-RPC endpoint of the target node.
    pub rpc_url: String,
    /// Sender account. Defaults to the node's first unlocked account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Root of the compiled artifacts.
    pub artifacts_dir: PathBuf,
    /// Fixed gas limit for deployment transactions. Estimated by the node if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    /// Blocks, counting the inclusion block, before a deployment counts as confirmed.
    pub confirmations: u64,
    /// Interval between receipt polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Time allowed for each confirmation, in seconds.
    pub timeout_secs: u64,
    /// How the two deployments are submitted.
    pub submission: Submission,

    pub first: ContractConfig,
    pub second: ContractConfig,
}

impl Default for Deployer {
    fn default() -> Self {
        let mut second = ContractConfig::new(DEFAULT_SECOND_CONTRACT);
        second.args.push(ArgTemplate::FIRST_ADDRESS);

        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            from: None,
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            gas: None,
            confirmations: 1,
            poll_interval_ms: 1_000,
            timeout_secs: 120,
            submission: Submission::default(),
            first: ContractConfig::new(DEFAULT_FIRST_CONTRACT),
            second,
        }
    }
}

impl Deployer {
    /// Resolve the configuration: defaults, then the TOML file if any, then
    /// `TLDEPLOY_*` environment variables.
    ///
    /// `path` may point at a file or at a directory containing [`CONFIG_FILENAME`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            if !path.exists() {
                anyhow::bail!("Configuration file or directory not found: {}", path.display());
            }
            let config_path = if path.is_dir() {
                path.join(CONFIG_FILENAME)
            } else {
                path.to_path_buf()
            };
            figment = figment.merge(Toml::file(config_path));
        }

        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to resolve deployment configuration")?;

        if let Some(path) = path {
            tracing::info!(path = %path.display(), "Configuration loaded");
        }
        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize deployer config to TOML")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Load the configuration from a TOML file, without environment overrides.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        toml::from_str(&content).context("Failed to parse config file as TOML")
    }

    /// Validate the configuration into a deployment plan.
    ///
    /// Fails without touching the network if the first contract refers to an
    /// address that cannot exist yet, if both contracts share a name, or if
    /// concurrent submission is requested for a dependent pair.
    pub fn plan(&self) -> Result<DeploymentPlan, DeployError> {
        let first: ContractSpec = self.first.template().standalone().ok_or_else(|| {
            DeployError::Config(format!(
                "{} is deployed first and cannot take its own address as an argument",
                self.first.name
            ))
        })?;

        DeploymentPlan::new(first, self.second.template(), self.submission)
    }

    fn artifact_store(&self) -> ArtifactStore {
        [&self.first, &self.second]
            .into_iter()
            .filter_map(|c| c.artifact.as_ref().map(|path| (c.name.clone(), path.clone())))
            .fold(ArtifactStore::new(&self.artifacts_dir), |store, (name, path)| {
                store.with_override(name, path)
            })
    }

    /// Deploy both contracts against the configured node.
    pub async fn deploy(&self) -> Result<DeployedPair> {
        let plan = self.plan()?;

        tracing::info!(
            rpc_url = %self.rpc_url,
            artifacts_dir = %self.artifacts_dir.display(),
            "Connecting to node..."
        );

        let client = Arc::new(RpcClient::new(&self.rpc_url, DEFAULT_REQUEST_TIMEOUT)?);

        let deployer = RpcDeployer::new(client.clone(), self.artifact_store())
            .with_sender(self.from)
            .with_gas(self.gas);
        let waiter = RpcConfirmer::new(client)
            .with_confirmations(self.confirmations)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_timeout(Duration::from_secs(self.timeout_secs));

        let pair = plan.execute(&deployer, &waiter).await?;

        tracing::info!("✓ Deployment complete!");
        Ok(pair)
    }
}
