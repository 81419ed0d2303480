//! Contract deployer backed by `eth_sendTransaction`.

use std::sync::Arc;

use alloy_core::primitives::{Address, Bytes, TxHash};
use tokio::sync::OnceCell;

use crate::{
    ContractDeployer, ContractSpec, DeployError, DeploymentHandle, artifact::ArtifactStore,
    rpc::RpcClient,
};

/// Deploys contracts by asking the node to sign and send the creation transaction.
///
/// Creation data comes from the compiled artifact. The sender is either configured
/// explicitly or is the node's first unlocked account, which is what Hardhat's
/// default signer uses.
pub struct RpcDeployer {
    client: Arc<RpcClient>,
    artifacts: ArtifactStore,
    from: Option<Address>,
    gas: Option<u64>,
    sender: OnceCell<Address>,
}

impl RpcDeployer {
    pub fn new(client: Arc<RpcClient>, artifacts: ArtifactStore) -> Self {
        Self {
            client,
            artifacts,
            from: None,
            gas: None,
            sender: OnceCell::new(),
        }
    }

    /// Send from `from` instead of the node's first account.
    pub fn with_sender(mut self, from: Option<Address>) -> Self {
        self.from = from;
        self
    }

    /// Use a fixed gas limit instead of letting the node estimate it.
    pub fn with_gas(mut self, gas: Option<u64>) -> Self {
        self.gas = gas;
        self
    }

    async fn sender(&self, contract: &str) -> Result<Address, DeployError> {
        if let Some(from) = self.from {
            return Ok(from);
        }

        self.sender
            .get_or_try_init(|| async {
                let accounts: Vec<Address> = self
                    .client
                    .call("eth_accounts", vec![])
                    .await
                    .map_err(|e| DeployError::broadcast(contract, format!("{e:#}")))?;

                let sender = accounts.first().copied().ok_or_else(|| {
                    DeployError::broadcast(contract, "node exposes no unlocked accounts")
                })?;
                tracing::debug!(sender = %sender, "Using the node's first account as sender");
                Ok::<_, DeployError>(sender)
            })
            .await
            .copied()
    }
}

impl ContractDeployer for RpcDeployer {
    async fn deploy(&self, spec: &ContractSpec) -> Result<DeploymentHandle, DeployError> {
        let artifact = self.artifacts.load(&spec.name)?;
        let data = Bytes::from(artifact.creation_data(&spec.args)?);
        let from = self.sender(&spec.name).await?;

        let mut tx = serde_json::json!({
            "from": from,
            "data": data,
        });
        if let Some(gas) = self.gas {
            tx["gas"] = serde_json::json!(format!("{gas:#x}"));
        }

        tracing::debug!(
            contract = %spec.name,
            from = %from,
            data_len = data.len(),
            "Sending creation transaction"
        );

        let tx_hash: TxHash = self
            .client
            .call("eth_sendTransaction", vec![tx])
            .await
            .map_err(|e| DeployError::broadcast(&spec.name, format!("{e:#}")))?;

        tracing::info!(contract = %spec.name, tx_hash = %tx_hash, "Deployment transaction sent");

        Ok(DeploymentHandle {
            contract: spec.name.clone(),
            tx_hash,
        })
    }
}
