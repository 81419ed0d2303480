//! Confirmation waiter polling `eth_getTransactionReceipt`.

use std::{sync::Arc, time::Duration};

use alloy_core::primitives::Address;
use serde::Deserialize;
use tokio::time::Instant;

use crate::{
    ConfirmationWaiter, DeployError, DeployedContract, DeploymentHandle,
    rpc::{self, RpcClient, deserialize_opt_quantity, deserialize_quantity},
};

/// Default interval between receipt polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default time to wait for a deployment to be confirmed.
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(120);

/// Receipt fields needed to judge a deployment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentReceipt {
    #[serde(deserialize_with = "deserialize_quantity")]
    block_number: u64,
    /// Absent on pre-Byzantium chains.
    #[serde(default, deserialize_with = "deserialize_opt_quantity")]
    status: Option<u64>,
    #[serde(default)]
    contract_address: Option<Address>,
}

/// Waits for deployment receipts and, optionally, extra confirmations on top.
pub struct RpcConfirmer {
    client: Arc<RpcClient>,
    confirmations: u64,
    poll_interval: Duration,
    timeout: Duration,
}

impl RpcConfirmer {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self {
            client,
            confirmations: 1,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_CONFIRM_TIMEOUT,
        }
    }

    /// Number of blocks, counting the inclusion block, before a deployment is final.
    /// `0` is treated as `1`.
    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn timed_out(&self, handle: DeploymentHandle, started: Instant) -> DeployError {
        DeployError::Timeout {
            contract: handle.contract,
            tx_hash: handle.tx_hash,
            waited: started.elapsed(),
        }
    }

    async fn wait_for_block(&self, target: u64, deadline: Instant) -> bool {
        let client = &self.client;
        rpc::poll_until("confirmations", self.poll_interval, deadline, || async move {
            let head: String = client.call("eth_blockNumber", vec![]).await?;
            let head = rpc::parse_quantity(&head)?;
            Ok::<_, anyhow::Error>((head >= target).then_some(()))
        })
        .await
        .is_some()
    }
}

impl ConfirmationWaiter for RpcConfirmer {
    async fn confirm(&self, handle: DeploymentHandle) -> Result<DeployedContract, DeployError> {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let client = &self.client;
        let tx_hash = handle.tx_hash;

        let receipt = rpc::poll_until(
            "transaction receipt",
            self.poll_interval,
            deadline,
            || async move {
                client
                    .call::<Option<DeploymentReceipt>>(
                        "eth_getTransactionReceipt",
                        vec![serde_json::json!(tx_hash)],
                    )
                    .await
            },
        )
        .await;

        let Some(receipt) = receipt else {
            return Err(self.timed_out(handle, started));
        };

        if receipt.status == Some(0) {
            return Err(DeployError::Revert {
                contract: handle.contract,
                tx_hash,
                reason: format!("constructor reverted in block {}", receipt.block_number),
            });
        }

        let Some(address) = receipt.contract_address else {
            return Err(DeployError::Revert {
                contract: handle.contract,
                tx_hash,
                reason: "receipt carries no contract address".to_string(),
            });
        };

        if self.confirmations > 1 {
            let target = receipt.block_number.saturating_add(self.confirmations - 1);
            tracing::debug!(
                contract = %handle.contract,
                block = receipt.block_number,
                target,
                "Waiting for additional confirmations"
            );
            if !self.wait_for_block(target, deadline).await {
                return Err(self.timed_out(handle, started));
            }
        }

        tracing::debug!(
            contract = %handle.contract,
            address = %address,
            block = receipt.block_number,
            "Receipt confirmed"
        );

        Ok(DeployedContract {
            name: handle.contract,
            address,
            block_number: receipt.block_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use alloy_core::primitives::B256;
    use serde_json::json;

    use super::*;
    use crate::{rpc::DEFAULT_REQUEST_TIMEOUT, services::mock_node::MockNode};

    fn handle() -> DeploymentHandle {
        DeploymentHandle {
            contract: "Timelock".to_string(),
            tx_hash: B256::repeat_byte(0x11),
        }
    }

    fn confirmer(node: &MockNode) -> RpcConfirmer {
        let client = Arc::new(RpcClient::new(&node.url, DEFAULT_REQUEST_TIMEOUT).unwrap());
        RpcConfirmer::new(client)
            .with_poll_interval(Duration::from_millis(10))
            .with_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_confirm_after_pending_polls() {
        let address = Address::repeat_byte(0xaa);
        let polls = Arc::new(AtomicU64::new(0));
        let node_polls = polls.clone();

        let node = MockNode::start(move |method, _| match method {
            "eth_getTransactionReceipt" if node_polls.fetch_add(1, Ordering::SeqCst) < 2 => {
                Ok(json!(null))
            }
            "eth_getTransactionReceipt" => Ok(json!({
                "blockNumber": "0x5",
                "status": "0x1",
                "contractAddress": address,
            })),
            other => Err(format!("unexpected method {other}")),
        })
        .await;

        let deployed = confirmer(&node).confirm(handle()).await.unwrap();

        assert_eq!(
            deployed,
            DeployedContract {
                name: "Timelock".to_string(),
                address,
                block_number: 5,
            }
        );
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_status_is_revert() {
        let node = MockNode::start(|_, _| {
            Ok(json!({ "blockNumber": "0x5", "status": "0x0", "contractAddress": null }))
        })
        .await;

        let err = confirmer(&node).confirm(handle()).await.unwrap_err();
        assert!(matches!(err, DeployError::Revert { ref contract, .. } if contract == "Timelock"));
    }

    #[tokio::test]
    async fn test_missing_receipt_times_out() {
        let node = MockNode::start(|_, _| Ok(json!(null))).await;

        let err = confirmer(&node)
            .with_timeout(Duration::from_millis(100))
            .confirm(handle())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Timeout { tx_hash, .. } if tx_hash == B256::repeat_byte(0x11)));
    }

    #[tokio::test]
    async fn test_waits_for_extra_confirmations() {
        let address = Address::repeat_byte(0xbb);
        let head = Arc::new(AtomicU64::new(5));
        let node_head = head.clone();

        let node = MockNode::start(move |method, _| match method {
            "eth_getTransactionReceipt" => Ok(json!({
                "blockNumber": "0x5",
                "status": "0x1",
                "contractAddress": address,
            })),
            "eth_blockNumber" => Ok(json!(format!(
                "{:#x}",
                node_head.fetch_add(1, Ordering::SeqCst)
            ))),
            other => Err(format!("unexpected method {other}")),
        })
        .await;

        let deployed = confirmer(&node)
            .with_confirmations(3)
            .confirm(handle())
            .await
            .unwrap();

        assert_eq!(deployed.address, address);
        // Block 5 included, head must reach 7.
        assert_eq!(node.params_of("eth_blockNumber").len(), 3);
    }

    #[tokio::test]
    async fn test_unreachable_confirmation_target_times_out() {
        let node = MockNode::start(|method, _| match method {
            "eth_getTransactionReceipt" => Ok(json!({
                "blockNumber": "0x5",
                "status": "0x1",
                "contractAddress": Address::repeat_byte(0xcc),
            })),
            "eth_blockNumber" => Ok(json!("0x6")),
            other => Err(format!("unexpected method {other}")),
        })
        .await;

        let err = confirmer(&node)
            .with_confirmations(u64::MAX)
            .with_timeout(Duration::from_millis(100))
            .confirm(handle())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Timeout { .. }));
    }
}
