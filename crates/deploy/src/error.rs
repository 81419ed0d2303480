//! Errors surfaced by a deployment run.

use std::time::Duration;

use alloy_core::primitives::TxHash;
use thiserror::Error;

/// Failure of a single deployment step.
///
/// None of these are recovered locally: the orchestrator aborts on the first one
/// and hands it back to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeployError {
    /// The contract artifact is missing, malformed, or does not accept the given arguments.
    #[error("compilation error for {contract}: {reason}")]
    Compilation { contract: String, reason: String },

    /// The node refused to accept the deployment transaction.
    #[error("failed to broadcast {contract}: {reason}")]
    Broadcast { contract: String, reason: String },

    /// The deployment transaction was not confirmed in time.
    #[error("timed out after {waited:?} waiting for {contract} (tx {tx_hash}) to confirm")]
    Timeout {
        contract: String,
        tx_hash: TxHash,
        waited: Duration,
    },

    /// The constructor failed on-chain.
    #[error("deployment of {contract} reverted (tx {tx_hash}): {reason}")]
    Revert {
        contract: String,
        tx_hash: TxHash,
        reason: String,
    },

    /// The deployment plan itself is invalid. Raised before anything is submitted.
    #[error("invalid deployment configuration: {0}")]
    Config(String),
}

impl DeployError {
    pub fn compilation(contract: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Compilation {
            contract: contract.into(),
            reason: reason.into(),
        }
    }

    pub fn broadcast(contract: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Broadcast {
            contract: contract.into(),
            reason: reason.into(),
        }
    }

    /// Name of the contract the failing step was working on, if any.
    pub fn contract(&self) -> Option<&str> {
        match self {
            Self::Compilation { contract, .. }
            | Self::Broadcast { contract, .. }
            | Self::Timeout { contract, .. }
            | Self::Revert { contract, .. } => Some(contract),
            Self::Config(_) => None,
        }
    }
}
