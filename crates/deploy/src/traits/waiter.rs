//! Confirmation side of a deployment.

use std::future::Future;

use crate::{DeployError, DeployedContract, DeploymentHandle};

/// Waits for a broadcast deployment to be mined.
pub trait ConfirmationWaiter: Send + Sync {
    /// Block until `handle` is included and return the deployed contract.
    ///
    /// Fails with [`DeployError::Timeout`] if no confirmation is observed in time
    /// and [`DeployError::Revert`] if the constructor failed on-chain.
    fn confirm(
        &self,
        handle: DeploymentHandle,
    ) -> impl Future<Output = Result<DeployedContract, DeployError>> + Send;
}
