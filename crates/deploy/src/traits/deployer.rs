//! Broadcasting side of a deployment.

use std::future::Future;

use crate::{ContractSpec, DeployError, DeploymentHandle};

/// Compiles (or loads), signs and broadcasts a contract creation transaction.
///
/// Returning a handle only means the node accepted the transaction. The contract
/// does not have an address the caller may rely on until it is confirmed.
pub trait ContractDeployer: Send + Sync {
    /// Submit the deployment of `spec`.
    ///
    /// Fails with [`DeployError::Compilation`] when the contract cannot be built
    /// with these arguments and [`DeployError::Broadcast`] when the node rejects it.
    fn deploy(
        &self,
        spec: &ContractSpec,
    ) -> impl Future<Output = Result<DeploymentHandle, DeployError>> + Send;
}
