//! JSON-RPC backed implementations of the deployment collaborators.
//!
//! Both talk to a development node (Hardhat, Anvil) that holds unlocked accounts
//! and signs transactions on the caller's behalf.

mod rpc_confirmer;
mod rpc_deployer;

#[cfg(test)]
mod mock_node;

pub use rpc_confirmer::RpcConfirmer;
pub use rpc_deployer::RpcDeployer;
