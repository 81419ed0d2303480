//! Seams between the orchestrator and the outside world.
//!
//! A deployment goes through two external collaborators, in this order:
//! a [`ContractDeployer`] broadcasts the creation transaction and hands back a
//! [`DeploymentHandle`](crate::DeploymentHandle), then a [`ConfirmationWaiter`]
//! blocks until that handle is mined and yields the final address.

mod deployer;
mod waiter;

pub use deployer::ContractDeployer;
pub use waiter::ConfirmationWaiter;
