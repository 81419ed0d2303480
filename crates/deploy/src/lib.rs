//! timelock-deploy - Two-step contract deployment.
//!
//! This crate deploys a pair of contracts where the second takes the first one's
//! confirmed address as a constructor argument: `Timelock`, then `TimelockTest`.
//! The chain is reached through two traits, [`ContractDeployer`] and
//! [`ConfirmationWaiter`], with JSON-RPC implementations in [`services`].

pub mod artifact;
pub mod rpc;
pub mod services;

mod contract;
pub use contract::{
    ArgTemplate, ConstructorArg, ContractSpec, ContractTemplate, DeployedContract,
    DeploymentHandle, Placeholder, encode_constructor_args,
};

mod deployer;
pub use deployer::{
    CONFIG_FILENAME, ContractConfig, DEFAULT_FIRST_CONTRACT, DEFAULT_RPC_URL,
    DEFAULT_SECOND_CONTRACT, Deployer, ENV_PREFIX,
};

mod error;
pub use error::DeployError;

mod orchestrator;
pub use orchestrator::{DeployedPair, DeploymentPlan, Submission, deploy_two};

mod record;
pub use record::{DEPLOYMENTS_KEY, write_deployments};

mod traits;
pub use traits::{ConfirmationWaiter, ContractDeployer};

pub use services::{RpcConfirmer, RpcDeployer};
