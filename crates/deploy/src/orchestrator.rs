//! Two-contract deployment pipeline.
//!
//! The pipeline is fixed: deploy the first contract, wait for it, build the second
//! contract's spec from the first's confirmed address, deploy the second, wait for
//! it. The only value carried from one step to the next is the first
//! [`DeployedContract`]. No addresses are held in shared state.

use alloy_core::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{
    ConfirmationWaiter, ContractDeployer, ContractSpec, ContractTemplate, DeployError,
    DeployedContract,
};

/// How the two deployment transactions are submitted.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Submission {
    /// Second contract is submitted only after the first is confirmed.
    #[default]
    Sequential,
    /// Both contracts are submitted up front and confirmed together.
    /// Only valid when the second contract does not take the first's address.
    Concurrent,
}

/// Both confirmed deployments of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedPair {
    pub first: DeployedContract,
    pub second: DeployedContract,
}

impl DeployedPair {
    pub fn contracts(&self) -> [&DeployedContract; 2] {
        [&self.first, &self.second]
    }
}

/// Broadcast `spec` and wait for it to be mined.
async fn deploy_and_confirm<D, W>(
    deployer: &D,
    waiter: &W,
    spec: &ContractSpec,
) -> Result<DeployedContract, DeployError>
where
    D: ContractDeployer,
    W: ConfirmationWaiter,
{
    tracing::info!(contract = %spec.name, args = spec.args.len(), "Submitting deployment...");
    let handle = deployer.deploy(spec).await?;

    tracing::info!(contract = %spec.name, tx_hash = %handle.tx_hash, "Waiting for confirmation...");
    let deployed = waiter.confirm(handle).await?;

    tracing::info!(
        contract = %deployed.name,
        address = %deployed.address,
        block = deployed.block_number,
        "Contract deployed"
    );

    Ok(deployed)
}

/// Deploy `first`, then the contract `second` builds from the first's confirmed address.
///
/// `second` is only called once the first deployment is confirmed, so it never sees
/// a pending or placeholder address. The first error aborts the run: if the first
/// contract fails, nothing is submitted for the second.
pub async fn deploy_two<D, W, F>(
    deployer: &D,
    waiter: &W,
    first: ContractSpec,
    second: F,
) -> Result<DeployedPair, DeployError>
where
    D: ContractDeployer,
    W: ConfirmationWaiter,
    F: FnOnce(Address) -> ContractSpec,
{
    let first = deploy_and_confirm(deployer, waiter, &first).await?;

    let second_spec = second(first.address);
    let second = deploy_and_confirm(deployer, waiter, &second_spec).await?;

    Ok(DeployedPair { first, second })
}

/// A validated pair of deployments.
///
/// Whether the second contract depends on the first is read from its template.
/// Asking for concurrent submission of a dependent pair is rejected here, when the
/// plan is built, rather than partway through a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPlan {
    first: ContractSpec,
    second: ContractTemplate,
    submission: Submission,
}

impl DeploymentPlan {
    pub fn new(
        first: ContractSpec,
        second: ContractTemplate,
        submission: Submission,
    ) -> Result<Self, DeployError> {
        if first.name == second.name {
            return Err(DeployError::Config(format!(
                "both contracts are named {}; results and artifacts are keyed by name",
                first.name
            )));
        }

        if submission == Submission::Concurrent && second.depends_on_first() {
            return Err(DeployError::Config(format!(
                "{} takes the address of {} as a constructor argument and cannot be submitted concurrently with it",
                second.name, first.name
            )));
        }

        Ok(Self {
            first,
            second,
            submission,
        })
    }

    pub fn first(&self) -> &ContractSpec {
        &self.first
    }

    pub fn second(&self) -> &ContractTemplate {
        &self.second
    }

    pub fn submission(&self) -> Submission {
        self.submission
    }

    /// Run the plan against the given collaborators.
    pub async fn execute<D, W>(self, deployer: &D, waiter: &W) -> Result<DeployedPair, DeployError>
    where
        D: ContractDeployer,
        W: ConfirmationWaiter,
    {
        tracing::info!(
            first = %self.first.name,
            second = %self.second.name,
            submission = %self.submission,
            "Starting deployment..."
        );

        match self.submission {
            Submission::Sequential => {
                let template = self.second;
                deploy_two(deployer, waiter, self.first, |address| {
                    template.resolve(address)
                })
                .await
            }
            Submission::Concurrent => {
                let second = self.second.standalone().ok_or_else(|| {
                    DeployError::Config(format!(
                        "{} depends on {} and cannot be submitted concurrently",
                        self.second.name, self.first.name
                    ))
                })?;

                let (first_handle, second_handle) =
                    futures::try_join!(deployer.deploy(&self.first), deployer.deploy(&second))?;

                tracing::info!(
                    first_tx = %first_handle.tx_hash,
                    second_tx = %second_handle.tx_hash,
                    "Waiting for both confirmations..."
                );

                let (first, second) =
                    futures::try_join!(waiter.confirm(first_handle), waiter.confirm(second_handle))?;

                for deployed in [&first, &second] {
                    tracing::info!(
                        contract = %deployed.name,
                        address = %deployed.address,
                        block = deployed.block_number,
                        "Contract deployed"
                    );
                }

                Ok(DeployedPair { first, second })
            }
        }
    }
}
