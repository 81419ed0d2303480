//! Values flowing through a deployment: what to deploy, what was broadcast, what landed.

use alloy_core::{
    dyn_abi::DynSolValue,
    primitives::{Address, Bytes, TxHash, U256},
};
use serde::{Deserialize, Serialize};

/// A single constructor argument.
///
/// In TOML these are written as one-key tables, e.g. `{ uint = "3600" }` or
/// `{ address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructorArg {
    Address(Address),
    Uint(U256),
    Bool(bool),
    String(String),
    Bytes(Bytes),
}

impl ConstructorArg {
    /// Whether this value can be passed for a parameter of the given Solidity type.
    pub fn fits(&self, sol_type: &str) -> bool {
        match self {
            Self::Address(_) => sol_type == "address",
            Self::Uint(value) => uint_bits(sol_type).is_some_and(|bits| value.bit_len() <= bits),
            Self::Bool(_) => sol_type == "bool",
            Self::String(_) => sol_type == "string",
            Self::Bytes(_) => sol_type == "bytes",
        }
    }

    fn to_sol_value(&self) -> DynSolValue {
        match self {
            Self::Address(address) => DynSolValue::Address(*address),
            Self::Uint(value) => DynSolValue::Uint(*value, 256),
            Self::Bool(value) => DynSolValue::Bool(*value),
            Self::String(value) => DynSolValue::String(value.clone()),
            Self::Bytes(value) => DynSolValue::Bytes(value.to_vec()),
        }
    }
}

impl From<Address> for ConstructorArg {
    fn from(address: Address) -> Self {
        Self::Address(address)
    }
}

/// Width of a scalar `uint<N>` type. `uint` is an alias for `uint256`; arrays and
/// other types yield `None`.
fn uint_bits(sol_type: &str) -> Option<usize> {
    let bits = match sol_type.strip_prefix("uint")? {
        "" => 256,
        width => width.parse::<usize>().ok()?,
    };
    (bits > 0 && bits <= 256 && bits % 8 == 0).then_some(bits)
}

/// ABI-encode constructor arguments, ready to be appended to creation bytecode.
pub fn encode_constructor_args(args: &[ConstructorArg]) -> Vec<u8> {
    if args.is_empty() {
        return Vec::new();
    }

    DynSolValue::Tuple(args.iter().map(ConstructorArg::to_sol_value).collect()).abi_encode_params()
}

/// A contract ready to be deployed: its artifact name and fully known arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSpec {
    pub name: String,
    #[serde(default)]
    pub args: Vec<ConstructorArg>,
}

impl ContractSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<ConstructorArg>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Marker written in place of an argument that is only known once the first
/// contract is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placeholder {
    FirstAddress,
}

/// An argument of the second contract: either a literal or the first contract's address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgTemplate {
    Placeholder(Placeholder),
    Value(ConstructorArg),
}

impl ArgTemplate {
    pub const FIRST_ADDRESS: Self = Self::Placeholder(Placeholder::FirstAddress);
}

impl From<ConstructorArg> for ArgTemplate {
    fn from(arg: ConstructorArg) -> Self {
        Self::Value(arg)
    }
}

/// A contract whose arguments may reference the first deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractTemplate {
    pub name: String,
    #[serde(default)]
    pub args: Vec<ArgTemplate>,
}

impl ContractTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<ArgTemplate>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a placeholder for the first contract's confirmed address.
    pub fn first_address(self) -> Self {
        self.arg(ArgTemplate::FIRST_ADDRESS)
    }

    pub fn depends_on_first(&self) -> bool {
        self.args
            .iter()
            .any(|arg| matches!(arg, ArgTemplate::Placeholder(_)))
    }

    /// Substitute the first contract's confirmed address into every placeholder.
    pub fn resolve(&self, first_address: Address) -> ContractSpec {
        ContractSpec {
            name: self.name.clone(),
            args: self
                .args
                .iter()
                .map(|arg| match arg {
                    ArgTemplate::Placeholder(Placeholder::FirstAddress) => {
                        ConstructorArg::Address(first_address)
                    }
                    ArgTemplate::Value(value) => value.clone(),
                })
                .collect(),
        }
    }

    /// The spec of a template with no placeholders, or `None` if it needs an address.
    pub fn standalone(&self) -> Option<ContractSpec> {
        self.args
            .iter()
            .map(|arg| match arg {
                ArgTemplate::Value(value) => Some(value.clone()),
                ArgTemplate::Placeholder(_) => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(|args| ContractSpec {
                name: self.name.clone(),
                args,
            })
    }
}

/// A deployment transaction that has been accepted by the node but not yet mined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentHandle {
    pub contract: String,
    pub tx_hash: TxHash,
}

/// A contract whose deployment has been confirmed on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContract {
    pub name: String,
    pub address: Address,
    pub block_number: u64,
}
