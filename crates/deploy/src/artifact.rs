//! Compiled contract artifacts.
//!
//! Compilation itself happens elsewhere. This module only reads the JSON artifact
//! a compiler left behind (Hardhat, or Foundry's `out/` directory through an
//! explicit artifact path) and turns it into creation data for a deployment
//! transaction.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use alloy_core::json_abi::JsonAbi;
use serde::Deserialize;

use crate::{
    DeployError,
    contract::{ConstructorArg, encode_constructor_args},
};

/// Default directory Hardhat writes artifacts to.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Subdirectory of the artifacts directory holding per-source artifacts.
const CONTRACTS_SUBDIR: &str = "contracts";

/// Marker left in bytecode by solc for library addresses that still need linking.
const UNLINKED_LIBRARY_MARKER: &str = "__";

/// The parts of a Hardhat artifact this tool needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    #[serde(default)]
    contract_name: Option<String>,
    abi: JsonAbi,
    bytecode: RawBytecode,
}

/// Hardhat writes the bytecode as a hex string, Foundry nests it under `object`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

impl RawBytecode {
    fn hex(&self) -> &str {
        match self {
            Self::Hex(hex) | Self::Object { object: hex } => hex,
        }
    }
}

/// A loaded contract artifact.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub abi: JsonAbi,
    pub bytecode: Vec<u8>,
}

impl Artifact {
    /// Parse a Hardhat-style artifact.
    pub fn from_json(name: &str, json: &str) -> Result<Self, DeployError> {
        let raw: RawArtifact = serde_json::from_str(json)
            .map_err(|e| DeployError::compilation(name, format!("invalid artifact JSON: {e}")))?;

        if let Some(artifact_name) = raw.contract_name.as_deref().filter(|n| *n != name) {
            tracing::warn!(
                contract = %name,
                artifact_name = %artifact_name,
                "Artifact contract name does not match the requested contract"
            );
        }

        let hex_code = raw.bytecode.hex().trim_start_matches("0x");
        if hex_code.is_empty() {
            return Err(DeployError::compilation(
                name,
                "artifact has no bytecode (abstract contract or interface?)",
            ));
        }
        if hex_code.contains(UNLINKED_LIBRARY_MARKER) {
            return Err(DeployError::compilation(
                name,
                "bytecode contains unlinked library references",
            ));
        }

        let bytecode = hex::decode(hex_code)
            .map_err(|e| DeployError::compilation(name, format!("invalid bytecode hex: {e}")))?;

        Ok(Self {
            name: name.to_string(),
            abi: raw.abi,
            bytecode,
        })
    }

    /// Solidity types of the constructor parameters, in order.
    pub fn constructor_types(&self) -> Vec<&str> {
        self.abi
            .constructor
            .as_ref()
            .map(|ctor| ctor.inputs.iter().map(|param| param.ty.as_str()).collect())
            .unwrap_or_default()
    }

    /// Bytecode followed by the ABI-encoded constructor arguments.
    ///
    /// Fails if the arguments do not match the constructor's declared parameters.
    pub fn creation_data(&self, args: &[ConstructorArg]) -> Result<Vec<u8>, DeployError> {
        let expected = self.constructor_types();
        if expected.len() != args.len() {
            return Err(DeployError::compilation(
                &self.name,
                format!(
                    "constructor takes {} argument(s), {} given",
                    expected.len(),
                    args.len()
                ),
            ));
        }

        if let Some((index, (arg, ty))) = args
            .iter()
            .zip(&expected)
            .enumerate()
            .find(|(_, (arg, ty))| !arg.fits(ty))
        {
            return Err(DeployError::compilation(
                &self.name,
                format!("constructor argument {index} has type {ty}, got {arg:?}"),
            ));
        }

        let mut data = self.bytecode.clone();
        data.extend(encode_constructor_args(args));
        Ok(data)
    }
}

/// Locates artifacts on disk.
///
/// By default, `<root>/contracts/<Name>.sol/<Name>.json`, the Hardhat layout.
/// Individual contracts can be pointed elsewhere.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    root: PathBuf,
    overrides: HashMap<String, PathBuf>,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            overrides: HashMap::new(),
        }
    }

    /// Use an explicit artifact file for `name`.
    pub fn with_override(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(name.into(), path.into());
        self
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.overrides.get(name).cloned().unwrap_or_else(|| {
            self.root
                .join(CONTRACTS_SUBDIR)
                .join(format!("{name}.sol"))
                .join(format!("{name}.json"))
        })
    }

    pub fn load(&self, name: &str) -> Result<Artifact, DeployError> {
        let path = self.path_for(name);
        let json = read_artifact(name, &path)?;
        tracing::debug!(contract = %name, path = %path.display(), "Loaded artifact");
        Artifact::from_json(name, &json)
    }
}

fn read_artifact(name: &str, path: &Path) -> Result<String, DeployError> {
    std::fs::read_to_string(path).map_err(|e| {
        DeployError::compilation(
            name,
            format!("failed to read artifact {}: {e}", path.display()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::{Address, U256};
    use tempdir::TempDir;

    const TIMELOCK_ARTIFACT: &str = r#"{
        "contractName": "TimelockTest",
        "abi": [
            {
                "type": "constructor",
                "inputs": [{ "name": "timelock", "type": "address", "internalType": "address" }],
                "stateMutability": "nonpayable"
            }
        ],
        "bytecode": "0x6080604052"
    }"#;

    #[test]
    fn test_creation_data_appends_encoded_args() {
        let artifact = Artifact::from_json("TimelockTest", TIMELOCK_ARTIFACT).unwrap();
        assert_eq!(artifact.constructor_types(), vec!["address"]);

        let address = Address::repeat_byte(0xaa);
        let data = artifact.creation_data(&[address.into()]).unwrap();

        assert_eq!(&data[..5], &[0x60, 0x80, 0x60, 0x40, 0x52]);
        assert_eq!(data.len(), 5 + 32);
        assert_eq!(&data[5 + 12..], address.as_slice());
    }

    #[test]
    fn test_wrong_arity_is_rejected() {
        let artifact = Artifact::from_json("TimelockTest", TIMELOCK_ARTIFACT).unwrap();
        let err = artifact.creation_data(&[]).unwrap_err();

        assert!(matches!(err, DeployError::Compilation { .. }));
        assert!(err.to_string().contains("1 argument(s), 0 given"));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let artifact = Artifact::from_json("TimelockTest", TIMELOCK_ARTIFACT).unwrap();
        let err = artifact
            .creation_data(&[ConstructorArg::Uint(U256::from(1))])
            .unwrap_err();

        assert!(matches!(err, DeployError::Compilation { .. }));
    }

    #[test]
    fn test_scalar_for_array_parameter_is_rejected() {
        let json = r#"{
            "abi": [{
                "type": "constructor",
                "inputs": [{ "name": "delays", "type": "uint256[]" }],
                "stateMutability": "nonpayable"
            }],
            "bytecode": "0x00"
        }"#;
        let artifact = Artifact::from_json("Schedule", json).unwrap();

        let err = artifact
            .creation_data(&[ConstructorArg::Uint(U256::from(5))])
            .unwrap_err();
        assert!(matches!(err, DeployError::Compilation { .. }));
        assert!(err.to_string().contains("uint256[]"));
    }

    #[test]
    fn test_foundry_bytecode_object_is_accepted() {
        let json = r#"{
            "abi": [],
            "bytecode": { "object": "0x6080", "sourceMap": "", "linkReferences": {} }
        }"#;
        let artifact = Artifact::from_json("Timelock", json).unwrap();
        assert_eq!(artifact.bytecode, vec![0x60, 0x80]);
    }

    #[test]
    fn test_empty_bytecode_is_rejected() {
        let json = r#"{ "contractName": "ITimelock", "abi": [], "bytecode": "0x" }"#;
        let err = Artifact::from_json("ITimelock", json).unwrap_err();
        assert!(err.to_string().contains("no bytecode"));
    }

    #[test]
    fn test_unlinked_bytecode_is_rejected() {
        let json = r#"{ "abi": [], "bytecode": "0x6080__$1234567890abcdef$__6040" }"#;
        let err = Artifact::from_json("Linked", json).unwrap_err();
        assert!(err.to_string().contains("unlinked"));
    }

    #[test]
    fn test_store_uses_hardhat_layout() {
        let tmp = TempDir::new("tldeploy-artifacts").unwrap();
        let dir = tmp.path().join("contracts/Timelock.sol");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("Timelock.json"),
            r#"{ "contractName": "Timelock", "abi": [], "bytecode": "0x00" }"#,
        )
        .unwrap();

        let store = ArtifactStore::new(tmp.path());
        let artifact = store.load("Timelock").unwrap();

        assert_eq!(artifact.bytecode, vec![0x00]);
        assert!(artifact.constructor_types().is_empty());
    }

    #[test]
    fn test_store_missing_artifact_is_compilation_error() {
        let tmp = TempDir::new("tldeploy-artifacts").unwrap();
        let store = ArtifactStore::new(tmp.path());

        let err = store.load("Timelock").unwrap_err();
        assert_eq!(err.contract(), Some("Timelock"));
        assert!(matches!(err, DeployError::Compilation { .. }));
    }

    #[test]
    fn test_store_override() {
        let store = ArtifactStore::new("artifacts").with_override("Timelock", "out/Timelock.json");
        assert_eq!(store.path_for("Timelock"), PathBuf::from("out/Timelock.json"));
        assert_eq!(
            store.path_for("TimelockTest"),
            PathBuf::from("artifacts/contracts/TimelockTest.sol/TimelockTest.json")
        );
    }
}
