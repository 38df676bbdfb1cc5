//! Minimal ABI descriptor read from a compiled contract artifact.
//!
//! Only the shape of the interface is kept (names, parameter types,
//! mutability). Encoding calls is the wallet's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AbiError {
    #[error("failed to parse ABI artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("ABI does not declare function '{0}'")]
    MissingFunction(String),
    #[error("ABI does not declare event '{0}'")]
    MissingEvent(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbiEntryKind {
    Function,
    Event,
    Constructor,
    Fallback,
    Receive,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub indexed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiEntry {
    #[serde(rename = "type")]
    pub kind: AbiEntryKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default)]
    pub outputs: Vec<AbiParam>,
    #[serde(default)]
    pub state_mutability: Option<String>,
}

impl AbiEntry {
    /// Canonical signature, e.g. `NewEpicNFTMinted(address,uint256)`.
    pub fn signature(&self) -> String {
        let params = self
            .inputs
            .iter()
            .map(|param| param.ty.as_str())
            .collect::<Vec<_>>()
            .join(",");
        format!("{}({params})", self.name.as_deref().unwrap_or_default())
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self.state_mutability.as_deref(), Some("view" | "pure"))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawArtifact {
    Artifact { abi: Vec<AbiEntry> },
    Bare(Vec<AbiEntry>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbiDescriptor {
    entries: Vec<AbiEntry>,
}

impl AbiDescriptor {
    pub fn new(entries: Vec<AbiEntry>) -> Self {
        Self { entries }
    }

    /// Accepts either a compiler artifact (`{"abi": [...], ...}`) or a bare ABI array.
    pub fn from_artifact_json(raw: &str) -> Result<Self, AbiError> {
        let entries = match serde_json::from_str::<RawArtifact>(raw)? {
            RawArtifact::Artifact { abi } => abi,
            RawArtifact::Bare(entries) => entries,
        };
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[AbiEntry] {
        &self.entries
    }

    fn find(&self, kind: AbiEntryKind, name: &str) -> Option<&AbiEntry> {
        self.entries
            .iter()
            .find(|entry| entry.kind == kind && entry.name.as_deref() == Some(name))
    }

    pub fn function(&self, name: &str) -> Option<&AbiEntry> {
        self.find(AbiEntryKind::Function, name)
    }

    pub fn event(&self, name: &str) -> Option<&AbiEntry> {
        self.find(AbiEntryKind::Event, name)
    }

    pub fn require(&self, functions: &[&str], events: &[&str]) -> Result<(), AbiError> {
        if let Some(missing) = functions.iter().find(|name| self.function(name).is_none()) {
            return Err(AbiError::MissingFunction((*missing).to_string()));
        }
        if let Some(missing) = events.iter().find(|name| self.event(name).is_none()) {
            return Err(AbiError::MissingEvent((*missing).to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTIFACT: &str = r#"{
        "_format": "hh-sol-artifact-1",
        "contractName": "MyEpicNFT",
        "abi": [
            {"inputs": [], "stateMutability": "nonpayable", "type": "constructor"},
            {
                "anonymous": false,
                "inputs": [
                    {"indexed": false, "internalType": "address", "name": "sender", "type": "address"},
                    {"indexed": false, "internalType": "uint256", "name": "tokenId", "type": "uint256"}
                ],
                "name": "NewEpicNFTMinted",
                "type": "event"
            },
            {
                "inputs": [],
                "name": "getNumberOfNFTMinted",
                "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
                "stateMutability": "view",
                "type": "function"
            },
            {"inputs": [], "name": "makeAnEpicNFT", "outputs": [], "stateMutability": "nonpayable", "type": "function"}
        ]
    }"#;

    #[test]
    fn parses_compiler_artifact() {
        let abi = AbiDescriptor::from_artifact_json(ARTIFACT).expect("artifact");
        assert_eq!(abi.entries().len(), 4);
        let counter = abi.function("getNumberOfNFTMinted").expect("counter");
        assert!(counter.is_read_only());
        assert!(!abi.function("makeAnEpicNFT").expect("mint").is_read_only());
        assert_eq!(
            abi.event("NewEpicNFTMinted").expect("event").signature(),
            "NewEpicNFTMinted(address,uint256)"
        );
    }

    #[test]
    fn parses_bare_abi_array() {
        let abi = AbiDescriptor::from_artifact_json(
            r#"[{"type": "function", "name": "makeAnEpicNFT", "inputs": []}]"#,
        )
        .expect("bare");
        assert!(abi.function("makeAnEpicNFT").is_some());
    }

    #[test]
    fn require_reports_first_missing_item() {
        let abi = AbiDescriptor::from_artifact_json(ARTIFACT).expect("artifact");
        abi.require(&["getNumberOfNFTMinted", "makeAnEpicNFT"], &["NewEpicNFTMinted"])
            .expect("complete abi");

        let err = abi
            .require(&["getTotalNFTsMintedSoFar"], &[])
            .expect_err("missing function");
        assert!(matches!(err, AbiError::MissingFunction(name) if name == "getTotalNFTsMintedSoFar"));

        let err = abi
            .require(&[], &["Transfer"])
            .expect_err("missing event");
        assert!(matches!(err, AbiError::MissingEvent(name) if name == "Transfer"));
    }
}
