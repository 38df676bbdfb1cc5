use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use shared::{
    abi::{AbiDescriptor, AbiEntry, AbiEntryKind, AbiParam},
    domain::{Address, NetworkId, TokenId, TxHash},
};
use url::Url;

use crate::error::ClientError;

pub const DEFAULT_SETTINGS_FILE: &str = "minter.toml";

/// Names of the contract members the client relies on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContractMethods {
    pub total_minted: String,
    pub mint: String,
    pub collections: String,
    pub balance: String,
    pub minted_event: String,
}

impl Default for ContractMethods {
    fn default() -> Self {
        Self {
            total_minted: "getNumberOfNFTMinted".into(),
            mint: "makeAnEpicNFT".into(),
            collections: "getCollectionsOf".into(),
            balance: "balanceOf".into(),
            minted_event: "NewEpicNFTMinted".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub contract_address: String,
    pub expected_network_id: String,
    pub total_mint_cap: u64,
    pub explorer_tx_url: String,
    pub marketplace_url: String,
    pub abi_path: Option<PathBuf>,
    /// Counter refresh period; 0 turns polling off.
    pub poll_interval_secs: u64,
    pub methods: ContractMethods,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            contract_address: "0x8A8Bb906Cf69d2CFD015311a916e5721b4bC1848".into(),
            expected_network_id: "4".into(),
            total_mint_cap: 50,
            explorer_tx_url: "https://rinkeby.etherscan.io/tx/".into(),
            marketplace_url: "https://testnets.opensea.io/assets".into(),
            abi_path: None,
            poll_interval_secs: 0,
            methods: ContractMethods::default(),
        }
    }
}

/// Defaults, then the settings file when present, then `APP__*` variables.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str::<Settings>(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Settings::default(),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("APP__CONTRACT_ADDRESS") {
        settings.contract_address = v;
    }
    if let Some(v) = lookup("APP__EXPECTED_NETWORK_ID") {
        settings.expected_network_id = v;
    }
    if let Some(v) = lookup("APP__TOTAL_MINT_CAP") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.total_mint_cap = parsed;
        }
    }
    if let Some(v) = lookup("APP__EXPLORER_TX_URL") {
        settings.explorer_tx_url = v;
    }
    if let Some(v) = lookup("APP__MARKETPLACE_URL") {
        settings.marketplace_url = v;
    }
    if let Some(v) = lookup("APP__ABI_PATH") {
        settings.abi_path = Some(PathBuf::from(v));
    }
    if let Some(v) = lookup("APP__POLL_INTERVAL_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.poll_interval_secs = parsed;
        }
    }
}

/// Settings checked and turned into the values the client runs on.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub contract_address: Address,
    pub expected_network: NetworkId,
    pub total_cap: u64,
    pub explorer_tx_url: Url,
    pub marketplace_url: Url,
    pub abi: Arc<AbiDescriptor>,
    pub methods: ContractMethods,
    pub poll_interval: Option<Duration>,
}

impl ClientConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        let contract_address = settings
            .contract_address
            .parse::<Address>()
            .map_err(|err| ClientError::Config(err.to_string()))?;

        let abi = match &settings.abi_path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|err| {
                    ClientError::Config(format!(
                        "failed to read ABI artifact '{}': {err}",
                        path.display()
                    ))
                })?;
                AbiDescriptor::from_artifact_json(&raw)
                    .map_err(|err| ClientError::Config(err.to_string()))?
            }
            None => default_abi(&settings.methods),
        };
        let methods = &settings.methods;
        abi.require(
            &[methods.total_minted.as_str(), methods.mint.as_str()],
            &[methods.minted_event.as_str()],
        )
        .map_err(|err| ClientError::Config(err.to_string()))?;

        Ok(Self {
            contract_address,
            expected_network: NetworkId::new(settings.expected_network_id.trim()),
            total_cap: settings.total_mint_cap,
            explorer_tx_url: parse_base_url(&settings.explorer_tx_url)?,
            marketplace_url: parse_base_url(&settings.marketplace_url)?,
            abi: Arc::new(abi),
            methods: settings.methods.clone(),
            poll_interval: (settings.poll_interval_secs > 0)
                .then(|| Duration::from_secs(settings.poll_interval_secs)),
        })
    }

    pub fn tx_link(&self, hash: &TxHash) -> Option<Url> {
        self.explorer_tx_url.join(hash.as_str()).ok()
    }

    pub fn token_link(&self, token_id: TokenId) -> Option<Url> {
        self.marketplace_url
            .join(&format!("{}/{}", self.contract_address, token_id))
            .ok()
    }
}

/// Base URLs get a trailing slash so that joining appends instead of replacing.
fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let raw = raw.trim();
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash)
        .map_err(|err| ClientError::Config(format!("invalid url '{raw}': {err}")))
}

fn param(name: &str, ty: &str) -> AbiParam {
    AbiParam {
        name: name.into(),
        ty: ty.into(),
        indexed: false,
    }
}

fn function(
    name: &str,
    inputs: Vec<AbiParam>,
    outputs: Vec<AbiParam>,
    mutability: &str,
) -> AbiEntry {
    AbiEntry {
        kind: AbiEntryKind::Function,
        name: Some(name.into()),
        inputs,
        outputs,
        state_mutability: Some(mutability.into()),
    }
}

/// Interface assumed when no artifact is configured.
pub fn default_abi(methods: &ContractMethods) -> AbiDescriptor {
    AbiDescriptor::new(vec![
        function(
            &methods.total_minted,
            Vec::new(),
            vec![param("", "uint256")],
            "view",
        ),
        function(&methods.mint, Vec::new(), Vec::new(), "nonpayable"),
        function(
            &methods.collections,
            vec![param("owner", "address")],
            vec![param("", "string[]")],
            "view",
        ),
        function(
            &methods.balance,
            vec![param("owner", "address")],
            vec![param("", "uint256")],
            "view",
        ),
        AbiEntry {
            kind: AbiEntryKind::Event,
            name: Some(methods.minted_event.clone()),
            inputs: vec![param("sender", "address"), param("tokenId", "uint256")],
            outputs: Vec::new(),
            state_mutability: None,
        },
    ])
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
