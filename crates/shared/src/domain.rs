use std::{fmt, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(TokenId);
id_newtype!(BlockNumber);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid address '{0}': expected 0x followed by 40 hex digits")]
    InvalidAddress(String),
    #[error("invalid transaction hash '{0}': expected 0x followed by 64 hex digits")]
    InvalidTxHash(String),
    #[error("collection fragment is not valid base64: {0}")]
    InvalidFragmentEncoding(String),
    #[error("collection fragment is not valid utf-8")]
    InvalidFragmentText,
}

fn parse_prefixed_hex(raw: &str, digits: usize) -> Option<String> {
    let trimmed = raw.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))?;
    if hex.len() != digits || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("0x{}", hex.to_ascii_lowercase()))
}

/// Account or contract address, stored lower-cased with its `0x` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_prefixed_hex(raw, 40)
            .map(Self)
            .ok_or_else(|| DomainError::InvalidAddress(raw.to_string()))
    }
}

impl TryFrom<String> for Address {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash(String);

impl TxHash {
    /// Hash built from a 256-bit value given as four big-endian words.
    pub fn from_words(words: [u64; 4]) -> Self {
        Self(format!(
            "0x{:016x}{:016x}{:016x}{:016x}",
            words[0], words[1], words[2], words[3]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TxHash {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_prefixed_hex(raw, 64)
            .map(Self)
            .ok_or_else(|| DomainError::InvalidTxHash(raw.to_string()))
    }
}

impl TryFrom<String> for TxHash {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TxHash> for String {
    fn from(value: TxHash) -> Self {
        value.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Network identifier as reported by the wallet (`net_version`), e.g. `"4"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub String);

impl NetworkId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token content as handed out by the contract: base64 text wrapping an
/// HTML/SVG fragment. Kept opaque; only decoded for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionFragment(pub String);

impl CollectionFragment {
    pub fn from_html(html: &str) -> Self {
        Self(STANDARD.encode(html.as_bytes()))
    }

    pub fn decode_html(&self) -> Result<String, DomainError> {
        let bytes = STANDARD
            .decode(self.0.trim())
            .map_err(|err| DomainError::InvalidFragmentEncoding(err.to_string()))?;
        String::from_utf8(bytes).map_err(|_| DomainError::InvalidFragmentText)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Transient, non-blocking message.
    Toast,
    /// Blocking message the user has to dismiss.
    Alert,
}
