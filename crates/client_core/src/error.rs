use shared::{domain::NetworkId, error::ProviderError};
use thiserror::Error;

/// Every way a user-triggered action can end without success. All of them
/// are terminal for that action; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("no wallet provider is available")]
    WalletUnavailable,
    #[error("wallet is on network {actual}, expected {expected}")]
    WrongNetwork {
        expected: NetworkId,
        actual: NetworkId,
    },
    #[error("request was rejected in the wallet")]
    UserRejected,
    #[error("no wallet account is connected")]
    NotConnected,
    #[error("a mint transaction is already in flight")]
    MintInProgress,
    #[error("contract call failed: {0}")]
    ContractCall(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        if err.is_user_rejection() {
            Self::UserRejected
        } else {
            Self::ContractCall(err.to_string())
        }
    }
}
