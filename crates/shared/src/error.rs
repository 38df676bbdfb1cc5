use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Provider error codes, following the numeric codes injected wallets report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorCode {
    UserRejected,
    Unauthorized,
    UnsupportedMethod,
    Disconnected,
    ChainDisconnected,
    /// Transaction was mined but the contract reverted it.
    Reverted,
    Internal,
}

impl ProviderErrorCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            4001 => Self::UserRejected,
            4100 => Self::Unauthorized,
            4200 => Self::UnsupportedMethod,
            4900 => Self::Disconnected,
            4901 => Self::ChainDisconnected,
            3 => Self::Reverted,
            _ => Self::Internal,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::UserRejected => 4001,
            Self::Unauthorized => 4100,
            Self::UnsupportedMethod => 4200,
            Self::Disconnected => 4900,
            Self::ChainDisconnected => 4901,
            Self::Reverted => 3,
            Self::Internal => -32603,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code:?} ({}): {message}", .code.code())]
pub struct ProviderError {
    pub code: ProviderErrorCode,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(ProviderErrorCode::UserRejected, "user rejected the request")
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == ProviderErrorCode::UserRejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_codes_map_both_ways() {
        for code in [
            ProviderErrorCode::UserRejected,
            ProviderErrorCode::Unauthorized,
            ProviderErrorCode::UnsupportedMethod,
            ProviderErrorCode::Disconnected,
            ProviderErrorCode::ChainDisconnected,
            ProviderErrorCode::Reverted,
            ProviderErrorCode::Internal,
        ] {
            assert_eq!(ProviderErrorCode::from_code(code.code()), code);
        }
        assert_eq!(ProviderErrorCode::from_code(-32000), ProviderErrorCode::Internal);
    }

    #[test]
    fn display_includes_numeric_code() {
        let err = ProviderError::user_rejected();
        assert_eq!(
            err.to_string(),
            "UserRejected (4001): user rejected the request"
        );
    }
}
