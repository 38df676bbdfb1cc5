use std::sync::Arc;

use shared::{abi::AbiDescriptor, domain::Address};
use tracing::{debug, warn};
use wallet_integration::{ContractBinding, ContractSession, WalletProvider};

use crate::error::ClientError;

/// Builds contract handles for the fixed contract address. A handle is bound
/// to whichever signer the wallet reports at call time, so nothing is cached.
pub struct ContractGateway {
    provider: Option<Arc<dyn WalletProvider>>,
    address: Address,
    abi: Arc<AbiDescriptor>,
}

impl ContractGateway {
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        address: Address,
        abi: Arc<AbiDescriptor>,
    ) -> Self {
        Self {
            provider,
            address,
            abi,
        }
    }

    pub fn provider(&self) -> Option<&Arc<dyn WalletProvider>> {
        self.provider.as_ref()
    }

    pub fn require_provider(&self) -> Result<&Arc<dyn WalletProvider>, ClientError> {
        self.provider.as_ref().ok_or_else(|| {
            warn!("gateway: wallet provider missing; install a browser wallet");
            ClientError::WalletUnavailable
        })
    }

    pub async fn contract(&self) -> Result<Arc<dyn ContractSession>, ClientError> {
        let provider = self.require_provider()?;
        let signer = provider.signer().await?;
        debug!(
            "gateway: binding contract={} signer={}",
            self.address, signer.address
        );
        let contract = provider
            .bind_contract(ContractBinding {
                address: self.address.clone(),
                abi: Arc::clone(&self.abi),
                signer,
            })
            .await?;
        Ok(contract)
    }
}
