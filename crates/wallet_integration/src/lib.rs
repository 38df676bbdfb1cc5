use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    abi::AbiDescriptor,
    domain::{Address, CollectionFragment, NetworkId, TxHash},
    error::{ProviderError, ProviderErrorCode},
    protocol::{MintedEvent, Signer, TxReceipt, WalletNotification},
};
use tokio::sync::{broadcast, oneshot};

pub mod simulated;

pub use simulated::{SimulatedWallet, SimulatedWalletConfig};

/// Everything needed to address one contract on behalf of one signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractBinding {
    pub address: Address,
    pub abi: Arc<AbiDescriptor>,
    pub signer: Signer,
}

/// A submitted transaction whose confirmation has not been observed yet.
#[derive(Debug)]
pub struct PendingTransaction {
    hash: TxHash,
    confirmation: oneshot::Receiver<Result<TxReceipt, ProviderError>>,
}

impl PendingTransaction {
    pub fn new(
        hash: TxHash,
        confirmation: oneshot::Receiver<Result<TxReceipt, ProviderError>>,
    ) -> Self {
        Self { hash, confirmation }
    }

    pub fn hash(&self) -> &TxHash {
        &self.hash
    }

    /// Waits for the transaction to be mined. There is no timeout.
    pub async fn wait(self) -> Result<TxReceipt, ProviderError> {
        match self.confirmation.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProviderError::new(
                ProviderErrorCode::Disconnected,
                format!("confirmation for {} was dropped by the provider", self.hash),
            )),
        }
    }
}

#[async_trait]
pub trait ContractSession: Send + Sync {
    fn binding(&self) -> &ContractBinding;
    async fn total_minted(&self) -> Result<u64, ProviderError>;
    async fn collections_of(&self, owner: &Address)
        -> Result<Vec<CollectionFragment>, ProviderError>;
    async fn balance_of(&self, owner: &Address) -> Result<u64, ProviderError>;
    async fn mint(&self) -> Result<PendingTransaction, ProviderError>;
    fn subscribe_minted(&self) -> broadcast::Receiver<MintedEvent>;
}

/// The injected wallet object. Every interaction with accounts, the network
/// and contracts goes through it.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Accounts already authorized for this application; never prompts.
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;
    /// Prompts the user to authorize accounts.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;
    async fn network_id(&self) -> Result<NetworkId, ProviderError>;
    async fn signer(&self) -> Result<Signer, ProviderError>;
    async fn bind_contract(
        &self,
        binding: ContractBinding,
    ) -> Result<Arc<dyn ContractSession>, ProviderError>;
    fn subscribe_notifications(&self) -> broadcast::Receiver<WalletNotification>;
}
