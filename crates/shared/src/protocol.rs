use serde::{Deserialize, Serialize};

use crate::domain::{Address, BlockNumber, CollectionFragment, NetworkId, TokenId, TxHash};

/// Notifications pushed by the wallet outside of any request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum WalletNotification {
    AccountsChanged { accounts: Vec<Address> },
    ChainChanged { network_id: NetworkId },
}

/// Account authorized to sign for the active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub hash: TxHash,
    pub block_number: BlockNumber,
}

/// Payload of the contract's "new NFT minted" event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintedEvent {
    pub minter: Address,
    pub token_id: TokenId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<CollectionFragment>>,
}
