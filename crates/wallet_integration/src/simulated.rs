//! In-memory wallet and contract used by the terminal front end and tests.
//!
//! Mints are accepted until the supply cap, confirmed on a spawned task and
//! announced on the contract's minted channel. Confirmations can be held
//! back to observe a transaction while it is still pending.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{
    domain::{Address, BlockNumber, CollectionFragment, NetworkId, TokenId, TxHash},
    error::{ProviderError, ProviderErrorCode},
    protocol::{MintedEvent, Signer, TxReceipt, WalletNotification},
};
use tokio::sync::{broadcast, oneshot, watch, Mutex};
use tracing::{debug, info};

use crate::{ContractBinding, ContractSession, PendingTransaction, WalletProvider};

#[derive(Debug, Clone)]
pub struct SimulatedWalletConfig {
    pub accounts: Vec<Address>,
    /// Whether `accounts` are already authorized when the wallet is injected.
    pub pre_authorized: bool,
    pub network_id: NetworkId,
    /// Every `request_accounts` prompt is declined.
    pub reject_requests: bool,
    pub supply_cap: u64,
    pub confirmation_delay: Duration,
    /// Minted events carry the minter's full collection list.
    pub events_carry_collections: bool,
}

impl Default for SimulatedWalletConfig {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            pre_authorized: false,
            network_id: NetworkId::new("4"),
            reject_requests: false,
            supply_cap: 50,
            confirmation_delay: Duration::ZERO,
            events_carry_collections: true,
        }
    }
}

struct ChainState {
    accounts: Vec<Address>,
    authorized: bool,
    network_id: NetworkId,
    reject_requests: bool,
    supply_cap: u64,
    minted: u64,
    collections: HashMap<Address, Vec<CollectionFragment>>,
    submit_failure: Option<ProviderError>,
    revert_confirmations: bool,
    next_tx: u64,
    next_block: u64,
    mint_submissions: u64,
    contract_bindings: u64,
}

impl ChainState {
    fn authorized_accounts(&self) -> Vec<Address> {
        if self.authorized {
            self.accounts.clone()
        } else {
            Vec::new()
        }
    }
}

struct SimulatedChain {
    state: Mutex<ChainState>,
    notifications: broadcast::Sender<WalletNotification>,
    minted: broadcast::Sender<MintedEvent>,
    confirmations_open: watch::Sender<bool>,
    confirmation_delay: Duration,
    events_carry_collections: bool,
}

impl SimulatedChain {
    async fn confirm_mint(
        self: Arc<Self>,
        minter: Address,
        hash: TxHash,
        reply: oneshot::Sender<Result<TxReceipt, ProviderError>>,
    ) {
        let mut open = self.confirmations_open.subscribe();
        let opened = open.wait_for(|open| *open).await.is_ok();
        if !opened {
            return;
        }
        if !self.confirmation_delay.is_zero() {
            tokio::time::sleep(self.confirmation_delay).await;
        }

        let (outcome, event) = {
            let mut state = self.state.lock().await;
            if state.revert_confirmations || state.minted >= state.supply_cap {
                let err = ProviderError::new(
                    ProviderErrorCode::Reverted,
                    format!("transaction {hash} reverted"),
                );
                (Err(err), None)
            } else {
                let token_id = TokenId(state.minted);
                state.minted += 1;
                state.next_block += 1;
                let block_number = BlockNumber(state.next_block);
                let owned = state.collections.entry(minter.clone()).or_default();
                owned.push(placeholder_fragment(token_id));
                let collections = self.events_carry_collections.then(|| owned.clone());
                let receipt = TxReceipt {
                    hash: hash.clone(),
                    block_number,
                };
                let event = MintedEvent {
                    minter: minter.clone(),
                    token_id,
                    collections,
                };
                (Ok(receipt), Some(event))
            }
        };

        debug!(
            "simulated: confirmation tx={} ok={} minter={}",
            hash,
            outcome.is_ok(),
            minter
        );
        let _ = reply.send(outcome);
        if let Some(event) = event {
            let _ = self.minted.send(event);
        }
    }
}

fn placeholder_fragment(token_id: TokenId) -> CollectionFragment {
    CollectionFragment::from_html(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\"><text>token #{token_id}</text></svg>"
    ))
}

fn tx_hash(sequence: u64) -> TxHash {
    TxHash::from_words([0, 0, 0, sequence])
}

#[derive(Clone)]
pub struct SimulatedWallet {
    chain: Arc<SimulatedChain>,
}

impl SimulatedWallet {
    pub fn new(config: SimulatedWalletConfig) -> Self {
        let (notifications, _) = broadcast::channel(64);
        let (minted, _) = broadcast::channel(256);
        let (confirmations_open, _) = watch::channel(true);
        Self {
            chain: Arc::new(SimulatedChain {
                state: Mutex::new(ChainState {
                    accounts: config.accounts,
                    authorized: config.pre_authorized,
                    network_id: config.network_id,
                    reject_requests: config.reject_requests,
                    supply_cap: config.supply_cap,
                    minted: 0,
                    collections: HashMap::new(),
                    submit_failure: None,
                    revert_confirmations: false,
                    next_tx: 0,
                    next_block: 0,
                    mint_submissions: 0,
                    contract_bindings: 0,
                }),
                notifications,
                minted,
                confirmations_open,
                confirmation_delay: config.confirmation_delay,
                events_carry_collections: config.events_carry_collections,
            }),
        }
    }

    /// Switches the wallet's accounts as a user would in the extension.
    pub async fn set_accounts(&self, accounts: Vec<Address>) {
        let visible = {
            let mut state = self.chain.state.lock().await;
            state.accounts = accounts;
            state.authorized_accounts()
        };
        let _ = self
            .chain
            .notifications
            .send(WalletNotification::AccountsChanged { accounts: visible });
    }

    /// Revokes the application's authorization.
    pub async fn disconnect(&self) {
        self.chain.state.lock().await.authorized = false;
        let _ = self
            .chain
            .notifications
            .send(WalletNotification::AccountsChanged {
                accounts: Vec::new(),
            });
    }

    pub async fn switch_network(&self, network_id: NetworkId) {
        self.chain.state.lock().await.network_id = network_id.clone();
        let _ = self
            .chain
            .notifications
            .send(WalletNotification::ChainChanged { network_id });
    }

    pub async fn set_reject_requests(&self, reject: bool) {
        self.chain.state.lock().await.reject_requests = reject;
    }

    /// Makes every following mint submission fail before a transaction exists.
    pub async fn fail_submissions_with(&self, err: Option<ProviderError>) {
        self.chain.state.lock().await.submit_failure = err;
    }

    pub async fn revert_confirmations(&self, revert: bool) {
        self.chain.state.lock().await.revert_confirmations = revert;
    }

    pub fn hold_confirmations(&self) {
        self.chain.confirmations_open.send_replace(false);
    }

    pub fn release_confirmations(&self) {
        self.chain.confirmations_open.send_replace(true);
    }

    /// Emits a minted event as if another party had minted.
    pub fn announce_mint(&self, event: MintedEvent) {
        let _ = self.chain.minted.send(event);
    }

    pub async fn total_minted(&self) -> u64 {
        self.chain.state.lock().await.minted
    }

    pub async fn mint_submissions(&self) -> u64 {
        self.chain.state.lock().await.mint_submissions
    }

    pub async fn contract_bindings(&self) -> u64 {
        self.chain.state.lock().await.contract_bindings
    }

    /// Number of live subscriptions to the minted event.
    pub fn minted_listeners(&self) -> usize {
        self.chain.minted.receiver_count()
    }
}

#[async_trait]
impl WalletProvider for SimulatedWallet {
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(self.chain.state.lock().await.authorized_accounts())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let mut state = self.chain.state.lock().await;
        if state.reject_requests {
            return Err(ProviderError::user_rejected());
        }
        state.authorized = true;
        Ok(state.accounts.clone())
    }

    async fn network_id(&self) -> Result<NetworkId, ProviderError> {
        Ok(self.chain.state.lock().await.network_id.clone())
    }

    async fn signer(&self) -> Result<Signer, ProviderError> {
        let state = self.chain.state.lock().await;
        state
            .authorized_accounts()
            .into_iter()
            .next()
            .map(|address| Signer { address })
            .ok_or_else(|| {
                ProviderError::new(
                    ProviderErrorCode::Unauthorized,
                    "no account has been authorized",
                )
            })
    }

    async fn bind_contract(
        &self,
        binding: ContractBinding,
    ) -> Result<Arc<dyn ContractSession>, ProviderError> {
        self.chain.state.lock().await.contract_bindings += 1;
        Ok(Arc::new(SimulatedContract {
            binding,
            chain: Arc::clone(&self.chain),
        }))
    }

    fn subscribe_notifications(&self) -> broadcast::Receiver<WalletNotification> {
        self.chain.notifications.subscribe()
    }
}

struct SimulatedContract {
    binding: ContractBinding,
    chain: Arc<SimulatedChain>,
}

#[async_trait]
impl ContractSession for SimulatedContract {
    fn binding(&self) -> &ContractBinding {
        &self.binding
    }

    async fn total_minted(&self) -> Result<u64, ProviderError> {
        Ok(self.chain.state.lock().await.minted)
    }

    async fn collections_of(
        &self,
        owner: &Address,
    ) -> Result<Vec<CollectionFragment>, ProviderError> {
        let state = self.chain.state.lock().await;
        Ok(state.collections.get(owner).cloned().unwrap_or_default())
    }

    async fn balance_of(&self, owner: &Address) -> Result<u64, ProviderError> {
        let state = self.chain.state.lock().await;
        Ok(state.collections.get(owner).map_or(0, |owned| owned.len() as u64))
    }

    async fn mint(&self) -> Result<PendingTransaction, ProviderError> {
        let minter = self.binding.signer.address.clone();
        let hash = {
            let mut state = self.chain.state.lock().await;
            if let Some(err) = state.submit_failure.clone() {
                return Err(err);
            }
            if !state.authorized || !state.accounts.contains(&minter) {
                return Err(ProviderError::new(
                    ProviderErrorCode::Unauthorized,
                    format!("signer {minter} is not authorized"),
                ));
            }
            if state.minted >= state.supply_cap {
                return Err(ProviderError::new(
                    ProviderErrorCode::Reverted,
                    "execution reverted: supply exhausted",
                ));
            }
            state.mint_submissions += 1;
            state.next_tx += 1;
            tx_hash(state.next_tx)
        };

        info!("simulated: mint submitted tx={} minter={}", hash, minter);
        let (reply, confirmation) = oneshot::channel();
        tokio::spawn(Arc::clone(&self.chain).confirm_mint(minter, hash.clone(), reply));
        Ok(PendingTransaction::new(hash, confirmation))
    }

    fn subscribe_minted(&self) -> broadcast::Receiver<MintedEvent> {
        self.chain.minted.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::abi::AbiDescriptor;

    fn alice() -> Address {
        "0x00000000000000000000000000000000000000a1"
            .parse()
            .expect("address")
    }

    async fn bound(wallet: &SimulatedWallet) -> Arc<dyn ContractSession> {
        let signer = wallet.signer().await.expect("signer");
        wallet
            .bind_contract(ContractBinding {
                address: "0x8a8bb906cf69d2cfd015311a916e5721b4bc1848"
                    .parse()
                    .expect("contract"),
                abi: Arc::new(AbiDescriptor::default()),
                signer,
            })
            .await
            .expect("bind")
    }

    #[tokio::test]
    async fn request_accounts_authorizes_and_rejection_does_not() {
        let wallet = SimulatedWallet::new(SimulatedWalletConfig {
            accounts: vec![alice()],
            reject_requests: true,
            ..Default::default()
        });
        assert!(wallet.accounts().await.expect("accounts").is_empty());
        let err = wallet.request_accounts().await.expect_err("rejected");
        assert!(err.is_user_rejection());

        wallet.set_reject_requests(false).await;
        assert_eq!(wallet.request_accounts().await.expect("granted"), vec![alice()]);
        assert_eq!(wallet.accounts().await.expect("accounts"), vec![alice()]);
    }

    #[tokio::test]
    async fn mint_confirms_and_announces_token() {
        let wallet = SimulatedWallet::new(SimulatedWalletConfig {
            accounts: vec![alice()],
            pre_authorized: true,
            ..Default::default()
        });
        let contract = bound(&wallet).await;
        let mut minted = contract.subscribe_minted();

        let pending = contract.mint().await.expect("submit");
        let receipt = pending.wait().await.expect("confirm");
        assert_eq!(receipt.block_number, BlockNumber(1));

        let event = minted.recv().await.expect("event");
        assert_eq!(event.minter, alice());
        assert_eq!(event.token_id, TokenId(0));
        assert_eq!(event.collections.as_ref().map(Vec::len), Some(1));
        assert_eq!(contract.total_minted().await.expect("count"), 1);
        assert_eq!(contract.balance_of(&alice()).await.expect("balance"), 1);
    }

    #[tokio::test]
    async fn held_confirmation_keeps_transaction_pending() {
        let wallet = SimulatedWallet::new(SimulatedWalletConfig {
            accounts: vec![alice()],
            pre_authorized: true,
            ..Default::default()
        });
        wallet.hold_confirmations();
        let contract = bound(&wallet).await;
        let pending = contract.mint().await.expect("submit");

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(wallet.total_minted().await, 0);

        wallet.release_confirmations();
        pending.wait().await.expect("confirm");
        assert_eq!(wallet.total_minted().await, 1);
    }

    #[tokio::test]
    async fn supply_cap_rejects_submission() {
        let wallet = SimulatedWallet::new(SimulatedWalletConfig {
            accounts: vec![alice()],
            pre_authorized: true,
            supply_cap: 1,
            ..Default::default()
        });
        let contract = bound(&wallet).await;
        contract
            .mint()
            .await
            .expect("first")
            .wait()
            .await
            .expect("confirm");
        let err = contract.mint().await.expect_err("cap reached");
        assert_eq!(err.code, ProviderErrorCode::Reverted);
        assert_eq!(wallet.mint_submissions().await, 1);
    }
}
