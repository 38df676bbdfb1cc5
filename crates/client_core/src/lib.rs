use std::{sync::Arc, time::Duration};

use shared::{
    domain::{Address, NetworkId},
    protocol::{MintedEvent, TxReceipt, WalletNotification},
};
use tokio::{
    sync::{broadcast, broadcast::error::RecvError, Mutex, RwLock},
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};
use wallet_integration::{ContractSession, WalletProvider};

pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod listener;
pub mod state;

pub use config::{load_settings, ClientConfig, Settings};
pub use error::ClientError;
pub use events::{ClientEvent, Notification};
pub use listener::{MintSubscription, ScopedTask};
pub use state::{AppState, MintState, Session};

use crate::{
    events::{INSTALL_WALLET_MESSAGE, WRONG_NETWORK_MESSAGE},
    gateway::ContractGateway,
};

/// Wallet session, mint workflow and minted-event listener over one injected
/// wallet provider. All state lives in a single [`AppState`] and every change
/// is announced on the event channel.
pub struct MintClient {
    config: ClientConfig,
    gateway: ContractGateway,
    state: RwLock<AppState>,
    subscription: Mutex<Option<MintSubscription>>,
    events: broadcast::Sender<ClientEvent>,
}

impl MintClient {
    pub fn new(config: ClientConfig, provider: Option<Arc<dyn WalletProvider>>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        let gateway = ContractGateway::new(
            provider,
            config.contract_address.clone(),
            Arc::clone(&config.abi),
        );
        Arc::new(Self {
            state: RwLock::new(AppState::new(config.total_cap)),
            config,
            gateway,
            subscription: Mutex::new(None),
            events,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn wallet_present(&self) -> bool {
        self.gateway.provider().is_some()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> AppState {
        self.state.read().await.clone()
    }

    pub async fn has_active_listener(&self) -> bool {
        self.subscription
            .lock()
            .await
            .as_ref()
            .is_some_and(MintSubscription::is_active)
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    fn fail<T>(&self, action: &'static str, error: ClientError) -> Result<T, ClientError> {
        warn!("{action}: failed: {error}");
        self.emit(ClientEvent::Error {
            action,
            error: error.clone(),
        });
        Err(error)
    }

    async fn active_address(&self) -> Option<Address> {
        self.state.read().await.session().active_address().cloned()
    }

    /// Adopts the first pre-authorized account, if any, without prompting.
    pub async fn detect_existing_session(self: &Arc<Self>) -> Result<Option<Address>, ClientError> {
        match self.detect_existing_session_inner().await {
            Ok(address) => Ok(address),
            Err(err) => self.fail("detect_existing_session", err),
        }
    }

    async fn detect_existing_session_inner(
        self: &Arc<Self>,
    ) -> Result<Option<Address>, ClientError> {
        let provider = self.gateway.require_provider()?;
        let accounts = provider.accounts().await?;
        let Some(account) = accounts.into_iter().next() else {
            info!("session: no authorized account found");
            return Ok(None);
        };

        info!("session: found authorized account={account}");
        self.adopt_account(account.clone()).await?;
        Ok(Some(account))
    }

    /// Prompts the wallet for account access.
    pub async fn connect(self: &Arc<Self>) -> Result<Address, ClientError> {
        match self.connect_inner().await {
            Ok(address) => Ok(address),
            Err(err) => self.fail("connect", err),
        }
    }

    async fn connect_inner(self: &Arc<Self>) -> Result<Address, ClientError> {
        let Some(provider) = self.gateway.provider() else {
            self.emit(ClientEvent::Notification(Notification::alert(
                INSTALL_WALLET_MESSAGE,
            )));
            return Err(ClientError::WalletUnavailable);
        };

        let accounts = provider.request_accounts().await?;
        let account = accounts
            .into_iter()
            .next()
            .ok_or(ClientError::NotConnected)?;
        info!("session: connected account={account}");
        self.adopt_account(account.clone()).await?;
        Ok(account)
    }

    async fn adopt_account(self: &Arc<Self>, account: Address) -> Result<(), ClientError> {
        let provider = self.gateway.require_provider()?;
        let network_id = provider.network_id().await?;

        let (valid, session) = {
            let mut state = self.state.write().await;
            let valid =
                state.adopt_account(account, network_id.clone(), &self.config.expected_network);
            (valid, state.session().clone())
        };
        self.emit(ClientEvent::SessionChanged(session));

        if !valid {
            self.release_subscription().await;
            self.emit(ClientEvent::Notification(Notification::toast(
                WRONG_NETWORK_MESSAGE,
            )));
            return Err(ClientError::WrongNetwork {
                expected: self.config.expected_network.clone(),
                actual: network_id,
            });
        }

        let (minted, collections) = futures::future::join(
            self.refresh_total_minted_inner(),
            self.refresh_collections_inner(),
        )
        .await;
        if let Err(err) = minted {
            warn!("session: counter refresh after adoption failed: {err}");
        }
        if let Err(err) = collections {
            warn!("session: collections refresh after adoption failed: {err}");
        }
        if let Err(err) = self.arm_event_listener_inner().await {
            warn!("session: listener setup after adoption failed: {err}");
        }
        Ok(())
    }

    /// An empty list means the wallet revoked access: the session is cleared.
    pub async fn on_accounts_changed(
        self: &Arc<Self>,
        accounts: Vec<Address>,
    ) -> Result<(), ClientError> {
        let Some(account) = accounts.into_iter().next() else {
            info!("session: wallet reported no accounts; clearing session");
            self.release_subscription().await;
            let session = {
                let mut state = self.state.write().await;
                state.clear_session();
                state.session().clone()
            };
            self.emit(ClientEvent::SessionChanged(session));
            return Ok(());
        };

        info!("session: accounts changed active={account}");
        match self.adopt_account(account).await {
            Ok(()) => Ok(()),
            Err(err) => self.fail("accounts_changed", err),
        }
    }

    /// A network switch reloads everything instead of patching the session.
    pub async fn on_chain_changed(
        self: &Arc<Self>,
        network_id: NetworkId,
    ) -> Result<Option<Address>, ClientError> {
        info!("session: chain changed network={network_id}; reloading");
        self.emit(ClientEvent::ReloadRequested(network_id));
        self.release_subscription().await;
        let session = {
            let mut state = self.state.write().await;
            state.reset();
            state.session().clone()
        };
        self.emit(ClientEvent::SessionChanged(session));
        self.detect_existing_session().await
    }

    /// Feeds the wallet's account/network notifications into the session.
    pub fn watch_wallet_notifications(self: &Arc<Self>) -> Result<ScopedTask, ClientError> {
        let provider = match self.gateway.require_provider() {
            Ok(provider) => provider,
            Err(err) => return self.fail("watch_wallet_notifications", err),
        };

        let mut notifications = provider.subscribe_notifications();
        let client = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            loop {
                let notification = match notifications.recv().await {
                    Ok(notification) => notification,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("session: skipped {skipped} wallet notifications");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(client) = client.upgrade() else {
                    break;
                };
                match notification {
                    WalletNotification::AccountsChanged { accounts } => {
                        let _ = client.on_accounts_changed(accounts).await;
                    }
                    WalletNotification::ChainChanged { network_id } => {
                        let _ = client.on_chain_changed(network_id).await;
                    }
                }
            }
        });
        Ok(ScopedTask::new(handle))
    }

    pub async fn refresh_total_minted(&self) -> Result<u64, ClientError> {
        match self.refresh_total_minted_inner().await {
            Ok(total) => Ok(total),
            Err(err) => self.fail("refresh_total_minted", err),
        }
    }

    async fn refresh_total_minted_inner(&self) -> Result<u64, ClientError> {
        let contract = self.gateway.contract().await?;
        let total = contract.total_minted().await?;
        self.state.write().await.set_total_minted(total);
        debug!("mint: total minted {total}/{}", self.config.total_cap);
        self.emit(ClientEvent::TotalMintedRefreshed(total));
        Ok(total)
    }

    pub async fn refresh_collections(&self) -> Result<usize, ClientError> {
        match self.refresh_collections_inner().await {
            Ok(count) => Ok(count),
            Err(err) => self.fail("refresh_collections", err),
        }
    }

    async fn refresh_collections_inner(&self) -> Result<usize, ClientError> {
        let owner = self
            .active_address()
            .await
            .ok_or(ClientError::NotConnected)?;
        let contract = self.gateway.contract().await?;
        let collections = contract.collections_of(&owner).await?;
        let count = collections.len();
        self.state.write().await.replace_collections(collections);
        self.emit(ClientEvent::CollectionsReplaced(count));
        Ok(count)
    }

    /// Number of tokens held by the active account.
    pub async fn balance(&self) -> Result<u64, ClientError> {
        match self.balance_inner().await {
            Ok(balance) => Ok(balance),
            Err(err) => self.fail("balance", err),
        }
    }

    async fn balance_inner(&self) -> Result<u64, ClientError> {
        let owner = self
            .active_address()
            .await
            .ok_or(ClientError::NotConnected)?;
        let contract = self.gateway.contract().await?;
        Ok(contract.balance_of(&owner).await?)
    }

    /// Submits one mint and waits for it to be mined. A second call while a
    /// mint is in flight is refused rather than submitted.
    pub async fn mint(self: &Arc<Self>) -> Result<TxReceipt, ClientError> {
        match self.mint_inner().await {
            Ok(receipt) => Ok(receipt),
            Err(err) => self.fail("mint", err),
        }
    }

    async fn mint_inner(self: &Arc<Self>) -> Result<TxReceipt, ClientError> {
        self.gateway.require_provider()?;
        self.require_mint_session().await?;
        let contract = self.gateway.contract().await?;
        if !self.state.write().await.begin_mint() {
            return Err(ClientError::MintInProgress);
        }
        self.emit(ClientEvent::MintingChanged(true));

        // The flight owns the minting flag, so it is cleared even when the
        // caller stops waiting.
        let client = Arc::clone(self);
        let flight = tokio::spawn(async move { client.complete_mint(contract).await });
        match flight.await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.state.write().await.finish_mint();
                self.emit(ClientEvent::MintingChanged(false));
                Err(ClientError::ContractCall(format!("mint task failed: {err}")))
            }
        }
    }

    async fn require_mint_session(&self) -> Result<(), ClientError> {
        let session = self.state.read().await.session().clone();
        let Some(network_id) = session.network_id.filter(|_| session.address.is_some()) else {
            return Err(ClientError::NotConnected);
        };
        if !session.on_correct_network {
            self.emit(ClientEvent::Notification(Notification::toast(
                WRONG_NETWORK_MESSAGE,
            )));
            return Err(ClientError::WrongNetwork {
                expected: self.config.expected_network.clone(),
                actual: network_id,
            });
        }
        Ok(())
    }

    async fn complete_mint(
        self: Arc<Self>,
        contract: Arc<dyn ContractSession>,
    ) -> Result<TxReceipt, ClientError> {
        info!("mint: waiting for wallet to submit transaction");
        let outcome = submit_and_confirm(contract.as_ref()).await;

        self.state.write().await.finish_mint();
        self.emit(ClientEvent::MintingChanged(false));
        let receipt = outcome?;

        match self.config.tx_link(&receipt.hash) {
            Some(link) => info!("mint: mined, see transaction {link}"),
            None => info!("mint: mined tx={}", receipt.hash),
        }

        if let Err(err) = self.refresh_total_minted_inner().await {
            warn!("mint: counter refresh after mint failed: {err}");
        }
        if let Err(err) = self.arm_event_listener_inner().await {
            warn!("mint: listener re-arm after mint failed: {err}");
        }
        Ok(receipt)
    }

    /// Makes sure exactly one minted-event handler runs for the current
    /// signer. An active subscription for the same binding is kept.
    pub async fn arm_event_listener(self: &Arc<Self>) -> Result<(), ClientError> {
        match self.arm_event_listener_inner().await {
            Ok(()) => Ok(()),
            Err(err) => self.fail("arm_event_listener", err),
        }
    }

    async fn arm_event_listener_inner(self: &Arc<Self>) -> Result<(), ClientError> {
        let contract = self.gateway.contract().await?;
        let mut slot = self.subscription.lock().await;

        if let Some(current) = slot.as_ref() {
            if current.is_active() && current.contract().binding() == contract.binding() {
                debug!("listener: handler already armed");
                return Ok(());
            }
        }
        // The previous handler is aborted before the new one subscribes.
        slot.take();

        let mut minted = contract.subscribe_minted();
        let client = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            loop {
                match minted.recv().await {
                    Ok(event) => {
                        let Some(client) = client.upgrade() else {
                            break;
                        };
                        client.handle_minted(event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("listener: skipped {skipped} minted events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        info!(
            "listener: armed contract={} signer={}",
            contract.binding().address,
            contract.binding().signer.address
        );
        *slot = Some(MintSubscription::new(contract, ScopedTask::new(handle)));
        Ok(())
    }

    async fn release_subscription(&self) {
        if self.subscription.lock().await.take().is_some() {
            debug!("listener: released minted-event handler");
        }
    }

    async fn handle_minted(&self, event: MintedEvent) {
        info!(
            "listener: token minted token_id={} minter={}",
            event.token_id, event.minter
        );

        if let Some(collections) = event.collections.clone() {
            let replaced = {
                let mut state = self.state.write().await;
                if state.session().active_address() == Some(&event.minter) {
                    let count = collections.len();
                    state.replace_collections(collections);
                    Some(count)
                } else {
                    None
                }
            };
            if let Some(count) = replaced {
                self.emit(ClientEvent::CollectionsReplaced(count));
            }
        }

        let link = self.config.token_link(event.token_id);
        self.emit(ClientEvent::Notification(Notification::minted(link)));
        self.emit(ClientEvent::TokenMinted(event));
    }

    /// Refreshes the mint counter every `every` until the guard is dropped.
    /// A zero interval starts nothing.
    pub fn spawn_counter_poller(self: &Arc<Self>, every: Duration) -> Option<ScopedTask> {
        if every.is_zero() {
            warn!("poller: zero interval, counter polling disabled");
            return None;
        }
        let client = Arc::downgrade(self);
        Some(ScopedTask::new(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(client) = client.upgrade() else {
                    break;
                };
                if let Err(err) = client.refresh_total_minted_inner().await {
                    debug!("poller: counter refresh skipped: {err}");
                }
            }
        })))
    }
}

async fn submit_and_confirm(contract: &dyn ContractSession) -> Result<TxReceipt, ClientError> {
    let pending = contract.mint().await?;
    info!("mint: mining tx={}", pending.hash());
    Ok(pending.wait().await?)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
