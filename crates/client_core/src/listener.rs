use std::sync::Arc;

use tokio::task::JoinHandle;
use wallet_integration::ContractSession;

/// Background task that is aborted when the guard is dropped.
#[derive(Debug)]
pub struct ScopedTask(JoinHandle<()>);

impl ScopedTask {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self(handle)
    }

    pub fn is_running(&self) -> bool {
        !self.0.is_finished()
    }
}

impl Drop for ScopedTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// The minted-event subscription of one contract handle. Dropping it stops
/// the handler, so replacing the subscription never stacks handlers.
pub struct MintSubscription {
    contract: Arc<dyn ContractSession>,
    task: ScopedTask,
}

impl MintSubscription {
    pub fn new(contract: Arc<dyn ContractSession>, task: ScopedTask) -> Self {
        Self { contract, task }
    }

    pub fn contract(&self) -> &Arc<dyn ContractSession> {
        &self.contract
    }

    pub fn is_active(&self) -> bool {
        self.task.is_running()
    }
}
