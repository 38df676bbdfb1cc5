use chrono::{DateTime, Utc};
use shared::{
    domain::{NetworkId, NotificationKind},
    protocol::MintedEvent,
};
use url::Url;

use crate::{error::ClientError, state::Session};

pub const INSTALL_WALLET_MESSAGE: &str = "Get MetaMask!";
pub const WRONG_NETWORK_MESSAGE: &str = "Please connect to the correct network.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub link: Option<Url>,
    pub issued_at: DateTime<Utc>,
}

impl Notification {
    pub fn toast(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Toast, message, None)
    }

    pub fn alert(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Alert, message, None)
    }

    pub fn with_link(mut self, link: Option<Url>) -> Self {
        self.link = link;
        self
    }

    fn new(kind: NotificationKind, message: impl Into<String>, link: Option<Url>) -> Self {
        Self {
            kind,
            message: message.into(),
            link,
            issued_at: Utc::now(),
        }
    }

    pub fn minted(link: Option<Url>) -> Self {
        let mut message = "Hey there! We've minted your NFT and sent it to your wallet. \
                           It may be blank right now. It can take a max of 10 min to show up \
                           on the marketplace."
            .to_string();
        if let Some(link) = &link {
            message.push_str(&format!(" Here's the link: {link}"));
        }
        Self::alert(message).with_link(link)
    }
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    SessionChanged(Session),
    MintingChanged(bool),
    TotalMintedRefreshed(u64),
    CollectionsReplaced(usize),
    TokenMinted(MintedEvent),
    Notification(Notification),
    ReloadRequested(NetworkId),
    Error {
        action: &'static str,
        error: ClientError,
    },
}
