//! Plain-text rendering of the client state.

use std::fmt::Write as _;

use client_core::{AppState, Notification};
use shared::domain::NotificationKind;

const TWITTER_HANDLE: &str = "_buildspace";

pub fn render_view(state: &AppState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "My NFT Collection");
    let _ = writeln!(out, "Each unique. Each beautiful. Discover your NFT today.");
    let _ = writeln!(out);

    let session = state.session();
    let mint = state.mint();
    if !session.is_valid() {
        let _ = writeln!(out, "[ Connect to Wallet ]");
    } else if mint.is_minting {
        let _ = writeln!(out, "[ Minting... ]");
    } else {
        let _ = writeln!(out, "[ Mint NFT ]");
    }
    if let Some(address) = session.active_address() {
        let _ = writeln!(out, "Connected: {address}");
    }

    let _ = writeln!(
        out,
        "Number of NFT minted so far: {} / {}",
        mint.total_minted, mint.total_cap
    );

    if !state.collections().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Your collection:");
        for (index, fragment) in state.collections().iter().enumerate() {
            match fragment.decode_html() {
                Ok(html) => {
                    let _ = writeln!(out, "  #{index}: {html}");
                }
                Err(err) => {
                    let _ = writeln!(out, "  #{index}: <unreadable: {err}>");
                }
            }
        }
    }

    let _ = writeln!(out);
    let _ = write!(out, "built on @{TWITTER_HANDLE}");
    out
}

pub fn render_notification(notification: &Notification) -> String {
    let tag = match notification.kind {
        NotificationKind::Toast => "toast",
        NotificationKind::Alert => "alert",
    };
    format!(
        "[{tag} {}] {}",
        notification.issued_at.format("%H:%M:%S"),
        notification.message
    )
}
