//! Application state container. Fields only change through the transition
//! methods on [`AppState`], so every mutation is observable in one place.

use serde::Serialize;
use shared::domain::{Address, CollectionFragment, NetworkId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub address: Option<Address>,
    pub network_id: Option<NetworkId>,
    pub on_correct_network: bool,
}

impl Session {
    /// An account is adopted and the wallet sits on the expected network.
    pub fn is_valid(&self) -> bool {
        self.address.is_some() && self.on_correct_network
    }

    pub fn active_address(&self) -> Option<&Address> {
        if self.is_valid() {
            self.address.as_ref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MintState {
    pub is_minting: bool,
    pub total_minted: u64,
    pub total_cap: u64,
}

impl MintState {
    pub fn remaining(&self) -> u64 {
        self.total_cap.saturating_sub(self.total_minted)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppState {
    session: Session,
    mint: MintState,
    collections: Vec<CollectionFragment>,
}

impl AppState {
    pub fn new(total_cap: u64) -> Self {
        Self {
            mint: MintState {
                total_cap,
                ..MintState::default()
            },
            ..Self::default()
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn mint(&self) -> &MintState {
        &self.mint
    }

    pub fn collections(&self) -> &[CollectionFragment] {
        &self.collections
    }

    /// Records the account and network reported by the wallet. Returns
    /// whether the resulting session is valid.
    pub fn adopt_account(
        &mut self,
        address: Address,
        network_id: NetworkId,
        expected: &NetworkId,
    ) -> bool {
        if self.session.address.as_ref() != Some(&address) {
            self.collections.clear();
        }
        self.session = Session {
            on_correct_network: &network_id == expected,
            address: Some(address),
            network_id: Some(network_id),
        };
        self.session.is_valid()
    }

    pub fn clear_session(&mut self) {
        self.session = Session::default();
        self.collections.clear();
    }

    /// Flips `is_minting` on. Returns false when a mint is already in flight.
    pub fn begin_mint(&mut self) -> bool {
        if self.mint.is_minting {
            return false;
        }
        self.mint.is_minting = true;
        true
    }

    pub fn finish_mint(&mut self) {
        self.mint.is_minting = false;
    }

    pub fn set_total_minted(&mut self, total_minted: u64) {
        self.mint.total_minted = total_minted;
    }

    pub fn replace_collections(&mut self, collections: Vec<CollectionFragment>) {
        self.collections = collections;
    }

    /// Back to the freshly loaded state; the cap is configuration and survives.
    pub fn reset(&mut self) {
        *self = Self::new(self.mint.total_cap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(last: &str) -> Address {
        format!("0x{last:0>40}").parse().expect("address")
    }

    #[test]
    fn adoption_on_expected_network_is_valid() {
        let mut state = AppState::new(50);
        let expected = NetworkId::new("4");
        assert!(state.adopt_account(address("a1"), NetworkId::new("4"), &expected));
        assert_eq!(state.session().active_address(), Some(&address("a1")));
    }

    #[test]
    fn adoption_on_other_network_keeps_session_invalid() {
        let mut state = AppState::new(50);
        let expected = NetworkId::new("4");
        assert!(!state.adopt_account(address("a1"), NetworkId::new("1"), &expected));
        assert!(!state.session().is_valid());
        assert_eq!(state.session().active_address(), None);
        assert_eq!(state.session().network_id, Some(NetworkId::new("1")));
    }

    #[test]
    fn switching_account_drops_previous_collections() {
        let mut state = AppState::new(50);
        let expected = NetworkId::new("4");
        state.adopt_account(address("a1"), expected.clone(), &expected);
        state.replace_collections(vec![CollectionFragment::from_html("<p>1</p>")]);

        state.adopt_account(address("a1"), expected.clone(), &expected);
        assert_eq!(state.collections().len(), 1);

        state.adopt_account(address("b2"), expected.clone(), &expected);
        assert!(state.collections().is_empty());
    }

    #[test]
    fn begin_mint_refuses_second_flight() {
        let mut state = AppState::new(50);
        assert!(state.begin_mint());
        assert!(!state.begin_mint());
        state.finish_mint();
        assert!(state.begin_mint());
    }

    #[test]
    fn reset_keeps_cap_only() {
        let mut state = AppState::new(50);
        let expected = NetworkId::new("4");
        state.adopt_account(address("a1"), expected.clone(), &expected);
        state.set_total_minted(12);
        state.reset();
        assert_eq!(state, AppState::new(50));
        assert_eq!(state.mint().remaining(), 50);
    }
}
