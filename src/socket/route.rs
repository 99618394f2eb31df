use crate::network::platform::Network;
use std::sync::{Arc, RwLock};

/// Process-wide routing slot.
///
/// While a network is bound here, every socket the crate opens is pinned to
/// it. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct ProcessRoute {
    slot: Arc<RwLock<Option<Network>>>,
}

impl ProcessRoute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route all new sockets through `network`, replacing any previous binding.
    pub fn bind(&self, network: Network) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(network);
    }

    /// Return to the default route.
    pub fn unbind(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    pub fn current(&self) -> Option<Network> {
        self.slot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_bound(&self) -> bool {
        self.current().is_some()
    }
}
