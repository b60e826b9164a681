//! Listener Registry
//!
//! Tracks which global key listener categories are active. Toggling only
//! changes which key presses reach subscribers: presses for an inactive
//! category are dropped, never buffered. Host-side capabilities are unaffected.

use std::sync::Arc;

use super::events::{ListenerCategory, ListenerState};
use super::types::HostCommand;
use super::CapabilityBridge;

/// Owner of the listener state for one bridge.
pub struct ListenerRegistry {
    bridge: Arc<CapabilityBridge>,
}

impl ListenerRegistry {
    pub fn new(bridge: Arc<CapabilityBridge>) -> Self {
        Self { bridge }
    }

    /// Turn a category on. Returns `false` when it was already on.
    pub fn enable(&self, category: ListenerCategory) -> bool {
        self.set(category, true)
    }

    /// Turn a category off. Returns `false` when it was already off.
    pub fn disable(&self, category: ListenerCategory) -> bool {
        self.set(category, false)
    }

    /// Turn every category on. Returns the ones this call switched on, so
    /// the caller can release exactly those later.
    pub fn enable_all(&self) -> Vec<ListenerCategory> {
        ListenerCategory::ALL
            .into_iter()
            .filter(|&category| self.enable(category))
            .collect()
    }

    /// Turn off the given categories, leaving every other one as it is.
    pub fn release(&self, categories: &[ListenerCategory]) {
        for &category in categories {
            self.disable(category);
        }
    }

    pub fn disable_all(&self) {
        for category in ListenerCategory::ALL {
            self.disable(category);
        }
    }

    pub fn is_active(&self, category: ListenerCategory) -> bool {
        self.bridge.events().listener_state().is_active(category)
    }

    pub fn state(&self) -> ListenerState {
        self.bridge.events().listener_state()
    }

    fn set(&self, category: ListenerCategory, enabled: bool) -> bool {
        if !self.bridge.events().set_listener(category, enabled) {
            tracing::trace!("Listener {} already {}", category, on_off(enabled));
            return false;
        }
        tracing::debug!("Listener {} turned {}", category, on_off(enabled));
        self.bridge.submit(HostCommand::SetListener { category, enabled });
        true
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
