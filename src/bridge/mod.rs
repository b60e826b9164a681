//! Capability Bridge
//!
//! The single gateway between the control layer and the privileged host.
//! Three call shapes:
//! - commands: [`CapabilityBridge::submit`], fire-and-forget, failures logged only
//! - queries: async, resolve to exactly one value or a [`BridgeError`]
//! - events: [`CapabilityBridge::subscribe`] returns a [`Subscription`]
//!
//! The bridge keeps no state about outcomes and caches nothing; concurrent
//! identical queries each reach the host.

pub mod events;
pub mod listeners;
pub mod types;

use std::sync::Arc;

pub use events::{
    EventBus, EventSink, HostEvent, KeyDirection, ListenerCategory, ListenerState, ShortcutKind,
    Subscription, SubscriptionId,
};
pub use listeners::ListenerRegistry;
pub use types::{
    AuthorizationDomain, CalendarAuthorizationStatus, CalendarEvent, ClipboardShortcutKey,
    EventStatus, GlobalShortcutKey, HostCommand, HostConstants, MediaInfo,
};

use crate::error::{BridgeError, BridgeResult};
use crate::host::Host;

/// Process-wide capability gateway. Build one and share it behind an `Arc`.
pub struct CapabilityBridge {
    host: Arc<dyn Host>,
    events: EventBus,
    constants: HostConstants,
}

impl CapabilityBridge {
    /// Connect to `host`, read its constants and hand it the event sink.
    pub fn new(host: Arc<dyn Host>) -> Self {
        let events = EventBus::new();
        host.attach(events.sink());
        let constants = host.constants();
        tracing::debug!("Capability bridge ready (accent color {})", constants.accent_color);
        Self {
            host,
            events,
            constants,
        }
    }

    pub fn constants(&self) -> &HostConstants {
        &self.constants
    }

    // --- Commands ---

    /// Hand a command to the host. Returns as soon as it is submitted.
    ///
    /// Invalid arguments and host refusals are logged and dropped.
    pub fn submit(&self, command: HostCommand) {
        if let Err(e) = command.validate() {
            tracing::warn!("Dropping {} command: {}", command.name(), e);
            return;
        }

        tracing::debug!("Submitting {} command", command.name());
        let name = command.name();
        if let Err(e) = self.host.execute(command) {
            tracing::warn!("Host rejected {} command: {}", name, e);
        }
    }

    // --- Queries ---

    pub async fn running_apps(&self) -> BridgeResult<Vec<String>> {
        tracing::debug!("Querying running applications");
        self.host
            .running_apps()
            .await
            .inspect_err(|e| tracing::warn!("running apps query failed: {}", e))
    }

    /// Upcoming calendar events. Requires calendar authorization; any other
    /// status resolves with [`BridgeError::Unauthorized`]. No matches is an
    /// empty list, not a failure.
    pub async fn next_calendar_events(&self, query: Option<&str>) -> BridgeResult<Vec<CalendarEvent>> {
        let status = self.calendar_authorization_status().await?;
        if !status.is_authorized() {
            tracing::debug!("Calendar query refused, status {}", status);
            return Err(BridgeError::Unauthorized {
                domain: AuthorizationDomain::Calendar,
                status,
            });
        }

        let query = query.map(str::trim).filter(|q| !q.is_empty());
        tracing::debug!("Querying calendar events (filter: {:?})", query);
        self.host
            .next_calendar_events(query)
            .await
            .inspect_err(|e| tracing::warn!("calendar events query failed: {}", e))
    }

    /// Now-playing metadata, `None` when nothing is playing.
    pub async fn media_info(&self) -> BridgeResult<Option<MediaInfo>> {
        tracing::debug!("Querying media info");
        self.host
            .media_info()
            .await
            .inspect_err(|e| tracing::warn!("media info query failed: {}", e))
    }

    pub async fn calendar_authorization_status(&self) -> BridgeResult<CalendarAuthorizationStatus> {
        self.host
            .calendar_authorization_status()
            .await
            .inspect_err(|e| tracing::warn!("calendar status query failed: {}", e))
    }

    pub async fn accessibility_status(&self) -> BridgeResult<bool> {
        self.host
            .accessibility_status()
            .await
            .inspect_err(|e| tracing::warn!("accessibility status query failed: {}", e))
    }

    // --- Authorization requests ---

    /// Run the host's calendar permission prompt. Completion says nothing
    /// about the outcome; re-query the status afterwards.
    pub async fn request_calendar_access(&self) -> BridgeResult<()> {
        tracing::info!("Requesting calendar access");
        self.host.request_calendar_access().await
    }

    /// Run the host's accessibility permission prompt. Completion says
    /// nothing about the outcome; re-query the status afterwards.
    pub async fn request_accessibility_access(&self) -> BridgeResult<()> {
        tracing::info!("Requesting accessibility access");
        self.host.request_accessibility_access().await
    }

    // --- Events ---

    pub fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// End all subscriptions. Later subscriptions start out ended.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down capability bridge");
        self.events.close();
    }
}
