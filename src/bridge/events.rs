//! Host Event Stream
//!
//! Notifications that originate in the host (global key presses, shortcut
//! firings, authorization changes) and their fan-out to subscribers.
//!
//! Each subscriber owns one unbounded channel, so everything it receives is in
//! emission order. Key presses are gated by the listener state both when they
//! are emitted and again when a subscriber takes them off its queue: once a
//! category is disabled, queued presses of that category are dropped too.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::types::{AuthorizationDomain, CalendarAuthorizationStatus};

/// Class of global key input that can be switched on and off independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListenerCategory {
    HorizontalArrows,
    VerticalArrows,
    Enter,
}

impl ListenerCategory {
    pub const ALL: [ListenerCategory; 3] = [
        ListenerCategory::HorizontalArrows,
        ListenerCategory::VerticalArrows,
        ListenerCategory::Enter,
    ];
}

impl std::fmt::Display for ListenerCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HorizontalArrows => f.write_str("horizontalArrows"),
            Self::VerticalArrows => f.write_str("verticalArrows"),
            Self::Enter => f.write_str("enter"),
        }
    }
}

/// Key reported by a global key listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyDirection {
    Up,
    Down,
    Left,
    Right,
    Enter,
}

impl KeyDirection {
    /// Listener category that delivers this key.
    pub fn category(&self) -> ListenerCategory {
        match self {
            Self::Up | Self::Down => ListenerCategory::VerticalArrows,
            Self::Left | Self::Right => ListenerCategory::HorizontalArrows,
            Self::Enter => ListenerCategory::Enter,
        }
    }
}

/// Which global shortcut fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShortcutKind {
    Global,
    Scratchpad,
    ClipboardManager,
}

/// A single notification from the host. Emitted once, never replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostEvent {
    KeyPress {
        direction: KeyDirection,
    },
    AuthorizationChanged {
        domain: AuthorizationDomain,
        status: CalendarAuthorizationStatus,
    },
    ShortcutFired {
        kind: ShortcutKind,
    },
}

impl HostEvent {
    pub fn key(direction: KeyDirection) -> Self {
        Self::KeyPress { direction }
    }

    /// Listener category gating this event; `None` for events that are never gated.
    pub fn category(&self) -> Option<ListenerCategory> {
        match self {
            Self::KeyPress { direction } => Some(direction.category()),
            _ => None,
        }
    }
}

/// Set of currently active listener categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerState {
    active: BTreeSet<ListenerCategory>,
}

impl ListenerState {
    pub fn is_active(&self, category: ListenerCategory) -> bool {
        self.active.contains(&category)
    }

    pub fn active(&self) -> impl Iterator<Item = ListenerCategory> + '_ {
        self.active.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Whether `event` may be delivered under this state.
    pub fn admits(&self, event: &HostEvent) -> bool {
        event.category().is_none_or(|c| self.is_active(c))
    }

    pub(crate) fn set(&mut self, category: ListenerCategory, enabled: bool) -> bool {
        if enabled {
            self.active.insert(category)
        } else {
            self.active.remove(&category)
        }
    }
}

/// Identifier of one subscription, ordered by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    closed: bool,
    subscribers: BTreeMap<SubscriptionId, mpsc::UnboundedSender<HostEvent>>,
}

/// Fan-out of host events to subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
    listeners: Arc<RwLock<ListenerState>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in the event stream.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = lock(&self.inner);
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        if inner.closed {
            tracing::debug!("Subscribed {} to a closed event bus", id);
            drop(tx);
        } else {
            inner.subscribers.insert(id, tx);
            tracing::debug!("Subscribed {} ({} active)", id, inner.subscribers.len());
        }
        Subscription {
            id,
            rx,
            bus: Arc::clone(&self.inner),
            listeners: Arc::clone(&self.listeners),
        }
    }

    /// Deliver `event` to every live subscriber. Returns how many received it.
    pub fn emit(&self, event: HostEvent) -> usize {
        if !self.listener_state().admits(&event) {
            tracing::trace!("Dropping {:?}: listener inactive", event);
            return 0;
        }

        let mut inner = lock(&self.inner);
        inner
            .subscribers
            .retain(|_, tx| tx.send(event.clone()).is_ok());
        let delivered = inner.subscribers.len();
        tracing::trace!("Delivered {:?} to {} subscriber(s)", event, delivered);
        delivered
    }

    /// Handle the host uses to push events.
    pub fn sink(&self) -> EventSink {
        EventSink { bus: self.clone() }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }

    /// Snapshot of the active listener categories.
    pub fn listener_state(&self) -> ListenerState {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// End every subscription. Pending events are still readable; later
    /// subscriptions start out ended.
    pub fn close(&self) {
        let mut inner = lock(&self.inner);
        inner.closed = true;
        inner.subscribers.clear();
        tracing::debug!("Event bus closed");
    }

    pub(crate) fn set_listener(&self, category: ListenerCategory, enabled: bool) -> bool {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(category, enabled)
    }
}

fn lock(inner: &Mutex<BusInner>) -> MutexGuard<'_, BusInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Emit-only handle given to the host.
#[derive(Clone)]
pub struct EventSink {
    bus: EventBus,
}

impl EventSink {
    pub fn emit(&self, event: HostEvent) -> usize {
        self.bus.emit(event)
    }
}

/// A live registration on the event stream.
///
/// Dropping the subscription unsubscribes it.
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::UnboundedReceiver<HostEvent>,
    bus: Arc<Mutex<BusInner>>,
    listeners: Arc<RwLock<ListenerState>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next event, waiting until one arrives. `None` once the bus is closed
    /// and the queue is drained.
    pub async fn next(&mut self) -> Option<HostEvent> {
        loop {
            let event = self.rx.recv().await?;
            if self.admits(&event) {
                return Some(event);
            }
        }
    }

    /// Next already-queued event, without waiting.
    pub fn try_next(&mut self) -> Option<HostEvent> {
        loop {
            let event = self.rx.try_recv().ok()?;
            if self.admits(&event) {
                return Some(event);
            }
        }
    }

    /// Stop receiving events. Anything still queued is discarded.
    pub fn unsubscribe(self) {
        tracing::debug!("Unsubscribing {}", self.id);
    }

    fn admits(&self, event: &HostEvent) -> bool {
        let admitted = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .admits(event);
        if !admitted {
            tracing::trace!("{}: discarding queued {:?}", self.id, event);
        }
        admitted
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        lock(&self.bus).subscribers.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus_with_all_listeners() -> EventBus {
        let bus = EventBus::new();
        for category in ListenerCategory::ALL {
            bus.set_listener(category, true);
        }
        bus
    }

    #[test]
    fn test_key_categories() {
        assert_eq!(KeyDirection::Up.category(), ListenerCategory::VerticalArrows);
        assert_eq!(KeyDirection::Down.category(), ListenerCategory::VerticalArrows);
        assert_eq!(KeyDirection::Left.category(), ListenerCategory::HorizontalArrows);
        assert_eq!(KeyDirection::Right.category(), ListenerCategory::HorizontalArrows);
        assert_eq!(KeyDirection::Enter.category(), ListenerCategory::Enter);
    }

    #[test]
    fn test_emission_order_preserved() {
        let bus = bus_with_all_listeners();
        let mut sub = bus.subscribe();

        bus.emit(HostEvent::key(KeyDirection::Down));
        bus.emit(HostEvent::key(KeyDirection::Up));
        bus.emit(HostEvent::key(KeyDirection::Enter));

        assert_eq!(sub.try_next(), Some(HostEvent::key(KeyDirection::Down)));
        assert_eq!(sub.try_next(), Some(HostEvent::key(KeyDirection::Up)));
        assert_eq!(sub.try_next(), Some(HostEvent::key(KeyDirection::Enter)));
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn test_every_subscriber_gets_each_event_once() {
        let bus = bus_with_all_listeners();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        assert_eq!(bus.emit(HostEvent::key(KeyDirection::Enter)), 2);

        assert_eq!(a.try_next(), Some(HostEvent::key(KeyDirection::Enter)));
        assert_eq!(a.try_next(), None);
        assert_eq!(b.try_next(), Some(HostEvent::key(KeyDirection::Enter)));
        assert_eq!(b.try_next(), None);
    }

    #[test]
    fn test_inactive_category_dropped_at_emission() {
        let bus = EventBus::new();
        bus.set_listener(ListenerCategory::Enter, true);
        let mut sub = bus.subscribe();

        assert_eq!(bus.emit(HostEvent::key(KeyDirection::Left)), 0);
        bus.emit(HostEvent::key(KeyDirection::Enter));

        assert_eq!(sub.try_next(), Some(HostEvent::key(KeyDirection::Enter)));
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn test_queued_key_dropped_after_disable() {
        let bus = bus_with_all_listeners();
        let mut sub = bus.subscribe();

        bus.emit(HostEvent::key(KeyDirection::Up));
        bus.emit(HostEvent::key(KeyDirection::Enter));
        bus.set_listener(ListenerCategory::VerticalArrows, false);

        assert_eq!(sub.try_next(), Some(HostEvent::key(KeyDirection::Enter)));
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn test_non_key_events_never_gated() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        let event = HostEvent::AuthorizationChanged {
            domain: AuthorizationDomain::Accessibility,
            status: CalendarAuthorizationStatus::Authorized,
        };

        assert_eq!(bus.emit(event.clone()), 1);
        bus.emit(HostEvent::ShortcutFired {
            kind: ShortcutKind::Scratchpad,
        });

        assert_eq!(sub.try_next(), Some(event));
        assert!(matches!(
            sub.try_next(),
            Some(HostEvent::ShortcutFired { .. })
        ));
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = bus_with_all_listeners();
        let sub = bus.subscribe();
        let mut other = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        sub.unsubscribe();
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.emit(HostEvent::key(KeyDirection::Enter)), 1);
        assert!(other.try_next().is_some());
    }

    #[test]
    fn test_subscription_ids_are_ordered() {
        let bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        assert!(a.id() < b.id());
    }

    #[tokio::test]
    async fn test_close_ends_stream_after_drain() {
        let bus = bus_with_all_listeners();
        let mut sub = bus.subscribe();
        bus.emit(HostEvent::key(KeyDirection::Enter));
        bus.close();

        assert_eq!(sub.next().await, Some(HostEvent::key(KeyDirection::Enter)));
        assert_eq!(sub.next().await, None);

        let mut late = bus.subscribe();
        assert_eq!(late.next().await, None);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_string(&HostEvent::key(KeyDirection::Down)).unwrap();
        assert_eq!(json, r#"{"type":"keyPress","direction":"down"}"#);
    }
}
