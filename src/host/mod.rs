//! Privileged Host Layer
//!
//! The host owns the operating-system capabilities (window geometry,
//! clipboard, calendar, accessibility). The core never performs them itself;
//! it reaches the host only through this trait, so a fake host can stand in
//! for the real one.

pub mod mock;
pub mod terminal;

use async_trait::async_trait;

use crate::bridge::events::EventSink;
use crate::bridge::types::{CalendarAuthorizationStatus, CalendarEvent, HostCommand, HostConstants, MediaInfo};
use crate::error::BridgeResult;

pub use mock::{MockCall, MockHost};
pub use terminal::TerminalHost;

/// The host interface.
///
/// Commands are handed over synchronously and must not block; the host
/// performs them on its own schedule. Queries resolve exactly once.
#[async_trait]
pub trait Host: Send + Sync {
    /// Boot-time constants, read once when the bridge is built.
    fn constants(&self) -> HostConstants;

    /// Receive the sink used to push host events. Called once by the bridge.
    fn attach(&self, sink: EventSink);

    /// Accept a command. An `Err` means the host refused it outright.
    fn execute(&self, command: HostCommand) -> BridgeResult<()>;

    /// Identifiers of running applications.
    async fn running_apps(&self) -> BridgeResult<Vec<String>>;

    /// Upcoming calendar events, optionally filtered by free text.
    async fn next_calendar_events(&self, query: Option<&str>) -> BridgeResult<Vec<CalendarEvent>>;

    /// Now-playing metadata, `None` when nothing is playing.
    async fn media_info(&self) -> BridgeResult<Option<MediaInfo>>;

    async fn calendar_authorization_status(&self) -> BridgeResult<CalendarAuthorizationStatus>;

    /// Resolves when the permission prompt flow finishes, whatever its outcome.
    async fn request_calendar_access(&self) -> BridgeResult<()>;

    async fn accessibility_status(&self) -> BridgeResult<bool>;

    /// Resolves when the permission prompt flow finishes, whatever its outcome.
    async fn request_accessibility_access(&self) -> BridgeResult<()>;
}
