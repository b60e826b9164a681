//! Mock host for unit testing.
//!
//! Records every call and returns pre-configured responses. Events can be
//! pushed into the bridge with [`MockHost::emit`] once the bridge has attached.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::Host;
use crate::bridge::events::{EventSink, HostEvent};
use crate::bridge::types::{
    AuthorizationDomain, CalendarAuthorizationStatus, CalendarEvent, HostCommand, HostConstants,
    MediaInfo,
};
use crate::error::{BridgeError, BridgeResult};

/// A recorded call to the mock host.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Execute(HostCommand),
    RunningApps,
    NextCalendarEvents(Option<String>),
    MediaInfo,
    CalendarAuthorizationStatus,
    RequestCalendarAccess,
    AccessibilityStatus,
    RequestAccessibilityAccess,
}

struct MockState {
    constants: HostConstants,
    sink: Option<EventSink>,
    calls: Vec<MockCall>,
    running_apps: Vec<String>,
    calendar_events: Vec<CalendarEvent>,
    media: Option<MediaInfo>,
    calendar_status: CalendarAuthorizationStatus,
    accessibility: bool,
    grant_on_request: bool,
    command_error: Option<BridgeError>,
    query_error: Option<BridgeError>,
}

/// Mock implementation of [`Host`].
pub struct MockHost {
    state: Mutex<MockState>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                constants: HostConstants::default(),
                sink: None,
                calls: Vec::new(),
                running_apps: Vec::new(),
                calendar_events: Vec::new(),
                media: None,
                calendar_status: CalendarAuthorizationStatus::NotDetermined,
                accessibility: false,
                grant_on_request: false,
                command_error: None,
                query_error: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_accent_color(self, color: &str) -> Self {
        self.state().constants.accent_color = color.to_string();
        self
    }

    pub fn with_running_apps(self, apps: Vec<String>) -> Self {
        self.state().running_apps = apps;
        self
    }

    pub fn with_calendar_events(self, events: Vec<CalendarEvent>) -> Self {
        self.state().calendar_events = events;
        self
    }

    pub fn with_media(self, media: MediaInfo) -> Self {
        self.state().media = Some(media);
        self
    }

    pub fn with_calendar_status(self, status: CalendarAuthorizationStatus) -> Self {
        self.state().calendar_status = status;
        self
    }

    pub fn with_accessibility(self, granted: bool) -> Self {
        self.state().accessibility = granted;
        self
    }

    /// Permission prompts resolve as granted and emit `AuthorizationChanged`.
    pub fn grant_on_request(self) -> Self {
        self.state().grant_on_request = true;
        self
    }

    /// Configure `execute` to refuse every command.
    pub fn with_command_error(self, err: BridgeError) -> Self {
        self.state().command_error = Some(err);
        self
    }

    /// Configure every query to fail.
    pub fn with_query_error(self, err: BridgeError) -> Self {
        self.state().query_error = Some(err);
        self
    }

    /// Push an event through the attached sink. Returns the delivery count,
    /// or 0 when no bridge has attached yet.
    pub fn emit(&self, event: HostEvent) -> usize {
        let sink = self.state().sink.clone();
        sink.map_or(0, |s| s.emit(event))
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    /// Only the commands, in submission order.
    pub fn commands(&self) -> Vec<HostCommand> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                MockCall::Execute(cmd) => Some(cmd.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    fn record(&self, call: MockCall) -> BridgeResult<()> {
        let mut state = self.state();
        state.calls.push(call);
        match &state.query_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn grant(&self, domain: AuthorizationDomain) {
        let sink = {
            let mut state = self.state();
            if !state.grant_on_request {
                return;
            }
            match domain {
                AuthorizationDomain::Calendar => {
                    state.calendar_status = CalendarAuthorizationStatus::Authorized
                }
                AuthorizationDomain::Accessibility => state.accessibility = true,
            }
            state.sink.clone()
        };
        if let Some(sink) = sink {
            sink.emit(HostEvent::AuthorizationChanged {
                domain,
                status: CalendarAuthorizationStatus::Authorized,
            });
        }
    }
}

#[async_trait]
impl Host for MockHost {
    fn constants(&self) -> HostConstants {
        self.state().constants.clone()
    }

    fn attach(&self, sink: EventSink) {
        self.state().sink = Some(sink);
    }

    fn execute(&self, command: HostCommand) -> BridgeResult<()> {
        let mut state = self.state();
        state.calls.push(MockCall::Execute(command));
        match &state.command_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn running_apps(&self) -> BridgeResult<Vec<String>> {
        self.record(MockCall::RunningApps)?;
        Ok(self.state().running_apps.clone())
    }

    async fn next_calendar_events(&self, query: Option<&str>) -> BridgeResult<Vec<CalendarEvent>> {
        self.record(MockCall::NextCalendarEvents(query.map(str::to_string)))?;
        let state = self.state();
        Ok(state
            .calendar_events
            .iter()
            .filter(|e| query.is_none_or(|q| e.matches(q)))
            .cloned()
            .collect())
    }

    async fn media_info(&self) -> BridgeResult<Option<MediaInfo>> {
        self.record(MockCall::MediaInfo)?;
        Ok(self.state().media.clone())
    }

    async fn calendar_authorization_status(&self) -> BridgeResult<CalendarAuthorizationStatus> {
        self.record(MockCall::CalendarAuthorizationStatus)?;
        Ok(self.state().calendar_status)
    }

    async fn request_calendar_access(&self) -> BridgeResult<()> {
        self.record(MockCall::RequestCalendarAccess)?;
        self.grant(AuthorizationDomain::Calendar);
        Ok(())
    }

    async fn accessibility_status(&self) -> BridgeResult<bool> {
        self.record(MockCall::AccessibilityStatus)?;
        Ok(self.state().accessibility)
    }

    async fn request_accessibility_access(&self) -> BridgeResult<()> {
        self.record(MockCall::RequestAccessibilityAccess)?;
        self.grant(AuthorizationDomain::Accessibility);
        Ok(())
    }
}
