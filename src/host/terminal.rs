//! Terminal Host
//!
//! A headless stand-in for the privileged host, used by the CLI. Commands are
//! logged instead of performed, permission prompts resolve as granted, and
//! global key presses come from the controlling terminal.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use tokio::sync::Notify;

use super::Host;
use crate::bridge::events::{EventSink, HostEvent, KeyDirection};
use crate::bridge::types::{
    AuthorizationDomain, CalendarAuthorizationStatus, CalendarEvent, HostCommand, HostConstants,
    MediaInfo,
};
use crate::error::{BridgeError, BridgeResult};

struct TerminalState {
    sink: Option<EventSink>,
    calendar_status: CalendarAuthorizationStatus,
    accessibility: bool,
    launch_at_login: bool,
}

pub struct TerminalHost {
    constants: HostConstants,
    state: Mutex<TerminalState>,
    quit: Arc<Notify>,
    toggle: Arc<Notify>,
}

/// What a terminal key press means to the onboarding screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKey {
    Quit,
    ToggleLaunchAtLogin,
    Global(KeyDirection),
    Ignored,
}

impl TerminalHost {
    pub fn new(constants: HostConstants) -> Self {
        Self {
            constants,
            state: Mutex::new(TerminalState {
                sink: None,
                calendar_status: CalendarAuthorizationStatus::NotDetermined,
                accessibility: false,
                launch_at_login: false,
            }),
            quit: Arc::new(Notify::new()),
            toggle: Arc::new(Notify::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, TerminalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Notified when the user presses Esc, `q` or Ctrl+C.
    pub fn quit_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.quit)
    }

    /// Notified when the user presses Space.
    pub fn toggle_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.toggle)
    }

    pub fn launch_at_login(&self) -> bool {
        self.state().launch_at_login
    }

    /// Forward terminal key presses as global key events.
    ///
    /// Uses crossterm's async `EventStream` so the reader never blocks the
    /// runtime. Fails if no bridge has attached yet.
    pub fn start_key_listener(&self) -> BridgeResult<()> {
        let sink = self
            .state()
            .sink
            .clone()
            .ok_or_else(|| BridgeError::HostUnavailable("no bridge attached".to_string()))?;
        let quit = Arc::clone(&self.quit);
        let toggle = Arc::clone(&self.toggle);

        tokio::spawn(async move {
            let mut reader = EventStream::new();
            while let Some(event) = reader.next().await {
                let key = match event {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::warn!("Terminal input error: {}", e);
                        break;
                    }
                };

                match classify_key(&key) {
                    TerminalKey::Quit => {
                        quit.notify_one();
                        break;
                    }
                    TerminalKey::ToggleLaunchAtLogin => toggle.notify_one(),
                    TerminalKey::Global(direction) => {
                        sink.emit(HostEvent::key(direction));
                    }
                    TerminalKey::Ignored => {}
                }
            }
            tracing::debug!("Terminal key listener stopped");
        });
        Ok(())
    }

    fn emit(&self, event: HostEvent) {
        let sink = self.state().sink.clone();
        if let Some(sink) = sink {
            sink.emit(event);
        }
    }
}

/// Esc, `q` and Ctrl+C quit. Space is handled locally; arrows and Enter
/// become global key events.
pub fn classify_key(key: &KeyEvent) -> TerminalKey {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => TerminalKey::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => TerminalKey::Quit,
        KeyCode::Char(' ') => TerminalKey::ToggleLaunchAtLogin,
        code => key_direction(code).map_or(TerminalKey::Ignored, TerminalKey::Global),
    }
}

fn key_direction(code: KeyCode) -> Option<KeyDirection> {
    match code {
        KeyCode::Up => Some(KeyDirection::Up),
        KeyCode::Down => Some(KeyDirection::Down),
        KeyCode::Left => Some(KeyDirection::Left),
        KeyCode::Right => Some(KeyDirection::Right),
        KeyCode::Enter => Some(KeyDirection::Enter),
        _ => None,
    }
}

#[async_trait]
impl Host for TerminalHost {
    fn constants(&self) -> HostConstants {
        self.constants.clone()
    }

    fn attach(&self, sink: EventSink) {
        self.state().sink = Some(sink);
    }

    fn execute(&self, command: HostCommand) -> BridgeResult<()> {
        match &command {
            HostCommand::SetLaunchAtLogin(enabled) => {
                self.state().launch_at_login = *enabled;
                tracing::info!("host: launch at login = {}", enabled);
            }
            HostCommand::SetListener { category, enabled } => {
                tracing::debug!("host: listener {} enabled = {}", category, enabled);
            }
            other => tracing::info!("host: {:?}", other),
        }
        Ok(())
    }

    async fn running_apps(&self) -> BridgeResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn next_calendar_events(&self, _query: Option<&str>) -> BridgeResult<Vec<CalendarEvent>> {
        Ok(Vec::new())
    }

    async fn media_info(&self) -> BridgeResult<Option<MediaInfo>> {
        Ok(None)
    }

    async fn calendar_authorization_status(&self) -> BridgeResult<CalendarAuthorizationStatus> {
        Ok(self.state().calendar_status)
    }

    async fn request_calendar_access(&self) -> BridgeResult<()> {
        self.state().calendar_status = CalendarAuthorizationStatus::Authorized;
        self.emit(HostEvent::AuthorizationChanged {
            domain: AuthorizationDomain::Calendar,
            status: CalendarAuthorizationStatus::Authorized,
        });
        Ok(())
    }

    async fn accessibility_status(&self) -> BridgeResult<bool> {
        Ok(self.state().accessibility)
    }

    async fn request_accessibility_access(&self) -> BridgeResult<()> {
        self.state().accessibility = true;
        self.emit(HostEvent::AuthorizationChanged {
            domain: AuthorizationDomain::Accessibility,
            status: CalendarAuthorizationStatus::Authorized,
        });
        Ok(())
    }
}
