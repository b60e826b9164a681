//! Data carried across the capability bridge.
//!
//! Serialized field names follow the host's wire form (camelCase), so records
//! decoded from the host and records printed by the CLI look the same.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::events::ListenerCategory;
use crate::error::{BridgeError, BridgeResult};

/// Calendar permission status as reported by the host.
///
/// Denied and restricted are not expected to go back to not-determined, but
/// nothing enforces that. Callers re-check on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalendarAuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    Authorized,
}

impl CalendarAuthorizationStatus {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotDetermined => "notDetermined",
            Self::Restricted => "restricted",
            Self::Denied => "denied",
            Self::Authorized => "authorized",
        }
    }
}

impl From<bool> for CalendarAuthorizationStatus {
    /// Accessibility only reports granted/not granted.
    fn from(granted: bool) -> Self {
        if granted {
            Self::Authorized
        } else {
            Self::Denied
        }
    }
}

impl std::fmt::Display for CalendarAuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission domain an authorization status belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthorizationDomain {
    Calendar,
    Accessibility,
}

impl std::fmt::Display for AuthorizationDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Calendar => f.write_str("calendar"),
            Self::Accessibility => f.write_str("accessibility"),
        }
    }
}

/// Participation status of a calendar event. Encoded as 0..=3 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EventStatus {
    #[default]
    None,
    Confirmed,
    Tentative,
    Cancelled,
}

impl TryFrom<u8> for EventStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Confirmed),
            2 => Ok(Self::Tentative),
            3 => Ok(Self::Cancelled),
            other => Err(format!("unknown event status: {other}")),
        }
    }
}

impl From<EventStatus> for u8 {
    fn from(status: EventStatus) -> Self {
        match status {
            EventStatus::None => 0,
            EventStatus::Confirmed => 1,
            EventStatus::Tentative => 2,
            EventStatus::Cancelled => 3,
        }
    }
}

/// One upcoming calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_all_day: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub status: EventStatus,
}

impl CalendarEvent {
    /// Case-insensitive match of `query` against title, location and notes.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(&needle))
            || self.location.to_lowercase().contains(&needle)
            || self.notes.to_lowercase().contains(&needle)
    }
}

/// Now-playing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub title: String,
    pub artist: String,
    pub artwork: String,
    pub bundle_identifier: String,
    pub url: String,
}

/// Modifier used by the global and scratchpad shortcuts (modifier then Space).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobalShortcutKey {
    Command,
    Option,
}

/// Modifier used by the clipboard manager shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardShortcutKey {
    Shift,
    Option,
}

/// Values the host exposes once, at boot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConstants {
    pub accent_color: String,
}

impl Default for HostConstants {
    fn default() -> Self {
        Self {
            accent_color: "#3B82F6".to_string(),
        }
    }
}

/// One-way request to the host. No result, no completion signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "camelCase")]
pub enum HostCommand {
    OpenFile(String),
    OpenWithFinder(String),
    OpenFinderAt(String),
    HideWindow,
    ToggleDarkMode,
    ExecuteAppleScript(String),
    SetGlobalShortcut(GlobalShortcutKey),
    SetScratchpadShortcut(GlobalShortcutKey),
    SetClipboardManagerShortcut(ClipboardShortcutKey),
    SetLaunchAtLogin(bool),
    ResizeFrontmostRightHalf,
    ResizeFrontmostLeftHalf,
    ResizeFrontmostFullscreen,
    MoveFrontmostNextScreen,
    MoveFrontmostPrevScreen,
    PasteToFrontmostApp(String),
    InsertToFrontmostApp(String),
    SetListener {
        category: ListenerCategory,
        enabled: bool,
    },
    CheckForUpdates,
    SetWindowRelativeSize(f64),
    ResetWindowSize,
    SetWindowHeight(f64),
}

impl HostCommand {
    /// Host operation name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenFile(_) => "openFile",
            Self::OpenWithFinder(_) => "openWithFinder",
            Self::OpenFinderAt(_) => "openFinderAt",
            Self::HideWindow => "hideWindow",
            Self::ToggleDarkMode => "toggleDarkMode",
            Self::ExecuteAppleScript(_) => "executeAppleScript",
            Self::SetGlobalShortcut(_) => "setGlobalShortcut",
            Self::SetScratchpadShortcut(_) => "setScratchpadShortcut",
            Self::SetClipboardManagerShortcut(_) => "setClipboardManagerShortcut",
            Self::SetLaunchAtLogin(_) => "setLaunchAtLogin",
            Self::ResizeFrontmostRightHalf => "resizeFrontmostRightHalf",
            Self::ResizeFrontmostLeftHalf => "resizeFrontmostLeftHalf",
            Self::ResizeFrontmostFullscreen => "resizeFrontmostFullscreen",
            Self::MoveFrontmostNextScreen => "moveFrontmostNextScreen",
            Self::MoveFrontmostPrevScreen => "moveFrontmostPrevScreen",
            Self::PasteToFrontmostApp(_) => "pasteToFrontmostApp",
            Self::InsertToFrontmostApp(_) => "insertToFrontmostApp",
            Self::SetListener { .. } => "setListener",
            Self::CheckForUpdates => "checkForUpdates",
            Self::SetWindowRelativeSize(_) => "setWindowRelativeSize",
            Self::ResetWindowSize => "resetWindowSize",
            Self::SetWindowHeight(_) => "setWindowHeight",
        }
    }

    /// Reject arguments the host could never act on.
    pub fn validate(&self) -> BridgeResult<()> {
        match self {
            Self::OpenFile(path) | Self::OpenWithFinder(path) | Self::OpenFinderAt(path) => {
                validate_path(path)
            }
            Self::ExecuteAppleScript(source) => {
                if source.trim().is_empty() {
                    return Err(BridgeError::InvalidArgument(
                        "script cannot be empty".to_string(),
                    ));
                }
                validate_text(source)
            }
            Self::PasteToFrontmostApp(text) | Self::InsertToFrontmostApp(text) => {
                validate_text(text)
            }
            Self::SetWindowRelativeSize(size) => {
                if !(size.is_finite() && *size > 0.0 && *size <= 1.0) {
                    return Err(BridgeError::InvalidArgument(format!(
                        "relative size must be in (0, 1], got {size}"
                    )));
                }
                Ok(())
            }
            Self::SetWindowHeight(height) => {
                if !(height.is_finite() && *height > 0.0) {
                    return Err(BridgeError::InvalidArgument(format!(
                        "window height must be > 0, got {height}"
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn validate_path(path: &str) -> BridgeResult<()> {
    if path.trim().is_empty() {
        return Err(BridgeError::InvalidArgument(
            "path cannot be empty".to_string(),
        ));
    }
    validate_text(path)
}

fn validate_text(text: &str) -> BridgeResult<()> {
    if text.contains('\0') {
        return Err(BridgeError::InvalidArgument(
            "text contains null byte".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(HostCommand::OpenFile(String::new()))]
    #[case(HostCommand::OpenFinderAt("  ".to_string()))]
    #[case(HostCommand::ExecuteAppleScript(String::new()))]
    #[case(HostCommand::PasteToFrontmostApp("a\0b".to_string()))]
    #[case(HostCommand::SetWindowRelativeSize(0.0))]
    #[case(HostCommand::SetWindowRelativeSize(1.5))]
    #[case(HostCommand::SetWindowRelativeSize(f64::NAN))]
    #[case(HostCommand::SetWindowHeight(-10.0))]
    fn test_invalid_commands_rejected(#[case] command: HostCommand) {
        let err = command.validate().unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidArgument);
    }

    #[rstest]
    #[case(HostCommand::OpenFile("/Applications/Safari.app".to_string()))]
    #[case(HostCommand::ExecuteAppleScript("beep".to_string()))]
    #[case(HostCommand::PasteToFrontmostApp(String::new()))]
    #[case(HostCommand::SetWindowRelativeSize(1.0))]
    #[case(HostCommand::SetWindowHeight(420.0))]
    #[case(HostCommand::ToggleDarkMode)]
    fn test_valid_commands_accepted(#[case] command: HostCommand) {
        assert!(command.validate().is_ok());
    }

    #[test]
    fn test_event_status_wire_form() {
        assert_eq!(EventStatus::try_from(2), Ok(EventStatus::Tentative));
        assert!(EventStatus::try_from(7).is_err());
        assert_eq!(u8::from(EventStatus::Cancelled), 3);
    }

    #[test]
    fn test_calendar_event_from_host_json() {
        let json = r##"{
            "id": "evt-1",
            "title": "Standup",
            "date": "2026-10-19T09:00:00Z",
            "endDate": "2026-10-19T09:15:00Z",
            "isAllDay": false,
            "notes": "",
            "color": "#ff0000",
            "location": "Room 4",
            "status": 1
        }"##;
        let event: CalendarEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.title.as_deref(), Some("Standup"));
        assert_eq!(event.url, None);
        assert_eq!(event.status, EventStatus::Confirmed);
        assert!(event.matches("stand"));
        assert!(event.matches("room"));
        assert!(!event.matches("retro"));
    }

    #[test]
    fn test_authorization_status_wire_names() {
        let status: CalendarAuthorizationStatus =
            serde_json::from_str("\"notDetermined\"").unwrap();
        assert_eq!(status, CalendarAuthorizationStatus::NotDetermined);
        assert_eq!(CalendarAuthorizationStatus::from(true), CalendarAuthorizationStatus::Authorized);
        assert_eq!(CalendarAuthorizationStatus::from(false), CalendarAuthorizationStatus::Denied);
    }

    #[test]
    fn test_command_names() {
        assert_eq!(
            HostCommand::SetGlobalShortcut(GlobalShortcutKey::Command).name(),
            "setGlobalShortcut"
        );
        assert_eq!(HostCommand::ResetWindowSize.name(), "resetWindowSize");
    }
}
