//! Requests from the core to the presentation layer.

/// Surface of the launcher that can take keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusableWidget {
    Onboarding,
    Search,
}

/// Something the presentation layer should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiRequest {
    /// Move keyboard focus to a widget
    FocusWidget(FocusableWidget),
}
