//! Onboarding State Machine
//!
//! Walks a first-time user through `v1_start → v1_shortcut →
//! v1_quick_actions → v1_completed`, advancing on global key events. Each
//! transition performs at most one host-visible side effect, submitted as a
//! fire-and-forget command, so advancing never waits on the host.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use super::scheduler::{DEFAULT_TRANSITION_DELAY, TransitionScheduler, Visibility};
use super::step::{OnboardingStep, SHORTCUT_CHOICES};
use crate::bridge::events::{HostEvent, KeyDirection};
use crate::bridge::types::{AuthorizationDomain, CalendarAuthorizationStatus, HostCommand};
use crate::bridge::CapabilityBridge;
use crate::ui::{FocusableWidget, UiRequest};

/// Default delay between completing onboarding and focusing search.
pub const DEFAULT_FOCUS_DELAY: Duration = Duration::from_millis(500);

/// Snapshot of onboarding progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnboardingProgress {
    pub step: OnboardingStep,
    /// Highlighted shortcut choice; always a valid index into `SHORTCUT_CHOICES`
    pub selected_index: usize,
    /// Written only by the transition scheduler
    pub visible: bool,
    pub launch_at_login: bool,
}

/// What handling an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingAction {
    /// Event not valid for the current step, or no change
    None,
    SelectionChanged(usize),
    Advanced(OnboardingStep),
    LaunchAtLoginChanged(bool),
}

/// Latest authorization statuses the host has announced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorizationSnapshot {
    pub calendar: Option<CalendarAuthorizationStatus>,
    pub accessibility: Option<CalendarAuthorizationStatus>,
}

/// Timing and initial values for a run of the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnboardingSettings {
    pub transition_delay: Duration,
    pub focus_delay: Duration,
    pub launch_at_login: bool,
}

impl Default for OnboardingSettings {
    fn default() -> Self {
        Self {
            transition_delay: DEFAULT_TRANSITION_DELAY,
            focus_delay: DEFAULT_FOCUS_DELAY,
            launch_at_login: false,
        }
    }
}

/// Single owner of the onboarding progress. Not meant for concurrent use.
pub struct OnboardingMachine {
    bridge: Arc<CapabilityBridge>,
    ui_tx: mpsc::UnboundedSender<UiRequest>,
    step: OnboardingStep,
    selected_index: usize,
    launch_at_login: bool,
    authorization: AuthorizationSnapshot,
    scheduler: TransitionScheduler,
    focus_delay: Duration,
    focus_requested: bool,
}

impl OnboardingMachine {
    pub fn new(
        bridge: Arc<CapabilityBridge>,
        ui_tx: mpsc::UnboundedSender<UiRequest>,
        initial: OnboardingStep,
        settings: OnboardingSettings,
    ) -> Self {
        Self {
            bridge,
            ui_tx,
            step: initial,
            selected_index: 0,
            launch_at_login: settings.launch_at_login,
            authorization: AuthorizationSnapshot::default(),
            scheduler: TransitionScheduler::new(initial, settings.transition_delay),
            focus_delay: settings.focus_delay,
            focus_requested: false,
        }
    }

    /// Show the initial step. Call once, inside a tokio runtime.
    pub fn start(&mut self) {
        tracing::info!("Onboarding starting at {}", self.step);
        self.scheduler.step_changed(self.step);
        if self.step == OnboardingStep::Completed {
            self.schedule_focus();
        }
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn is_complete(&self) -> bool {
        self.step.is_terminal()
    }

    pub fn progress(&self) -> OnboardingProgress {
        OnboardingProgress {
            step: self.step,
            selected_index: self.selected_index,
            visible: self.scheduler.visibility().visible,
            launch_at_login: self.launch_at_login,
        }
    }

    /// Step whose screen is mounted, and whether it is visible.
    pub fn visibility(&self) -> Visibility {
        self.scheduler.visibility()
    }

    pub fn watch_visibility(&self) -> watch::Receiver<Visibility> {
        self.scheduler.watch()
    }

    pub fn authorization(&self) -> AuthorizationSnapshot {
        self.authorization
    }

    pub fn launch_at_login(&self) -> bool {
        self.launch_at_login
    }

    /// Persist the launch-at-login preference through the host.
    pub fn set_launch_at_login(&mut self, enabled: bool) {
        self.launch_at_login = enabled;
        self.bridge.submit(HostCommand::SetLaunchAtLogin(enabled));
    }

    /// Flip the launch-at-login switch shown on the quick actions step.
    /// Ignored on every other step.
    pub fn toggle_launch_at_login(&mut self) -> OnboardingAction {
        if self.step != OnboardingStep::QuickActions {
            tracing::trace!("Launch-at-login toggle ignored at {}", self.step);
            return OnboardingAction::None;
        }
        let enabled = !self.launch_at_login;
        self.set_launch_at_login(enabled);
        OnboardingAction::LaunchAtLoginChanged(enabled)
    }

    /// Feed one host event. Events that make no sense for the current step
    /// are ignored.
    pub fn handle_event(&mut self, event: HostEvent) -> OnboardingAction {
        match event {
            HostEvent::KeyPress { direction } => self.handle_key(direction),
            HostEvent::AuthorizationChanged { domain, status } => {
                tracing::debug!("Authorization for {} is now {}", domain, status);
                match domain {
                    AuthorizationDomain::Calendar => self.authorization.calendar = Some(status),
                    AuthorizationDomain::Accessibility => {
                        self.authorization.accessibility = Some(status)
                    }
                }
                OnboardingAction::None
            }
            HostEvent::ShortcutFired { .. } => OnboardingAction::None,
        }
    }

    /// Handle a key for the current step
    pub fn handle_key(&mut self, key: KeyDirection) -> OnboardingAction {
        match self.step {
            OnboardingStep::Start => match key {
                KeyDirection::Enter => self.advance(),
                _ => OnboardingAction::None,
            },
            OnboardingStep::Shortcut => self.handle_shortcut_key(key),
            OnboardingStep::QuickActions => match key {
                KeyDirection::Enter => self.advance(),
                _ => OnboardingAction::None,
            },
            OnboardingStep::Completed => {
                tracing::trace!("Ignoring {:?}, onboarding already completed", key);
                OnboardingAction::None
            }
        }
    }

    fn handle_shortcut_key(&mut self, key: KeyDirection) -> OnboardingAction {
        match key {
            KeyDirection::Up | KeyDirection::Left => {
                self.select(self.selected_index.saturating_sub(1))
            }
            KeyDirection::Down | KeyDirection::Right => {
                self.select((self.selected_index + 1).min(SHORTCUT_CHOICES.len() - 1))
            }
            KeyDirection::Enter => {
                let choice = &SHORTCUT_CHOICES[self.selected_index];
                tracing::info!("Binding global shortcut: {}", choice.label);
                self.bridge.submit(HostCommand::SetGlobalShortcut(choice.key));
                self.advance()
            }
        }
    }

    fn select(&mut self, index: usize) -> OnboardingAction {
        if index == self.selected_index {
            return OnboardingAction::None;
        }
        self.selected_index = index;
        OnboardingAction::SelectionChanged(index)
    }

    fn advance(&mut self) -> OnboardingAction {
        let Some(next) = self.step.next() else {
            return OnboardingAction::None;
        };

        tracing::info!("Onboarding: {} -> {}", self.step, next);
        self.step = next;
        if next == OnboardingStep::Shortcut {
            self.selected_index = 0;
        }
        self.scheduler.step_changed(next);
        if next == OnboardingStep::Completed {
            self.schedule_focus();
        }
        OnboardingAction::Advanced(next)
    }

    fn schedule_focus(&mut self) {
        if self.focus_requested {
            return;
        }
        self.focus_requested = true;

        let ui_tx = self.ui_tx.clone();
        let delay = self.focus_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if ui_tx
                .send(UiRequest::FocusWidget(FocusableWidget::Search))
                .is_err()
            {
                tracing::debug!("UI gone before search focus request");
            }
        });
    }
}
