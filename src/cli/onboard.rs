//! Interactive onboarding in the terminal.

use std::io::{self, Stdout, Write};
use std::sync::Arc;

use anyhow::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use tokio::sync::mpsc;

use crate::bridge::{CapabilityBridge, ListenerRegistry};
use crate::config::Config;
use crate::host::TerminalHost;
use crate::onboarding::{
    OnboardingAction, OnboardingMachine, OnboardingProgress, OnboardingStep, SHORTCUT_CHOICES,
};
use crate::ui::UiRequest;

/// Raw mode plus alternate screen, restored on drop.
struct TerminalSession {
    stdout: Stdout,
}

impl TerminalSession {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All), MoveTo(0, 0))?;
        Ok(Self { stdout })
    }

    fn clear(&mut self) -> Result<()> {
        execute!(self.stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        Ok(())
    }

    fn render(&mut self, progress: &OnboardingProgress) -> Result<()> {
        self.clear()?;
        self.stdout.write_all(screen(progress).as_bytes())?;
        self.stdout.flush()?;
        Ok(())
    }
}

/// Text for one onboarding step, with raw-mode line endings.
fn screen(progress: &OnboardingProgress) -> String {
    let mut out = String::new();
    let step = progress.step;

    out.push_str(&format!("{}\r\n\r\n", step.title()));
    for line in step.body() {
        out.push_str(&format!("  {}\r\n", line));
    }

    match step {
        OnboardingStep::Shortcut => {
            for (index, choice) in SHORTCUT_CHOICES.iter().enumerate() {
                let marker = if index == progress.selected_index { "›" } else { " " };
                out.push_str(&format!("{} {}\r\n", marker, choice.label));
            }
            if let Some(hint) = SHORTCUT_CHOICES
                .get(progress.selected_index)
                .and_then(|choice| choice.hint)
            {
                out.push_str(&format!("\r\n  {}\r\n", hint));
            }
        }
        OnboardingStep::QuickActions => {
            let state = if progress.launch_at_login { "on" } else { "off" };
            out.push_str(&format!(
                "\r\n  Launch at login: {} (Space to toggle)\r\n",
                state
            ));
        }
        _ => {}
    }

    if let Some(prompt) = step.prompt() {
        out.push_str(&format!("\r\n{}\r\n", prompt));
    }
    out.push_str("\r\n(Esc to quit)\r\n");
    out
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, LeaveAlternateScreen, Show);
        let _ = terminal::disable_raw_mode();
    }
}

/// Run the onboarding flow against the terminal host until search is
/// focused or the user quits.
pub(super) async fn cmd_onboard(config: &Config, step: Option<OnboardingStep>) -> Result<()> {
    let initial = step.unwrap_or(config.onboarding.initial_step);
    let settings = config.onboarding.settings();

    let host = Arc::new(TerminalHost::new(config.host.constants()));
    let bridge = Arc::new(CapabilityBridge::new(host.clone()));

    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();
    let mut machine = OnboardingMachine::new(bridge.clone(), ui_tx, initial, settings);
    let mut visibility = machine.watch_visibility();
    let quit = host.quit_signal();
    let toggle = host.toggle_signal();

    let listeners = ListenerRegistry::new(bridge.clone());
    let enabled = listeners.enable_all();
    let mut events = bridge.subscribe();

    let mut session = TerminalSession::enter()?;
    host.start_key_listener()?;
    machine.start();
    if machine.visibility().visible {
        session.render(&machine.progress())?;
    }

    let finished = loop {
        tokio::select! {
            _ = quit.notified() => break false,
            _ = toggle.notified() => {
                let action = machine.toggle_launch_at_login();
                if let OnboardingAction::LaunchAtLoginChanged(enabled) = action {
                    tracing::debug!("Launch at login toggled to {}", enabled);
                    if machine.visibility().visible {
                        session.render(&machine.progress())?;
                    }
                }
            }
            event = events.next() => {
                let Some(event) = event else { break false };
                let action = machine.handle_event(event);
                match action {
                    OnboardingAction::SelectionChanged(_) if machine.visibility().visible => {
                        session.render(&machine.progress())?;
                    }
                    OnboardingAction::Advanced(_) => session.clear()?,
                    _ => {}
                }
            }
            changed = visibility.changed() => {
                if changed.is_err() {
                    break false;
                }
                let shown = *visibility.borrow_and_update();
                if shown.visible {
                    session.render(&machine.progress())?;
                }
            }
            request = ui_rx.recv() => {
                if let Some(UiRequest::FocusWidget(widget)) = request {
                    tracing::info!("Focus requested for {:?}", widget);
                    break true;
                }
            }
        }
    };

    drop(session);
    events.unsubscribe();
    listeners.release(&enabled);
    bridge.shutdown();

    if finished {
        println!("Onboarding complete. Search is ready.");
    } else {
        println!("Onboarding paused at {}.", machine.step());
        tracing::info!("Onboarding left at {}", machine.step());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(step: OnboardingStep, launch_at_login: bool) -> OnboardingProgress {
        OnboardingProgress {
            step,
            selected_index: 0,
            visible: true,
            launch_at_login,
        }
    }

    #[test]
    fn test_quick_actions_screen_shows_launch_at_login() {
        let off = screen(&progress(OnboardingStep::QuickActions, false));
        assert!(off.contains("Launch at login: off (Space to toggle)"));

        let on = screen(&progress(OnboardingStep::QuickActions, true));
        assert!(on.contains("Launch at login: on (Space to toggle)"));
    }

    #[test]
    fn test_launch_at_login_only_on_quick_actions() {
        for step in [
            OnboardingStep::Start,
            OnboardingStep::Shortcut,
            OnboardingStep::Completed,
        ] {
            assert!(!screen(&progress(step, true)).contains("Launch at login"));
        }
    }

    #[test]
    fn test_shortcut_screen_marks_selection() {
        let mut shown = progress(OnboardingStep::Shortcut, false);
        shown.selected_index = 1;
        let text = screen(&shown);
        assert!(text.contains(&format!("› {}", SHORTCUT_CHOICES[1].label)));
        assert!(text.ends_with("(Esc to quit)\r\n"));
    }
}
