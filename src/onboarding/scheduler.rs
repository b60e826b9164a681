//! Transition Scheduler
//!
//! Separates the moment the onboarding step changes from the moment its
//! screen becomes visible, so consecutive advances fade out and back in
//! instead of swapping abruptly.
//!
//! On every change the current screen is hidden (unless the new step is the
//! first one) and a single timer is (re)armed. When it fires, the displayed
//! step latches to the latest step and becomes visible. A change that lands
//! before the timer fires restarts it: last write wins.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::step::OnboardingStep;

/// Default delay between a step change and its screen showing.
pub const DEFAULT_TRANSITION_DELAY: Duration = Duration::from_millis(1000);

/// Fade animation length the presentation should use.
pub const DEFAULT_FADE_DURATION: Duration = Duration::from_millis(500);

/// Cancellable one-shot timer. Scheduling again cancels the pending fire;
/// dropping the timer cancels it too.
#[derive(Default)]
pub struct SingleShotTimer {
    pending: Option<CancellationToken>,
}

impl SingleShotTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` after `delay` unless cancelled first. Must be called
    /// from within a tokio runtime.
    pub fn schedule<F>(&mut self, delay: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let token = CancellationToken::new();
        let cancelled = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(delay) => action(),
            }
        });
        self.pending = Some(token);
    }

    /// Cancel the pending fire, if any. Returns whether one was armed.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

impl Drop for SingleShotTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// What the presentation should show right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    /// Step whose screen is mounted
    pub step: OnboardingStep,
    pub visible: bool,
}

pub struct TransitionScheduler {
    delay: Duration,
    state: Arc<watch::Sender<Visibility>>,
    /// Bumped on every change; a reveal only lands if it still matches
    generation: Arc<AtomicU64>,
    timer: SingleShotTimer,
}

impl TransitionScheduler {
    /// Start out showing `initial`, visible.
    pub fn new(initial: OnboardingStep, delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(Visibility {
            step: initial,
            visible: true,
        });
        Self {
            delay,
            state: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            timer: SingleShotTimer::new(),
        }
    }

    /// Record a step change and (re)arm the reveal timer.
    pub fn step_changed(&mut self, step: OnboardingStep) {
        self.timer.cancel();

        let mut current = 0;
        self.state.send_if_modified(|v| {
            current = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if step == OnboardingStep::Start || !v.visible {
                return false;
            }
            v.visible = false;
            true
        });

        let state = Arc::clone(&self.state);
        let generation = Arc::clone(&self.generation);
        self.timer.schedule(self.delay, move || {
            reveal(&state, &generation, current, step);
        });
    }

    pub fn visibility(&self) -> Visibility {
        *self.state.borrow()
    }

    /// Receiver notified on every visibility change.
    pub fn watch(&self) -> watch::Receiver<Visibility> {
        self.state.subscribe()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Show `step` unless a newer change has been recorded since `expected`.
/// The check and the write happen under the channel's lock, so a reveal can
/// never land after a later hide.
fn reveal(
    state: &watch::Sender<Visibility>,
    generation: &AtomicU64,
    expected: u64,
    step: OnboardingStep,
) -> bool {
    state.send_if_modified(|v| {
        if generation.load(Ordering::SeqCst) != expected {
            tracing::trace!("Skipping stale reveal of {}", step);
            return false;
        }
        tracing::debug!("Revealing onboarding step {}", step);
        *v = Visibility {
            step,
            visible: true,
        };
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DELAY: Duration = Duration::from_millis(1000);

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_once_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = SingleShotTimer::new();
        let counter = fired.clone();
        timer.schedule(Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sleep_ms(99).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        sleep_ms(2).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        sleep_ms(500).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_cancels_previous() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = SingleShotTimer::new();
        for _ in 0..3 {
            let counter = fired.clone();
            timer.schedule(Duration::from_millis(100), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            sleep_ms(50).await;
        }

        sleep_ms(200).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_fire() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = SingleShotTimer::new();
        let counter = fired.clone();
        timer.schedule(Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(timer.cancel());
        assert!(!timer.cancel());
        drop(timer);

        sleep_ms(200).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_step_stays_visible() {
        let mut scheduler = TransitionScheduler::new(OnboardingStep::Start, DELAY);
        scheduler.step_changed(OnboardingStep::Start);
        assert!(scheduler.visibility().visible);

        sleep_ms(1001).await;
        assert_eq!(
            scheduler.visibility(),
            Visibility {
                step: OnboardingStep::Start,
                visible: true
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_hides_then_reveals() {
        let mut scheduler = TransitionScheduler::new(OnboardingStep::Start, DELAY);
        scheduler.step_changed(OnboardingStep::Shortcut);

        assert_eq!(
            scheduler.visibility(),
            Visibility {
                step: OnboardingStep::Start,
                visible: false
            }
        );

        sleep_ms(999).await;
        assert!(!scheduler.visibility().visible);

        sleep_ms(2).await;
        assert_eq!(
            scheduler.visibility(),
            Visibility {
                step: OnboardingStep::Shortcut,
                visible: true
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_reveal_is_ignored() {
        let mut scheduler = TransitionScheduler::new(OnboardingStep::Start, DELAY);
        scheduler.step_changed(OnboardingStep::Shortcut);
        let stale = scheduler.generation.load(Ordering::SeqCst);
        scheduler.step_changed(OnboardingStep::QuickActions);

        // A timer for the first change that already finished sleeping.
        assert!(!reveal(
            &scheduler.state,
            &scheduler.generation,
            stale,
            OnboardingStep::Shortcut
        ));
        assert_eq!(
            scheduler.visibility(),
            Visibility {
                step: OnboardingStep::Start,
                visible: false
            }
        );

        sleep_ms(1001).await;
        assert_eq!(
            scheduler.visibility(),
            Visibility {
                step: OnboardingStep::QuickActions,
                visible: true
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_changes_only_reveal_latest() {
        let mut scheduler = TransitionScheduler::new(OnboardingStep::Start, DELAY);
        let mut rx = scheduler.watch();
        let seen = tokio::spawn(async move {
            let mut shown = Vec::new();
            while rx.changed().await.is_ok() {
                let v = *rx.borrow_and_update();
                if v.visible {
                    shown.push(v.step);
                }
            }
            shown
        });

        scheduler.step_changed(OnboardingStep::Shortcut);
        sleep_ms(400).await;
        scheduler.step_changed(OnboardingStep::QuickActions);
        sleep_ms(700).await;
        // The first timer would have fired at 1000ms; it was restarted.
        assert!(!scheduler.visibility().visible);

        sleep_ms(400).await;
        assert_eq!(
            scheduler.visibility(),
            Visibility {
                step: OnboardingStep::QuickActions,
                visible: true
            }
        );

        drop(scheduler);
        let shown = seen.await.unwrap();
        assert_eq!(shown, vec![OnboardingStep::QuickActions]);
    }
}
