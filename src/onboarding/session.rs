//! Drives one onboarding run from host events to completion.

use std::sync::Arc;

use super::machine::{OnboardingAction, OnboardingMachine, OnboardingProgress};
use crate::bridge::{CapabilityBridge, ListenerRegistry};

/// Switch the global key listeners on, feed every host event to `machine`
/// until it reaches the terminal step, then release the listeners this run
/// switched on.
///
/// Returns early if the event stream ends first.
pub async fn run_onboarding(
    bridge: Arc<CapabilityBridge>,
    mut machine: OnboardingMachine,
) -> OnboardingProgress {
    let listeners = ListenerRegistry::new(Arc::clone(&bridge));
    let enabled = listeners.enable_all();
    let mut subscription = bridge.subscribe();
    machine.start();

    while !machine.is_complete() {
        let Some(event) = subscription.next().await else {
            tracing::warn!(
                "Event stream ended during onboarding at {}",
                machine.step()
            );
            break;
        };
        if let OnboardingAction::Advanced(step) = machine.handle_event(event) {
            tracing::debug!("Onboarding reached step {}", step.number());
        }
    }

    subscription.unsubscribe();
    listeners.release(&enabled);
    machine.progress()
}
