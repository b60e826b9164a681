//! First-run onboarding flow.

pub mod machine;
pub mod scheduler;
pub mod session;
pub mod step;

pub use machine::{
    AuthorizationSnapshot, OnboardingAction, OnboardingMachine, OnboardingProgress,
    OnboardingSettings,
};
pub use scheduler::{SingleShotTimer, TransitionScheduler, Visibility};
pub use session::run_onboarding;
pub use step::{OnboardingStep, SHORTCUT_CHOICES, ShortcutChoice};
