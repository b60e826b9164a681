//! sol-bridge - Capability Bridge and First-Run Onboarding
//!
//! A typed bridge between a launcher's presentation layer and the privileged
//! host that owns OS-level capabilities, plus the onboarding flow that runs
//! on top of it.
//!
//! ## Features
//!
//! - **Capability Bridge:** fire-and-forget host commands, async queries, and
//!   a subscription-based event stream
//! - **Listener Registry:** global key listeners switched on per category
//! - **Onboarding:** a four-step state machine driven by global key events
//! - **Transition Scheduler:** delayed reveal of each onboarding step
//!
//! ## Quick Start
//!
//! ```bash
//! # Walk through onboarding in the terminal
//! sol-bridge
//!
//! # Query the host
//! sol-bridge events --query standup --format json
//! ```

pub mod bridge;
pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod onboarding;
pub mod ui;

// Re-export commonly used types
pub use bridge::CapabilityBridge;
pub use error::{BridgeError, ErrorCode};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
