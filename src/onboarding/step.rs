//! Onboarding steps and the content shown for each.

use serde::{Deserialize, Serialize};

use crate::bridge::types::GlobalShortcutKey;

/// One screen of the first-run flow. Order is fixed; there is no going back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OnboardingStep {
    #[serde(rename = "v1_start")]
    Start,
    #[serde(rename = "v1_shortcut")]
    Shortcut,
    #[serde(rename = "v1_quick_actions")]
    QuickActions,
    #[serde(rename = "v1_completed")]
    Completed,
}

impl OnboardingStep {
    pub const ALL: [OnboardingStep; 4] = [
        OnboardingStep::Start,
        OnboardingStep::Shortcut,
        OnboardingStep::QuickActions,
        OnboardingStep::Completed,
    ];

    /// The step after this one; `None` for the terminal step.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Start => Some(Self::Shortcut),
            Self::Shortcut => Some(Self::QuickActions),
            Self::QuickActions => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    /// Step number (1-based)
    pub fn number(&self) -> usize {
        match self {
            Self::Start => 1,
            Self::Shortcut => 2,
            Self::QuickActions => 3,
            Self::Completed => 4,
        }
    }

    /// Persisted identifier, e.g. `v1_shortcut`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "v1_start",
            Self::Shortcut => "v1_shortcut",
            Self::QuickActions => "v1_quick_actions",
            Self::Completed => "v1_completed",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Start => "Welcome to your new macOS launcher",
            Self::Shortcut => "Pick a global shortcut",
            Self::QuickActions => "Quick actions",
            Self::Completed => "All set",
        }
    }

    /// Body lines shown under the title.
    pub fn body(&self) -> &'static [&'static str] {
        match self {
            Self::Start => &[],
            Self::Shortcut => &[],
            Self::QuickActions => &[
                "⌘ + number executes quick actions or favorites",
                "⌘ + ⇧ + Space globally opens the Scratchpad",
            ],
            Self::Completed => &[],
        }
    }

    /// Prompt at the bottom of the screen, if the step waits for Enter.
    pub fn prompt(&self) -> Option<&'static str> {
        match self {
            Self::Completed => None,
            _ => Some("Press ↩ to continue"),
        }
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OnboardingStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| format!("unknown onboarding step: {s}"))
    }
}

/// A global shortcut binding offered on the shortcut step.
pub struct ShortcutChoice {
    pub label: &'static str,
    pub key: GlobalShortcutKey,
    pub hint: Option<&'static str>,
}

/// The two bindings offered, in display order.
pub const SHORTCUT_CHOICES: &[ShortcutChoice] = &[
    ShortcutChoice {
        label: "⌥ then Space",
        key: GlobalShortcutKey::Option,
        hint: None,
    },
    ShortcutChoice {
        label: "⌘ then Space",
        key: GlobalShortcutKey::Command,
        hint: Some(
            "You will need to unbind Spotlight in System Preferences → Keyboard Shortcuts",
        ),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_order() {
        let mut visited = vec![OnboardingStep::Start];
        while let Some(next) = visited.last().and_then(|s| s.next()) {
            visited.push(next);
        }
        assert_eq!(visited, OnboardingStep::ALL.to_vec());
        assert!(OnboardingStep::Completed.is_terminal());
    }

    #[test]
    fn test_step_numbers_increase() {
        for pair in OnboardingStep::ALL.windows(2) {
            assert!(pair[0].number() < pair[1].number());
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_parse_and_display() {
        for step in OnboardingStep::ALL {
            assert_eq!(step.to_string().parse::<OnboardingStep>(), Ok(step));
        }
        assert!("v2_start".parse::<OnboardingStep>().is_err());
    }

    #[test]
    fn test_serde_uses_persisted_names() {
        let json = serde_json::to_string(&OnboardingStep::QuickActions).unwrap();
        assert_eq!(json, "\"v1_quick_actions\"");
    }

    #[test]
    fn test_exactly_two_shortcut_choices() {
        assert_eq!(SHORTCUT_CHOICES.len(), 2);
        assert_eq!(SHORTCUT_CHOICES[0].key, GlobalShortcutKey::Option);
        assert_eq!(SHORTCUT_CHOICES[1].key, GlobalShortcutKey::Command);
        assert!(SHORTCUT_CHOICES[1].hint.is_some());
    }
}
