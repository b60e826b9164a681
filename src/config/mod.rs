//! Configuration Module
//!
//! Handles application configuration loading, validation, and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bridge::types::HostConstants;
use crate::onboarding::machine::DEFAULT_FOCUS_DELAY;
use crate::onboarding::scheduler::{DEFAULT_FADE_DURATION, DEFAULT_TRANSITION_DELAY};
use crate::onboarding::{OnboardingSettings, OnboardingStep};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Onboarding flow configuration
    #[serde(default)]
    pub onboarding: OnboardingConfig,

    /// Terminal host configuration
    #[serde(default)]
    pub host: HostConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log to file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingConfig {
    /// Step to resume from (default: v1_start)
    #[serde(default = "default_initial_step")]
    pub initial_step: OnboardingStep,

    /// Delay before a new step becomes visible, in milliseconds (default: 1000)
    #[serde(default = "default_transition_delay_ms")]
    pub transition_delay_ms: u64,

    /// Delay between completion and focusing search, in milliseconds (default: 500)
    #[serde(default = "default_focus_delay_ms")]
    pub focus_delay_ms: u64,

    /// Fade animation length for the presentation, in milliseconds (default: 500)
    #[serde(default = "default_fade_duration_ms")]
    pub fade_duration_ms: u64,

    /// Current launch-at-login preference
    #[serde(default)]
    pub launch_at_login: bool,
}

fn default_initial_step() -> OnboardingStep {
    OnboardingStep::Start
}

fn default_transition_delay_ms() -> u64 {
    DEFAULT_TRANSITION_DELAY.as_millis() as u64
}

fn default_focus_delay_ms() -> u64 {
    DEFAULT_FOCUS_DELAY.as_millis() as u64
}

fn default_fade_duration_ms() -> u64 {
    DEFAULT_FADE_DURATION.as_millis() as u64
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            initial_step: default_initial_step(),
            transition_delay_ms: default_transition_delay_ms(),
            focus_delay_ms: default_focus_delay_ms(),
            fade_duration_ms: default_fade_duration_ms(),
            launch_at_login: false,
        }
    }
}

impl OnboardingConfig {
    pub fn settings(&self) -> OnboardingSettings {
        OnboardingSettings {
            transition_delay: Duration::from_millis(self.transition_delay_ms),
            focus_delay: Duration::from_millis(self.focus_delay_ms),
            launch_at_login: self.launch_at_login,
        }
    }

    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Accent color reported by the terminal host
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
}

fn default_accent_color() -> String {
    HostConstants::default().accent_color
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            accent_color: default_accent_color(),
        }
    }
}

impl HostConfig {
    pub fn constants(&self) -> HostConstants {
        HostConstants {
            accent_color: self.accent_color.clone(),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. Default values
    /// 2. System config: ~/.config/sol-bridge/config.toml
    /// 3. Local config: ./sol-bridge.toml
    /// 4. Environment variables
    pub fn load() -> Result<Self> {
        tracing::debug!("Loading configuration...");

        let mut config = Self::default();

        if let Some(system_config_path) = Self::system_config_path()
            && system_config_path.exists()
        {
            tracing::debug!("Loading system config from: {:?}", system_config_path);
            config = Self::load_file(&system_config_path)?;
        }

        let local_config_path = Self::local_config_path();
        if local_config_path.exists() {
            tracing::debug!("Loading local config from: {:?}", local_config_path);
            config = Self::load_file(&local_config_path)?;
        }

        config.apply_env_overrides()?;

        tracing::debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply environment overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from custom path: {:?}", path);

        if !path.exists() {
            anyhow::bail!("Config file not found: {:?}", path);
        }
        let mut config = Self::load_file(path)?;
        config.apply_env_overrides()?;

        tracing::debug!("Configuration loaded successfully from custom path");
        Ok(config)
    }

    /// Get the system config path: ~/.config/sol-bridge/config.toml
    pub fn system_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sol-bridge").join("config.toml"))
    }

    /// Get the local config path: ./sol-bridge.toml
    fn local_config_path() -> PathBuf {
        PathBuf::from("./sol-bridge.toml")
    }

    fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        toml::from_str(&contents).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(log_level) = lookup("SOL_LOG_LEVEL") {
            self.logging.level = log_level;
        }

        if let Some(log_file) = lookup("SOL_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(log_file));
        }

        if let Some(delay) = lookup("SOL_TRANSITION_DELAY_MS") {
            self.onboarding.transition_delay_ms = delay
                .parse()
                .with_context(|| format!("SOL_TRANSITION_DELAY_MS is not a number: {delay}"))?;
        }

        if let Some(delay) = lookup("SOL_FOCUS_DELAY_MS") {
            self.onboarding.focus_delay_ms = delay
                .parse()
                .with_context(|| format!("SOL_FOCUS_DELAY_MS is not a number: {delay}"))?;
        }

        if let Some(launch) = lookup("SOL_LAUNCH_AT_LOGIN") {
            self.onboarding.launch_at_login = launch
                .parse()
                .with_context(|| format!("SOL_LAUNCH_AT_LOGIN is not true/false: {launch}"))?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        tracing::debug!("Validating configuration...");

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        if self.onboarding.transition_delay_ms == 0 {
            anyhow::bail!("onboarding.transition_delay_ms must be greater than 0");
        }

        if self.onboarding.focus_delay_ms == 0 {
            anyhow::bail!("onboarding.focus_delay_ms must be greater than 0");
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        tracing::info!("Configuration saved to: {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.onboarding.initial_step, OnboardingStep::Start);
        assert_eq!(config.onboarding.transition_delay_ms, 1000);
        assert_eq!(config.onboarding.focus_delay_ms, 500);
        assert!(!config.onboarding.launch_at_login);
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_delay() {
        let mut config = Config::default();
        config.onboarding.transition_delay_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_content = r##"
[logging]
level = "debug"

[onboarding]
initial_step = "v1_quick_actions"
transition_delay_ms = 250
launch_at_login = true

[host]
accent_color = "#FF9500"
        "##;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.onboarding.initial_step, OnboardingStep::QuickActions);
        assert_eq!(config.onboarding.transition_delay_ms, 250);
        assert_eq!(config.onboarding.focus_delay_ms, 500);
        assert!(config.onboarding.launch_at_login);
        assert_eq!(config.host.constants().accent_color, "#FF9500");
    }

    #[test]
    fn test_unknown_step_rejected() {
        let toml_content = r#"
[onboarding]
initial_step = "v1_nope"
        "#;
        assert!(toml::from_str::<Config>(toml_content).is_err());
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.onboarding.transition_delay_ms = 10;
        config.onboarding.focus_delay_ms = 20;
        let settings = config.onboarding.settings();
        assert_eq!(settings.transition_delay, Duration::from_millis(10));
        assert_eq!(settings.focus_delay, Duration::from_millis(20));
        assert_eq!(config.onboarding.fade_duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.onboarding.initial_step = OnboardingStep::Shortcut;

        config.save(temp_file.path()).unwrap();

        let contents = std::fs::read_to_string(temp_file.path()).unwrap();
        let loaded: Config = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.logging.level, config.logging.level);
        assert_eq!(loaded.onboarding.initial_step, OnboardingStep::Shortcut);
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_applied() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("SOL_LOG_LEVEL", "debug"),
                ("SOL_TRANSITION_DELAY_MS", "42"),
                ("SOL_LAUNCH_AT_LOGIN", "true"),
            ]))
            .unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.onboarding.transition_delay_ms, 42);
        assert!(config.onboarding.launch_at_login);
    }

    #[test]
    fn test_invalid_launch_at_login_env_rejected() {
        let mut config = Config::default();
        config.onboarding.launch_at_login = true;
        let err = config
            .apply_overrides(env(&[("SOL_LAUNCH_AT_LOGIN", "yes")]))
            .unwrap_err();
        assert!(err.to_string().contains("SOL_LAUNCH_AT_LOGIN"));
        assert!(config.onboarding.launch_at_login);
    }

    #[test]
    fn test_invalid_delay_env_rejected() {
        let mut config = Config::default();
        assert!(
            config
                .apply_overrides(env(&[("SOL_FOCUS_DELAY_MS", "soon")]))
                .is_err()
        );
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        assert!(Config::load_from_path("/nonexistent/sol-bridge.toml").is_err());
    }
}
