//! CLI Module
//!
//! Command-line interface for sol-bridge using Clap v4.

mod onboard;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;

use crate::bridge::{CalendarAuthorizationStatus, CalendarEvent, CapabilityBridge};
use crate::config::Config;
use crate::host::TerminalHost;
use crate::onboarding::OnboardingStep;

/// sol-bridge - capability bridge and first-run onboarding for a launcher
#[derive(Parser, Debug)]
#[command(name = "sol-bridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug mode (creates log files in .sol-bridge/logs/)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk through first-run onboarding (default)
    Onboard {
        /// Step to start from (v1_start, v1_shortcut, v1_quick_actions, v1_completed)
        #[arg(short, long)]
        step: Option<OnboardingStep>,
    },

    /// List running applications
    Apps {
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List upcoming calendar events
    Events {
        /// Only show events whose title, location or notes contain this text
        #[arg(short, long)]
        query: Option<String>,

        /// Ask for calendar access first if it has not been granted
        #[arg(long)]
        request_access: bool,

        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show what is currently playing
    Media {
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show calendar and accessibility authorization
    Status {
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show host constants
    Constants {
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizationReport {
    calendar: CalendarAuthorizationStatus,
    accessibility: bool,
}

/// Main CLI entry point
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    if cli.debug {
        tracing::info!("Debug mode enabled");
    }

    match cli.command {
        None => onboard::cmd_onboard(&config, None).await,
        Some(Commands::Onboard { step }) => onboard::cmd_onboard(&config, step).await,
        Some(Commands::Apps { format }) => {
            let bridge = connect(&config);
            let apps = bridge.running_apps().await?;
            emit(format, &apps, |apps| {
                if apps.is_empty() {
                    println!("No running applications reported");
                }
                for app in apps {
                    println!("{}", app);
                }
            })
        }
        Some(Commands::Events {
            query,
            request_access,
            format,
        }) => {
            let bridge = connect(&config);
            let events = fetch_events(&bridge, query.as_deref(), request_access).await?;
            emit(format, &events, |events| {
                if events.is_empty() {
                    println!("No upcoming events");
                }
                for event in events {
                    let when = if event.is_all_day {
                        event.date.format("%Y-%m-%d (all day)").to_string()
                    } else {
                        format!(
                            "{} - {}",
                            event.date.format("%Y-%m-%d %H:%M"),
                            event.end_date.format("%H:%M")
                        )
                    };
                    println!(
                        "{}  {}",
                        when,
                        event.title.as_deref().unwrap_or("(untitled)")
                    );
                    if !event.location.is_empty() {
                        println!("    at {}", event.location);
                    }
                }
            })
        }
        Some(Commands::Media { format }) => {
            let bridge = connect(&config);
            let media = bridge.media_info().await?;
            emit(format, &media, |media| match media {
                Some(info) => println!("{} - {} ({})", info.title, info.artist, info.bundle_identifier),
                None => println!("Nothing playing"),
            })
        }
        Some(Commands::Status { format }) => {
            let bridge = connect(&config);
            let report = AuthorizationReport {
                calendar: bridge.calendar_authorization_status().await?,
                accessibility: bridge.accessibility_status().await?,
            };
            emit(format, &report, |report| {
                println!("Calendar: {}", report.calendar);
                println!(
                    "Accessibility: {}",
                    if report.accessibility { "granted" } else { "not granted" }
                );
            })
        }
        Some(Commands::Constants { format }) => {
            let bridge = connect(&config);
            let constants = bridge.constants().clone();
            emit(format, &constants, |constants| {
                println!("Accent color: {}", constants.accent_color);
            })
        }
        Some(Commands::Config) => cmd_config(&config),
    }
}

/// Load configuration from file or defaults
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config = if let Some(path) = config_path {
        tracing::info!("Loading configuration from custom path: {}", path);
        Config::load_from_path(path)?
    } else {
        tracing::debug!("Loading default configuration");
        Config::load()?
    };

    config.validate()?;

    Ok(config)
}

fn connect(config: &Config) -> CapabilityBridge {
    let host = Arc::new(TerminalHost::new(config.host.constants()));
    CapabilityBridge::new(host)
}

async fn fetch_events(
    bridge: &CapabilityBridge,
    query: Option<&str>,
    request_access: bool,
) -> Result<Vec<CalendarEvent>> {
    if request_access && !bridge.calendar_authorization_status().await?.is_authorized() {
        bridge.request_calendar_access().await?;
    }
    bridge
        .next_calendar_events(query)
        .await
        .context("Calendar events unavailable (pass --request-access to ask for access)")
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}

/// Show configuration
fn cmd_config(config: &Config) -> Result<()> {
    if let Some(path) = Config::system_config_path() {
        println!("# System config: {}", path.display());
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
