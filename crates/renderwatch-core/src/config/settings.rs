use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Render progress monitor for video editors")]
pub struct Config {
    /// Enable debug mode
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Polling interval in milliseconds
    #[arg(short = 'i', long, global = true)]
    pub poll_interval: Option<u64>,

    /// Disable the render-complete notification
    #[arg(long, global = true)]
    pub no_notify: bool,

    /// Print status updates as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Watch the editor for render progress (default)
    Watch,
    /// Replay a scripted render (no editor required)
    Demo,
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Check if running in demo mode
    pub fn is_demo_mode(&self) -> bool {
        matches!(self.command, Some(Command::Demo))
    }
}

/// Application settings (from config file)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Interval between detection cycles in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Upper bound for a single UI query in milliseconds
    #[serde(default = "default_query_timeout")]
    pub query_timeout_ms: u64,

    /// Application being watched
    #[serde(default)]
    pub target: TargetSettings,

    /// UI names the probes look for
    #[serde(default)]
    pub probes: ProbeSettings,

    /// Render-complete notification
    #[serde(default)]
    pub notifications: NotificationSettings,
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_query_timeout() -> u64 {
    5000
}

/// Identity of the watched application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSettings {
    /// Process name as seen by System Events
    #[serde(default = "default_process_name")]
    pub process_name: String,

    /// Localized display names that count as the application running
    #[serde(default = "default_display_names")]
    pub display_names: Vec<String>,

    /// Bundle identifiers that count as the application running
    #[serde(default = "default_bundle_ids")]
    pub bundle_ids: Vec<String>,
}

fn default_process_name() -> String {
    "Final Cut Pro".to_string()
}

fn default_display_names() -> Vec<String> {
    vec!["Final Cut Pro".to_string(), "Final Cut Pro Trial".to_string()]
}

fn default_bundle_ids() -> Vec<String> {
    vec![
        "com.apple.FinalCut".to_string(),
        "com.apple.FinalCutTrial".to_string(),
    ]
}

impl Default for TargetSettings {
    fn default() -> Self {
        Self {
            process_name: default_process_name(),
            display_names: default_display_names(),
            bundle_ids: default_bundle_ids(),
        }
    }
}

/// Names of the UI pieces the probe chain inspects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSettings {
    /// Title of the window listing background tasks
    #[serde(default = "default_background_tasks_window")]
    pub background_tasks_window: String,

    /// Top-level menus scanned for a progress label, in order
    #[serde(default = "default_menus")]
    pub menus: Vec<String>,

    /// Accessibility role of progress indicator elements
    #[serde(default = "default_progress_role")]
    pub progress_role: String,
}

fn default_background_tasks_window() -> String {
    "Background Tasks".to_string()
}

fn default_menus() -> Vec<String> {
    vec!["Window".to_string(), "View".to_string()]
}

fn default_progress_role() -> String {
    "AXProgressIndicator".to_string()
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            background_tasks_window: default_background_tasks_window(),
            menus: default_menus(),
            progress_role: default_progress_role(),
        }
    }
}

/// Render-complete notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Send a notification when a render finishes
    #[serde(default = "default_notify_enabled")]
    pub enabled: bool,

    /// Notification title
    #[serde(default = "default_notify_title")]
    pub title: String,

    /// Notification body
    #[serde(default = "default_notify_body")]
    pub body: String,
}

fn default_notify_enabled() -> bool {
    true
}

fn default_notify_title() -> String {
    "Render Complete".to_string()
}

fn default_notify_body() -> String {
    "Your render has finished.".to_string()
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: default_notify_enabled(),
            title: default_notify_title(),
            body: default_notify_body(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            query_timeout_ms: default_query_timeout(),
            target: TargetSettings::default(),
            probes: ProbeSettings::default(),
            notifications: NotificationSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                return Self::load_from(p);
            }
        }

        // Try default config locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("renderwatch/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/renderwatch/config.toml")),
            dirs::home_dir().map(|p| p.join(".renderwatch.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Merge CLI config into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Config) {
        if let Some(poll_interval) = cli.poll_interval {
            self.poll_interval_ms = poll_interval;
        }
        if cli.no_notify {
            self.notifications.enabled = false;
        }
    }

    /// Validate and normalize settings values
    ///
    /// Keeps the cadence and query timeout from spinning the automation layer.
    pub fn validate(&mut self) {
        const MIN_POLL_INTERVAL: u64 = 100;
        const MIN_QUERY_TIMEOUT: u64 = 100;

        if self.poll_interval_ms < MIN_POLL_INTERVAL {
            self.poll_interval_ms = MIN_POLL_INTERVAL;
        }
        if self.query_timeout_ms < MIN_QUERY_TIMEOUT {
            self.query_timeout_ms = MIN_QUERY_TIMEOUT;
        }
    }
}
