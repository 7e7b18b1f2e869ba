//! # Sync Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     FAMYANK_REMOTE_URL=http://catalog.local:3000                        │
//! │     FAMYANK_SYNC_MODE=pull_only                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/pos/sync.toml (Linux)                                     │
//! │     ~/Library/Application Support/com.famyank.pos/sync.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! │     pull_push, no remote (sync idle), 15s poll                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! mode = "pull_push"        # pull_push | pull_only | offline
//! push_on_change = true
//!
//! [remote]
//! url = "http://192.168.1.10:3000"
//! request_timeout_secs = 10
//!
//! [schedule]
//! poll_interval_secs = 15
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Sync Mode
// =============================================================================

/// Which directions this node syncs in.
///
/// ```text
/// PULL_PUSH (Default)   pull on schedule, push local catalog changes
/// PULL_ONLY             pull on schedule, never write to the remote
/// OFFLINE               nothing; every adapter call reports Skipped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    #[default]
    PullPush,
    PullOnly,
    Offline,
}

impl SyncMode {
    pub fn allows_pull(&self) -> bool {
        !matches!(self, SyncMode::Offline)
    }

    pub fn allows_push(&self) -> bool {
        matches!(self, SyncMode::PullPush)
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncMode::PullPush => write!(f, "pull_push"),
            SyncMode::PullOnly => write!(f, "pull_only"),
            SyncMode::Offline => write!(f, "offline"),
        }
    }
}

impl std::str::FromStr for SyncMode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pull_push" | "full" => Ok(SyncMode::PullPush),
            "pull_only" | "pull" | "read_only" => Ok(SyncMode::PullOnly),
            "offline" | "disabled" => Ok(SyncMode::Offline),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown sync mode: '{}'. Valid options: pull_push, pull_only, offline",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Where the remote catalog lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Base URL of the catalog server. Unset means sync stays idle.
    #[serde(default)]
    pub url: Option<String>,

    /// Upper bound on every request (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for RemoteSettings {
    fn default() -> Self {
        RemoteSettings {
            url: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    /// Seconds between pulls. A failed pull waits for the next tick.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    15
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        ScheduleSettings {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Sent with every request so the server log can tell nodes apart.
    /// Generated when absent.
    #[serde(default = "generate_node_id")]
    pub node_id: String,

    #[serde(default)]
    pub mode: SyncMode,

    /// Push the catalog after every local change that affects it.
    #[serde(default = "default_true")]
    pub push_on_change: bool,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub schedule: ScheduleSettings,
}

fn generate_node_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            node_id: generate_node_id(),
            mode: SyncMode::default(),
            push_on_change: true,
            remote: RemoteSettings::default(),
            schedule: ScheduleSettings::default(),
        }
    }
}

impl SyncConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.node_id.trim().is_empty() {
            return Err(SyncError::InvalidConfig("node_id must not be empty".into()));
        }

        if let Some(url) = &self.remote.url {
            parse_remote_url(url)?;
        }

        if self.schedule.poll_interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "poll_interval_secs must be greater than 0".into(),
            ));
        }

        if self.remote.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `FAMYANK_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("FAMYANK_NODE_ID") {
            self.node_id = id;
        }

        if let Some(url) = lookup("FAMYANK_REMOTE_URL") {
            debug!(url = %url, "Overriding remote URL from environment");
            self.remote.url = Some(url);
        }

        if let Some(mode) = lookup("FAMYANK_SYNC_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding sync mode from environment");
                    self.mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown sync mode in environment"),
            }
        }

        if let Some(secs) = lookup("FAMYANK_POLL_INTERVAL_SECS") {
            match secs.parse() {
                Ok(s) => self.schedule.poll_interval_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid FAMYANK_POLL_INTERVAL_SECS"),
            }
        }

        if let Some(secs) = lookup("FAMYANK_REQUEST_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(s) => self.remote.request_timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid FAMYANK_REQUEST_TIMEOUT_SECS"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "famyank", "pos")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// True when a remote is configured and the mode is not offline.
    pub fn is_sync_enabled(&self) -> bool {
        self.mode.allows_pull() && self.remote.url.is_some()
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote.url.as_deref()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.remote.request_timeout_secs)
    }
}

/// Parses a catalog server base URL. Only http and https are accepted.
pub fn parse_remote_url(raw: &str) -> SyncResult<Url> {
    let url = Url::parse(raw).map_err(|e| SyncError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SyncError::InvalidUrl(format!(
            "Remote URL must start with http:// or https://, got {}://",
            other
        ))),
    }
}
