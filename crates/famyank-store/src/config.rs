//! # Store Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FAMYANK_DB_PATH=/var/lib/famyank/famyank.db                        │
//! │     FAMYANK_ADMIN_PASSWORD=...                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pos/store.toml (Linux)                                   │
//! │     ~/Library/Application Support/com.famyank.pos/store.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # store.toml
//! database_path = "/var/lib/famyank/famyank.db"
//! low_stock_threshold = 10
//! seed_defaults = true
//! bootstrap_admin_password = "change-me"
//! tax_rate_bps = 1250   # 12.5%
//! ```

use std::path::PathBuf;

use famyank_core::reports::LOW_STOCK_THRESHOLD;
use famyank_core::TaxRate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

const DB_FILE_NAME: &str = "famyank.db";

/// Settings for one [`PosStore`](crate::PosStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite file. Defaults to `<data_dir>/famyank.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Products below this stock level are flagged on the dashboard.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,

    /// Seed the default catalog and staff when the records are absent.
    #[serde(default = "default_true")]
    pub seed_defaults: bool,

    /// Password given to the seeded admin account.
    #[serde(default)]
    pub bootstrap_admin_password: Option<String>,

    /// Receipt tax rate in basis points.
    #[serde(default)]
    pub tax_rate_bps: u32,
}

fn default_low_stock_threshold() -> i64 {
    LOW_STOCK_THRESHOLD
}

fn default_true() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            database_path: None,
            low_stock_threshold: default_low_stock_threshold(),
            seed_defaults: true,
            bootstrap_admin_password: None,
            tax_rate_bps: 0,
        }
    }
}

impl StoreConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (store.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading store config from file");
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
            warn!("Failed to load store config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.low_stock_threshold < 0 {
            return Err(StoreError::InvalidConfig(
                "low_stock_threshold must not be negative".into(),
            ));
        }

        if self.tax_rate_bps > 10_000 {
            return Err(StoreError::InvalidConfig(format!(
                "tax_rate_bps must be at most 10000, got {}",
                self.tax_rate_bps
            )));
        }

        if matches!(self.bootstrap_admin_password.as_deref(), Some(p) if p.trim().is_empty()) {
            return Err(StoreError::InvalidConfig(
                "bootstrap_admin_password must not be blank".into(),
            ));
        }

        Ok(())
    }

    /// Applies `FAMYANK_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("FAMYANK_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(threshold) = lookup("FAMYANK_LOW_STOCK_THRESHOLD") {
            match threshold.parse() {
                Ok(t) => self.low_stock_threshold = t,
                Err(_) => warn!(value = %threshold, "Ignoring invalid FAMYANK_LOW_STOCK_THRESHOLD"),
            }
        }

        if let Some(password) = lookup("FAMYANK_ADMIN_PASSWORD") {
            self.bootstrap_admin_password = Some(password);
        }

        if let Some(bps) = lookup("FAMYANK_TAX_RATE_BPS") {
            match bps.parse() {
                Ok(b) => self.tax_rate_bps = b,
                Err(_) => warn!(value = %bps, "Ignoring invalid FAMYANK_TAX_RATE_BPS"),
            }
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "famyank", "pos")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("store.toml"))
    }

    /// The database file to open: the configured one, else the platform data dir.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().join(DB_FILE_NAME)))
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}
