//! Read-mostly reporting settings behind a TTL cache.
//!
//! [`SettingsCache`] collapses concurrent cache misses into a single
//! backing-store read: readers share a read lock while the value is fresh,
//! and a reader that finds it stale takes the write lock, re-checks
//! freshness and only then calls the [`SettingsStore`].

use crate::error::{LedgerInsightsError, Result};
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

pub const DEFAULT_SETTINGS_TTL: Duration = Duration::from_secs(5 * 60);

/// Settings as persisted by the configuration collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSettings {
    /// Earliest date from which history counts as real data.
    pub record_start_date: Option<NaiveDate>,
    pub payroll_tax_ceiling: f64,
    /// Percentage, e.g. `14.0` for 14%.
    pub payroll_tax_rate: f64,
    /// Percent of net income at which spending triggers a budget warning.
    pub budget_warning_threshold: f64,
    /// Income-tax bracket rate forced by the user instead of the computed one.
    pub manual_bracket_override: Option<f64>,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            record_start_date: None,
            payroll_tax_ceiling: 0.0,
            payroll_tax_rate: 0.0,
            budget_warning_threshold: 80.0,
            manual_bracket_override: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSettings {
    pub record_start_date: Option<NaiveDate>,
    pub payroll_tax_ceiling: f64,
    pub payroll_tax_rate: f64,
    /// `payroll_tax_ceiling * payroll_tax_rate / 100`, rebuilt on every refresh.
    pub payroll_tax_amount: f64,
    pub budget_warning_threshold: f64,
    pub manual_bracket_override: Option<f64>,
}

impl From<RawSettings> for CachedSettings {
    fn from(raw: RawSettings) -> Self {
        Self {
            record_start_date: raw.record_start_date,
            payroll_tax_ceiling: raw.payroll_tax_ceiling,
            payroll_tax_rate: raw.payroll_tax_rate,
            payroll_tax_amount: raw.payroll_tax_ceiling * raw.payroll_tax_rate / 100.0,
            budget_warning_threshold: raw.budget_warning_threshold,
            manual_bracket_override: raw.manual_bracket_override,
        }
    }
}

impl Default for CachedSettings {
    fn default() -> Self {
        RawSettings::default().into()
    }
}

/// Backing store for [`SettingsCache`]. Called under the cache's write lock.
pub trait SettingsStore: Send + Sync {
    fn load_settings(&self) -> Result<RawSettings>;
}

/// Settings held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSettingsStore {
    settings: RawSettings,
}

impl StaticSettingsStore {
    pub fn new(settings: RawSettings) -> Self {
        Self { settings }
    }
}

impl SettingsStore for StaticSettingsStore {
    fn load_settings(&self) -> Result<RawSettings> {
        Ok(self.settings.clone())
    }
}

/// Reads a JSON settings document on every refresh. Missing fields take defaults.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn load_settings(&self) -> Result<RawSettings> {
        let contents = std::fs::read_to_string(&self.path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }
}

#[derive(Debug, Default)]
struct CacheState {
    value: CachedSettings,
    last_refresh: Option<Instant>,
}

impl CacheState {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.last_refresh
            .map(|at| at.elapsed() < ttl)
            .unwrap_or(false)
    }
}

pub struct SettingsCache {
    store: Arc<dyn SettingsStore>,
    state: RwLock<CacheState>,
    ttl: Duration,
    refreshes: AtomicUsize,
}

impl SettingsCache {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self::with_ttl(store, DEFAULT_SETTINGS_TTL)
    }

    pub fn with_ttl(store: Arc<dyn SettingsStore>, ttl: Duration) -> Self {
        Self {
            store,
            state: RwLock::new(CacheState::default()),
            ttl,
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self) -> Result<CachedSettings> {
        {
            let state = self.state.read().unwrap_or_else(|poisoned| {
                warn!("Settings cache lock was poisoned; recovering");
                PoisonError::into_inner(poisoned)
            });
            if state.is_fresh(self.ttl) {
                return Ok(state.value.clone());
            }
        }

        let mut state = self.state.write().unwrap_or_else(|poisoned| {
            warn!("Settings cache lock was poisoned; recovering");
            PoisonError::into_inner(poisoned)
        });

        // Another caller may have refreshed while we waited for the write lock.
        if state.is_fresh(self.ttl) {
            return Ok(state.value.clone());
        }

        let raw = self.store.load_settings().map_err(|e| match e {
            LedgerInsightsError::Settings(_) => e,
            other => LedgerInsightsError::Settings(other.to_string()),
        })?;
        state.value = CachedSettings::from(raw);
        state.last_refresh = Some(Instant::now());
        let count = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            "Refreshed reporting settings (refresh #{}, record start: {:?})",
            count, state.value.record_start_date
        );

        Ok(state.value.clone())
    }

    /// Forces the next [`get`](Self::get) to reload from the store.
    pub fn invalidate(&self) {
        let mut state = self.state.write().unwrap_or_else(|poisoned| {
            warn!("Settings cache lock was poisoned; recovering");
            PoisonError::into_inner(poisoned)
        });
        state.last_refresh = None;
    }

    /// Number of backing-store reads so far.
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    /// The record-start date, or `None` when unset or the store is unavailable.
    pub fn record_start_date(&self) -> Option<NaiveDate> {
        match self.get() {
            Ok(settings) => settings.record_start_date,
            Err(e) => {
                warn!("Falling back to no record start date: {}", e);
                None
            }
        }
    }
}
