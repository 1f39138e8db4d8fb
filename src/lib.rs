//! # Ledger Insights
//!
//! Reporting core for a personal-finance ledger. Turns raw ledger entries
//! (incomes, fixed and variable expenses, bills and card installment plans)
//! into per-month summaries, month-over-month comparisons, category
//! breakdowns, trend series, budget usage and a composite financial health
//! score with recommendations.
//!
//! ## Core Concepts
//!
//! - **Ledger Source**: Bulk lookups over a set of accounts ([`LedgerSource`]); [`LedgerSnapshot`] is the in-memory implementation
//! - **Monthly Summary**: Per-month totals with `total_expenses` and `balance` always consistent with their components
//! - **Installments**: A card purchase split into equal monthly contributions ([`InstallmentAmortizer`])
//! - **Record Start**: Configured date before which history counts as "no data"
//! - **Settings Cache**: Read-mostly configuration refreshed at most once per TTL ([`SettingsCache`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use ledger_insights::*;
//! use chrono::NaiveDate;
//! use std::sync::Arc;
//!
//! let account = AccountId::new();
//! let ledger = LedgerSnapshot::from_entries(vec![
//!     LedgerEntry::Income(Income {
//!         account_id: account,
//!         date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
//!         gross_amount: 6000.0,
//!         net_amount: 5000.0,
//!         tax_amount: 1000.0,
//!         description: None,
//!     }),
//!     LedgerEntry::FixedExpense(FixedExpense {
//!         account_id: account,
//!         amount: 1500.0,
//!         active: true,
//!         description: Some("Rent".to_string()),
//!     }),
//! ]);
//!
//! let engine = ReportingEngine::new(
//!     Arc::new(ledger),
//!     Arc::new(StaticSettingsStore::default()),
//!     Arc::new(SystemClock),
//! );
//!
//! let accounts: AccountSet = [account].into_iter().collect();
//! let summaries = engine.summaries_for_period(&accounts, "2024-01:2024-03").unwrap();
//! let health = engine.health_score(&accounts, &[]).unwrap();
//! ```

pub mod aggregator;
pub mod amortizer;
pub mod clock;
pub mod error;
pub mod health;
pub mod schema;
pub mod scoring;
pub mod settings;
pub mod snapshot;
pub mod trends;
pub mod utils;

pub use aggregator::{combine_summaries, BatchSummaryAggregator};
pub use amortizer::{InstallmentAmortizer, InstallmentContribution};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{LedgerInsightsError, Result};
pub use health::{
    HealthGrade, HealthScore, HealthScoreEngine, HealthScoreHistory, Recommendation,
    RecommendationPriority, ScoreComponent, SubScores,
};
pub use schema::*;
pub use settings::{
    CachedSettings, JsonFileSettingsStore, RawSettings, SettingsCache, SettingsStore,
    StaticSettingsStore, DEFAULT_SETTINGS_TTL,
};
pub use snapshot::{LedgerSnapshot, LedgerSource};
pub use trends::TrendComposer;
pub use utils::*;

use log::debug;
use schemars::JsonSchema;
use std::sync::Arc;

/// Bundles a ledger source, the settings cache and a clock so callers don't
/// have to wire the reporting components themselves.
pub struct ReportingEngine {
    source: Arc<dyn LedgerSource>,
    settings: SettingsCache,
    clock: Arc<dyn Clock>,
}

impl ReportingEngine {
    pub fn new(
        source: Arc<dyn LedgerSource>,
        settings_store: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_settings_cache(source, SettingsCache::new(settings_store), clock)
    }

    pub fn with_settings_cache(
        source: Arc<dyn LedgerSource>,
        settings: SettingsCache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            settings,
            clock,
        }
    }

    pub fn settings(&self) -> &SettingsCache {
        &self.settings
    }

    pub fn monthly_summaries(
        &self,
        accounts: &AccountSet,
        start: Month,
        end: Month,
    ) -> Result<Vec<MonthlySummary>> {
        BatchSummaryAggregator::new(self.source.as_ref()).aggregate(accounts, start, end)
    }

    /// Summaries for a `"YYYY-MM"` or `"YYYY-MM:YYYY-MM"` period.
    pub fn summaries_for_period(
        &self,
        accounts: &AccountSet,
        period: &str,
    ) -> Result<Vec<MonthlySummary>> {
        let (start, end) = parse_period_string(period)?;
        debug!("Resolved period '{}' to {}..={}", period, start, end);
        self.monthly_summaries(accounts, start, end)
    }

    pub fn compare_months(
        &self,
        accounts: &AccountSet,
        year: i32,
        month: u32,
    ) -> Result<ComparisonResult> {
        self.trends().compare_months(accounts, year, month)
    }

    pub fn category_breakdown(
        &self,
        accounts: &AccountSet,
        year: i32,
        month: u32,
    ) -> Result<Option<Vec<CategoryShare>>> {
        self.trends().category_breakdown(accounts, year, month)
    }

    pub fn trend(&self, accounts: &AccountSet, month_count: i32) -> Result<Vec<TrendPoint>> {
        self.trends().trend(accounts, month_count)
    }

    pub fn budget_usage(&self, accounts: &AccountSet, year: i32, month: u32) -> Result<BudgetUsage> {
        self.trends().budget_usage(accounts, year, month)
    }

    pub fn health_score(&self, accounts: &AccountSet, goals: &[Goal]) -> Result<HealthScore> {
        HealthScoreEngine::new(self.source.as_ref(), &self.settings, self.clock.as_ref())
            .score(accounts, goals)
    }

    fn trends(&self) -> TrendComposer<'_> {
        TrendComposer::new(self.source.as_ref(), &self.settings, self.clock.as_ref())
    }
}

#[derive(JsonSchema)]
#[allow(dead_code)]
struct ReportOutputs {
    monthly_summaries: Vec<MonthlySummary>,
    comparison: ComparisonResult,
    category_breakdown: Option<Vec<CategoryShare>>,
    trend: Vec<TrendPoint>,
    budget_usage: BudgetUsage,
    health_score: HealthScore,
}

/// JSON Schema covering every report type this crate produces.
pub fn report_schema_as_json() -> Result<String> {
    let root = schemars::schema_for!(ReportOutputs);
    Ok(serde_json::to_string_pretty(&root)?)
}
