use crate::aggregator::BatchSummaryAggregator;
use crate::clock::Clock;
use crate::error::Result;
use crate::schema::{
    AccountSet, BudgetUsage, CategoryShare, Change, ComparisonResult, MonthlySummary, TrendPoint,
};
use crate::settings::{CachedSettings, SettingsCache};
use crate::snapshot::LedgerSource;
use crate::utils::Month;
use log::{debug, warn};
use std::collections::BTreeMap;

/// Month-over-month comparisons, category shares and trend series on top of
/// [`BatchSummaryAggregator`].
pub struct TrendComposer<'a> {
    source: &'a dyn LedgerSource,
    settings: &'a SettingsCache,
    clock: &'a dyn Clock,
}

impl<'a> TrendComposer<'a> {
    pub fn new(
        source: &'a dyn LedgerSource,
        settings: &'a SettingsCache,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            source,
            settings,
            clock,
        }
    }

    fn aggregator(&self) -> BatchSummaryAggregator<'a> {
        BatchSummaryAggregator::new(self.source)
    }

    pub fn compare_months(
        &self,
        accounts: &AccountSet,
        year: i32,
        month: u32,
    ) -> Result<ComparisonResult> {
        let current_month = Month::new(year, month)?;
        let previous_month = current_month.prev();

        let has_previous_month = match self.settings.record_start_date() {
            Some(start) => previous_month.first_day() >= start,
            None => true,
        };

        let summaries = self
            .aggregator()
            .aggregate(accounts, previous_month, current_month)?;
        let find = |m: Month| {
            summaries
                .iter()
                .find(|s| s.month == m)
                .cloned()
                .unwrap_or_else(|| MonthlySummary::empty(m))
        };

        let current = find(current_month);
        if !has_previous_month {
            debug!(
                "{} predates the record start; comparing {} without a baseline",
                previous_month, current_month
            );
            return Ok(ComparisonResult {
                current,
                previous: MonthlySummary::empty(previous_month),
                has_previous_month,
                income_change: Change::default(),
                expense_change: Change::default(),
                balance_change: Change::default(),
            });
        }

        let previous = find(previous_month);
        Ok(ComparisonResult {
            income_change: Change::between(current.net_income, previous.net_income),
            expense_change: Change::between(current.total_expenses, previous.total_expenses),
            balance_change: Change::between(current.balance, previous.balance),
            current,
            previous,
            has_previous_month,
        })
    }

    /// Variable-expense shares per category for one month.
    ///
    /// `None` when no accounts were queried; `Some(vec![])` when the accounts
    /// have no categorized expenses that month.
    pub fn category_breakdown(
        &self,
        accounts: &AccountSet,
        year: i32,
        month: u32,
    ) -> Result<Option<Vec<CategoryShare>>> {
        let month = Month::new(year, month)?;
        if accounts.is_empty() {
            return Ok(None);
        }

        let expenses = self.source.active_variable_expenses_between(
            accounts,
            month.first_day(),
            month.last_day(),
        )?;

        let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for expense in expenses.iter().filter(|e| e.active) {
            let category = expense.category.trim();
            if category.is_empty() || !month.contains(expense.created_at.date_naive()) {
                continue;
            }
            let entry = totals.entry(category.to_string()).or_insert((0.0, 0));
            entry.0 += expense.amount;
            entry.1 += 1;
        }

        let grand_total: f64 = totals.values().map(|(amount, _)| amount).sum();
        let mut shares: Vec<CategoryShare> = totals
            .into_iter()
            .map(|(category, (amount, expense_count))| CategoryShare {
                percentage: if grand_total > 0.0 {
                    amount / grand_total * 100.0
                } else {
                    0.0
                },
                category,
                amount,
                expense_count,
            })
            .collect();
        shares.sort_by(|a, b| {
            b.amount
                .total_cmp(&a.amount)
                .then_with(|| a.category.cmp(&b.category))
        });

        Ok(Some(shares))
    }

    /// `month_count` months ending at the current month, oldest first.
    pub fn trend(&self, accounts: &AccountSet, month_count: i32) -> Result<Vec<TrendPoint>> {
        if month_count <= 0 {
            return Ok(Vec::new());
        }

        let end = self.clock.current_month();
        let start = end
            .checked_offset(-(month_count - 1))
            .unwrap_or_else(Month::earliest);
        let mut points: Vec<TrendPoint> = self
            .aggregator()
            .aggregate(accounts, start, end)?
            .iter()
            .map(TrendPoint::from)
            .collect();
        points.sort_by_key(|p| p.month);
        Ok(points)
    }

    /// Spending for one month as a percentage of its net income, checked
    /// against the configured warning threshold.
    pub fn budget_usage(&self, accounts: &AccountSet, year: i32, month: u32) -> Result<BudgetUsage> {
        let month = Month::new(year, month)?;
        let summary = self.aggregator().aggregate_month(accounts, month)?;
        let warning_threshold = match self.settings.get() {
            Ok(settings) => settings.budget_warning_threshold,
            Err(e) => {
                warn!("Falling back to the default budget warning threshold: {}", e);
                CachedSettings::default().budget_warning_threshold
            }
        };

        let (usage_percent, exceeded) = if summary.net_income > 0.0 {
            let usage = summary.total_expenses / summary.net_income * 100.0;
            (usage, usage >= warning_threshold)
        } else if summary.total_expenses > 0.0 {
            (100.0, true)
        } else {
            (0.0, false)
        };

        Ok(BudgetUsage {
            month,
            net_income: summary.net_income,
            total_expenses: summary.total_expenses,
            usage_percent,
            warning_threshold,
            exceeded,
        })
    }
}
