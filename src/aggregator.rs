use crate::amortizer::InstallmentAmortizer;
use crate::error::Result;
use crate::schema::{AccountSet, MonthlySummary};
use crate::snapshot::LedgerSource;
use crate::utils::{months_in_range, Month};
use log::debug;
use std::collections::BTreeMap;

/// Builds per-month summaries with one bulk lookup per entry kind,
/// independent of how many months are requested.
pub struct BatchSummaryAggregator<'a> {
    source: &'a dyn LedgerSource,
}

impl<'a> BatchSummaryAggregator<'a> {
    pub fn new(source: &'a dyn LedgerSource) -> Self {
        Self { source }
    }

    /// One summary per month in `[range_start, range_end]`, oldest first.
    /// Months without data are present with zero totals.
    pub fn aggregate(
        &self,
        accounts: &AccountSet,
        range_start: Month,
        range_end: Month,
    ) -> Result<Vec<MonthlySummary>> {
        let mut grid: BTreeMap<Month, MonthlySummary> = months_in_range(range_start, range_end)
            .into_iter()
            .map(|month| (month, MonthlySummary::empty(month)))
            .collect();

        if grid.is_empty() {
            return Ok(Vec::new());
        }

        if accounts.is_empty() {
            return Ok(finish(grid));
        }

        let from = range_start.first_day();
        let to = range_end.last_day();

        let incomes = self.source.incomes_between(accounts, from, to)?;
        for income in &incomes {
            if let Some(slot) = grid.get_mut(&Month::from_date(income.date)) {
                slot.gross_income += income.gross_amount;
                slot.net_income += income.net_amount;
                slot.tax += income.tax_amount;
            }
        }

        let fixed = self.source.active_fixed_expenses(accounts)?;
        let fixed_total: f64 = fixed.iter().filter(|e| e.active).map(|e| e.amount).sum();
        for slot in grid.values_mut() {
            slot.fixed_expenses += fixed_total;
        }

        let variable = self
            .source
            .active_variable_expenses_between(accounts, from, to)?;
        for expense in variable.iter().filter(|e| e.active) {
            let month = Month::from_date(expense.created_at.date_naive());
            if let Some(slot) = grid.get_mut(&month) {
                slot.variable_expenses += expense.amount;
            }
        }

        let plans = self.source.installment_plans(accounts)?;
        for plan in &plans {
            let Some(plan_end) = InstallmentAmortizer::end_month(plan) else {
                continue;
            };
            let first = plan.start_month.max(range_start);
            let last = plan_end.min(range_end);
            if first > last {
                continue;
            }
            for (_, slot) in grid.range_mut(first..=last) {
                slot.card_expenses += plan.per_installment_amount;
            }
        }

        let bills = self.source.bills_due_between(accounts, from, to)?;
        for bill in &bills {
            if let Some(slot) = grid.get_mut(&Month::from_date(bill.due_date)) {
                slot.bill_expenses += bill.amount;
            }
        }

        debug!(
            "Aggregated {} months ({} to {}) for {} accounts: {} incomes, {} fixed, {} variable, {} plans, {} bills",
            grid.len(),
            range_start,
            range_end,
            accounts.len(),
            incomes.len(),
            fixed.len(),
            variable.len(),
            plans.len(),
            bills.len()
        );

        Ok(finish(grid))
    }

    pub fn aggregate_month(&self, accounts: &AccountSet, month: Month) -> Result<MonthlySummary> {
        Ok(self
            .aggregate(accounts, month, month)?
            .pop()
            .unwrap_or_else(|| MonthlySummary::empty(month)))
    }
}

fn finish(grid: BTreeMap<Month, MonthlySummary>) -> Vec<MonthlySummary> {
    let mut summaries: Vec<MonthlySummary> = grid
        .into_values()
        .map(|mut summary| {
            summary.recompute_totals();
            summary
        })
        .collect();
    summaries.sort_by_key(|s| s.month);
    summaries
}

/// Sums a run of monthly summaries into one window total keyed by its last month.
pub fn combine_summaries(summaries: &[MonthlySummary]) -> Option<MonthlySummary> {
    let last = summaries.iter().map(|s| s.month).max()?;
    let mut total = MonthlySummary::empty(last);
    for summary in summaries {
        total.gross_income += summary.gross_income;
        total.net_income += summary.net_income;
        total.tax += summary.tax;
        total.fixed_expenses += summary.fixed_expenses;
        total.variable_expenses += summary.variable_expenses;
        total.card_expenses += summary.card_expenses;
        total.bill_expenses += summary.bill_expenses;
    }
    total.recompute_totals();
    Some(total)
}
