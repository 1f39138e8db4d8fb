//! Ledger access for the aggregation layer.
//!
//! [`LedgerSource`] is the seam towards the storage collaborator: one bulk
//! lookup per entry kind, each filtered by account set (and date range where
//! the entry kind is date-stamped). [`LedgerSnapshot`] is the in-memory
//! implementation used when the entries are already loaded.

use crate::error::Result;
use crate::schema::{
    AccountSet, Bill, FixedExpense, Income, InstallmentPlan, LedgerEntry, VariableExpense,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub trait LedgerSource: Send + Sync {
    /// Incomes dated within `[from, to]`.
    fn incomes_between(
        &self,
        accounts: &AccountSet,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Income>>;

    fn active_fixed_expenses(&self, accounts: &AccountSet) -> Result<Vec<FixedExpense>>;

    /// Active variable expenses whose creation date falls within `[from, to]`.
    fn active_variable_expenses_between(
        &self,
        accounts: &AccountSet,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<VariableExpense>>;

    fn installment_plans(&self, accounts: &AccountSet) -> Result<Vec<InstallmentPlan>>;

    /// Bills due within `[from, to]`.
    fn bills_due_between(
        &self,
        accounts: &AccountSet,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bill>>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub incomes: Vec<Income>,
    pub fixed_expenses: Vec<FixedExpense>,
    pub variable_expenses: Vec<VariableExpense>,
    pub bills: Vec<Bill>,
    pub installment_plans: Vec<InstallmentPlan>,
}

impl LedgerSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = LedgerEntry>,
    {
        let mut snapshot = Self::new();
        for entry in entries {
            snapshot.push(entry);
        }
        snapshot
    }

    pub fn push(&mut self, entry: LedgerEntry) {
        match entry {
            LedgerEntry::Income(e) => self.incomes.push(e),
            LedgerEntry::FixedExpense(e) => self.fixed_expenses.push(e),
            LedgerEntry::VariableExpense(e) => self.variable_expenses.push(e),
            LedgerEntry::Bill(e) => self.bills.push(e),
            LedgerEntry::InstallmentPlan(e) => self.installment_plans.push(e),
        }
    }

    pub fn len(&self) -> usize {
        self.incomes.len()
            + self.fixed_expenses.len()
            + self.variable_expenses.len()
            + self.bills.len()
            + self.installment_plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LedgerSource for LedgerSnapshot {
    fn incomes_between(
        &self,
        accounts: &AccountSet,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Income>> {
        Ok(self
            .incomes
            .iter()
            .filter(|e| accounts.contains(&e.account_id) && e.date >= from && e.date <= to)
            .cloned()
            .collect())
    }

    fn active_fixed_expenses(&self, accounts: &AccountSet) -> Result<Vec<FixedExpense>> {
        Ok(self
            .fixed_expenses
            .iter()
            .filter(|e| e.active && accounts.contains(&e.account_id))
            .cloned()
            .collect())
    }

    fn active_variable_expenses_between(
        &self,
        accounts: &AccountSet,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<VariableExpense>> {
        Ok(self
            .variable_expenses
            .iter()
            .filter(|e| {
                let created = e.created_at.date_naive();
                e.active && accounts.contains(&e.account_id) && created >= from && created <= to
            })
            .cloned()
            .collect())
    }

    fn installment_plans(&self, accounts: &AccountSet) -> Result<Vec<InstallmentPlan>> {
        Ok(self
            .installment_plans
            .iter()
            .filter(|e| accounts.contains(&e.account_id))
            .cloned()
            .collect())
    }

    fn bills_due_between(
        &self,
        accounts: &AccountSet,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bill>> {
        Ok(self
            .bills
            .iter()
            .filter(|e| accounts.contains(&e.account_id) && e.due_date >= from && e.due_date <= to)
            .cloned()
            .collect())
    }
}
