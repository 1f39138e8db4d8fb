use crate::utils::Month;
use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Identifier of an individual or joint account owned by the account collaborator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct AccountId(pub Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The accounts a caller is allowed to see, already resolved by the account collaborator.
pub type AccountSet = BTreeSet<AccountId>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Income {
    pub account_id: AccountId,
    pub date: NaiveDate,
    pub gross_amount: f64,
    pub net_amount: f64,
    pub tax_amount: f64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Recurring obligation without a date; counts in every month while active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FixedExpense {
    pub account_id: AccountId,
    pub amount: f64,
    pub active: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VariableExpense {
    pub account_id: AccountId,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
    /// Empty when the expense was never categorized.
    #[serde(default)]
    pub category: String,
    pub active: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Bill {
    pub account_id: AccountId,
    pub amount: f64,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
}

/// A card purchase paid in `total_installments` monthly installments.
///
/// `total_amount` is informational only; every installment contributes
/// exactly `per_installment_amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InstallmentPlan {
    pub account_id: AccountId,
    pub per_installment_amount: f64,
    pub total_installments: i32,
    pub start_month: Month,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEntry {
    Income(Income),
    FixedExpense(FixedExpense),
    VariableExpense(VariableExpense),
    Bill(Bill),
    InstallmentPlan(InstallmentPlan),
}

impl LedgerEntry {
    pub fn account_id(&self) -> AccountId {
        match self {
            LedgerEntry::Income(e) => e.account_id,
            LedgerEntry::FixedExpense(e) => e.account_id,
            LedgerEntry::VariableExpense(e) => e.account_id,
            LedgerEntry::Bill(e) => e.account_id,
            LedgerEntry::InstallmentPlan(e) => e.account_id,
        }
    }
}

/// A savings goal as handed over by the goals collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Goal {
    pub id: Uuid,
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthlySummary {
    pub month: Month,
    pub gross_income: f64,
    pub net_income: f64,
    pub tax: f64,
    pub fixed_expenses: f64,
    pub variable_expenses: f64,
    pub card_expenses: f64,
    pub bill_expenses: f64,
    pub total_expenses: f64,
    pub balance: f64,
}

impl MonthlySummary {
    pub fn empty(month: Month) -> Self {
        Self {
            month,
            gross_income: 0.0,
            net_income: 0.0,
            tax: 0.0,
            fixed_expenses: 0.0,
            variable_expenses: 0.0,
            card_expenses: 0.0,
            bill_expenses: 0.0,
            total_expenses: 0.0,
            balance: 0.0,
        }
    }

    /// First-of-month timestamp of the summarized month.
    pub fn period_start(&self) -> NaiveDate {
        self.month.first_day()
    }

    /// Re-derives `total_expenses` and `balance` from the component totals.
    pub fn recompute_totals(&mut self) {
        self.total_expenses =
            self.fixed_expenses + self.variable_expenses + self.card_expenses + self.bill_expenses;
        self.balance = self.net_income - self.total_expenses;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Change {
    pub amount: f64,
    pub percent: f64,
}

impl Change {
    /// Month-over-month delta.
    ///
    /// A zero baseline reports +100% when the new value is positive and 0%
    /// otherwise; a negative baseline is measured against its magnitude.
    pub fn between(current: f64, previous: f64) -> Self {
        let amount = current - previous;
        let percent = if previous > 0.0 {
            amount / previous * 100.0
        } else if previous == 0.0 {
            if current > 0.0 {
                100.0
            } else {
                0.0
            }
        } else {
            amount / previous.abs() * 100.0
        };
        Self { amount, percent }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonResult {
    pub current: MonthlySummary,
    pub previous: MonthlySummary,
    pub has_previous_month: bool,
    pub income_change: Change,
    pub expense_change: Change,
    pub balance_change: Change,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryShare {
    pub category: String,
    pub amount: f64,
    pub percentage: f64,
    pub expense_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrendPoint {
    pub month: Month,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

impl From<&MonthlySummary> for TrendPoint {
    fn from(summary: &MonthlySummary) -> Self {
        Self {
            month: summary.month,
            income: summary.net_income,
            expense: summary.total_expenses,
            balance: summary.net_income - summary.total_expenses,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BudgetUsage {
    pub month: Month,
    pub net_income: f64,
    pub total_expenses: f64,
    pub usage_percent: f64,
    pub warning_threshold: f64,
    pub exceeded: bool,
}
