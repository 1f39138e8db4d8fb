//! Composite financial health score.
//!
//! Four sub-scores, each in `[0, 100]`, are mapped through the curves in
//! [`crate::scoring`] and combined with fixed weights:
//!
//! | Component | Weight | Window |
//! |---|---|---|
//! | Savings rate | 0.30 | trailing 3 months |
//! | Debt (fixed obligations) | 0.25 | reference month |
//! | Goal progress | 0.25 | active goals |
//! | Budget consistency | 0.20 | trailing 3 single months |
//!
//! Windows never reach back past the configured record-start month. Missing
//! data always resolves to a documented neutral score instead of an error.

use crate::aggregator::{combine_summaries, BatchSummaryAggregator};
use crate::clock::Clock;
use crate::error::Result;
use crate::schema::{AccountSet, Goal, MonthlySummary};
use crate::scoring::{
    coefficient_of_variation, DEBT_CURVE, GOAL_CURVE, SAVINGS_CURVE, VOLATILITY_CURVE,
};
use crate::settings::SettingsCache;
use crate::snapshot::LedgerSource;
use crate::utils::Month;
use chrono::{DateTime, Utc};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const SAVINGS_WEIGHT: f64 = 0.30;
pub const DEBT_WEIGHT: f64 = 0.25;
pub const GOAL_WEIGHT: f64 = 0.25;
pub const BUDGET_WEIGHT: f64 = 0.20;

/// Score used when a component has no data to judge.
pub const NEUTRAL_SCORE: f64 = 50.0;
/// Budget-consistency score with fewer than two usable months.
pub const INSUFFICIENT_HISTORY_SCORE: f64 = 85.0;
/// Budget-consistency score when every usable month had no spending.
pub const NO_SPENDING_SCORE: f64 = 90.0;

const WEAK_THRESHOLD: f64 = 60.0;
const URGENT_THRESHOLD: f64 = 30.0;
const ENCOURAGEMENT_THRESHOLD: f64 = 75.0;
const MAX_TAILORED_RECOMMENDATIONS: usize = 3;
const MAX_RECOMMENDATIONS: usize = 4;
const TRAILING_MONTHS: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScoreComponent {
    Savings,
    Debt,
    Goals,
    Budget,
    General,
}

impl ScoreComponent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreComponent::Savings => "savings",
            ScoreComponent::Debt => "debt",
            ScoreComponent::Goals => "goals",
            ScoreComponent::Budget => "budget",
            ScoreComponent::General => "general",
        }
    }
}

impl fmt::Display for ScoreComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Recommendation {
    pub component: ScoreComponent,
    pub priority: RecommendationPriority,
    pub title: String,
    pub message: String,
}

impl Recommendation {
    fn new(
        component: ScoreComponent,
        priority: RecommendationPriority,
        title: &str,
        message: &str,
    ) -> Self {
        Self {
            component,
            priority,
            title: title.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl HealthGrade {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            HealthGrade::Excellent
        } else if score >= 60.0 {
            HealthGrade::Good
        } else if score >= 40.0 {
            HealthGrade::Fair
        } else {
            HealthGrade::Poor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubScores {
    pub savings: f64,
    pub debt: f64,
    pub goals: f64,
    pub budget: f64,
}

impl SubScores {
    pub fn composite(&self) -> f64 {
        (SAVINGS_WEIGHT * self.savings
            + DEBT_WEIGHT * self.debt
            + GOAL_WEIGHT * self.goals
            + BUDGET_WEIGHT * self.budget)
            .clamp(0.0, 100.0)
    }

    /// Scored components with their advice, in fixed reporting order.
    fn ordered(&self) -> [(f64, &'static Advice); 4] {
        [
            (self.savings, &SAVINGS_ADVICE),
            (self.debt, &DEBT_ADVICE),
            (self.goals, &GOAL_ADVICE),
            (self.budget, &BUDGET_ADVICE),
        ]
    }
}

/// A point-in-time score. Never modified after it is issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HealthScore {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub reference_month: Month,
    pub sub_scores: SubScores,
    pub composite_score: f64,
    pub grade: HealthGrade,
    pub recommendations: Vec<Recommendation>,
}

/// Append-only log of issued scores, oldest first.
#[derive(Debug, Clone, Default)]
pub struct HealthScoreHistory {
    entries: Vec<HealthScore>,
}

impl HealthScoreHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, score: HealthScore) -> &HealthScore {
        self.entries.push(score);
        &self.entries[self.entries.len() - 1]
    }

    pub fn latest(&self) -> Option<&HealthScore> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HealthScore> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct HealthScoreEngine<'a> {
    source: &'a dyn LedgerSource,
    settings: &'a SettingsCache,
    clock: &'a dyn Clock,
}

impl<'a> HealthScoreEngine<'a> {
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

    /// Issues a fresh score for `accounts` and the user's `goals`.
    pub fn score(&self, accounts: &AccountSet, goals: &[Goal]) -> Result<HealthScore> {
        let reference_month = self.clock.current_month();
        let window = self.trailing_window(accounts, reference_month, TRAILING_MONTHS)?;

        let sub_scores = SubScores {
            savings: savings_score_from(&window),
            debt: debt_score_from(window.iter().find(|s| s.month == reference_month)),
            goals: goal_score(goals),
            budget: budget_consistency_score_from(&window),
        };
        let composite_score = sub_scores.composite();
        let recommendations = recommendations(&sub_scores, composite_score);

        info!(
            "Issued health score {:.1} for {} accounts ({}): savings {:.1}, debt {:.1}, goals {:.1}, budget {:.1}",
            composite_score,
            accounts.len(),
            reference_month,
            sub_scores.savings,
            sub_scores.debt,
            sub_scores.goals,
            sub_scores.budget
        );

        Ok(HealthScore {
            id: Uuid::new_v4(),
            generated_at: self.clock.now(),
            reference_month,
            sub_scores,
            composite_score,
            grade: HealthGrade::from_score(composite_score),
            recommendations,
        })
    }

    pub fn savings_score(&self, accounts: &AccountSet) -> Result<f64> {
        let reference = self.clock.current_month();
        let window = self.trailing_window(accounts, reference, TRAILING_MONTHS)?;
        Ok(savings_score_from(&window))
    }

    pub fn debt_score(&self, accounts: &AccountSet) -> Result<f64> {
        let reference = self.clock.current_month();
        let window = self.trailing_window(accounts, reference, 1)?;
        Ok(debt_score_from(window.first()))
    }

    pub fn budget_consistency_score(&self, accounts: &AccountSet) -> Result<f64> {
        let reference = self.clock.current_month();
        let window = self.trailing_window(accounts, reference, TRAILING_MONTHS)?;
        Ok(budget_consistency_score_from(&window))
    }

    /// Summaries for the `months` months ending at `reference`, dropping any
    /// month before the record-start month.
    fn trailing_window(
        &self,
        accounts: &AccountSet,
        reference: Month,
        months: i32,
    ) -> Result<Vec<MonthlySummary>> {
        let mut start = reference.offset(-(months - 1));
        if let Some(record_start) = self.settings.record_start_date() {
            start = start.max(Month::from_date(record_start));
        }
        if start > reference {
            debug!(
                "Scoring window ending {} lies before the record start",
                reference
            );
            return Ok(Vec::new());
        }
        BatchSummaryAggregator::new(self.source).aggregate(accounts, start, reference)
    }
}

/// Savings-rate score over a window; 50 without usable months, 0 without income.
pub fn savings_score_from(window: &[MonthlySummary]) -> f64 {
    let total = match combine_summaries(window) {
        Some(total) => total,
        None => return NEUTRAL_SCORE,
    };
    if total.net_income <= 0.0 {
        return 0.0;
    }
    let savings_rate = (total.net_income - total.total_expenses) / total.net_income;
    SAVINGS_CURVE.evaluate(savings_rate * 100.0)
}

/// Fixed-obligation score for one month; 50 when the month is unusable.
pub fn debt_score_from(month: Option<&MonthlySummary>) -> f64 {
    let summary = match month {
        Some(summary) => summary,
        None => return NEUTRAL_SCORE,
    };
    let obligations = summary.fixed_expenses + summary.bill_expenses;
    if summary.net_income <= 0.0 {
        return if obligations > 0.0 { 0.0 } else { 100.0 };
    }
    DEBT_CURVE.evaluate(obligations / summary.net_income * 100.0)
}

/// Average capped progress across active goals with a positive target; 50 without any.
pub fn goal_score(goals: &[Goal]) -> f64 {
    let progress: Vec<f64> = goals
        .iter()
        .filter(|g| g.active && g.target_amount > 0.0)
        .map(|g| (g.current_amount / g.target_amount).clamp(0.0, 1.0) * 100.0)
        .collect();
    if progress.is_empty() {
        return NEUTRAL_SCORE;
    }
    let average = progress.iter().sum::<f64>() / progress.len() as f64;
    GOAL_CURVE.evaluate(average)
}

/// Month-to-month spending stability, excluding card installments.
pub fn budget_consistency_score_from(valid_months: &[MonthlySummary]) -> f64 {
    if valid_months.len() < 2 {
        return INSUFFICIENT_HISTORY_SCORE;
    }
    let expenses: Vec<f64> = valid_months
        .iter()
        .map(|s| s.fixed_expenses + s.variable_expenses + s.bill_expenses)
        .collect();
    if expenses.iter().all(|e| *e == 0.0) {
        return NO_SPENDING_SCORE;
    }
    match coefficient_of_variation(&expenses) {
        Some(cv) => VOLATILITY_CURVE.evaluate(cv * 100.0),
        None => NO_SPENDING_SCORE,
    }
}

pub fn recommendations(sub_scores: &SubScores, composite: f64) -> Vec<Recommendation> {
    let mut out: Vec<Recommendation> = sub_scores
        .ordered()
        .iter()
        .filter(|(score, _)| *score < WEAK_THRESHOLD)
        .take(MAX_TAILORED_RECOMMENDATIONS)
        .map(|(score, advice)| advice.recommend(*score < URGENT_THRESHOLD))
        .collect();

    if out.is_empty() && composite >= ENCOURAGEMENT_THRESHOLD {
        out.push(Recommendation::new(
            ScoreComponent::General,
            RecommendationPriority::Low,
            "Keep it up",
            "Your finances are in great shape. Keep saving consistently and review your goals periodically.",
        ));
    }

    if out.is_empty() {
        out.push(Recommendation::new(
            ScoreComponent::General,
            RecommendationPriority::Low,
            "Get started",
            "Keep recording your income, expenses and goals so your financial picture becomes clearer each month.",
        ));
    }

    out.truncate(MAX_RECOMMENDATIONS);
    out
}

/// Tailored wording for one weak component: an urgent and a moderate tier.
struct Advice {
    component: ScoreComponent,
    urgent: (&'static str, &'static str),
    moderate: (&'static str, &'static str),
}

impl Advice {
    fn recommend(&self, urgent: bool) -> Recommendation {
        let (priority, (title, message)) = if urgent {
            (RecommendationPriority::High, self.urgent)
        } else {
            (RecommendationPriority::Medium, self.moderate)
        };
        Recommendation::new(self.component, priority, title, message)
    }
}

const SAVINGS_ADVICE: Advice = Advice {
    component: ScoreComponent::Savings,
    urgent: (
        "Stop spending more than you earn",
        "Your expenses are consuming almost all of your income. Cut non-essential spending and set aside a fixed amount as soon as income arrives.",
    ),
    moderate: (
        "Raise your savings rate",
        "Try to save at least 10-20% of your net income. Automating a transfer on payday makes it easier.",
    ),
};

const DEBT_ADVICE: Advice = Advice {
    component: ScoreComponent::Debt,
    urgent: (
        "Reduce fixed obligations urgently",
        "Fixed expenses and bills take most of your income. Renegotiate or cancel recurring commitments before taking on new ones.",
    ),
    moderate: (
        "Review recurring commitments",
        "Fixed obligations are above a comfortable share of your income. Look for subscriptions and bills you can lower.",
    ),
};

const GOAL_ADVICE: Advice = Advice {
    component: ScoreComponent::Goals,
    urgent: (
        "Start funding your goals",
        "Your goals have barely progressed. Contribute a small fixed amount every month, even if it is modest.",
    ),
    moderate: (
        "Speed up goal contributions",
        "Your goals are moving slowly. Increase monthly contributions or revisit targets and deadlines.",
    ),
};

const BUDGET_ADVICE: Advice = Advice {
    component: ScoreComponent::Budget,
    urgent: (
        "Stabilize your spending",
        "Your monthly spending swings widely. Build a monthly budget and track it weekly to avoid surprises.",
    ),
    moderate: (
        "Smooth out monthly spending",
        "Your spending varies from month to month. Spread large purchases and plan irregular expenses ahead.",
    ),
};
