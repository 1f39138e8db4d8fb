use crate::schema::InstallmentPlan;
use crate::utils::{months_between, Month};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstallmentContribution {
    pub month: Month,
    pub amount: f64,
    /// 1-based position of the installment within the plan.
    pub installment_number: i32,
}

/// Expands installment plans into their monthly contributions.
pub struct InstallmentAmortizer;

impl InstallmentAmortizer {
    /// One contribution per installment, in month order starting at `start_month`.
    /// Plans with no positive installment count contribute nothing, and a plan
    /// running past the calendar's last month stops there.
    pub fn schedule(plan: &InstallmentPlan) -> Vec<InstallmentContribution> {
        if plan.total_installments <= 0 {
            return Vec::new();
        }

        (0..plan.total_installments)
            .map_while(|index| {
                plan.start_month
                    .checked_offset(index)
                    .map(|month| InstallmentContribution {
                        month,
                        amount: plan.per_installment_amount,
                        installment_number: index + 1,
                    })
            })
            .collect()
    }

    pub fn amount_in(plan: &InstallmentPlan, month: Month) -> f64 {
        match Self::end_month(plan) {
            Some(end) if month >= plan.start_month && month <= end => plan.per_installment_amount,
            _ => 0.0,
        }
    }

    /// Last month with a contribution, capped at [`Month::latest`].
    pub fn end_month(plan: &InstallmentPlan) -> Option<Month> {
        if plan.total_installments <= 0 {
            return None;
        }
        Some(
            plan.start_month
                .checked_offset(plan.total_installments - 1)
                .unwrap_or_else(Month::latest),
        )
    }

    /// Installments still due strictly after `as_of`.
    pub fn remaining_installments(plan: &InstallmentPlan, as_of: Month) -> i32 {
        let Some(end) = Self::end_month(plan) else {
            return 0;
        };
        if as_of >= end {
            0
        } else if as_of < plan.start_month {
            months_between(plan.start_month, end) + 1
        } else {
            months_between(as_of, end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AccountId;

    fn month(year: i32, month: u32) -> Month {
        Month::new(year, month).unwrap()
    }

    fn plan(amount: f64, installments: i32, start: Month) -> InstallmentPlan {
        InstallmentPlan {
            account_id: AccountId::new(),
            per_installment_amount: amount,
            total_installments: installments,
            start_month: start,
            total_amount: None,
            description: None,
        }
    }

    #[test]
    fn test_three_installments_cover_three_months() {
        let plan = plan(200.0, 3, month(2024, 1));
        let schedule = InstallmentAmortizer::schedule(&plan);

        let months: Vec<Month> = schedule.iter().map(|c| c.month).collect();
        assert_eq!(months, vec![month(2024, 1), month(2024, 2), month(2024, 3)]);
        assert!(schedule.iter().all(|c| c.amount == 200.0));
        assert_eq!(schedule[2].installment_number, 3);

        assert_eq!(InstallmentAmortizer::amount_in(&plan, month(2024, 3)), 200.0);
        assert_eq!(InstallmentAmortizer::amount_in(&plan, month(2024, 4)), 0.0);
        assert_eq!(InstallmentAmortizer::amount_in(&plan, month(2023, 12)), 0.0);
    }

    #[test]
    fn test_non_positive_installments_contribute_nothing() {
        assert!(InstallmentAmortizer::schedule(&plan(100.0, 0, month(2024, 1))).is_empty());
        assert!(InstallmentAmortizer::schedule(&plan(100.0, -2, month(2024, 1))).is_empty());
        assert_eq!(InstallmentAmortizer::end_month(&plan(100.0, 0, month(2024, 1))), None);
    }

    #[test]
    fn test_schedule_crosses_year_boundary() {
        let plan = plan(50.0, 4, month(2023, 11));
        assert_eq!(InstallmentAmortizer::end_month(&plan), Some(month(2024, 2)));
        assert_eq!(
            InstallmentAmortizer::remaining_installments(&plan, month(2023, 12)),
            2
        );
    }

    #[test]
    fn test_installment_amount_is_not_derived_from_total() {
        let mut plan = plan(333.33, 3, month(2024, 5));
        plan.total_amount = Some(1000.0);
        let total: f64 = InstallmentAmortizer::schedule(&plan)
            .iter()
            .map(|c| c.amount)
            .sum();
        assert!((total - 999.99).abs() < 1e-9);
    }

    #[test]
    fn test_schedule_is_deterministic() {
        let plan = plan(120.0, 6, month(2024, 9));
        assert_eq!(
            InstallmentAmortizer::schedule(&plan),
            InstallmentAmortizer::schedule(&plan)
        );
    }

    #[test]
    fn test_schedule_stops_at_calendar_end() {
        let start = Month::latest().offset(-1);
        let plan = plan(100.0, 5, start);
        let schedule = InstallmentAmortizer::schedule(&plan);

        let months: Vec<Month> = schedule.iter().map(|c| c.month).collect();
        assert_eq!(months, vec![start, Month::latest()]);
        assert_eq!(InstallmentAmortizer::end_month(&plan), Some(Month::latest()));
        assert_eq!(InstallmentAmortizer::remaining_installments(&plan, start), 1);
    }

    #[test]
    fn test_huge_plan_is_answered_without_expanding() {
        let plan = plan(10.0, i32::MAX, month(2024, 1));
        assert_eq!(InstallmentAmortizer::end_month(&plan), Some(Month::latest()));
        assert_eq!(InstallmentAmortizer::amount_in(&plan, month(3024, 7)), 10.0);
        assert_eq!(
            InstallmentAmortizer::remaining_installments(&plan, Month::latest().offset(-3)),
            3
        );
    }
}
