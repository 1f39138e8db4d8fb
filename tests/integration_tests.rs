use anyhow::Result;
use chrono::{NaiveDate, TimeZone, Utc};
use ledger_insights::*;
use rand::seq::SliceRandom;
use std::sync::Arc;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn month(y: i32, m: u32) -> Month {
    Month::new(y, m).unwrap()
}

fn income(account: AccountId, on: NaiveDate, net: f64) -> LedgerEntry {
    LedgerEntry::Income(Income {
        account_id: account,
        date: on,
        gross_amount: net * 1.2,
        net_amount: net,
        tax_amount: net * 0.2,
        description: None,
    })
}

fn spend(account: AccountId, on: NaiveDate, amount: f64, category: &str) -> LedgerEntry {
    LedgerEntry::VariableExpense(VariableExpense {
        account_id: account,
        amount,
        created_at: Utc
            .from_utc_datetime(&on.and_hms_opt(18, 30, 0).unwrap()),
        category: category.to_string(),
        active: true,
        description: None,
    })
}

fn fixed(account: AccountId, amount: f64) -> LedgerEntry {
    LedgerEntry::FixedExpense(FixedExpense {
        account_id: account,
        amount,
        active: true,
        description: None,
    })
}

fn bill(account: AccountId, due: NaiveDate, amount: f64) -> LedgerEntry {
    LedgerEntry::Bill(Bill {
        account_id: account,
        amount,
        due_date: due,
        description: None,
    })
}

fn installments(account: AccountId, amount: f64, count: i32, start: Month) -> LedgerEntry {
    LedgerEntry::InstallmentPlan(InstallmentPlan {
        account_id: account,
        per_installment_amount: amount,
        total_installments: count,
        start_month: start,
        total_amount: Some(amount * count as f64),
        description: Some("Laptop".to_string()),
    })
}

/// A year of household activity for one account, plus noise on another account.
fn household_year(account: AccountId, other: AccountId) -> Vec<LedgerEntry> {
    let mut entries = vec![
        fixed(account, 1200.0),
        fixed(other, 9999.0),
        installments(account, 250.0, 4, month(2024, 11)),
    ];
    for m in 1..=12 {
        entries.push(income(account, date(2024, m, 5), 4000.0 + m as f64 * 100.0));
        entries.push(spend(account, date(2024, m, 10), 300.0 + m as f64 * 10.0, "Groceries"));
        entries.push(spend(account, date(2024, m, 20), 80.0, "Transport"));
        entries.push(bill(account, date(2024, m, 15), 150.0));
        entries.push(income(other, date(2024, m, 6), 1_000_000.0));
    }
    entries
}

fn engine(entries: Vec<LedgerEntry>, settings: RawSettings, today: NaiveDate) -> ReportingEngine {
    ReportingEngine::new(
        Arc::new(LedgerSnapshot::from_entries(entries)),
        Arc::new(StaticSettingsStore::new(settings)),
        Arc::new(FixedClock::on(today)),
    )
}

#[test]
fn test_year_of_summaries_is_internally_consistent() -> Result<()> {
    let account = AccountId::new();
    let other = AccountId::new();
    let engine = engine(
        household_year(account, other),
        RawSettings::default(),
        date(2024, 12, 31),
    );
    let accounts: AccountSet = [account].into_iter().collect();

    let summaries = engine.summaries_for_period(&accounts, "2024-01:2024-12")?;
    assert_eq!(summaries.len(), 12);

    for (idx, summary) in summaries.iter().enumerate() {
        assert_eq!(summary.month, month(2024, idx as u32 + 1));

        let components = summary.fixed_expenses
            + summary.variable_expenses
            + summary.card_expenses
            + summary.bill_expenses;
        assert!((components - summary.total_expenses).abs() < 1e-9);
        assert!((summary.net_income - summary.total_expenses - summary.balance).abs() < 1e-9);

        // the other account never leaks in
        assert!(summary.net_income < 10_000.0);
        assert_eq!(summary.fixed_expenses, 1200.0);
    }

    assert_eq!(summaries[9].card_expenses, 0.0);
    assert_eq!(summaries[10].card_expenses, 250.0);
    assert_eq!(summaries[11].card_expenses, 250.0);

    let january = &summaries[0];
    assert!((january.net_income - 4100.0).abs() < 1e-9);
    assert!((january.variable_expenses - 390.0).abs() < 1e-9);
    assert!((january.total_expenses - 1740.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_empty_account_set_yields_zero_months() -> Result<()> {
    let account = AccountId::new();
    let engine = engine(
        household_year(account, AccountId::new()),
        RawSettings::default(),
        date(2024, 6, 1),
    );

    let summaries = engine.monthly_summaries(&AccountSet::new(), month(2024, 3), month(2024, 3))?;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0], MonthlySummary::empty(month(2024, 3)));

    assert!(engine
        .category_breakdown(&AccountSet::new(), 2024, 3)?
        .is_none());
    Ok(())
}

#[test]
fn test_installments_span_plan_months_only() -> Result<()> {
    let account = AccountId::new();
    let engine = engine(
        vec![installments(account, 200.0, 3, month(2024, 1))],
        RawSettings::default(),
        date(2024, 6, 1),
    );
    let accounts: AccountSet = [account].into_iter().collect();

    let cards: Vec<f64> = engine
        .summaries_for_period(&accounts, "2023-12:2024-04")?
        .iter()
        .map(|s| s.card_expenses)
        .collect();
    assert_eq!(cards, vec![0.0, 200.0, 200.0, 200.0, 0.0]);
    Ok(())
}

#[test]
fn test_trend_order_ignores_source_order() -> Result<()> {
    let account = AccountId::new();
    let mut entries = household_year(account, AccountId::new());
    let mut rng = rand::thread_rng();

    let accounts: AccountSet = [account].into_iter().collect();
    let baseline = engine(entries.clone(), RawSettings::default(), date(2024, 12, 15))
        .trend(&accounts, 12)?;

    for _ in 0..5 {
        entries.shuffle(&mut rng);
        let trend = engine(entries.clone(), RawSettings::default(), date(2024, 12, 15))
            .trend(&accounts, 12)?;

        assert_eq!(trend.len(), 12);
        assert!(trend.windows(2).all(|w| w[0].month < w[1].month));
        assert_eq!(trend, baseline);
    }

    let short = engine(entries, RawSettings::default(), date(2024, 12, 15));
    assert!(short.trend(&accounts, 0)?.is_empty());
    assert!(short.trend(&accounts, -1)?.is_empty());
    Ok(())
}

#[test]
fn test_month_comparison_against_previous_month() -> Result<()> {
    let account = AccountId::new();
    let entries = vec![
        income(account, date(2024, 4, 1), 5000.0),
        income(account, date(2024, 5, 1), 6000.0),
    ];
    let accounts: AccountSet = [account].into_iter().collect();

    let comparison = engine(entries.clone(), RawSettings::default(), date(2024, 5, 20))
        .compare_months(&accounts, 2024, 5)?;
    assert!(comparison.has_previous_month);
    assert!((comparison.income_change.amount - 1000.0).abs() < 1e-9);
    assert!((comparison.income_change.percent - 20.0).abs() < 1e-9);

    let fresh_start = RawSettings {
        record_start_date: Some(date(2024, 5, 1)),
        ..RawSettings::default()
    };
    let comparison = engine(entries, fresh_start, date(2024, 5, 20))
        .compare_months(&accounts, 2024, 5)?;
    assert!(!comparison.has_previous_month);
    assert_eq!(comparison.income_change, Change::default());
    assert_eq!(comparison.previous, MonthlySummary::empty(month(2024, 4)));
    Ok(())
}

#[test]
fn test_comparison_from_zero_income() -> Result<()> {
    let account = AccountId::new();
    let accounts: AccountSet = [account].into_iter().collect();
    let comparison = engine(
        vec![income(account, date(2024, 2, 1), 5000.0)],
        RawSettings::default(),
        date(2024, 2, 20),
    )
    .compare_months(&accounts, 2024, 2)?;

    assert!((comparison.income_change.amount - 5000.0).abs() < 1e-9);
    assert!((comparison.income_change.percent - 100.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_category_breakdown_shares() -> Result<()> {
    let account = AccountId::new();
    let entries = vec![
        spend(account, date(2024, 7, 2), 1000.0, "Housing"),
        spend(account, date(2024, 7, 3), 500.0, "Food"),
        spend(account, date(2024, 7, 4), 300.0, "Leisure"),
        spend(account, date(2024, 7, 5), 75.0, "   "),
        spend(account, date(2024, 8, 1), 999.0, "Housing"),
    ];
    let accounts: AccountSet = [account].into_iter().collect();

    let shares = engine(entries, RawSettings::default(), date(2024, 7, 31))
        .category_breakdown(&accounts, 2024, 7)?
        .unwrap_or_default();

    assert_eq!(shares.len(), 3);
    assert_eq!(shares[0].category, "Housing");
    let total: f64 = shares.iter().map(|s| s.percentage).sum();
    assert!((total - 100.0).abs() < 0.01);
    for share in &shares {
        assert!((share.percentage - share.amount / 1800.0 * 100.0).abs() < 1e-9);
        assert_eq!(share.expense_count, 1);
    }
    Ok(())
}

#[test]
fn test_budget_usage_uses_configured_threshold() -> Result<()> {
    let account = AccountId::new();
    let entries = vec![
        income(account, date(2024, 9, 1), 4000.0),
        spend(account, date(2024, 9, 8), 3000.0, "Travel"),
    ];
    let accounts: AccountSet = [account].into_iter().collect();

    let lenient = RawSettings {
        budget_warning_threshold: 90.0,
        ..RawSettings::default()
    };
    let usage = engine(entries.clone(), lenient, date(2024, 9, 30))
        .budget_usage(&accounts, 2024, 9)?;
    assert!((usage.usage_percent - 75.0).abs() < 1e-9);
    assert!(!usage.exceeded);

    let strict = RawSettings {
        budget_warning_threshold: 70.0,
        ..RawSettings::default()
    };
    let usage = engine(entries, strict, date(2024, 9, 30)).budget_usage(&accounts, 2024, 9)?;
    assert!(usage.exceeded);
    assert_eq!(usage.warning_threshold, 70.0);
    Ok(())
}

#[test]
fn test_health_score_for_household() -> Result<()> {
    let account = AccountId::new();
    let engine = engine(
        household_year(account, AccountId::new()),
        RawSettings::default(),
        date(2024, 12, 20),
    );
    let accounts: AccountSet = [account].into_iter().collect();
    let goals = vec![
        Goal {
            id: Uuid::new_v4(),
            name: "Emergency fund".to_string(),
            target_amount: 10_000.0,
            current_amount: 6_500.0,
            active: true,
        },
        Goal {
            id: Uuid::new_v4(),
            name: "Abandoned".to_string(),
            target_amount: 0.0,
            current_amount: 0.0,
            active: true,
        },
    ];

    let mut history = HealthScoreHistory::new();
    let score = history.record(engine.health_score(&accounts, &goals)?).clone();

    for sub in [
        score.sub_scores.savings,
        score.sub_scores.debt,
        score.sub_scores.goals,
        score.sub_scores.budget,
    ] {
        assert!((0.0..=100.0).contains(&sub));
    }
    assert!((score.sub_scores.goals - 85.0).abs() < 1e-9);
    assert!((score.composite_score - score.sub_scores.composite()).abs() < 1e-9);
    assert!(score.recommendations.len() <= 4);
    assert_eq!(score.reference_month, month(2024, 12));
    assert_eq!(history.latest().map(|s| s.id), Some(score.id));

    let json = serde_json::to_string(&score)?;
    let parsed: HealthScore = serde_json::from_str(&json)?;
    assert_eq!(parsed.reference_month, score.reference_month);
    Ok(())
}

#[test]
fn test_health_without_data_is_neutral() -> Result<()> {
    let engine = engine(Vec::new(), RawSettings::default(), date(2024, 4, 2));
    let score = engine.health_score(&AccountSet::new(), &[])?;

    assert_eq!(score.sub_scores.goals, 50.0);
    assert_eq!(score.sub_scores.savings, 0.0);
    assert_eq!(score.sub_scores.debt, 100.0);
    assert_eq!(score.sub_scores.budget, 90.0);
    Ok(())
}

#[test]
fn test_settings_file_drives_reports() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{"record_start_date": "2024-03-01", "budget_warning_threshold": 50.0}"#,
    )?;

    let account = AccountId::new();
    let engine = ReportingEngine::new(
        Arc::new(LedgerSnapshot::from_entries(household_year(
            account,
            AccountId::new(),
        ))),
        Arc::new(JsonFileSettingsStore::new(&path)),
        Arc::new(FixedClock::on(date(2024, 3, 15))),
    );
    let accounts: AccountSet = [account].into_iter().collect();

    let comparison = engine.compare_months(&accounts, 2024, 3)?;
    assert!(!comparison.has_previous_month);

    let usage = engine.budget_usage(&accounts, 2024, 3)?;
    assert_eq!(usage.warning_threshold, 50.0);

    let score = engine.health_score(&accounts, &[])?;
    assert_eq!(score.sub_scores.budget, 85.0);
    assert_eq!(engine.settings().refresh_count(), 1);
    Ok(())
}
