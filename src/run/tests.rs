#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use super::*;
use crate::models::{CashFlowTotals, ExpenseKind, Plan, ProjectStatus, PREDEFINED_REJECTION_REASONS};
use crate::notify::RecordingSink;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

struct Harness {
    db: Database,
    config: Config,
    sink: RecordingSink,
}

impl Harness {
    fn new() -> Self {
        Self {
            db: Database::open_in_memory().unwrap(),
            config: Config::default(),
            sink: RecordingSink::default(),
        }
    }

    /// Run one command; returns the command result and whether it failed.
    fn run(&mut self, today: &str, argv: &[&str]) -> (Result<()>, bool) {
        let args: Vec<String> = std::iter::once("cashbook")
            .chain(argv.iter().copied())
            .map(String::from)
            .collect();
        let mut session = Session::new(&mut self.db, &self.config, d(today), &mut self.sink);
        let result = as_cli(&args, &mut session);
        (result, session.failed)
    }

    fn last(&self) -> &Notice {
        self.sink.notices.last().unwrap()
    }
}

// ── Helpers ───────────────────────────────────────────────────

#[test]
fn test_flag_helpers() {
    let args: Vec<String> = ["casual", "--title", "Lunch", "--reason", "a", "--reason", "b"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(positional(&args), Some("casual"));
    assert_eq!(flag(&args, "--title"), Some("Lunch"));
    assert_eq!(flag(&args, "--amount"), None);
    assert_eq!(flag_all(&args, "--reason"), vec!["a", "b"]);
    assert!(has_flag(&args, "--title"));
    assert!(required(&args, "--amount").is_err());
}

#[test]
fn test_parse_flag_rejects_bad_number() {
    let args = vec!["--day".to_string(), "x".to_string()];
    assert!(parse_flag::<u32>(&args, "--day").is_err());
    assert_eq!(parse_flag::<u32>(&args, "--months").unwrap(), None);
}

#[test]
fn test_unique_id() {
    assert!(matches!(unique_id(vec![], "ab"), Err(IdLookup::Missing)));
    assert_eq!(unique_id(vec!["abc".into()], "ab").ok(), Some("abc".to_string()));
    assert!(matches!(
        unique_id(vec!["abc".into(), "abd".into()], "ab"),
        Err(IdLookup::Ambiguous)
    ));
}

// ── Expenses ──────────────────────────────────────────────────

#[test]
fn test_add_monthly_creates_series_and_one_notice() {
    let mut h = Harness::new();
    let (result, failed) = h.run(
        "2024-01-01",
        &["add", "monthly", "--title", "Aluguel", "--amount", "1.500,00"],
    );
    result.unwrap();
    assert!(!failed);
    assert_eq!(h.sink.notices.len(), 1);
    assert_eq!(h.last().severity, Severity::Success);

    let rows = h.db.get_expenses(Scope::Personal, None).unwrap();
    assert_eq!(rows.len(), 13);
    assert!(rows.iter().all(|e| e.amount == dec!(1500)));
}

#[test]
fn test_replicate_reports_up_to_date_as_info() {
    let mut h = Harness::new();
    h.run(
        "2024-01-01",
        &["add", "monthly", "--title", "Internet", "--amount", "99.90", "--months", "3"],
    )
    .0
    .unwrap();
    let root = h
        .db
        .get_expenses(Scope::Personal, None)
        .unwrap()
        .into_iter()
        .find(|e| e.is_monthly_root())
        .unwrap();
    let prefix = &root.id[..8];

    h.run("2024-01-15", &["replicate", prefix]).0.unwrap();
    assert_eq!(h.last().severity, Severity::Success);
    assert!(h.last().description.starts_with("9 created"));

    let (result, failed) = h.run("2024-01-15", &["replicate", prefix]);
    result.unwrap();
    assert!(!failed);
    assert_eq!(h.last().severity, Severity::Info);
    assert_eq!(h.sink.notices.len(), 3);
}

#[test]
fn test_add_installment_without_total_fails_before_store() {
    let mut h = Harness::new();
    let (result, failed) = h.run(
        "2024-01-01",
        &["add", "installment", "--title", "Sofa", "--amount", "250"],
    );
    result.unwrap();
    assert!(failed);
    assert_eq!(h.sink.notices.len(), 1);
    assert_eq!(h.last().severity, Severity::Error);
    assert!(h.db.get_expenses(Scope::Personal, None).unwrap().is_empty());
}

#[test]
fn test_add_installment_then_delete_from_third() {
    let mut h = Harness::new();
    h.run(
        "2024-01-01",
        &[
            "add", "installment", "--title", "Notebook", "--amount", "500", "--total", "6",
            "--date", "2024-01-10",
        ],
    )
    .0
    .unwrap();
    let third = h
        .db
        .get_expenses(Scope::Personal, None)
        .unwrap()
        .into_iter()
        .find(|e| e.title == "Notebook (3/6)")
        .unwrap();

    h.run("2024-01-01", &["delete", &third.id]).0.unwrap();
    assert_eq!(h.last().description, "4 row(s) removed");
    assert_eq!(h.db.get_expenses(Scope::Personal, None).unwrap().len(), 2);
}

#[test]
fn test_delete_unknown_id_is_error_notice() {
    let mut h = Harness::new();
    let (result, failed) = h.run("2024-01-01", &["delete", "deadbeef"]);
    result.unwrap();
    assert!(failed);
    assert_eq!(h.last().severity, Severity::Error);
    assert!(h.last().description.contains("deadbeef"));
}

#[test]
fn test_update_without_changes_is_error_notice() {
    let mut h = Harness::new();
    h.run(
        "2024-01-01",
        &["add", "casual", "--title", "Lunch", "--amount", "35"],
    )
    .0
    .unwrap();
    let id = h.db.get_expenses(Scope::Personal, None).unwrap()[0].id.clone();

    let (_, failed) = h.run("2024-01-01", &["update", &id]);
    assert!(failed);
    assert_eq!(h.last().description, "nothing to update");

    let (_, failed) = h.run("2024-01-01", &["update", &id, "--amount", "40"]);
    assert!(!failed);
    let row = h.db.get_expenses(Scope::Personal, None).unwrap().remove(0);
    assert_eq!(row.amount, dec!(40));
    assert_eq!(row.kind, ExpenseKind::Casual);
}

#[test]
fn test_pay_and_unpay_future() {
    let mut h = Harness::new();
    h.run(
        "2024-01-01",
        &["add", "monthly", "--title", "Gym", "--amount", "120", "--months", "2"],
    )
    .0
    .unwrap();
    for e in h.db.get_expenses(Scope::Personal, None).unwrap() {
        h.run("2024-01-01", &["pay", &e.id]).0.unwrap();
    }
    assert!(h
        .db
        .get_expenses(Scope::Personal, None)
        .unwrap()
        .iter()
        .all(|e| e.paid));

    h.run("2024-02-01", &["unpay-future"]).0.unwrap();
    assert_eq!(h.last().description, "2 row(s) from 2024-02-01 on");
    let paid: Vec<bool> = h
        .db
        .get_expenses(Scope::Personal, None)
        .unwrap()
        .iter()
        .map(|e| e.paid)
        .collect();
    assert_eq!(paid, vec![true, false, false]);
}

#[test]
fn test_backfill_second_run_is_info() {
    let mut h = Harness::new();
    h.run("2024-01-01", &["backfill"]).0.unwrap();
    assert_eq!(h.last().severity, Severity::Info);
    h.run("2024-01-01", &["backfill", "--force"]).0.unwrap();
    assert_eq!(h.sink.notices.len(), 2);
}

#[test]
fn test_company_scope_is_separate() {
    let mut h = Harness::new();
    h.run(
        "2024-01-01",
        &["add", "casual", "--title", "Hosting", "--amount", "80", "--scope", "empresa"],
    )
    .0
    .unwrap();
    assert!(h.db.get_expenses(Scope::Personal, None).unwrap().is_empty());
    assert_eq!(h.db.get_expenses(Scope::Company, None).unwrap().len(), 1);
}

#[test]
fn test_bad_arguments_are_errors_not_notices() {
    let mut h = Harness::new();
    assert!(h.run("2024-01-01", &["add", "casual", "--title", "X"]).0.is_err());
    assert!(h.run("2024-01-01", &["frobnicate"]).0.is_err());
    assert!(h.sink.notices.is_empty());
}

#[test]
fn test_export_writes_file() {
    let mut h = Harness::new();
    h.run(
        "2024-03-01",
        &["add", "casual", "--title", "Lunch", "--amount", "35"],
    )
    .0
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    h.run(
        "2024-03-01",
        &["export", path.to_str().unwrap(), "--month", "2024-03"],
    )
    .0
    .unwrap();
    assert_eq!(h.last().severity, Severity::Success);
    assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
}

// ── Records ───────────────────────────────────────────────────

#[test]
fn test_subscription_add_and_delete_from_month() {
    let mut h = Harness::new();
    h.run(
        "2024-01-20",
        &["sub", "add", "flut", "--client", "Ana", "--value", "120"],
    )
    .0
    .unwrap();
    assert_eq!(h.db.get_subscriptions(Plan::Flut, None).unwrap().len(), 12);

    h.run(
        "2024-01-20",
        &["sub", "delete", "flut", "--client", "Ana", "--from", "2024-07"],
    )
    .0
    .unwrap();
    assert_eq!(h.last().description, "6 month(s) of Ana from 2024-07");
    let left = h.db.get_subscriptions(Plan::Flut, None).unwrap();
    assert_eq!(left.len(), 6);
    assert!(left.iter().all(|s| s.month < d("2024-07-01")));
}

#[test]
fn test_project_reject_requires_reason() {
    let mut h = Harness::new();
    h.run(
        "2024-01-01",
        &[
            "project", "add", "--name", "Site", "--client", "ACME", "--responsible", "Lia",
            "--value", "10000",
        ],
    )
    .0
    .unwrap();
    let id = h.db.get_projects().unwrap()[0].id.clone();

    let (_, failed) = h.run("2024-01-01", &["project", "reject", &id]);
    assert!(failed);
    assert_eq!(h.db.get_projects().unwrap()[0].status, ProjectStatus::Pending);

    let (_, failed) = h.run(
        "2024-01-01",
        &["project", "reject", &id, "--reason", "1", "--obs", "too expensive"],
    );
    assert!(!failed);
    let project = h.db.get_projects().unwrap().remove(0);
    assert_eq!(project.status, ProjectStatus::Rejected);
    assert_eq!(project.rejection_reasons, vec![PREDEFINED_REJECTION_REASONS[0]]);

    h.run("2024-01-01", &["project", "approve", &id]).0.unwrap();
    let project = h.db.get_projects().unwrap().remove(0);
    assert_eq!(project.status, ProjectStatus::Approved);
    assert!(project.rejection_reasons.is_empty());
}

#[test]
fn test_cash_flow_add_and_balance() {
    let mut h = Harness::new();
    h.run(
        "2024-05-02",
        &["cash", "add", "in", "--title", "Invoice 12", "--amount", "3000"],
    )
    .0
    .unwrap();
    h.run(
        "2024-05-03",
        &["cash", "add", "out", "--title", "Rent", "--amount", "1200"],
    )
    .0
    .unwrap();

    let entries = h.db.get_cash_flow("2024-05").unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(CashFlowTotals::from_entries(&entries).balance(), dec!(1800));

    let rent = entries.iter().find(|e| e.title == "Rent").unwrap();
    h.run("2024-05-03", &["cash", "delete", &rent.id[..8]]).0.unwrap();
    assert_eq!(h.db.get_cash_flow("2024-05").unwrap().len(), 1);
}
