#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn make_expense(kind: ExpenseKind) -> Expense {
    Expense::new(
        "Internet".into(),
        dec!(99.90),
        kind,
        Scope::Personal,
        date("2024-01-10"),
    )
}

// ── Expense ───────────────────────────────────────────────────

#[test]
fn test_expense_new_defaults() {
    let e = make_expense(ExpenseKind::Casual);
    assert!(!e.id.is_empty());
    assert!(!e.paid);
    assert!(!e.is_recurring);
    assert!(e.installment.is_none());
    assert_eq!(e.link, SeriesLink::Root);
    assert!(!e.created_at.is_empty());
}

#[test]
fn test_expense_ids_are_unique() {
    let a = make_expense(ExpenseKind::Casual);
    let b = make_expense(ExpenseKind::Casual);
    assert_ne!(a.id, b.id);
}

#[test]
fn test_root_id_of_root_is_self() {
    let e = make_expense(ExpenseKind::Monthly);
    assert_eq!(e.root_id(), e.id);
    assert!(e.is_root());
}

#[test]
fn test_spawn_member_links_to_parent() {
    let mut root = make_expense(ExpenseKind::Monthly);
    root.is_recurring = true;
    root.paid = true;
    let member = root.spawn_member(&root.id, date("2024-02-10"));

    assert_ne!(member.id, root.id);
    assert_eq!(member.root_id(), root.id);
    assert_eq!(member.date, date("2024-02-10"));
    assert!(!member.paid);
    assert!(!member.is_recurring);
    assert!(!member.is_monthly_root());
    assert_eq!(member.amount, root.amount);
    assert_eq!(member.title, root.title);
}

#[test]
fn test_is_monthly_root_requires_flag() {
    let mut e = make_expense(ExpenseKind::Monthly);
    assert!(!e.is_monthly_root());
    e.is_recurring = true;
    assert!(e.is_monthly_root());
}

#[test]
fn test_series_link_from_parent() {
    assert_eq!(SeriesLink::from_parent(None), SeriesLink::Root);
    let link = SeriesLink::from_parent(Some("abc".into()));
    assert_eq!(link.parent_id(), Some("abc"));
}

#[test]
fn test_installment_validity() {
    assert!(Installment { current: 1, total: 6 }.is_valid());
    assert!(Installment { current: 6, total: 6 }.is_valid());
    assert!(!Installment { current: 0, total: 6 }.is_valid());
    assert!(!Installment { current: 7, total: 6 }.is_valid());
    assert!(!Installment { current: 0, total: 0 }.is_valid());
}

#[test]
fn test_installment_remaining() {
    assert_eq!(Installment { current: 2, total: 6 }.remaining(), 4);
    assert_eq!(Installment { current: 6, total: 6 }.remaining(), 0);
}

#[test]
fn test_changes_without_date() {
    let changes = ExpenseChanges {
        amount: Some(dec!(10)),
        date: Some(date("2024-05-01")),
        ..Default::default()
    };
    let cascaded = changes.without_date();
    assert_eq!(cascaded.amount, Some(dec!(10)));
    assert!(cascaded.date.is_none());
    assert!(!cascaded.is_empty());
    assert!(ExpenseChanges::default().is_empty());
}

// ── Enums ─────────────────────────────────────────────────────

#[test]
fn test_kind_roundtrip() {
    for k in ExpenseKind::all() {
        assert_eq!(ExpenseKind::parse(k.as_str()), Some(*k));
    }
    assert_eq!(ExpenseKind::parse("MENSAL"), Some(ExpenseKind::Monthly));
    assert_eq!(ExpenseKind::parse("weekly"), None);
}

#[test]
fn test_scope_parse() {
    assert_eq!(Scope::parse("personal"), Some(Scope::Personal));
    assert_eq!(Scope::parse("Empresa"), Some(Scope::Company));
    assert_eq!(Scope::parse("other"), None);
    assert_eq!(format!("{}", Scope::Company), "company");
}

#[test]
fn test_plan_display_and_parse() {
    assert_eq!(Plan::parse("FLUT"), Some(Plan::Flut));
    assert_eq!(Plan::parse("flix"), Some(Plan::Flix));
    assert_eq!(Plan::parse("netflix"), None);
    assert_eq!(format!("{}", Plan::Flix), "FLIX");
}

#[test]
fn test_flow_kind_parse() {
    assert_eq!(FlowKind::parse("entrada"), Some(FlowKind::Inflow));
    assert_eq!(FlowKind::parse("saída"), Some(FlowKind::Outflow));
    assert_eq!(FlowKind::parse("out"), Some(FlowKind::Outflow));
    assert_eq!(FlowKind::Inflow.as_str(), "entrada");
}

// ── Subscription ──────────────────────────────────────────────

#[test]
fn test_subscription_new_normalizes_month() {
    let sub = Subscription::new(Plan::Flut, "Acme".into(), dec!(150), date("2024-03-17"));
    assert_eq!(sub.month, date("2024-03-01"));
}

#[test]
fn test_subscription_schedule_twelve_months() {
    let sub = Subscription::new(Plan::Flix, "Acme".into(), dec!(150), date("2024-11-01"));
    let rows = sub.schedule(12);
    assert_eq!(rows.len(), 12);
    assert_eq!(rows[0].month, date("2024-11-01"));
    assert_eq!(rows[1].month, date("2024-12-01"));
    assert_eq!(rows[2].month, date("2025-01-01"));
    assert_eq!(rows[11].month, date("2025-10-01"));
    assert!(rows.iter().all(|r| r.client_name == "Acme"));
}

// ── Project ───────────────────────────────────────────────────

#[test]
fn test_project_starts_pending() {
    let p = Project::new("Site".into(), "Acme".into(), "Ana".into(), dec!(5000));
    assert_eq!(p.status, ProjectStatus::Pending);
    assert!(p.rejection_reasons.is_empty());
}

#[test]
fn test_project_reject_requires_reason() {
    let mut p = Project::new("Site".into(), "Acme".into(), "Ana".into(), dec!(5000));
    assert!(p.reject(vec![], "no".into()).is_err());
    assert!(p.reject(vec!["  ".into()], String::new()).is_err());
    assert_eq!(p.status, ProjectStatus::Pending);
}

#[test]
fn test_project_reject_then_approve_clears_reasons() {
    let mut p = Project::new("Site".into(), "Acme".into(), "Ana".into(), dec!(5000));
    p.reject(
        vec![PREDEFINED_REJECTION_REASONS[0].into()],
        "too expensive".into(),
    )
    .unwrap();
    assert_eq!(p.status, ProjectStatus::Rejected);
    assert_eq!(p.rejection_reasons.len(), 1);

    p.set_status(ProjectStatus::Approved).unwrap();
    assert_eq!(p.status, ProjectStatus::Approved);
    assert!(p.rejection_reasons.is_empty());
    assert!(p.rejection_observations.is_empty());
}

#[test]
fn test_project_set_status_rejected_is_refused() {
    let mut p = Project::new("Site".into(), "Acme".into(), "Ana".into(), dec!(5000));
    assert!(p.set_status(ProjectStatus::Rejected).is_err());
}

#[test]
fn test_project_filter() {
    let mut a = Project::new("A".into(), "Acme Corp".into(), "Ana".into(), dec!(1));
    a.set_status(ProjectStatus::Approved).unwrap();
    let b = Project::new("B".into(), "Globex".into(), "Bruno".into(), dec!(2));

    let by_client = ProjectFilter {
        client: Some("acme".into()),
        ..Default::default()
    };
    assert!(a.matches(&by_client));
    assert!(!b.matches(&by_client));

    let pending = ProjectFilter {
        status: Some(ProjectStatus::Pending),
        ..Default::default()
    };
    assert!(!a.matches(&pending));
    assert!(b.matches(&pending));
    assert!(b.matches(&ProjectFilter::default()));
}

#[test]
fn test_project_stats() {
    let mut a = Project::new("A".into(), "C".into(), "R".into(), dec!(100));
    a.set_status(ProjectStatus::Approved).unwrap();
    let b = Project::new("B".into(), "C".into(), "R".into(), dec!(250.50));
    let mut c = Project::new("C".into(), "C".into(), "R".into(), dec!(10));
    c.reject(vec!["Prazo inviável".into()], String::new()).unwrap();

    let stats = ProjectStats::from_projects(&[a, b, c]);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.approved, 1);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.total_value, dec!(360.50));
}

// ── Cash flow ─────────────────────────────────────────────────

#[test]
fn test_cash_flow_entry_month() {
    let e = CashFlowEntry::new(FlowKind::Inflow, dec!(10), "Sale".into(), date("2024-07-23"));
    assert_eq!(e.month, date("2024-07-01"));
}

#[test]
fn test_cash_flow_totals_and_balance() {
    let entries = vec![
        CashFlowEntry::new(FlowKind::Inflow, dec!(1000), "Sale".into(), date("2024-07-01")),
        CashFlowEntry::new(FlowKind::Inflow, dec!(250), "Sale".into(), date("2024-07-02")),
        CashFlowEntry::new(FlowKind::Outflow, dec!(400.25), "Rent".into(), date("2024-07-05")),
    ];
    let totals = CashFlowTotals::from_entries(&entries);
    assert_eq!(totals.inflow, dec!(1250));
    assert_eq!(totals.outflow, dec!(400.25));
    assert_eq!(totals.balance(), dec!(849.75));
}

#[test]
fn test_cash_flow_totals_empty() {
    let totals = CashFlowTotals::from_entries(&[]);
    assert_eq!(totals.balance(), Decimal::ZERO);
}
