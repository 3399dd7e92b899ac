//! Recurring expense materializer.
//!
//! Expands monthly and installment templates into dated rows, tops up
//! missing future rows, and cascades edits/deletes through a series. Every
//! operation takes `today` explicitly and reports counts; turning those
//! counts into user feedback is the caller's job.

mod backfill;
mod casual;
mod dates;
mod installment;
mod monthly;

use anyhow::Result;
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;

use crate::models::{Expense, ExpenseChanges, ExpenseKind, Scope};

pub(crate) use backfill::{backfill_recurring, Backfill, BACKFILL_KEY};
pub(crate) use casual::create_casual;
pub(crate) use installment::create_installments;
pub(crate) use monthly::create_monthly_series;

/// Upper bound on months or installments generated for one series.
pub(crate) const MAX_SERIES_MONTHS: u32 = 600;

#[derive(Debug, thiserror::Error)]
pub(crate) enum SeriesError {
    #[error("{0}")]
    Validation(String),
    #[error("expense not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub(crate) type SeriesResult<T> = std::result::Result<T, SeriesError>;

/// Persistence primitives the materializer needs.
pub(crate) trait ExpenseStore {
    fn insert_expense(&mut self, expense: &Expense) -> Result<()>;
    /// Batch insert; a row whose (parent, date) pair already exists is
    /// skipped. Returns the number of rows written.
    fn insert_expenses(&mut self, expenses: &[Expense]) -> Result<usize>;
    fn get_expense(&self, id: &str) -> Result<Option<Expense>>;
    fn update_expense(&mut self, id: &str, changes: &ExpenseChanges) -> Result<usize>;
    fn update_members_from(
        &mut self,
        root_id: &str,
        from: NaiveDate,
        changes: &ExpenseChanges,
    ) -> Result<usize>;
    fn delete_expense(&mut self, id: &str) -> Result<usize>;
    fn delete_members_from(&mut self, root_id: &str, from: NaiveDate) -> Result<usize>;
    /// Members with `installment_current >= from_installment`, plus the root
    /// itself when `include_root`, in a single statement.
    fn delete_installments_from(
        &mut self,
        root_id: &str,
        from_installment: u32,
        include_root: bool,
    ) -> Result<usize>;
    /// Flag every remaining member of `root_id` as detached history.
    fn detach_members(&mut self, root_id: &str) -> Result<usize>;
    fn count_members(&self, root_id: &str) -> Result<usize>;
    fn member_dates_between(
        &self,
        root_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>>;
    /// Dates of rows carrying `base_title` (bare or numbered) and `amount`.
    fn installment_dates_between(
        &self,
        scope: Scope,
        base_title: &str,
        amount: Decimal,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>>;
    fn set_paid(&mut self, id: &str, paid: bool) -> Result<usize>;
    fn mark_unpaid_from(&mut self, scope: Scope, from: NaiveDate) -> Result<usize>;
    /// Monthly rows without a parent, flagged or not; detached history excluded.
    fn monthly_roots(&self) -> Result<Vec<Expense>>;
    fn set_recurring(&mut self, id: &str) -> Result<usize>;
}

/// Record of one-time maintenance jobs already applied to the store.
pub(crate) trait MaintenanceLog {
    fn maintenance_applied(&self, key: &str) -> Result<bool>;
    fn record_maintenance(&mut self, key: &str) -> Result<()>;
    fn clear_maintenance(&mut self, key: &str) -> Result<()>;
}

/// Result of a top-up. `created == 0` means the series was already complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Replication {
    pub created: usize,
    pub skipped: usize,
}

impl Replication {
    pub(crate) fn is_up_to_date(&self) -> bool {
        self.created == 0
    }
}

/// Row writes performed by an update, cascade included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Cascade {
    pub updated: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Removal {
    pub deleted: usize,
    /// The series anchor is gone along with the targeted rows.
    pub series_removed: bool,
}

fn load<S: ExpenseStore>(store: &S, id: &str) -> SeriesResult<Expense> {
    store
        .get_expense(id)?
        .ok_or_else(|| SeriesError::NotFound(id.to_string()))
}

fn title_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" \([0-9]+/[0-9]+\)$").unwrap_or_else(|_| unreachable!()))
}

/// Title with any trailing " (k/N)" installment counter removed.
pub(crate) fn base_title(title: &str) -> &str {
    match title_suffix().find(title) {
        Some(m) => &title[..m.start()],
        None => title,
    }
}

pub(crate) fn numbered_title(base: &str, current: u32, total: u32) -> String {
    format!("{base} ({current}/{total})")
}

// ── Dispatch by kind ──────────────────────────────────────────

/// Top up future rows of the series `id` belongs to.
pub(crate) fn replicate<S: ExpenseStore>(
    store: &mut S,
    id: &str,
    today: NaiveDate,
    window_months: u32,
) -> SeriesResult<Replication> {
    let target = load(store, id)?;
    match target.kind {
        ExpenseKind::Monthly => monthly::replicate(store, &target, today, window_months),
        ExpenseKind::Installment => installment::replicate(store, &target),
        ExpenseKind::Casual => Err(SeriesError::Validation(
            "casual expenses do not repeat".into(),
        )),
    }
}

pub(crate) fn update_expense<S: ExpenseStore>(
    store: &mut S,
    id: &str,
    changes: &ExpenseChanges,
    today: NaiveDate,
) -> SeriesResult<Cascade> {
    if changes.is_empty() {
        return Err(SeriesError::Validation("nothing to update".into()));
    }
    if changes.recurring_day.is_some_and(|d| !(1..=31).contains(&d)) {
        return Err(SeriesError::Validation(
            "recurring day must be between 1 and 31".into(),
        ));
    }
    let target = load(store, id)?;
    match target.kind {
        ExpenseKind::Monthly => monthly::update(store, &target, changes, today),
        ExpenseKind::Installment | ExpenseKind::Casual => casual::update(store, &target, changes),
    }
}

pub(crate) fn delete_expense<S: ExpenseStore>(
    store: &mut S,
    id: &str,
    today: NaiveDate,
) -> SeriesResult<Removal> {
    let target = load(store, id)?;
    match target.kind {
        ExpenseKind::Monthly => monthly::delete(store, &target, today),
        ExpenseKind::Installment => installment::delete(store, &target),
        ExpenseKind::Casual => casual::delete(store, &target),
    }
}

/// Flip the paid flag of one row; never cascades.
pub(crate) fn set_paid<S: ExpenseStore>(store: &mut S, id: &str, paid: bool) -> SeriesResult<()> {
    load(store, id)?;
    store.set_paid(id, paid)?;
    tracing::debug!(id, paid, "paid flag changed");
    Ok(())
}

/// Reset `paid` on every row of `scope` dated today or later.
pub(crate) fn mark_future_unpaid<S: ExpenseStore>(
    store: &mut S,
    scope: Scope,
    today: NaiveDate,
) -> SeriesResult<usize> {
    let count = store.mark_unpaid_from(scope, today)?;
    tracing::info!(%scope, count, "marked future expenses unpaid");
    Ok(count)
}
