use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;

use super::dates;
use super::{
    Cascade, ExpenseStore, Removal, Replication, SeriesError, SeriesResult, MAX_SERIES_MONTHS,
};
use crate::models::{Expense, ExpenseChanges, ExpenseKind, SeriesLink};

fn validate_day(day: Option<u32>) -> SeriesResult<()> {
    match day {
        Some(d) if !(1..=31).contains(&d) => Err(SeriesError::Validation(format!(
            "recurring day must be between 1 and 31, got {d}"
        ))),
        _ => Ok(()),
    }
}

fn validate_months(months: u32) -> SeriesResult<()> {
    if months > MAX_SERIES_MONTHS {
        return Err(SeriesError::Validation(format!(
            "at most {MAX_SERIES_MONTHS} months can be generated, got {months}"
        )));
    }
    Ok(())
}

/// Insert `template` as a series root plus `months` dated members.
pub(crate) fn create_monthly_series<S: ExpenseStore>(
    store: &mut S,
    template: &Expense,
    months: u32,
) -> SeriesResult<Expense> {
    if template.kind != ExpenseKind::Monthly {
        return Err(SeriesError::Validation(format!(
            "expected a monthly expense, got {}",
            template.kind
        )));
    }
    validate_day(template.recurring_day)?;
    validate_months(months)?;

    let mut root = template.clone();
    root.is_recurring = true;
    root.link = SeriesLink::Root;
    root.installment = None;

    let members: Vec<Expense> = (1..=months)
        .filter_map(|i| dates::occurrence(root.date, i, root.recurring_day))
        .map(|date| root.spawn_member(&root.id, date))
        .collect();

    store.insert_expense(&root)?;
    let created = if members.is_empty() {
        0
    } else {
        store.insert_expenses(&members)?
    };
    tracing::info!(id = %root.id, title = %root.title, created, "created monthly series");
    Ok(root)
}

pub(super) fn replicate<S: ExpenseStore>(
    store: &mut S,
    instance: &Expense,
    today: NaiveDate,
    window_months: u32,
) -> SeriesResult<Replication> {
    validate_months(window_months)?;
    if instance.detached {
        return Err(SeriesError::Validation(
            "this expense belongs to a deleted series".into(),
        ));
    }
    let root_id = instance.root_id().to_string();
    let root = if instance.is_root() {
        Some(instance.clone())
    } else {
        store.get_expense(&root_id)?
    };

    // Members are laid out from the root's date, not from a clamped member's.
    let anchor = root.as_ref().unwrap_or(instance);
    let day = instance
        .recurring_day
        .or(anchor.recurring_day)
        .unwrap_or_else(|| anchor.date.day());
    let candidates: Vec<NaiveDate> = (1..=window_months)
        .filter_map(|i| dates::occurrence(today, i, Some(day)))
        .collect();
    let (Some(&first), Some(&last)) = (candidates.first(), candidates.last()) else {
        return Ok(Replication::default());
    };

    let mut occupied: HashSet<NaiveDate> = store
        .member_dates_between(&root_id, first, last)?
        .into_iter()
        .collect();
    if let Some(root) = &root {
        occupied.insert(root.date);
    }

    let fresh: Vec<Expense> = candidates
        .iter()
        .filter(|date| !occupied.contains(date))
        .map(|&date| instance.spawn_member(&root_id, date))
        .collect();

    if fresh.is_empty() {
        tracing::info!(root = %root_id, "monthly series already up to date");
        return Ok(Replication {
            created: 0,
            skipped: candidates.len(),
        });
    }

    // A bare monthly row becomes a series root the first time it is replicated.
    if instance.is_root() && !instance.is_recurring {
        store.set_recurring(&instance.id)?;
    }
    let created = store.insert_expenses(&fresh)?;
    tracing::info!(root = %root_id, created, "replicated monthly expense");
    Ok(Replication {
        created,
        skipped: candidates.len() - created,
    })
}

pub(super) fn update<S: ExpenseStore>(
    store: &mut S,
    target: &Expense,
    changes: &ExpenseChanges,
    today: NaiveDate,
) -> SeriesResult<Cascade> {
    let cascade = changes.without_date();

    let updated = match &target.link {
        SeriesLink::Root if target.is_recurring => {
            store.update_expense(&target.id, changes)?
                + store.update_members_from(&target.id, today, &cascade)?
        }
        SeriesLink::Member { parent_id } => {
            // The sweep from the target's own date covers the target.
            let mut updated = store.update_members_from(parent_id, target.date, &cascade)?;
            updated += store.update_expense(parent_id, &cascade)?;
            if let Some(date) = changes.date {
                let moved = ExpenseChanges {
                    date: Some(date),
                    ..ExpenseChanges::default()
                };
                let n = store.update_expense(&target.id, &moved)?;
                if cascade.is_empty() {
                    updated += n;
                }
            }
            updated
        }
        SeriesLink::Root => store.update_expense(&target.id, changes)?,
    };

    tracing::info!(id = %target.id, updated, "updated monthly expense");
    Ok(Cascade { updated })
}

pub(super) fn delete<S: ExpenseStore>(
    store: &mut S,
    target: &Expense,
    today: NaiveDate,
) -> SeriesResult<Removal> {
    let removal = match &target.link {
        SeriesLink::Root if target.is_recurring => {
            // Past members outlive the root as detached history.
            let mut deleted = store.delete_members_from(&target.id, today)?;
            store.detach_members(&target.id)?;
            deleted += store.delete_expense(&target.id)?;
            Removal {
                deleted,
                series_removed: true,
            }
        }
        SeriesLink::Member { parent_id } => {
            let mut deleted = store.delete_expense(&target.id)?;
            deleted += store.delete_members_from(parent_id, target.date.max(today))?;
            let series_removed = store.count_members(parent_id)? == 0;
            if series_removed {
                deleted += store.delete_expense(parent_id)?;
            }
            Removal {
                deleted,
                series_removed,
            }
        }
        SeriesLink::Root => Removal {
            deleted: store.delete_expense(&target.id)?,
            series_removed: true,
        },
    };

    tracing::info!(id = %target.id, deleted = removal.deleted, "deleted monthly expense");
    Ok(removal)
}
