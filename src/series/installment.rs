use chrono::NaiveDate;
use std::collections::HashSet;

use super::dates;
use super::{
    base_title, numbered_title, ExpenseStore, Removal, Replication, SeriesError, SeriesResult,
    MAX_SERIES_MONTHS,
};
use crate::models::{Expense, ExpenseKind, Installment, SeriesLink};

fn installment_of(expense: &Expense) -> SeriesResult<Installment> {
    match expense.installment {
        Some(inst) if inst.total > MAX_SERIES_MONTHS => Err(SeriesError::Validation(format!(
            "at most {MAX_SERIES_MONTHS} installments are supported, got {}",
            inst.total
        ))),
        Some(inst) if inst.is_valid() => Ok(inst),
        Some(inst) => Err(SeriesError::Validation(format!(
            "invalid installment {}/{}",
            inst.current, inst.total
        ))),
        None => Err(SeriesError::Validation(
            "installment total and current are required".into(),
        )),
    }
}

/// Expand `template` into one row per remaining installment, from its
/// `current` up to `total`. Returns every inserted row, root first.
pub(crate) fn create_installments<S: ExpenseStore>(
    store: &mut S,
    template: &Expense,
) -> SeriesResult<Vec<Expense>> {
    if template.kind != ExpenseKind::Installment {
        return Err(SeriesError::Validation(format!(
            "expected an installment expense, got {}",
            template.kind
        )));
    }
    let Installment { current, total } = installment_of(template)?;
    let base = base_title(&template.title).to_string();

    let mut rows: Vec<Expense> = Vec::with_capacity((total - current + 1) as usize);
    for k in current..=total {
        let date = dates::shift_months(template.date, k - current).ok_or_else(|| {
            SeriesError::Validation(format!("installment {k} falls outside the calendar"))
        })?;
        let mut row = Expense {
            title: numbered_title(&base, k, total),
            date,
            installment: Some(Installment { current: k, total }),
            is_recurring: false,
            recurring_day: None,
            ..template.clone()
        };
        match rows.first() {
            Some(root) => {
                row.id = crate::models::new_id();
                row.paid = false;
                row.link = SeriesLink::Member {
                    parent_id: root.id.clone(),
                };
            }
            None => row.link = SeriesLink::Root,
        }
        rows.push(row);
    }

    // The root leads the batch, so members never precede their parent.
    let created = store.insert_expenses(&rows)?;
    tracing::info!(id = %rows[0].id, title = %base, created, total, "created installments");
    Ok(rows)
}

pub(super) fn replicate<S: ExpenseStore>(store: &mut S, instance: &Expense) -> SeriesResult<Replication> {
    let installment = installment_of(instance)?;
    let Installment { current, total } = installment;
    let remaining = installment.remaining();
    if remaining == 0 {
        tracing::info!(id = %instance.id, "installments already fully replicated");
        return Ok(Replication::default());
    }

    let root_id = instance.root_id().to_string();
    let base = base_title(&instance.title).to_string();
    let candidates: Vec<(u32, NaiveDate)> = (1..=remaining)
        .filter_map(|k| dates::shift_months(instance.date, k).map(|date| (current + k, date)))
        .collect();
    let (Some(&(_, first)), Some(&(_, last))) = (candidates.first(), candidates.last()) else {
        return Ok(Replication::default());
    };

    let mut covered: HashSet<NaiveDate> = store
        .installment_dates_between(instance.scope, &base, instance.amount, first, last)?
        .into_iter()
        .collect();
    covered.extend(store.member_dates_between(&root_id, first, last)?);

    let fresh: Vec<Expense> = candidates
        .iter()
        .filter(|(_, date)| !covered.contains(date))
        .map(|&(k, date)| Expense {
            title: numbered_title(&base, k, total),
            installment: Some(Installment { current: k, total }),
            ..instance.spawn_member(&root_id, date)
        })
        .collect();

    if fresh.is_empty() {
        tracing::info!(root = %root_id, "installments already fully replicated");
        return Ok(Replication {
            created: 0,
            skipped: candidates.len(),
        });
    }

    let created = store.insert_expenses(&fresh)?;
    tracing::info!(root = %root_id, created, "replicated installments");
    Ok(Replication {
        created,
        skipped: candidates.len() - created,
    })
}

/// Remove the selected installment and every later one of its series.
pub(super) fn delete<S: ExpenseStore>(store: &mut S, target: &Expense) -> SeriesResult<Removal> {
    let from = target.installment.map_or(1, |i| i.current);
    let removal = match &target.link {
        SeriesLink::Root => Removal {
            deleted: store.delete_installments_from(&target.id, from, true)?,
            series_removed: true,
        },
        SeriesLink::Member { parent_id } => Removal {
            deleted: store.delete_installments_from(parent_id, from, false)?,
            series_removed: false,
        },
    };
    tracing::info!(id = %target.id, from, deleted = removal.deleted, "deleted installments");
    Ok(removal)
}
