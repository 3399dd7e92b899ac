use super::{Cascade, ExpenseStore, Removal, SeriesError, SeriesResult};
use crate::models::{Expense, ExpenseChanges, ExpenseKind, SeriesLink};

pub(crate) fn create_casual<S: ExpenseStore>(store: &mut S, expense: &Expense) -> SeriesResult<()> {
    if expense.kind != ExpenseKind::Casual {
        return Err(SeriesError::Validation(format!(
            "expected a casual expense, got {}",
            expense.kind
        )));
    }
    if expense.link != SeriesLink::Root || expense.installment.is_some() {
        return Err(SeriesError::Validation(
            "casual expenses cannot belong to a series".into(),
        ));
    }
    store.insert_expense(expense)?;
    tracing::info!(id = %expense.id, title = %expense.title, "created casual expense");
    Ok(())
}

/// Single-row edit. Installment rows are edited this way too.
pub(super) fn update<S: ExpenseStore>(
    store: &mut S,
    target: &Expense,
    changes: &ExpenseChanges,
) -> SeriesResult<Cascade> {
    let updated = store.update_expense(&target.id, changes)?;
    tracing::info!(id = %target.id, kind = %target.kind, "updated expense");
    Ok(Cascade { updated })
}

pub(super) fn delete<S: ExpenseStore>(store: &mut S, target: &Expense) -> SeriesResult<Removal> {
    let deleted = store.delete_expense(&target.id)?;
    tracing::info!(id = %target.id, "deleted casual expense");
    Ok(Removal {
        deleted,
        series_removed: false,
    })
}
