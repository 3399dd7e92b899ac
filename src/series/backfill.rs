use chrono::NaiveDate;

use super::{monthly, ExpenseStore, MaintenanceLog, SeriesResult};

/// Maintenance key recording that legacy monthly rows were flagged.
pub(crate) const BACKFILL_KEY: &str = "monthly_recurring_backfill_v2";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Backfill {
    /// Legacy monthly rows promoted to series roots.
    pub flagged: usize,
    /// Members created while topping up every root.
    pub created: usize,
    pub first_run: bool,
}

/// Promote unflagged monthly roots to recurring (once), then top up every
/// recurring root's future window. A failing series is logged and skipped.
pub(crate) fn backfill_recurring<S>(
    store: &mut S,
    today: NaiveDate,
    window_months: u32,
    force: bool,
) -> SeriesResult<Backfill>
where
    S: ExpenseStore + MaintenanceLog,
{
    if force {
        store.clear_maintenance(BACKFILL_KEY)?;
    }
    let first_run = !store.maintenance_applied(BACKFILL_KEY)?;
    let mut outcome = Backfill {
        first_run,
        ..Backfill::default()
    };

    let mut roots = store.monthly_roots()?;
    if first_run {
        for root in roots.iter_mut().filter(|r| !r.is_recurring) {
            store.set_recurring(&root.id)?;
            root.is_recurring = true;
            outcome.flagged += 1;
        }
    }

    for root in roots.iter().filter(|r| r.is_recurring) {
        match monthly::replicate(store, root, today, window_months) {
            Ok(rep) => outcome.created += rep.created,
            Err(e) => tracing::warn!(id = %root.id, error = %e, "backfill skipped series"),
        }
    }

    if first_run {
        store.record_maintenance(BACKFILL_KEY)?;
    }
    tracing::info!(
        flagged = outcome.flagged,
        created = outcome.created,
        first_run,
        "recurring backfill finished"
    );
    Ok(outcome)
}
