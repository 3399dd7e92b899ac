mod cash_flow;
mod expense;
mod project;
mod subscription;

pub(crate) use cash_flow::{CashFlowEntry, CashFlowTotals, FlowKind};
pub(crate) use expense::{
    new_id, Expense, ExpenseChanges, ExpenseKind, Installment, Scope, SeriesLink,
};
pub(crate) use project::{
    Project, ProjectFilter, ProjectStats, ProjectStatus, PREDEFINED_REJECTION_REASONS,
};
pub(crate) use subscription::{first_of_month, Plan, Subscription};

#[cfg(test)]
mod tests;
