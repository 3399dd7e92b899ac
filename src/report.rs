//! Month-level aggregates shown by `summary` and the default command.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::models::{Expense, ExpenseKind, Plan, Scope, Subscription};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExpenseSummary {
    pub month: String,
    pub scope: Scope,
    pub count: usize,
    pub total: Decimal,
    pub paid: Decimal,
    pub unpaid: Decimal,
    /// In `ExpenseKind::all()` order; kinds without rows are reported as zero.
    pub by_kind: Vec<(ExpenseKind, Decimal)>,
    pub by_category: BTreeMap<String, Decimal>,
}

impl ExpenseSummary {
    pub(crate) fn from_expenses(month: &str, scope: Scope, expenses: &[Expense]) -> Self {
        let mut summary = Self {
            month: month.to_string(),
            scope,
            count: 0,
            total: Decimal::ZERO,
            paid: Decimal::ZERO,
            unpaid: Decimal::ZERO,
            by_kind: ExpenseKind::all().iter().map(|k| (*k, Decimal::ZERO)).collect(),
            by_category: BTreeMap::new(),
        };
        for e in expenses.iter().filter(|e| e.scope == scope) {
            summary.count += 1;
            summary.total += e.amount;
            if e.paid {
                summary.paid += e.amount;
            } else {
                summary.unpaid += e.amount;
            }
            if let Some((_, sum)) = summary.by_kind.iter_mut().find(|(k, _)| *k == e.kind) {
                *sum += e.amount;
            }
            let category = if e.category.is_empty() {
                "Sem categoria".to_string()
            } else {
                e.category.clone()
            };
            *summary.by_category.entry(category).or_default() += e.amount;
        }
        summary
    }
}

/// Billing total of one plan for one month.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SubscriptionSummary {
    pub plan: Plan,
    pub clients: usize,
    pub total: Decimal,
}

impl SubscriptionSummary {
    pub(crate) fn from_rows(plan: Plan, rows: &[Subscription]) -> Self {
        let rows: Vec<&Subscription> = rows.iter().filter(|s| s.plan == plan).collect();
        Self {
            plan,
            clients: rows.len(),
            total: rows.iter().map(|s| s.monthly_value).sum(),
        }
    }
}
