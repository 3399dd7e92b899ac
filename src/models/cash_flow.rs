use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::subscription::first_of_month;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlowKind {
    Inflow,
    Outflow,
}

impl FlowKind {
    /// Stored spelling, kept compatible with existing "entrada"/"saida" data.
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Inflow => "entrada",
            Self::Outflow => "saida",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "entrada" | "in" | "inflow" => Some(Self::Inflow),
            "saida" | "saída" | "out" | "outflow" => Some(Self::Outflow),
            _ => None,
        }
    }
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inflow => write!(f, "In"),
            Self::Outflow => write!(f, "Out"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CashFlowEntry {
    pub id: String,
    pub kind: FlowKind,
    pub amount: Decimal,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub month: NaiveDate,
    pub created_at: String,
    pub updated_at: String,
}

impl CashFlowEntry {
    pub(crate) fn new(kind: FlowKind, amount: Decimal, title: String, date: NaiveDate) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: super::expense::new_id(),
            kind,
            amount,
            title,
            description: String::new(),
            date,
            month: first_of_month(date),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Inflow and outflow totals of a set of entries.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct CashFlowTotals {
    pub inflow: Decimal,
    pub outflow: Decimal,
}

impl CashFlowTotals {
    pub(crate) fn from_entries(entries: &[CashFlowEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut acc, e| {
            match e.kind {
                FlowKind::Inflow => acc.inflow += e.amount,
                FlowKind::Outflow => acc.outflow += e.amount,
            }
            acc
        })
    }

    pub(crate) fn balance(&self) -> Decimal {
        self.inflow - self.outflow
    }
}
