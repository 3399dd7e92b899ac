use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

/// Billing tracker a subscription belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Plan {
    Flut,
    Flix,
}

impl Plan {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Flut => "flut",
            Self::Flix => "flix",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "flut" => Some(Self::Flut),
            "flix" => Some(Self::Flix),
            _ => None,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Subscription {
    pub id: String,
    pub plan: Plan,
    pub client_name: String,
    pub monthly_value: Decimal,
    /// Always the first day of the billed month.
    pub month: NaiveDate,
    pub created_at: String,
}

impl Subscription {
    pub(crate) fn new(plan: Plan, client_name: String, monthly_value: Decimal, month: NaiveDate) -> Self {
        Self {
            id: super::expense::new_id(),
            plan,
            client_name,
            monthly_value,
            month: first_of_month(month),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// One row per month for `months` consecutive months, starting at this row's month.
    pub(crate) fn schedule(&self, months: u32) -> Vec<Subscription> {
        (0..months)
            .filter_map(|i| self.month.checked_add_months(chrono::Months::new(i)))
            .map(|month| Subscription {
                id: super::expense::new_id(),
                month,
                ..self.clone()
            })
            .collect()
    }
}

pub(crate) fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
