use chrono::NaiveDate;
use rust_decimal::Decimal;

/// How an expense row behaves over time ("type" column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExpenseKind {
    Monthly,
    Installment,
    Casual,
}

impl ExpenseKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Installment => "installment",
            Self::Casual => "casual",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "monthly" | "mensal" => Some(Self::Monthly),
            "installment" | "parcelada" => Some(Self::Installment),
            "casual" => Some(Self::Casual),
            _ => None,
        }
    }

    pub(crate) fn all() -> &'static [ExpenseKind] {
        &[Self::Monthly, Self::Installment, Self::Casual]
    }
}

impl std::fmt::Display for ExpenseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Partition every expense query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    Personal,
    Company,
}

impl Scope {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Company => "company",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "personal" | "pessoal" => Some(Self::Personal),
            "company" | "empresa" => Some(Self::Company),
            _ => None,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Position of a row inside its series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SeriesLink {
    Root,
    Member { parent_id: String },
}

impl SeriesLink {
    pub(crate) fn from_parent(parent_id: Option<String>) -> Self {
        match parent_id {
            Some(parent_id) => Self::Member { parent_id },
            None => Self::Root,
        }
    }

    pub(crate) fn parent_id(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::Member { parent_id } => Some(parent_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Installment {
    pub current: u32,
    pub total: u32,
}

impl Installment {
    pub(crate) fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.current)
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.total >= 1 && self.current >= 1 && self.current <= self.total
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Expense {
    pub id: String,
    pub title: String,
    pub amount: Decimal,
    pub category: String,
    pub kind: ExpenseKind,
    pub scope: Scope,
    pub date: NaiveDate,
    pub description: String,
    pub paid: bool,
    pub installment: Option<Installment>,
    pub is_recurring: bool,
    pub link: SeriesLink,
    pub recurring_day: Option<u32>,
    pub created_at: String,
    /// History kept from a deleted monthly series; never promoted again.
    pub detached: bool,
}

impl Expense {
    pub(crate) fn new(
        title: String,
        amount: Decimal,
        kind: ExpenseKind,
        scope: Scope,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: new_id(),
            title,
            amount,
            category: String::new(),
            kind,
            scope,
            date,
            description: String::new(),
            paid: false,
            installment: None,
            is_recurring: false,
            link: SeriesLink::Root,
            recurring_day: None,
            created_at: chrono::Utc::now().to_rfc3339(),
            detached: false,
        }
    }

    /// Id of the row anchoring this expense's series.
    pub(crate) fn root_id(&self) -> &str {
        self.link.parent_id().unwrap_or(&self.id)
    }

    pub(crate) fn is_root(&self) -> bool {
        self.link == SeriesLink::Root
    }

    /// A monthly row that anchors generated instances.
    pub(crate) fn is_monthly_root(&self) -> bool {
        self.is_root() && self.is_recurring
    }

    /// Copy of this row as a fresh member of `parent_id`, dated `date`.
    pub(crate) fn spawn_member(&self, parent_id: &str, date: NaiveDate) -> Self {
        Self {
            id: new_id(),
            date,
            paid: false,
            is_recurring: false,
            detached: false,
            link: SeriesLink::Member {
                parent_id: parent_id.to_string(),
            },
            created_at: chrono::Utc::now().to_rfc3339(),
            ..self.clone()
        }
    }
}

/// Partial update applied to one or more expense rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ExpenseChanges {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub recurring_day: Option<u32>,
    /// Only ever applied to the targeted row.
    pub date: Option<NaiveDate>,
}

impl ExpenseChanges {
    pub(crate) fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The part of these changes that may cascade to siblings.
    pub(crate) fn without_date(&self) -> Self {
        Self {
            date: None,
            ..self.clone()
        }
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
