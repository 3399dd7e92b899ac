use anyhow::Result;
use rust_decimal::Decimal;

/// Reasons offered when a project budget is turned down.
pub(crate) const PREDEFINED_REJECTION_REASONS: &[&str] = &[
    "Orçamento acima do limite",
    "Informações incompletas",
    "Prazo inviável",
    "Falta de recursos",
    "Requisitos não atendidos",
    "Cliente não aprovou",
    "Questões técnicas",
    "Documentação insuficiente",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProjectStatus {
    Pending,
    Approved,
    Rejected,
}

impl ProjectStatus {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Project {
    pub id: String,
    pub name: String,
    pub client: String,
    pub responsible: String,
    pub estimated_value: Decimal,
    pub description: String,
    pub status: ProjectStatus,
    pub rejection_reasons: Vec<String>,
    pub rejection_observations: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Project {
    pub(crate) fn new(name: String, client: String, responsible: String, estimated_value: Decimal) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: super::expense::new_id(),
            name,
            client,
            responsible,
            estimated_value,
            description: String::new(),
            status: ProjectStatus::Pending,
            rejection_reasons: Vec::new(),
            rejection_observations: String::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Move to `Approved` or back to `Pending`; any rejection data is dropped.
    pub(crate) fn set_status(&mut self, status: ProjectStatus) -> Result<()> {
        if status == ProjectStatus::Rejected {
            anyhow::bail!("Rejecting a project requires at least one reason");
        }
        self.status = status;
        self.rejection_reasons.clear();
        self.rejection_observations.clear();
        self.touch();
        Ok(())
    }

    pub(crate) fn reject(&mut self, reasons: Vec<String>, observations: String) -> Result<()> {
        let reasons: Vec<String> = reasons
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        if reasons.is_empty() {
            anyhow::bail!("Select at least one reason to reject the project");
        }
        self.status = ProjectStatus::Rejected;
        self.rejection_reasons = reasons;
        self.rejection_observations = observations.trim().to_string();
        self.touch();
        Ok(())
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    pub(crate) fn matches(&self, filter: &ProjectFilter) -> bool {
        if filter.status.is_some_and(|s| s != self.status) {
            return false;
        }
        let contains = |haystack: &str, needle: &Option<String>| {
            needle
                .as_ref()
                .map_or(true, |n| haystack.to_lowercase().contains(&n.to_lowercase()))
        };
        contains(&self.client, &filter.client) && contains(&self.responsible, &filter.responsible)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub client: Option<String>,
    pub responsible: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ProjectStats {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub total_value: Decimal,
}

impl ProjectStats {
    pub(crate) fn from_projects(projects: &[Project]) -> Self {
        let mut stats = Self::default();
        for p in projects {
            match p.status {
                ProjectStatus::Pending => stats.pending += 1,
                ProjectStatus::Approved => stats.approved += 1,
                ProjectStatus::Rejected => stats.rejected += 1,
            }
            stats.total_value += p.estimated_value;
        }
        stats
    }
}
