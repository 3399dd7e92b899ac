use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::params;
use rust_decimal::Decimal;

use super::{date_column, decimal_column, format_date, month_pattern, Database};
use crate::models::*;

fn subscription_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subscription> {
    let plan_str: String = row.get(1)?;
    Ok(Subscription {
        id: row.get(0)?,
        plan: Plan::parse(&plan_str).unwrap_or(Plan::Flut),
        client_name: row.get(2)?,
        monthly_value: decimal_column(row, 3)?,
        month: date_column(row, 4)?,
        created_at: row.get(5)?,
    })
}

fn project_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    let status_str: String = row.get(6)?;
    let reasons_json: String = row.get(7)?;
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        client: row.get(2)?,
        responsible: row.get(3)?,
        estimated_value: decimal_column(row, 4)?,
        description: row.get(5)?,
        status: ProjectStatus::parse(&status_str).unwrap_or(ProjectStatus::Pending),
        rejection_reasons: serde_json::from_str(&reasons_json).unwrap_or_default(),
        rejection_observations: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn cash_flow_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CashFlowEntry> {
    let kind_str: String = row.get(1)?;
    Ok(CashFlowEntry {
        id: row.get(0)?,
        kind: FlowKind::parse(&kind_str).unwrap_or(FlowKind::Outflow),
        amount: decimal_column(row, 2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        date: date_column(row, 5)?,
        month: date_column(row, 6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl Database {
    // ── Subscriptions ─────────────────────────────────────────

    /// Insert `months` monthly rows for the subscription, starting at its month.
    pub(crate) fn insert_subscription_run(
        &mut self,
        template: &Subscription,
        months: u32,
    ) -> Result<Vec<Subscription>> {
        let rows = template.schedule(months);
        let tx = self.conn.transaction()?;
        for sub in &rows {
            tx.execute(
                "INSERT INTO subscriptions (id, plan, client_name, monthly_value, month_year, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    sub.id,
                    sub.plan.as_str(),
                    sub.client_name,
                    sub.monthly_value.to_string(),
                    format_date(sub.month),
                    sub.created_at,
                ],
            )?;
        }
        tx.commit()?;
        tracing::info!(plan = %template.plan, client = %template.client_name, months, "created subscription run");
        Ok(rows)
    }

    /// Subscriptions of a plan, newest month first; `month` is `YYYY-MM`.
    pub(crate) fn get_subscriptions(&self, plan: Plan, month: Option<&str>) -> Result<Vec<Subscription>> {
        let pattern = month.map(month_pattern).unwrap_or_else(|| "%".into());
        let mut stmt = self.conn.prepare(
            "SELECT id, plan, client_name, monthly_value, month_year, created_at
             FROM subscriptions WHERE plan = ?1 AND month_year LIKE ?2
             ORDER BY month_year DESC, client_name",
        )?;
        let rows = stmt.query_map(params![plan.as_str(), pattern], subscription_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn update_subscription(
        &self,
        id: &str,
        client_name: Option<&str>,
        monthly_value: Option<Decimal>,
    ) -> Result<usize> {
        let changed = self.conn.execute(
            "UPDATE subscriptions
             SET client_name = COALESCE(?1, client_name),
                 monthly_value = COALESCE(?2, monthly_value)
             WHERE id = ?3",
            params![client_name, monthly_value.map(|v| v.to_string()), id],
        )?;
        Ok(changed)
    }

    /// Remove a client's rows of a plan from `from_month` onward.
    pub(crate) fn delete_subscriptions_from(
        &self,
        plan: Plan,
        client_name: &str,
        from_month: NaiveDate,
    ) -> Result<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM subscriptions WHERE plan = ?1 AND client_name = ?2 AND month_year >= ?3",
            params![plan.as_str(), client_name, format_date(first_of_month(from_month))],
        )?;
        Ok(deleted)
    }

    // ── Projects ──────────────────────────────────────────────

    pub(crate) fn insert_project(&self, project: &Project) -> Result<()> {
        self.conn.execute(
            "INSERT INTO projects (id, name, client, responsible, estimated_value, description,
                                   status, rejection_reasons, rejection_observations, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                project.id,
                project.name,
                project.client,
                project.responsible,
                project.estimated_value.to_string(),
                project.description,
                project.status.as_str(),
                serde_json::to_string(&project.rejection_reasons)?,
                project.rejection_observations,
                project.created_at,
                project.updated_at,
            ],
        )?;
        Ok(())
    }

    pub(crate) fn get_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, client, responsible, estimated_value, description, status,
                    rejection_reasons, rejection_observations, created_at, updated_at
             FROM projects ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], project_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_project_by_id(&self, id: &str) -> Result<Option<Project>> {
        let result = self.conn.query_row(
            "SELECT id, name, client, responsible, estimated_value, description, status,
                    rejection_reasons, rejection_observations, created_at, updated_at
             FROM projects WHERE id = ?1",
            params![id],
            project_from_row,
        );
        match result {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist every mutable field of an existing project.
    pub(crate) fn save_project(&self, project: &Project) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE projects SET name = ?1, client = ?2, responsible = ?3, estimated_value = ?4,
                    description = ?5, status = ?6, rejection_reasons = ?7,
                    rejection_observations = ?8, updated_at = ?9
             WHERE id = ?10",
            params![
                project.name,
                project.client,
                project.responsible,
                project.estimated_value.to_string(),
                project.description,
                project.status.as_str(),
                serde_json::to_string(&project.rejection_reasons)?,
                project.rejection_observations,
                project.updated_at,
                project.id,
            ],
        )?;
        if changed == 0 {
            anyhow::bail!("Project not found: {}", project.id);
        }
        Ok(())
    }

    pub(crate) fn delete_project(&self, id: &str) -> Result<usize> {
        self.conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])
            .with_context(|| format!("Failed to delete project {id}"))
    }

    // ── Cash flow ─────────────────────────────────────────────

    pub(crate) fn insert_cash_flow(&self, entry: &CashFlowEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO cash_flow (id, type, amount, title, description, date, month_year, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.id,
                entry.kind.as_str(),
                entry.amount.to_string(),
                entry.title,
                entry.description,
                format_date(entry.date),
                format_date(entry.month),
                entry.created_at,
                entry.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Entries of a `YYYY-MM` month, newest first.
    pub(crate) fn get_cash_flow(&self, month: &str) -> Result<Vec<CashFlowEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, type, amount, title, description, date, month_year, created_at, updated_at
             FROM cash_flow WHERE month_year LIKE ?1
             ORDER BY date DESC, created_at DESC",
        )?;
        let rows = stmt.query_map(params![month_pattern(month)], cash_flow_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn update_cash_flow(&self, entry: &CashFlowEntry) -> Result<usize> {
        Ok(self.conn.execute(
            "UPDATE cash_flow SET type = ?1, amount = ?2, title = ?3, description = ?4,
                    date = ?5, month_year = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                entry.kind.as_str(),
                entry.amount.to_string(),
                entry.title,
                entry.description,
                format_date(entry.date),
                format_date(first_of_month(entry.date)),
                chrono::Utc::now().to_rfc3339(),
                entry.id,
            ],
        )?)
    }

    pub(crate) fn get_cash_flow_by_id(&self, id: &str) -> Result<Option<CashFlowEntry>> {
        let result = self.conn.query_row(
            "SELECT id, type, amount, title, description, date, month_year, created_at, updated_at
             FROM cash_flow WHERE id = ?1",
            params![id],
            cash_flow_from_row,
        );
        match result {
            Ok(e) => Ok(Some(e)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn delete_cash_flow(&self, id: &str) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM cash_flow WHERE id = ?1", params![id])?)
    }
}
