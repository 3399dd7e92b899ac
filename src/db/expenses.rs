use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use super::{date_column, decimal_column, format_date, like_escape, month_pattern, Database};
use crate::models::*;
use crate::series::{ExpenseStore, MaintenanceLog};

const EXPENSE_COLUMNS: &str = "id, title, amount, category, type, expense_category, date,
     description, paid, installment_current, installment_total, is_recurring,
     parent_expense_id, recurring_day, created_at, detached";

const INSERT_EXPENSE: &str = "INSERT INTO expenses (id, title, amount, category, type, expense_category, date,
     description, paid, installment_current, installment_total, is_recurring,
     parent_expense_id, recurring_day, created_at, detached)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)";

fn expense_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Expense> {
    let kind_str: String = row.get(4)?;
    let scope_str: String = row.get(5)?;
    let current: Option<u32> = row.get(9)?;
    let total: Option<u32> = row.get(10)?;
    Ok(Expense {
        id: row.get(0)?,
        title: row.get(1)?,
        amount: decimal_column(row, 2)?,
        category: row.get(3)?,
        kind: ExpenseKind::parse(&kind_str).unwrap_or(ExpenseKind::Casual),
        scope: Scope::parse(&scope_str).unwrap_or(Scope::Personal),
        date: date_column(row, 6)?,
        description: row.get(7)?,
        paid: row.get(8)?,
        installment: match (current, total) {
            (Some(current), Some(total)) => Some(Installment { current, total }),
            _ => None,
        },
        is_recurring: row.get(11)?,
        link: SeriesLink::from_parent(row.get(12)?),
        recurring_day: row.get(13)?,
        created_at: row.get(14)?,
        detached: row.get(15)?,
    })
}

fn insert_with(conn: &Connection, sql: &str, e: &Expense) -> rusqlite::Result<usize> {
    conn.execute(
        sql,
        params![
            e.id,
            e.title,
            e.amount.to_string(),
            e.category,
            e.kind.as_str(),
            e.scope.as_str(),
            format_date(e.date),
            e.description,
            e.paid,
            e.installment.map(|i| i.current),
            e.installment.map(|i| i.total),
            e.is_recurring,
            e.link.parent_id(),
            e.recurring_day,
            e.created_at,
            e.detached,
        ],
    )
}

/// Build the `SET` clause for a partial update, numbering parameters after `offset`.
fn set_clause(changes: &ExpenseChanges, offset: usize) -> (Vec<String>, Vec<Box<dyn ToSql>>) {
    let mut sets = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();
    let mut push = |column: &str, value: Box<dyn ToSql>| {
        values.push(value);
        sets.push(format!("{column} = ?{}", offset + values.len()));
    };
    if let Some(title) = &changes.title {
        push("title", Box::new(title.clone()));
    }
    if let Some(amount) = changes.amount {
        push("amount", Box::new(amount.to_string()));
    }
    if let Some(category) = &changes.category {
        push("category", Box::new(category.clone()));
    }
    if let Some(description) = &changes.description {
        push("description", Box::new(description.clone()));
    }
    if let Some(day) = changes.recurring_day {
        push("recurring_day", Box::new(day));
    }
    if let Some(date) = changes.date {
        push("date", Box::new(format_date(date)));
    }
    (sets, values)
}

impl Database {
    /// `where_sql` numbers its own parameters from ?1; the SET values follow them.
    fn apply_changes(
        &self,
        changes: &ExpenseChanges,
        where_sql: &str,
        mut values: Vec<Box<dyn ToSql>>,
    ) -> Result<usize> {
        let (sets, set_values) = set_clause(changes, values.len());
        if sets.is_empty() {
            return Ok(0);
        }
        values.extend(set_values);
        let sql = format!("UPDATE expenses SET {} WHERE {where_sql}", sets.join(", "));
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        Ok(self.conn.execute(&sql, refs.as_slice())?)
    }

    /// Expenses of a scope, optionally limited to a `YYYY-MM` month.
    pub(crate) fn get_expenses(&self, scope: Scope, month: Option<&str>) -> Result<Vec<Expense>> {
        let mut sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE expense_category = ?1");
        let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(scope.as_str())];
        if let Some(m) = month {
            sql.push_str(" AND date LIKE ?2");
            values.push(Box::new(month_pattern(m)));
        }
        sql.push_str(" ORDER BY date, title");

        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(refs.as_slice(), expense_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Every row of a series: the root first, then members by date.
    pub(crate) fn get_series(&self, root_id: &str) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses
             WHERE id = ?1 OR parent_expense_id = ?1
             ORDER BY parent_expense_id IS NOT NULL, date"
        ))?;
        let rows = stmt.query_map(params![root_id], expense_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

impl ExpenseStore for Database {
    fn insert_expense(&mut self, expense: &Expense) -> Result<()> {
        insert_with(&self.conn, INSERT_EXPENSE, expense)?;
        tracing::debug!(id = %expense.id, kind = %expense.kind, "inserted expense");
        Ok(())
    }

    fn insert_expenses(&mut self, expenses: &[Expense]) -> Result<usize> {
        let sql = format!(
            "{INSERT_EXPENSE}
             ON CONFLICT(parent_expense_id, date) WHERE parent_expense_id IS NOT NULL DO NOTHING"
        );
        let tx = self.conn.transaction()?;
        let mut count = 0;
        for expense in expenses {
            count += insert_with(&tx, &sql, expense)?;
        }
        tx.commit()?;
        tracing::debug!(requested = expenses.len(), inserted = count, "batch insert");
        Ok(count)
    }

    fn get_expense(&self, id: &str) -> Result<Option<Expense>> {
        let result = self.conn.query_row(
            &format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1"),
            params![id],
            expense_from_row,
        );
        match result {
            Ok(e) => Ok(Some(e)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn update_expense(&mut self, id: &str, changes: &ExpenseChanges) -> Result<usize> {
        self.apply_changes(changes, "id = ?1", vec![Box::new(id.to_string())])
    }

    fn update_members_from(
        &mut self,
        root_id: &str,
        from: NaiveDate,
        changes: &ExpenseChanges,
    ) -> Result<usize> {
        self.apply_changes(
            changes,
            "parent_expense_id = ?1 AND date >= ?2",
            vec![Box::new(root_id.to_string()), Box::new(format_date(from))],
        )
    }

    fn delete_expense(&mut self, id: &str) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM expenses WHERE id = ?1", params![id])?)
    }

    fn delete_members_from(&mut self, root_id: &str, from: NaiveDate) -> Result<usize> {
        Ok(self.conn.execute(
            "DELETE FROM expenses WHERE parent_expense_id = ?1 AND date >= ?2",
            params![root_id, format_date(from)],
        )?)
    }

    fn delete_installments_from(
        &mut self,
        root_id: &str,
        from_installment: u32,
        include_root: bool,
    ) -> Result<usize> {
        let sql = if include_root {
            "DELETE FROM expenses
             WHERE id = ?1 OR (parent_expense_id = ?1 AND installment_current >= ?2)"
        } else {
            "DELETE FROM expenses WHERE parent_expense_id = ?1 AND installment_current >= ?2"
        };
        Ok(self.conn.execute(sql, params![root_id, from_installment])?)
    }

    fn detach_members(&mut self, root_id: &str) -> Result<usize> {
        Ok(self.conn.execute(
            "UPDATE expenses SET detached = 1 WHERE parent_expense_id = ?1",
            params![root_id],
        )?)
    }

    fn count_members(&self, root_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM expenses WHERE parent_expense_id = ?1",
            params![root_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn member_dates_between(
        &self,
        root_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare(
            "SELECT date FROM expenses
             WHERE parent_expense_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date",
        )?;
        let rows = stmt.query_map(
            params![root_id, format_date(start), format_date(end)],
            |row| date_column(row, 0),
        )?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn installment_dates_between(
        &self,
        scope: Scope,
        base_title: &str,
        amount: Decimal,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        // Matches the bare title and any "(k/N)" numbered variant of it.
        let mut stmt = self.conn.prepare(
            "SELECT date, title FROM expenses
             WHERE expense_category = ?1 AND CAST(amount AS REAL) = CAST(?2 AS REAL)
               AND (title = ?3 OR title LIKE ?4 ESCAPE '\\')
               AND date >= ?5 AND date <= ?6
             ORDER BY date",
        )?;
        let rows = stmt.query_map(
            params![
                scope.as_str(),
                amount.to_string(),
                base_title,
                format!("{} (%/%)", like_escape(base_title)),
                format_date(start),
                format_date(end),
            ],
            |row| Ok((date_column(row, 0)?, row.get::<_, String>(1)?)),
        )?;
        let mut dates = Vec::new();
        for row in rows {
            let (date, title) = row?;
            if crate::series::base_title(&title) == base_title {
                dates.push(date);
            }
        }
        Ok(dates)
    }

    fn set_paid(&mut self, id: &str, paid: bool) -> Result<usize> {
        Ok(self.conn.execute(
            "UPDATE expenses SET paid = ?1 WHERE id = ?2",
            params![paid, id],
        )?)
    }

    fn mark_unpaid_from(&mut self, scope: Scope, from: NaiveDate) -> Result<usize> {
        Ok(self.conn.execute(
            "UPDATE expenses SET paid = 0 WHERE expense_category = ?1 AND date >= ?2 AND paid = 1",
            params![scope.as_str(), format_date(from)],
        )?)
    }

    fn monthly_roots(&self) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses
             WHERE type = 'monthly' AND parent_expense_id IS NULL AND detached = 0
             ORDER BY date"
        ))?;
        let rows = stmt.query_map([], expense_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn set_recurring(&mut self, id: &str) -> Result<usize> {
        Ok(self.conn.execute(
            "UPDATE expenses SET is_recurring = 1 WHERE id = ?1",
            params![id],
        )?)
    }
}

impl MaintenanceLog for Database {
    fn maintenance_applied(&self, key: &str) -> Result<bool> {
        Ok(self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM maintenance_runs WHERE key = ?1)",
            params![key],
            |row| row.get(0),
        )?)
    }

    fn record_maintenance(&mut self, key: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO maintenance_runs (key, applied_at) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET applied_at = ?2",
            params![key, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn clear_maintenance(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM maintenance_runs WHERE key = ?1", params![key])?;
        Ok(())
    }
}
