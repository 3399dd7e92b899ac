mod cli;
mod records;

use anyhow::Result;
use chrono::NaiveDate;

use crate::config::Config;
use crate::db::{Database, Table};
use crate::models::Scope;
use crate::notify::{NotificationSink, Notice, Severity};
use crate::series::SeriesError;

pub(crate) use cli::as_cli;

/// Everything a command needs: the store, settings, the current date and
/// where user feedback goes.
pub(crate) struct Session<'a> {
    pub db: &'a mut Database,
    pub config: &'a Config,
    pub today: NaiveDate,
    pub sink: &'a mut dyn NotificationSink,
    /// Set once any operation ended in an error notice.
    pub failed: bool,
}

impl<'a> Session<'a> {
    pub(crate) fn new(
        db: &'a mut Database,
        config: &'a Config,
        today: NaiveDate,
        sink: &'a mut dyn NotificationSink,
    ) -> Self {
        Self {
            db,
            config,
            today,
            sink,
            failed: false,
        }
    }

    fn notify(&mut self, notice: Notice) {
        if notice.severity == Severity::Error {
            self.failed = true;
        }
        self.sink.notify(notice);
    }

    /// Report a failed series operation. Store failures are logged in full
    /// and shown to the user as a generic message.
    fn series_failed(&mut self, title: &str, err: SeriesError) {
        tracing::error!(error = %err, "{title}");
        let description = match &err {
            SeriesError::Validation(_) | SeriesError::NotFound(_) => err.to_string(),
            SeriesError::Store(_) => {
                "The database rejected the change; see the log for details".to_string()
            }
        };
        self.notify(Notice::error(title, description));
    }

    fn failed_with(&mut self, title: &str, err: anyhow::Error) {
        tracing::error!(error = %err, "{title}");
        self.notify(Notice::error(title, err.to_string()));
    }

    /// Expand an id prefix into the single matching expense id.
    fn expense_id(&self, prefix: &str) -> Result<String, SeriesError> {
        let ids = self.db.ids_with_prefix(Table::Expenses, prefix)?;
        unique_id(ids, prefix).map_err(|e| match e {
            IdLookup::Missing => SeriesError::NotFound(prefix.to_string()),
            IdLookup::Ambiguous => SeriesError::Validation(format!("id prefix '{prefix}' is ambiguous")),
        })
    }

    fn record_id(&self, table: Table, prefix: &str) -> Result<String> {
        let ids = self.db.ids_with_prefix(table, prefix)?;
        unique_id(ids, prefix).map_err(|e| match e {
            IdLookup::Missing => anyhow::anyhow!("No record with id {prefix}"),
            IdLookup::Ambiguous => anyhow::anyhow!("id prefix '{prefix}' is ambiguous"),
        })
    }

    fn scope(&self, args: &[String]) -> Result<Scope> {
        match flag(args, "--scope") {
            Some(raw) => Scope::parse(raw).ok_or_else(|| anyhow::anyhow!("Unknown scope: {raw}")),
            None => self.config.scope(),
        }
    }

    /// Optional `YYYY-MM` positional argument, defaulting to the current month.
    fn month(&self, args: &[String]) -> Result<String> {
        match positional(args) {
            Some(raw) => crate::util::parse_month(raw),
            None => Ok(self.today.format("%Y-%m").to_string()),
        }
    }
}

enum IdLookup {
    Missing,
    Ambiguous,
}

fn unique_id(mut ids: Vec<String>, prefix: &str) -> std::result::Result<String, IdLookup> {
    match ids.len() {
        0 => Err(IdLookup::Missing),
        1 => Ok(ids.remove(0)),
        _ if ids.iter().any(|id| id == prefix) => Ok(prefix.to_string()),
        _ => Err(IdLookup::Ambiguous),
    }
}

// ── Argument helpers ─────────────────────────────────────────

/// Value following `name`, e.g. `--title Rent`.
fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

/// Every value given for a repeatable flag.
fn flag_all<'a>(args: &'a [String], name: &str) -> Vec<&'a str> {
    args.windows(2)
        .filter(|w| w[0] == name)
        .map(|w| w[1].as_str())
        .collect()
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

/// First argument, unless it is a flag.
fn positional(args: &[String]) -> Option<&str> {
    args.first()
        .filter(|a| !a.starts_with("--"))
        .map(String::as_str)
}

fn required<'a>(args: &'a [String], name: &str) -> Result<&'a str> {
    flag(args, name).ok_or_else(|| anyhow::anyhow!("Missing required flag {name}"))
}

fn parse_flag<T: std::str::FromStr>(args: &[String], name: &str) -> Result<Option<T>> {
    flag(args, name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| anyhow::anyhow!("Invalid value for {name}: {raw}"))
        })
        .transpose()
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests;
