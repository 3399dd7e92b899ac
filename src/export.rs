use anyhow::{Context, Result};
use std::path::Path;

use crate::db::DATE_FORMAT;
use crate::models::Expense;

const HEADER: [&str; 10] = [
    "date",
    "title",
    "amount",
    "category",
    "type",
    "scope",
    "paid",
    "installment",
    "series",
    "description",
];

/// Write `expenses` as CSV to `path`. Returns the number of data rows.
pub(crate) fn export_expenses(path: &Path, expenses: &[Expense]) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    wtr.write_record(HEADER)?;
    for e in expenses {
        let installment = e
            .installment
            .map(|i| format!("{}/{}", i.current, i.total))
            .unwrap_or_default();
        wtr.write_record([
            e.date.format(DATE_FORMAT).to_string(),
            e.title.clone(),
            e.amount.to_string(),
            e.category.clone(),
            e.kind.as_str().to_string(),
            e.scope.as_str().to_string(),
            if e.paid { "yes" } else { "no" }.to_string(),
            installment,
            e.root_id().to_string(),
            e.description.clone(),
        ])
        .context("Failed to write CSV record")?;
    }
    wtr.flush().context("Failed to flush CSV file")?;

    tracing::info!(path = %path.display(), rows = expenses.len(), "exported expenses");
    Ok(expenses.len())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{ExpenseKind, Installment, Scope};

    #[test]
    fn test_export_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("march.csv");

        let mut sofa = Expense::new(
            "Sofa, 3 lugares (2/6)".into(),
            dec!(250.00),
            ExpenseKind::Installment,
            Scope::Personal,
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        );
        sofa.installment = Some(Installment { current: 2, total: 6 });
        sofa.paid = true;

        assert_eq!(export_expenses(&path, &[sofa.clone()]).unwrap(), 1);

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(headers.len(), HEADER.len());
        assert_eq!(&headers[0], "date");

        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "2024-03-10");
        assert_eq!(&rows[0][1], "Sofa, 3 lugares (2/6)");
        assert_eq!(&rows[0][2], "250.00");
        assert_eq!(&rows[0][6], "yes");
        assert_eq!(&rows[0][7], "2/6");
        assert_eq!(&rows[0][8], sofa.id.as_str());
    }

    #[test]
    fn test_export_empty_month_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        assert_eq!(export_expenses(&path, &[]).unwrap(), 0);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.csv");
        assert!(export_expenses(&path, &[]).is_err());
    }
}
