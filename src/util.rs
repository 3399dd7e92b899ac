use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Format an amount the Brazilian way: `1234567.8` → `"R$ 1.234.567,80"`.
pub(crate) fn format_amount(val: Decimal) -> String {
    let formatted = format!("{:.2}", val.abs());
    let (int_part, dec_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let grouped: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(".");

    let sign = if val < Decimal::ZERO { "-" } else { "" };
    format!("{sign}R$ {grouped},{dec_part}")
}

/// Parse a user-typed amount. Accepts `1234.56`, `1.234,56`, `1234,56`,
/// and an optional `R$` prefix.
pub(crate) fn parse_amount(s: &str) -> Result<Decimal> {
    let cleaned = s.trim().trim_start_matches("R$").trim().replace(' ', "");
    if cleaned.is_empty() {
        anyhow::bail!("Amount is empty");
    }
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };
    Decimal::from_str(&normalized).with_context(|| format!("Failed to parse '{s}' as an amount"))
}

/// `YYYY-MM-DD`, falling back to `DD/MM/YYYY`.
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    anyhow::bail!("Could not parse date: {s}")
}

/// Validate a `YYYY-MM` month and return it normalized.
pub(crate) fn parse_month(s: &str) -> Result<String> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("Expected a month as YYYY-MM, got '{s}'"))?;
    Ok(first.format("%Y-%m").to_string())
}

/// Truncate to `max` characters, marking the cut with "…".
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max - 1).collect();
    format!("{kept}…")
}

#[cfg(test)]
#[path = "util_tests.rs"]
mod tests;
