use anyhow::Result;
use std::path::PathBuf;

use super::records;
use super::{flag, has_flag, parse_flag, positional, required, short_id, Session};
use crate::models::{Expense, ExpenseChanges, ExpenseKind, Installment, Plan};
use crate::notify::Notice;
use crate::report::{ExpenseSummary, SubscriptionSummary};
use crate::series;
use crate::util::{format_amount, parse_amount, parse_date, parse_month, truncate};

/// Run one command. `args[0]` is the program name; with no command the
/// current month's summary is printed.
pub(crate) fn as_cli(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let Some(command) = args.get(1) else {
        return cli_summary(&[], s);
    };
    let rest = &args[2..];
    match command.as_str() {
        "add" => cli_add(rest, s),
        "list" | "ls" => cli_list(rest, s),
        "summary" | "s" => cli_summary(rest, s),
        "replicate" => cli_replicate(rest, s),
        "update" => cli_update(rest, s),
        "pay" => cli_set_paid(rest, s, true),
        "unpay" => cli_set_paid(rest, s, false),
        "delete" | "rm" => cli_delete(rest, s),
        "unpay-future" => cli_unpay_future(rest, s),
        "backfill" => cli_backfill(rest, s),
        "export" => cli_export(rest, s),
        "sub" => records::cli_subscriptions(rest, s),
        "project" => records::cli_projects(rest, s),
        "cash" => records::cli_cash_flow(rest, s),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("cashbook {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("cashbook: expenses, subscriptions, projects and cash flow");
    println!();
    println!("Usage: cashbook [command]");
    println!();
    println!("Expenses:");
    println!("  (none)                          Summary of the current month");
    println!("  add casual|monthly|installment  Add an expense");
    println!("    --title <T> --amount <A>      Required");
    println!("    --category <C> --description <D> --date <YYYY-MM-DD> --scope <S>");
    println!("    --day <1-31> --months <N>     Monthly: pinned day, months ahead");
    println!("    --total <N> --current <K>     Installment: count and starting index");
    println!("  list [YYYY-MM] [--scope S]      List a month's expenses");
    println!("  summary [YYYY-MM] [--scope S]   Month totals");
    println!("  replicate <id>                  Create missing future rows of a series");
    println!("  update <id> [--title] [--amount] [--category] [--description] [--day] [--date]");
    println!("  pay <id> | unpay <id>           Toggle the paid flag of one row");
    println!("  delete <id>                     Delete, cascading through the series");
    println!("  unpay-future [--scope S]        Mark rows from today on as unpaid");
    println!("  backfill [--force]              Promote legacy monthly rows to series");
    println!("  export [path] [--month YYYY-MM] [--scope S]");
    println!();
    println!("Records:");
    println!("  sub add|list|update|delete flut|flix ...");
    println!("  project add|list|approve|reject|pending|delete|stats|reasons ...");
    println!("  cash add|list|update|delete ...");
    println!();
    println!("  --help, -h                      Show this help");
    println!("  --version, -V                   Show version");
    println!();
    println!("Ids may be abbreviated to any unique prefix.");
}

fn id_arg(args: &[String]) -> Result<&str> {
    positional(args).ok_or_else(|| anyhow::anyhow!("Missing expense id"))
}

// ── Expenses ─────────────────────────────────────────────────

fn cli_add(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let kind_raw = positional(args).ok_or_else(|| {
        anyhow::anyhow!("Usage: cashbook add casual|monthly|installment --title <T> --amount <A>")
    })?;
    let kind = ExpenseKind::parse(kind_raw)
        .ok_or_else(|| anyhow::anyhow!("Unknown expense type: {kind_raw}"))?;

    let title = required(args, "--title")?.trim().to_string();
    if title.is_empty() {
        anyhow::bail!("Title cannot be empty");
    }
    let amount = parse_amount(required(args, "--amount")?)?;
    let date = match flag(args, "--date") {
        Some(raw) => parse_date(raw)?,
        None => s.today,
    };

    let mut expense = Expense::new(title, amount, kind, s.scope(args)?, date);
    expense.category = flag(args, "--category").unwrap_or_default().to_string();
    expense.description = flag(args, "--description").unwrap_or_default().to_string();

    match kind {
        ExpenseKind::Casual => match series::create_casual(s.db, &expense) {
            Ok(()) => s.notify(Notice::success(
                "Expense added",
                format!("{} {}", expense.title, format_amount(expense.amount)),
            )),
            Err(e) => s.series_failed("Could not add expense", e),
        },
        ExpenseKind::Monthly => {
            expense.recurring_day = parse_flag(args, "--day")?;
            let months = parse_flag(args, "--months")?.unwrap_or(s.config.months_to_create);
            match series::create_monthly_series(s.db, &expense, months) {
                Ok(root) => s.notify(Notice::success(
                    "Monthly expense added",
                    format!("{} from {}, {} months ahead", root.title, root.date, months),
                )),
                Err(e) => s.series_failed("Could not add monthly expense", e),
            }
        }
        ExpenseKind::Installment => {
            let total: Option<u32> = parse_flag(args, "--total")?;
            let current: u32 = parse_flag(args, "--current")?.unwrap_or(1);
            expense.installment = total.map(|total| Installment { current, total });
            match series::create_installments(s.db, &expense) {
                Ok(rows) => s.notify(Notice::success(
                    "Installments added",
                    format!("{} installments of {}", rows.len(), format_amount(expense.amount)),
                )),
                Err(e) => s.series_failed("Could not add installments", e),
            }
        }
    }
    Ok(())
}

fn cli_list(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let month = s.month(args)?;
    let scope = s.scope(args)?;
    let expenses = s.db.get_expenses(scope, Some(&month))?;
    if expenses.is_empty() {
        println!("No {scope} expenses for {month}");
        return Ok(());
    }

    println!(
        "{:<8}  {:<10}  {:<32} {:>14}  {:<11} Paid",
        "ID", "Date", "Title", "Amount", "Type"
    );
    println!("{}", "─".repeat(86));
    for e in &expenses {
        let marker = if e.is_monthly_root() { "*" } else { " " };
        println!(
            "{:<8}  {:<10}  {:<32} {:>14}  {:<11} {}{}",
            short_id(&e.id),
            e.date,
            truncate(&e.title, 32),
            format_amount(e.amount),
            e.kind.as_str(),
            if e.paid { "yes" } else { "no" },
            marker,
        );
    }
    println!();
    println!("* series root");
    Ok(())
}

fn cli_summary(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let month = s.month(args)?;
    let scope = s.scope(args)?;
    let expenses = s.db.get_expenses(scope, Some(&month))?;
    let summary = ExpenseSummary::from_expenses(&month, scope, &expenses);

    println!("cashbook, {month} ({scope})");
    println!("{}", "─".repeat(40));
    for (kind, total) in &summary.by_kind {
        println!("  {:<12} {:>18}", kind.to_string(), format_amount(*total));
    }
    println!("  {:<12} {:>18}", "Total", format_amount(summary.total));
    println!("  {:<12} {:>18}", "Paid", format_amount(summary.paid));
    println!("  {:<12} {:>18}", "Unpaid", format_amount(summary.unpaid));
    println!("  {:<12} {:>18}", "Rows", summary.count);

    if !summary.by_category.is_empty() {
        println!();
        println!("By category:");
        for (name, amount) in &summary.by_category {
            println!("  {:<24} {:>16}", truncate(name, 24), format_amount(*amount));
        }
    }

    println!();
    println!("Subscriptions:");
    for plan in [Plan::Flut, Plan::Flix] {
        let rows = s.db.get_subscriptions(plan, Some(&month))?;
        let sub = SubscriptionSummary::from_rows(plan, &rows);
        println!(
            "  {:<6} {:>3} clients {:>18}",
            sub.plan.to_string(),
            sub.clients,
            format_amount(sub.total)
        );
    }

    let totals = crate::models::CashFlowTotals::from_entries(&s.db.get_cash_flow(&month)?);
    println!();
    println!("Cash flow:");
    println!("  {:<12} {:>18}", "In", format_amount(totals.inflow));
    println!("  {:<12} {:>18}", "Out", format_amount(totals.outflow));
    println!("  {:<12} {:>18}", "Balance", format_amount(totals.balance()));
    Ok(())
}

fn cli_replicate(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let prefix = id_arg(args)?;
    let (today, window) = (s.today, s.config.replication_window_months);
    let result = s
        .expense_id(prefix)
        .and_then(|id| series::replicate(s.db, &id, today, window));
    match result {
        Ok(rep) if rep.is_up_to_date() => s.notify(Notice::info(
            "Already up to date",
            "Every future row of this series already exists",
        )),
        Ok(rep) => s.notify(Notice::success(
            "Series replicated",
            format!("{} created, {} already present", rep.created, rep.skipped),
        )),
        Err(e) => s.series_failed("Could not replicate expense", e),
    }
    Ok(())
}

fn cli_update(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let prefix = id_arg(args)?;
    let changes = ExpenseChanges {
        title: flag(args, "--title").map(str::to_string),
        amount: flag(args, "--amount").map(parse_amount).transpose()?,
        category: flag(args, "--category").map(str::to_string),
        description: flag(args, "--description").map(str::to_string),
        recurring_day: parse_flag(args, "--day")?,
        date: flag(args, "--date").map(parse_date).transpose()?,
    };
    let today = s.today;
    let result = s
        .expense_id(prefix)
        .and_then(|id| series::update_expense(s.db, &id, &changes, today));
    match result {
        Ok(outcome) => s.notify(Notice::success(
            "Expense updated",
            format!("{} row(s) changed", outcome.updated),
        )),
        Err(e) => s.series_failed("Could not update expense", e),
    }
    Ok(())
}

fn cli_set_paid(args: &[String], s: &mut Session<'_>, paid: bool) -> Result<()> {
    let prefix = id_arg(args)?;
    let result = s
        .expense_id(prefix)
        .and_then(|id| series::set_paid(s.db, &id, paid));
    match result {
        Ok(()) if paid => s.notify(Notice::success("Marked as paid", "")),
        Ok(()) => s.notify(Notice::success("Marked as unpaid", "")),
        Err(e) => s.series_failed("Could not change paid status", e),
    }
    Ok(())
}

fn cli_delete(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let prefix = id_arg(args)?;
    let today = s.today;
    let result = s
        .expense_id(prefix)
        .and_then(|id| series::delete_expense(s.db, &id, today));
    match result {
        Ok(removal) => {
            let mut description = format!("{} row(s) removed", removal.deleted);
            if removal.series_removed {
                description.push_str(", series closed");
            }
            s.notify(Notice::success("Expense deleted", description));
        }
        Err(e) => s.series_failed("Could not delete expense", e),
    }
    Ok(())
}

fn cli_unpay_future(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let scope = s.scope(args)?;
    match series::mark_future_unpaid(s.db, scope, s.today) {
        Ok(0) => s.notify(Notice::info("Nothing to change", "No paid rows from today on")),
        Ok(count) => s.notify(Notice::success(
            "Future expenses marked unpaid",
            format!("{count} row(s) from {} on", s.today),
        )),
        Err(e) => s.series_failed("Could not mark expenses unpaid", e),
    }
    Ok(())
}

fn cli_backfill(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let force = has_flag(args, "--force");
    let window = s.config.replication_window_months;
    match series::backfill_recurring(s.db, s.today, window, force) {
        Ok(run) if run.flagged == 0 && run.created == 0 => s.notify(Notice::info(
            "Already up to date",
            "No monthly series needed new rows",
        )),
        Ok(run) => s.notify(Notice::success(
            "Recurring expenses updated",
            format!(
                "{} row(s) promoted to series, {} future row(s) created",
                run.flagged, run.created
            ),
        )),
        Err(e) => s.series_failed("Could not backfill recurring expenses", e),
    }
    Ok(())
}

fn cli_export(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let month = match flag(args, "--month") {
        Some(raw) => parse_month(raw)?,
        None => s.today.format("%Y-%m").to_string(),
    };
    let scope = s.scope(args)?;
    let path = positional(args)
        .map(|a| PathBuf::from(shellexpand(a)))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(format!("cashbook-{scope}-{month}.csv"))
        });

    let result = s
        .db
        .get_expenses(scope, Some(&month))
        .and_then(|rows| crate::export::export_expenses(&path, &rows));
    match result {
        Ok(0) => s.notify(Notice::info(
            "Nothing to export",
            format!("No {scope} expenses for {month}; wrote an empty file to {}", path.display()),
        )),
        Ok(count) => s.notify(Notice::success(
            "Expenses exported",
            format!("{count} row(s) to {}", path.display()),
        )),
        Err(e) => s.failed_with("Could not export expenses", e),
    }
    Ok(())
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}
