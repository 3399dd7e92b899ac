use anyhow::Result;

use super::{flag, flag_all, parse_flag, positional, required, short_id, Session};
use crate::db::Table;
use crate::models::*;
use crate::notify::Notice;
use crate::report::SubscriptionSummary;
use crate::util::{format_amount, parse_amount, parse_date, parse_month, truncate};

fn sub_args(args: &[String]) -> (Option<&str>, &[String]) {
    match args.split_first() {
        Some((first, rest)) => (Some(first.as_str()), rest),
        None => (None, args),
    }
}

fn plan_arg(args: &[String]) -> Result<(Plan, &[String])> {
    let (raw, rest) = sub_args(args);
    let raw = raw.ok_or_else(|| anyhow::anyhow!("Missing plan: flut or flix"))?;
    let plan = Plan::parse(raw).ok_or_else(|| anyhow::anyhow!("Unknown plan: {raw}"))?;
    Ok((plan, rest))
}

fn month_flag(args: &[String], name: &str) -> Result<Option<String>> {
    flag(args, name).map(parse_month).transpose()
}

fn first_day(month: &str) -> Result<chrono::NaiveDate> {
    parse_date(&format!("{month}-01"))
}

// ── Subscriptions ────────────────────────────────────────────

pub(super) fn cli_subscriptions(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let (action, rest) = sub_args(args);
    match action {
        Some("add") => sub_add(rest, s),
        Some("list") | Some("ls") => sub_list(rest, s),
        Some("update") => sub_update(rest, s),
        Some("delete") | Some("rm") => sub_delete(rest, s),
        _ => anyhow::bail!(
            "Usage: cashbook sub add|list|update|delete flut|flix [--client C] [--value V] [--month YYYY-MM]"
        ),
    }
}

fn sub_add(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let (plan, args) = plan_arg(args)?;
    let client = required(args, "--client")?.trim().to_string();
    let value = parse_amount(required(args, "--value")?)?;
    let start = match month_flag(args, "--month")? {
        Some(month) => first_day(&month)?,
        None => s.today,
    };
    let months = parse_flag(args, "--months")?.unwrap_or(s.config.subscription_months);

    let template = Subscription::new(plan, client, value, start);
    match s.db.insert_subscription_run(&template, months) {
        Ok(rows) => s.notify(Notice::success(
            format!("{plan} subscription added"),
            format!(
                "{} at {}/month, {} months from {}",
                template.client_name,
                format_amount(value),
                rows.len(),
                template.month.format("%Y-%m")
            ),
        )),
        Err(e) => s.failed_with("Could not add subscription", e),
    }
    Ok(())
}

fn sub_list(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let (plan, args) = plan_arg(args)?;
    let month = match positional(args) {
        Some(raw) => Some(parse_month(raw)?),
        None => None,
    };
    let rows = s.db.get_subscriptions(plan, month.as_deref())?;
    if rows.is_empty() {
        println!("No {plan} subscriptions");
        return Ok(());
    }

    println!("{:<8}  {:<7}  {:<28} {:>14}", "ID", "Month", "Client", "Value");
    println!("{}", "─".repeat(62));
    for sub in &rows {
        println!(
            "{:<8}  {:<7}  {:<28} {:>14}",
            short_id(&sub.id),
            sub.month.format("%Y-%m").to_string(),
            truncate(&sub.client_name, 28),
            format_amount(sub.monthly_value),
        );
    }
    if let Some(month) = &month {
        let summary = SubscriptionSummary::from_rows(plan, &rows);
        println!();
        println!(
            "{month}: {} clients, {}",
            summary.clients,
            format_amount(summary.total)
        );
    }
    Ok(())
}

fn sub_update(args: &[String], s: &mut Session<'_>) -> Result<()> {
    // The plan is accepted for symmetry with the other actions.
    let args = match args.first().and_then(|a| Plan::parse(a)) {
        Some(_) => &args[1..],
        None => args,
    };
    let prefix = positional(args).ok_or_else(|| anyhow::anyhow!("Missing subscription id"))?;
    let client = flag(args, "--client");
    let value = flag(args, "--value").map(parse_amount).transpose()?;
    if client.is_none() && value.is_none() {
        anyhow::bail!("Nothing to update: pass --client and/or --value");
    }

    let result = s
        .record_id(Table::Subscriptions, prefix)
        .and_then(|id| s.db.update_subscription(&id, client, value));
    match result {
        Ok(_) => s.notify(Notice::success("Subscription updated", "")),
        Err(e) => s.failed_with("Could not update subscription", e),
    }
    Ok(())
}

fn sub_delete(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let (plan, args) = plan_arg(args)?;
    let client = required(args, "--client")?;
    let from = match month_flag(args, "--from")? {
        Some(month) => first_day(&month)?,
        None => s.today,
    };

    match s.db.delete_subscriptions_from(plan, client, from) {
        Ok(0) => s.notify(Notice::info(
            "Nothing to delete",
            format!("No {plan} rows for {client} from {}", from.format("%Y-%m")),
        )),
        Ok(count) => s.notify(Notice::success(
            format!("{plan} subscription removed"),
            format!("{count} month(s) of {client} from {}", from.format("%Y-%m")),
        )),
        Err(e) => s.failed_with("Could not delete subscription", e),
    }
    Ok(())
}

// ── Projects ─────────────────────────────────────────────────

pub(super) fn cli_projects(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let (action, rest) = sub_args(args);
    match action {
        Some("add") => project_add(rest, s),
        Some("list") | Some("ls") => project_list(rest, s),
        Some("approve") => project_set_status(rest, s, ProjectStatus::Approved),
        Some("pending") => project_set_status(rest, s, ProjectStatus::Pending),
        Some("reject") => project_reject(rest, s),
        Some("delete") | Some("rm") => project_delete(rest, s),
        Some("stats") => project_stats(s),
        Some("reasons") => {
            for (i, reason) in PREDEFINED_REJECTION_REASONS.iter().enumerate() {
                println!("  {}. {reason}", i + 1);
            }
            Ok(())
        }
        _ => anyhow::bail!(
            "Usage: cashbook project add|list|approve|reject|pending|delete|stats|reasons"
        ),
    }
}

fn project_add(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let mut project = Project::new(
        required(args, "--name")?.trim().to_string(),
        required(args, "--client")?.trim().to_string(),
        required(args, "--responsible")?.trim().to_string(),
        parse_amount(required(args, "--value")?)?,
    );
    project.description = flag(args, "--description").unwrap_or_default().to_string();

    match s.db.insert_project(&project) {
        Ok(()) => s.notify(Notice::success(
            "Project submitted",
            format!("{} for {}, awaiting approval", project.name, project.client),
        )),
        Err(e) => s.failed_with("Could not add project", e),
    }
    Ok(())
}

fn project_list(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let status = match flag(args, "--status") {
        Some(raw) => Some(
            ProjectStatus::parse(raw).ok_or_else(|| anyhow::anyhow!("Unknown status: {raw}"))?,
        ),
        None => None,
    };
    let filter = ProjectFilter {
        status,
        client: flag(args, "--client").map(str::to_string),
        responsible: flag(args, "--responsible").map(str::to_string),
    };
    let projects: Vec<Project> = s
        .db
        .get_projects()?
        .into_iter()
        .filter(|p| p.matches(&filter))
        .collect();
    if projects.is_empty() {
        println!("No projects");
        return Ok(());
    }

    println!(
        "{:<8}  {:<24} {:<18} {:<14} {:>14}  Status",
        "ID", "Name", "Client", "Responsible", "Value"
    );
    println!("{}", "─".repeat(92));
    for p in &projects {
        println!(
            "{:<8}  {:<24} {:<18} {:<14} {:>14}  {}",
            short_id(&p.id),
            truncate(&p.name, 24),
            truncate(&p.client, 18),
            truncate(&p.responsible, 14),
            format_amount(p.estimated_value),
            p.status.as_str(),
        );
        if p.status == ProjectStatus::Rejected {
            println!("          reasons: {}", p.rejection_reasons.join("; "));
            if !p.rejection_observations.is_empty() {
                println!("          notes: {}", p.rejection_observations);
            }
        }
    }
    Ok(())
}

fn load_project(s: &Session<'_>, prefix: &str) -> Result<Project> {
    let id = s.record_id(Table::Projects, prefix)?;
    s.db
        .get_project_by_id(&id)?
        .ok_or_else(|| anyhow::anyhow!("Project not found: {id}"))
}

fn project_set_status(args: &[String], s: &mut Session<'_>, status: ProjectStatus) -> Result<()> {
    let prefix = positional(args).ok_or_else(|| anyhow::anyhow!("Missing project id"))?;
    let result = load_project(s, prefix).and_then(|mut project| {
        project.set_status(status)?;
        s.db.save_project(&project)?;
        Ok(project)
    });
    match result {
        Ok(project) => s.notify(Notice::success(
            format!("Project {status}"),
            project.name,
        )),
        Err(e) => s.failed_with("Could not change project status", e),
    }
    Ok(())
}

/// `--reason` may repeat; a number picks from the predefined list.
fn rejection_reasons(args: &[String]) -> Vec<String> {
    flag_all(args, "--reason")
        .into_iter()
        .map(|raw| {
            raw.parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| PREDEFINED_REJECTION_REASONS.get(i))
                .map_or_else(|| raw.to_string(), |r| (*r).to_string())
        })
        .collect()
}

fn project_reject(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let prefix = positional(args).ok_or_else(|| anyhow::anyhow!("Missing project id"))?;
    let reasons = rejection_reasons(args);
    let observations = flag(args, "--obs").unwrap_or_default().to_string();

    let result = load_project(s, prefix).and_then(|mut project| {
        project.reject(reasons, observations)?;
        s.db.save_project(&project)?;
        Ok(project)
    });
    match result {
        Ok(project) => s.notify(Notice::success(
            "Project rejected",
            format!("{}: {}", project.name, project.rejection_reasons.join("; ")),
        )),
        Err(e) => s.failed_with("Could not reject project", e),
    }
    Ok(())
}

fn project_delete(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let prefix = positional(args).ok_or_else(|| anyhow::anyhow!("Missing project id"))?;
    let result = s
        .record_id(Table::Projects, prefix)
        .and_then(|id| s.db.delete_project(&id));
    match result {
        Ok(_) => s.notify(Notice::success("Project deleted", "")),
        Err(e) => s.failed_with("Could not delete project", e),
    }
    Ok(())
}

fn project_stats(s: &mut Session<'_>) -> Result<()> {
    let stats = ProjectStats::from_projects(&s.db.get_projects()?);
    println!("Projects");
    println!("{}", "─".repeat(32));
    println!("  {:<10} {:>6}", "Pending", stats.pending);
    println!("  {:<10} {:>6}", "Approved", stats.approved);
    println!("  {:<10} {:>6}", "Rejected", stats.rejected);
    println!("  {:<10} {:>18}", "Value", format_amount(stats.total_value));
    Ok(())
}

// ── Cash flow ────────────────────────────────────────────────

pub(super) fn cli_cash_flow(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let (action, rest) = sub_args(args);
    match action {
        Some("add") => cash_add(rest, s),
        Some("list") | Some("ls") => cash_list(rest, s),
        Some("update") => cash_update(rest, s),
        Some("delete") | Some("rm") => cash_delete(rest, s),
        _ => anyhow::bail!("Usage: cashbook cash add in|out|list|update|delete ..."),
    }
}

fn flow_kind(raw: &str) -> Result<FlowKind> {
    FlowKind::parse(raw).ok_or_else(|| anyhow::anyhow!("Unknown flow type: {raw} (use in or out)"))
}

fn cash_add(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let kind = flow_kind(positional(args).ok_or_else(|| anyhow::anyhow!("Missing flow type: in or out"))?)?;
    let date = match flag(args, "--date") {
        Some(raw) => parse_date(raw)?,
        None => s.today,
    };
    let mut entry = CashFlowEntry::new(
        kind,
        parse_amount(required(args, "--amount")?)?,
        required(args, "--title")?.trim().to_string(),
        date,
    );
    entry.description = flag(args, "--description").unwrap_or_default().to_string();

    match s.db.insert_cash_flow(&entry) {
        Ok(()) => s.notify(Notice::success(
            "Cash flow entry added",
            format!("{} {} {}", entry.kind, entry.title, format_amount(entry.amount)),
        )),
        Err(e) => s.failed_with("Could not add cash flow entry", e),
    }
    Ok(())
}

fn cash_list(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let month = s.month(args)?;
    let entries = s.db.get_cash_flow(&month)?;
    let totals = CashFlowTotals::from_entries(&entries);

    if entries.is_empty() {
        println!("No cash flow for {month}");
    } else {
        println!("{:<8}  {:<10}  {:<4} {:<30} {:>14}", "ID", "Date", "Type", "Title", "Amount");
        println!("{}", "─".repeat(72));
        for e in &entries {
            println!(
                "{:<8}  {:<10}  {:<4} {:<30} {:>14}",
                short_id(&e.id),
                e.date,
                e.kind.to_string(),
                truncate(&e.title, 30),
                format_amount(e.amount),
            );
        }
        println!();
    }
    println!("In:      {:>18}", format_amount(totals.inflow));
    println!("Out:     {:>18}", format_amount(totals.outflow));
    println!("Balance: {:>18}", format_amount(totals.balance()));
    Ok(())
}

fn cash_update(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let prefix = positional(args).ok_or_else(|| anyhow::anyhow!("Missing entry id"))?;
    let kind = flag(args, "--type").map(flow_kind).transpose()?;
    let amount = flag(args, "--amount").map(parse_amount).transpose()?;
    let date = flag(args, "--date").map(parse_date).transpose()?;
    let title = flag(args, "--title");
    let description = flag(args, "--description");

    let result = s.record_id(Table::CashFlow, prefix).and_then(|id| {
        let mut entry = s
            .db
            .get_cash_flow_by_id(&id)?
            .ok_or_else(|| anyhow::anyhow!("Cash flow entry not found: {id}"))?;
        if let Some(kind) = kind {
            entry.kind = kind;
        }
        if let Some(amount) = amount {
            entry.amount = amount;
        }
        if let Some(date) = date {
            entry.date = date;
            entry.month = first_of_month(date);
        }
        if let Some(title) = title {
            entry.title = title.trim().to_string();
        }
        if let Some(description) = description {
            entry.description = description.to_string();
        }
        s.db.update_cash_flow(&entry)
    });
    match result {
        Ok(_) => s.notify(Notice::success("Cash flow entry updated", "")),
        Err(e) => s.failed_with("Could not update cash flow entry", e),
    }
    Ok(())
}

fn cash_delete(args: &[String], s: &mut Session<'_>) -> Result<()> {
    let prefix = positional(args).ok_or_else(|| anyhow::anyhow!("Missing entry id"))?;
    let result = s
        .record_id(Table::CashFlow, prefix)
        .and_then(|id| s.db.delete_cash_flow(&id));
    match result {
        Ok(_) => s.notify(Notice::success("Cash flow entry deleted", "")),
        Err(e) => s.failed_with("Could not delete cash flow entry", e),
    }
    Ok(())
}
