//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use curator_session::{ActOutcome, ItemId, Notification, Record, Row, Stats, ViewSnapshot};
use serde::Serialize;
use serde_json::{Value, json};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_rows(snapshot: &ViewSnapshot<Record>, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<Value> = snapshot.rows.iter().map(row_json).collect();
            print_json(&json!({"rows": rows, "stats": snapshot.stats}))?;
        }
        OutputFormat::Table => {
            println!("{:<12} {:<12} TITLE", "ID", "STATUS");
            for row in &snapshot.rows {
                println!(
                    "{:<12} {:<12} {}",
                    row.id,
                    row.badge.as_ref().map_or("-", |badge| badge.label.as_str()),
                    row.item.as_ref().and_then(Record::title).unwrap_or("")
                );
            }
            println!("{} rows", snapshot.rows.len());
            if !snapshot.stats.is_empty() {
                println!("stats: {}", format_stats(&snapshot.stats));
            }
        }
    }
    Ok(())
}

pub(crate) fn render_outcome(
    outcome: &ActOutcome,
    snapshot: &ViewSnapshot<Record>,
    format: OutputFormat,
) -> CliResult<()> {
    match (outcome, format) {
        (ActOutcome::Declined, OutputFormat::Json) => {
            print_json(&json!({"status": "declined"}))?;
        }
        (ActOutcome::Declined, OutputFormat::Table) => println!("cancelled; nothing was sent"),
        (ActOutcome::Completed { receipt, report }, OutputFormat::Json) => {
            let rows: Vec<Value> = snapshot.rows.iter().map(row_json).collect();
            print_json(&json!({
                "status": "completed",
                "action": receipt.action,
                "message": receipt.message,
                "patched": report.patched,
                "removed_or_missing": report.missing,
                "stale": report.stale,
                "rows": rows,
            }))?;
        }
        (ActOutcome::Completed { receipt, report }, OutputFormat::Table) => {
            println!("{}", receipt.message);
            for row in &snapshot.rows {
                if let Some(badge) = &row.badge {
                    println!("  {:<12} {}", row.id, badge.label);
                }
            }
            if !report.stale.is_empty() {
                println!("superseded by a newer action: {}", join_ids(&report.stale));
            }
        }
    }
    Ok(())
}

pub(crate) fn render_stats(stats: &Stats, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(stats)?,
        OutputFormat::Table => {
            for (key, value) in stats.iter() {
                println!("{key:<16} {}", display_value(value));
            }
        }
    }
    Ok(())
}

pub(crate) fn render_record(record: &Record, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(record)?,
        OutputFormat::Table => {
            println!("id: {}", record.id);
            for (key, value) in &record.fields {
                println!("{key}: {}", display_value(value));
            }
        }
    }
    Ok(())
}

pub(crate) fn render_notification(notice: &Notification, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string(notice)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => println!("{}", format_notification(notice)),
    }
    Ok(())
}

pub(crate) fn format_notification(notice: &Notification) -> String {
    let stamp = notice.created_at.format("%H:%M:%S");
    if notice.title.is_empty() {
        format!("{stamp} [{}] {}", notice.kind.as_str(), notice.message)
    } else {
        format!(
            "{stamp} [{}] {}: {}",
            notice.kind.as_str(),
            notice.title,
            notice.message
        )
    }
}

pub(crate) fn format_stats(stats: &Stats) -> String {
    stats
        .iter()
        .map(|(key, value)| format!("{key}={}", display_value(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn row_json(row: &Row<Record>) -> Value {
    json!({
        "id": row.id,
        "status": row.badge.as_ref().map(|badge| badge.label.as_str()),
        "item": row.item,
    })
}

fn join_ids(ids: &[ItemId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
