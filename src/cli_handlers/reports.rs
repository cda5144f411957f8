//! Read-only reports over the stored records.

use chrono::Local;

use crate::error::Result;
use crate::records::{Record, RecordKind};
use crate::search::{self, RecordFilter};
use crate::stats::{self, PeriodCounts};
use crate::store::Datastore;

fn print_counts(label: &str, counts: &PeriodCounts) {
    println!(
        "{}: {} total, {} today, {} this week, {} this month",
        label, counts.total, counts.today, counts.this_week, counts.this_month
    );
}

pub async fn handle_stats_command(store: &Datastore, format: &str) -> Result<()> {
    let registrations = store.registrations().load().await?;
    let contacts = store.contacts().load().await?;
    let summary = stats::summarize(&registrations, &contacts, Local::now().date_naive());

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_counts("Registrations", &summary.registrations);
    print_counts("Contacts", &summary.contacts);
    println!(
        "Status: {} pending, {} completed, {} cancelled",
        summary.by_status.pending, summary.by_status.completed, summary.by_status.cancelled
    );

    for (title, breakdown) in [("By course", &summary.by_course), ("By country", &summary.by_country)] {
        if breakdown.is_empty() {
            continue;
        }
        println!("\n{}:", title);
        for (name, count) in breakdown {
            println!("  {:<24} {}", name, count);
        }
    }

    Ok(())
}

pub async fn handle_trends_command(store: &Datastore, days: u32, format: &str) -> Result<()> {
    let days = stats::trend_days(Some(days))?;
    let registrations = store.registrations().load().await?;
    let points = stats::trends(&registrations, days, Local::now().date_naive());

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&points)?);
        return Ok(());
    }

    for point in &points {
        println!("{}  {:>4}  {}", point.label, point.count, "#".repeat(point.count.min(60)));
    }
    Ok(())
}

pub async fn handle_search_command(
    store: &Datastore,
    query: &str,
    kind: RecordKind,
    status: Option<&str>,
    course: Option<&str>,
    format: &str,
) -> Result<()> {
    let filter = RecordFilter::from_raw(Some(query), status, course, None, None)?;
    let records = store.store(kind).load().await?;
    let result = search::search(records, &filter);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.data.is_empty() {
        println!("No {} matched", kind.plural());
        return Ok(());
    }

    for record in &result.data {
        println!("{}", summary_line(kind, record));
    }
    println!("\n{} {}(s) found", result.total, kind);
    Ok(())
}

fn summary_line(kind: RecordKind, record: &Record) -> String {
    let field = |name: &str| record.get_str(name).unwrap_or_default();
    let key = record.key().unwrap_or_else(|| "-".to_string());
    let when = record
        .submitted_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());

    match kind {
        RecordKind::Registration => format!(
            "#{}  {}  {}  {}  {}  [{}]",
            key,
            when,
            field("name"),
            field("phone"),
            field("course"),
            record.status()
        ),
        RecordKind::Contact => format!(
            "#{}  {}  {}  {}  {}",
            key,
            when,
            field("name"),
            field("phone"),
            field("message")
        ),
    }
}
