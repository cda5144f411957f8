//! Dashboard statistics: period counts, breakdowns and daily trends.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{IntakeError, Result};
use crate::records::{Record, DEFAULT_STATUS};
use crate::time_utils::{month_start, week_start};

/// Bucket used for records without a course or country.
pub const UNSPECIFIED: &str = "Other";

pub const DEFAULT_TREND_DAYS: u32 = 7;
pub const MAX_TREND_DAYS: u32 = 366;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodCounts {
    pub total: usize,
    pub today: usize,
    pub this_week: usize,
    pub this_month: usize,
}

impl PeriodCounts {
    fn tally(records: &[Record], today: NaiveDate) -> Self {
        let week = week_start(today);
        let month = month_start(today);
        let mut counts = PeriodCounts {
            total: records.len(),
            ..Default::default()
        };

        for date in records.iter().filter_map(|r| r.submitted_at()).map(|t| t.date()) {
            if date == today {
                counts.today += 1;
            }
            if date >= week {
                counts.this_week += 1;
            }
            if date >= month {
                counts.this_month += 1;
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub completed: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    #[serde(flatten)]
    pub registrations: PeriodCounts,
    /// Same as `by_status.pending`, kept at the top level for dashboard cards.
    pub pending: usize,
    pub completed: usize,
    pub by_course: BTreeMap<String, usize>,
    pub by_country: BTreeMap<String, usize>,
    pub by_status: StatusCounts,
    pub contacts: PeriodCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub label: String,
    pub count: usize,
}

pub fn summarize(registrations: &[Record], contacts: &[Record], today: NaiveDate) -> StatsSummary {
    let mut by_course = BTreeMap::new();
    let mut by_country = BTreeMap::new();
    let mut by_status = StatusCounts::default();

    for reg in registrations {
        let course = reg
            .get_str("course")
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| UNSPECIFIED.to_string());
        *by_course.entry(course).or_insert(0) += 1;

        for country in destinations(reg) {
            *by_country.entry(country).or_insert(0) += 1;
        }

        match reg.status().as_str() {
            DEFAULT_STATUS => by_status.pending += 1,
            "completed" => by_status.completed += 1,
            "cancelled" => by_status.cancelled += 1,
            _ => {},
        }
    }

    StatsSummary {
        registrations: PeriodCounts::tally(registrations, today),
        pending: by_status.pending,
        completed: by_status.completed,
        by_course,
        by_country,
        by_status,
        contacts: PeriodCounts::tally(contacts, today),
    }
}

/// Destination countries of a registration: `target_country`, else `projects`.
fn destinations(reg: &Record) -> Vec<String> {
    let raw = ["target_country", "projects"]
        .iter()
        .filter_map(|f| reg.get(f))
        .find(|v| !is_blank(v));

    let mut out: Vec<String> = match raw {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(split_list)
            .collect(),
        Some(Value::String(s)) => split_list(s).collect(),
        Some(other) => vec![other.to_string()],
        None => Vec::new(),
    };

    if out.is_empty() {
        out.push(UNSPECIFIED.to_string());
    }
    out
}

fn split_list(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Validate the `days` window for trends.
pub fn trend_days(days: Option<u32>) -> Result<u32> {
    let days = days.unwrap_or(DEFAULT_TREND_DAYS);
    if days == 0 || days > MAX_TREND_DAYS {
        return Err(IntakeError::InvalidInput(format!(
            "days must be between 1 and {}",
            MAX_TREND_DAYS
        )));
    }
    Ok(days)
}

/// Registrations per day for the `days` days ending `today`, oldest first.
pub fn trends(registrations: &[Record], days: u32, today: NaiveDate) -> Vec<TrendPoint> {
    let first = today - Days::new(u64::from(days.saturating_sub(1)));
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for date in registrations
        .iter()
        .filter_map(|r| r.submitted_at())
        .map(|t| t.date())
        .filter(|d| *d >= first && *d <= today)
    {
        *per_day.entry(date).or_insert(0) += 1;
    }

    first
        .iter_days()
        .take(days as usize)
        .map(|date| TrendPoint {
            date: date.format("%Y-%m-%d").to_string(),
            label: date.format("%m/%d").to_string(),
            count: per_day.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Distinct courses in first-seen order.
pub fn courses(registrations: &[Record]) -> Vec<String> {
    let mut seen = Vec::new();
    for course in registrations.iter().filter_map(|r| r.get_str("course")) {
        let course = course.trim().to_string();
        if !course.is_empty() && !seen.contains(&course) {
            seen.push(course);
        }
    }
    seen
}
