//! Record filtering for the dashboard search box and for exports.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::records::{sort_newest_first, Record};
use crate::time_utils::parse_date;

/// Fields scanned by the free-text query.
const SEARCH_FIELDS: &[&str] = &["name", "phone", "email", "course", "remarks", "message"];

/// Sentinel the dashboard sends for "no filter" in select boxes.
const ALL: &str = "all";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub query: Option<String>,
    pub status: Option<String>,
    pub course: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl RecordFilter {
    /// Build a filter from raw query-string values.
    pub fn from_raw(
        query: Option<&str>,
        status: Option<&str>,
        course: Option<&str>,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            query: non_empty(query).map(str::to_lowercase),
            status: selection(status),
            course: selection(course),
            date_from: non_empty(date_from).map(parse_date).transpose()?,
            date_to: non_empty(date_to).map(parse_date).transpose()?,
        })
    }

    pub fn matches(&self, record: &Record) -> bool {
        if let Some(q) = &self.query {
            let hit = SEARCH_FIELDS.iter().any(|f| {
                record
                    .get_str(f)
                    .is_some_and(|v| v.to_lowercase().contains(q.as_str()))
            });
            if !hit {
                return false;
            }
        }

        if let Some(status) = &self.status {
            if record.status() != *status {
                return false;
            }
        }

        if let Some(course) = &self.course {
            if record.get_str("course").as_deref() != Some(course.as_str()) {
                return false;
            }
        }

        if self.date_from.is_some() || self.date_to.is_some() {
            let Some(date) = record.submitted_at().map(|t| t.date()) else {
                return false;
            };
            if self.date_from.is_some_and(|from| date < from) {
                return false;
            }
            if self.date_to.is_some_and(|to| date > to) {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn selection(raw: Option<&str>) -> Option<String> {
    non_empty(raw)
        .filter(|s| !s.eq_ignore_ascii_case(ALL))
        .map(str::to_string)
}

#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub data: Vec<Record>,
    pub total: usize,
}

/// Filter and order records newest first.
pub fn search(records: Vec<Record>, filter: &RecordFilter) -> SearchResult {
    let mut data = filter.apply(records);
    sort_newest_first(&mut data);
    SearchResult {
        total: data.len(),
        data,
    }
}
