use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::clock::{format_instant, TimezoneOffset};

use super::models::EmployeeRecord;

pub const PRESENT_LABEL: &str = "Présent";
pub const ABSENT_LABEL: &str = "Absent";
pub const NO_OVERTIME_LABEL: &str = "Sans Heure Sup";
pub const ZERO_OVERTIME_LABEL: &str = "0H00";

/// Free-text search plus an optional exact post match.
#[derive(Debug, Clone, Default)]
pub struct RosterFilter {
    pub search: String,
    pub post: Option<String>,
}

impl RosterFilter {
    pub fn matches(&self, record: &EmployeeRecord) -> bool {
        let needle = self.search.to_lowercase();
        let text_match = record.matricule.to_string().contains(&needle)
            || record.surname.to_lowercase().contains(&needle)
            || record.given_name.to_lowercase().contains(&needle);

        let post_match = match self.post.as_deref() {
            None | Some("") => true,
            Some(post) => record.post == post,
        };

        text_match && post_match
    }

    pub fn apply<'a>(&self, records: &'a [EmployeeRecord]) -> Vec<&'a EmployeeRecord> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

/// Sorted, de-duplicated post labels for the post picker.
pub fn distinct_posts(records: &[EmployeeRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.post.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Display-ready roster line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterRow {
    pub matricule: String,
    pub surname: String,
    pub given_name: String,
    pub post: String,
    pub presence: &'static str,
    pub entry: String,
    pub exit: String,
    pub daily_overtime: String,
    pub daily_amount: String,
    pub total_overtime: String,
    pub total_amount: String,
    pub timezone_label: String,
}

impl RosterRow {
    /// `today` is the current UTC date; entry times are compared raw.
    pub fn from_record(record: &EmployeeRecord, today: NaiveDate, timezone: TimezoneOffset) -> Self {
        let entry_date = record
            .entry_time
            .as_deref()
            .and_then(|entry| entry.get(..10));
        let presence = if entry_date == Some(today.format("%Y-%m-%d").to_string().as_str()) {
            PRESENT_LABEL
        } else {
            ABSENT_LABEL
        };

        let day_closed = record.entry_time.is_some() && record.exit_time.is_some();
        let daily_overtime = record
            .daily_overtime
            .as_deref()
            .filter(|value| day_closed && !value.is_empty())
            .unwrap_or(NO_OVERTIME_LABEL)
            .to_string();
        let daily_amount = record
            .daily_amount
            .as_ref()
            .filter(|_| day_closed)
            .and_then(display_json_value)
            .unwrap_or_else(|| NO_OVERTIME_LABEL.to_string());

        let total_overtime = record
            .overtime
            .as_deref()
            .filter(|value| !value.is_empty())
            .unwrap_or(ZERO_OVERTIME_LABEL)
            .to_string();
        let total_amount = match record.overtime_amount {
            Some(amount) if amount > 0.0 => format_amount(amount),
            _ => format_amount(0.0),
        };

        Self {
            matricule: record.matricule.to_string(),
            surname: record.surname.clone(),
            given_name: record.given_name.clone(),
            post: record.post.clone(),
            presence,
            entry: format_instant(record.entry_time.as_deref(), timezone),
            exit: format_instant(record.exit_time.as_deref(), timezone),
            daily_overtime,
            daily_amount,
            total_overtime,
            total_amount,
            timezone_label: timezone.effective_label(),
        }
    }
}

fn display_json_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) if n.as_f64() == Some(0.0) => None,
        serde_json::Value::Number(n) if n.is_f64() => n.as_f64().map(|v| v.to_string()),
        other => Some(other.to_string()),
    }
}

/// `12 500 Ar` style, grouped with narrow no-break spaces and a decimal comma.
pub fn format_amount(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents / 100);
    let fraction = cents % 100;

    let mut out = String::new();
    if negative && cents > 0 {
        out.push('-');
    }
    out.push_str(&whole);
    if fraction > 0 {
        let digits = format!("{fraction:02}");
        out.push(',');
        out.push_str(digits.trim_end_matches('0'));
    }
    out.push_str(" Ar");
    out
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 * 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('\u{202f}');
        }
        grouped.push(ch);
    }
    grouped
}
