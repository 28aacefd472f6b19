use serde::Serialize;

use super::{models::LogEntry, roster::format_amount};

/// Totals shown under an employee's mark history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSummary {
    pub count: usize,
    pub total_overtime: String,
    pub total_amount: String,
}

impl LogSummary {
    pub fn from_entries(entries: &[LogEntry]) -> Self {
        let total_minutes: u64 = entries
            .iter()
            .filter_map(|entry| entry.overtime.as_deref())
            .map(overtime_minutes)
            .fold(0, u64::saturating_add);
        let total_amount: f64 = entries
            .iter()
            .filter_map(|entry| entry.overtime_amount)
            .sum();

        Self {
            count: entries.len(),
            total_overtime: format!("{}H{:02}", total_minutes / 60, total_minutes % 60),
            total_amount: format_amount(total_amount),
        }
    }
}

/// `2H05` or `2:05` to minutes. Unreadable parts count as zero.
fn overtime_minutes(raw: &str) -> u64 {
    let normalized = raw.trim().replace(['H', 'h'], ":");
    let mut parts = normalized.split(':');
    let hours = parts.next().map(parse_leading_digits).unwrap_or(0);
    let minutes = parts.next().map(parse_leading_digits).unwrap_or(0);
    hours.saturating_mul(60).saturating_add(minutes)
}

fn parse_leading_digits(raw: &str) -> u64 {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(overtime: Option<&str>, amount: Option<f64>) -> LogEntry {
        LogEntry {
            surname: "Rakoto".into(),
            given_name: "Jean".into(),
            entry_time: Some("2024-01-01 05:00:00".into()),
            exit_time: Some("2024-01-01 16:00:00".into()),
            overtime: overtime.map(str::to_string),
            overtime_amount: amount,
        }
    }

    #[test]
    fn sums_overtime_and_amounts() {
        let entries = vec![
            entry(Some("1H30"), Some(7500.0)),
            entry(Some("0:45"), Some(3750.0)),
            entry(None, None),
            entry(Some("2h"), Some(10000.0)),
        ];

        let summary = LogSummary::from_entries(&entries);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.total_overtime, "4H15");
        assert_eq!(summary.total_amount, "21\u{202f}250 Ar");
    }

    #[test]
    fn garbage_overtime_counts_as_zero() {
        let entries = vec![entry(Some("n/a"), None), entry(Some("1Hxx"), None)];
        let summary = LogSummary::from_entries(&entries);
        assert_eq!(summary.total_overtime, "1H00");
    }

    #[test]
    fn oversized_overtime_saturates() {
        let entries = vec![
            entry(Some("999999999999999999H00"), None),
            entry(Some("1H00"), None),
        ];
        let summary = LogSummary::from_entries(&entries);
        assert_eq!(
            summary.total_overtime,
            format!("{}H{:02}", u64::MAX / 60, u64::MAX % 60)
        );
    }

    #[test]
    fn empty_history() {
        let summary = LogSummary::from_entries(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.total_overtime, "0H00");
        assert_eq!(summary.total_amount, "0 Ar");
    }
}
