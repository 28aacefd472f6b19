use chrono::{DateTime, Locale, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TimezoneOffset;

const SERVER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// What the wall clock shows for one tick. Rebuilt from scratch every time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockFace {
    pub time: String,
    pub date: String,
    pub label: String,
}

impl ClockFace {
    pub fn compute(now: DateTime<Utc>, timezone: TimezoneOffset) -> Self {
        let local = now.with_timezone(&timezone.fixed_offset());

        Self {
            time: local.format("%H:%M:%S").to_string(),
            date: local
                .format_localized("%A %-d %B %Y", Locale::fr_FR)
                .to_string(),
            label: timezone.effective_label(),
        }
    }
}

/// Render a bare server timestamp (UTC, no zone suffix) in the operator's zone.
///
/// Missing input renders as an empty string; anything unparsable is handed
/// back untouched.
pub fn format_instant(utc_timestamp: Option<&str>, timezone: TimezoneOffset) -> String {
    let Some(raw) = utc_timestamp else {
        return String::new();
    };

    match parse_server_timestamp(raw) {
        Some(utc) => {
            let local = utc.with_timezone(&timezone.fixed_offset());
            format!(
                "{} {}",
                local.format("%d/%m/%Y %H:%M:%S"),
                utc_zone_name(timezone)
            )
        }
        None => raw.to_string(),
    }
}

pub(crate) fn parse_server_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = raw.trim().replacen('T', " ", 1);
    NaiveDateTime::parse_from_str(&normalized, SERVER_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn utc_zone_name(timezone: TimezoneOffset) -> String {
    let hours = timezone.effective_hours();
    if hours >= 0 {
        format!("UTC+{hours}")
    } else {
        format!("UTC{hours}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::selectable_timezones;
    use chrono::TimeZone;

    fn tz(hours: i8) -> TimezoneOffset {
        TimezoneOffset::new(hours).unwrap()
    }

    #[test]
    fn clock_face_uses_effective_offset() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 5).unwrap();
        let face = ClockFace::compute(now, tz(0));

        assert_eq!(face.time, "11:00:05");
        assert_eq!(face.date, "lundi 1 janvier 2024");
        assert_eq!(face.label, "GMT+3");
    }

    #[test]
    fn clock_face_rolls_the_date_across_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 2, 30, 0).unwrap();
        let face = ClockFace::compute(now, tz(-5));

        assert_eq!(face.time, "21:30:00");
        assert!(face.date.contains("décembre"));
        assert!(face.date.contains("2023"));
        assert_eq!(face.label, "GMT-5");
    }

    #[test]
    fn formats_server_timestamp_in_selected_zone() {
        assert_eq!(
            format_instant(Some("2024-01-01 08:00:00"), tz(0)),
            "01/01/2024 11:00:00 UTC+3"
        );
        assert_eq!(
            format_instant(Some("2024-01-01 08:00:00"), tz(-12)),
            "31/12/2023 20:00:00 UTC-12"
        );
    }

    #[test]
    fn accepts_t_separator_and_fractional_seconds() {
        assert_eq!(
            format_instant(Some("2024-03-10T14:15:16.250"), tz(1)),
            "10/03/2024 15:15:16 UTC+1"
        );
    }

    #[test]
    fn every_offset_renders_something() {
        for option in selectable_timezones() {
            let rendered = format_instant(Some("2024-06-15 23:59:59"), option.offset);
            assert!(!rendered.is_empty());
            assert_ne!(rendered, "2024-06-15 23:59:59");
        }
    }

    #[test]
    fn malformed_input_is_returned_unchanged() {
        for raw in ["", "null", "yesterday", "2024-13-01 00:00:00", "2024-01-01Z"] {
            assert_eq!(format_instant(Some(raw), tz(0)), raw);
        }
    }

    #[test]
    fn missing_input_is_empty() {
        assert_eq!(format_instant(None, tz(0)), "");
    }
}
