use std::fmt;

use anyhow::{bail, Result};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_OFFSET_HOURS: i8 = -12;
pub const MAX_OFFSET_HOURS: i8 = 12;

/// Where offset 0 lands: the deployment's reference zone.
pub const DEFAULT_OFFSET_HOURS: i8 = 3;

/// Operator-selected whole-hour UTC offset in `-12..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub struct TimezoneOffset(i8);

impl TimezoneOffset {
    pub fn new(hours: i8) -> Result<Self> {
        if !(MIN_OFFSET_HOURS..=MAX_OFFSET_HOURS).contains(&hours) {
            bail!("timezone offset {hours} outside {MIN_OFFSET_HOURS}..={MAX_OFFSET_HOURS}");
        }
        Ok(Self(hours))
    }

    /// The raw selection, as shown in the picker.
    pub fn selected_hours(&self) -> i8 {
        self.0
    }

    /// Offset actually applied to wall-clock math.
    pub fn effective_hours(&self) -> i8 {
        if self.0 == 0 {
            DEFAULT_OFFSET_HOURS
        } else {
            self.0
        }
    }

    pub fn fixed_offset(&self) -> FixedOffset {
        // |hours| <= 12 always fits.
        FixedOffset::east_opt(i32::from(self.effective_hours()) * 3600)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Picker label for the selection: `GMT+N` / `GMT-N`.
    pub fn label(&self) -> String {
        gmt_label(self.0)
    }

    /// Label of the zone the clock actually runs in.
    pub fn effective_label(&self) -> String {
        gmt_label(self.effective_hours())
    }

    /// IANA `Etc/` name sent to the attendance service. POSIX sign is inverted.
    pub fn iana_name(&self) -> String {
        let hours = self.effective_hours();
        if hours >= 0 {
            format!("Etc/GMT-{hours}")
        } else {
            format!("Etc/GMT+{}", -hours)
        }
    }
}

impl Default for TimezoneOffset {
    fn default() -> Self {
        Self(0)
    }
}

impl TryFrom<i8> for TimezoneOffset {
    type Error = anyhow::Error;

    fn try_from(hours: i8) -> Result<Self> {
        Self::new(hours)
    }
}

impl From<TimezoneOffset> for i8 {
    fn from(offset: TimezoneOffset) -> Self {
        offset.0
    }
}

impl fmt::Display for TimezoneOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn gmt_label(hours: i8) -> String {
    if hours >= 0 {
        format!("GMT+{hours}")
    } else {
        format!("GMT{hours}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimezoneOption {
    pub offset: TimezoneOffset,
    pub label: String,
    pub iana: String,
}

/// Every selectable offset, west to east.
pub fn selectable_timezones() -> Vec<TimezoneOption> {
    (MIN_OFFSET_HOURS..=MAX_OFFSET_HOURS)
        .map(|hours| {
            let offset = TimezoneOffset(hours);
            TimezoneOption {
                offset,
                label: offset.label(),
                iana: offset.iana_name(),
            }
        })
        .collect()
}
