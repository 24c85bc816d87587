use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Granularity of a date rendered into a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateGrain {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl DateGrain {
    /// Folder segments, `2024/03/01` or `year=2024/month=03/day=01` for partition names.
    pub fn folder(&self, at: DateTime<Utc>, partition_names: bool) -> String {
        let parts = [
            ("year", format!("{:04}", at.year())),
            ("month", format!("{:02}", at.month())),
            ("day", format!("{:02}", at.day())),
            ("hour", format!("{:02}", at.hour())),
            ("minute", format!("{:02}", at.minute())),
            ("second", format!("{:02}", at.second())),
        ];

        parts[..self.depth()]
            .iter()
            .map(|(name, value)| {
                if partition_names {
                    format!("{name}={value}")
                } else {
                    value.clone()
                }
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Compact stamp used in file names, `20240301T120000` for seconds.
    pub fn stamp(&self, at: DateTime<Utc>) -> String {
        let pattern = match self {
            DateGrain::Year => "%Y",
            DateGrain::Month => "%Y%m",
            DateGrain::Day => "%Y%m%d",
            DateGrain::Hour => "%Y%m%dT%H",
            DateGrain::Minute => "%Y%m%dT%H%M",
            DateGrain::Second => "%Y%m%dT%H%M%S",
        };
        at.format(pattern).to_string()
    }

    fn depth(&self) -> usize {
        *self as usize + 1
    }
}
