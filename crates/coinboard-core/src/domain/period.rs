use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{UtcDateTime, ValidationError};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Chart window selectable for coin price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimePeriod {
    #[serde(rename = "3h")]
    ThreeHours,
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "3y")]
    ThreeYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl TimePeriod {
    pub const ALL: [Self; 8] = [
        Self::ThreeHours,
        Self::OneDay,
        Self::SevenDays,
        Self::ThirtyDays,
        Self::ThreeMonths,
        Self::OneYear,
        Self::ThreeYears,
        Self::FiveYears,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ThreeHours => "3h",
            Self::OneDay => "24h",
            Self::SevenDays => "7d",
            Self::ThirtyDays => "30d",
            Self::ThreeMonths => "3m",
            Self::OneYear => "1y",
            Self::ThreeYears => "3y",
            Self::FiveYears => "5y",
        }
    }

    /// Window length in days.
    pub const fn days(self) -> f64 {
        match self {
            Self::ThreeHours => 0.125,
            Self::OneDay => 1.0,
            Self::SevenDays => 7.0,
            Self::ThirtyDays => 30.0,
            Self::ThreeMonths => 90.0,
            Self::OneYear => 365.0,
            Self::ThreeYears => 1095.0,
            Self::FiveYears => 1825.0,
        }
    }

    /// `days` query value sent to the market chart endpoint. The upstream has no
    /// sub-day resolution, so `3h` fetches a full day and is trimmed afterwards.
    pub const fn upstream_days(self) -> &'static str {
        match self {
            Self::ThreeHours | Self::OneDay => "1",
            Self::SevenDays => "7",
            Self::ThirtyDays => "30",
            Self::ThreeMonths => "90",
            Self::OneYear => "365",
            Self::ThreeYears => "1095",
            Self::FiveYears => "1825",
        }
    }

    /// Trim window applied to the fetched chart, if narrower than the fetch.
    pub const fn trim_window(self) -> Option<Duration> {
        match self {
            Self::ThreeHours => Some(Duration::from_secs(3 * 3600)),
            _ => None,
        }
    }
}

impl Default for TimePeriod {
    fn default() -> Self {
        Self::SevenDays
    }
}

impl Display for TimePeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimePeriod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|period| period.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::InvalidTimePeriod {
                value: trimmed.to_owned(),
            })
    }
}

/// Periods a coin listed at `listed_at` (unix seconds) has enough history for.
///
/// Age gets a one-day buffer; the shortest period is always offered.
pub fn available_periods(listed_at: i64, now: UtcDateTime) -> Vec<TimePeriod> {
    let age_days = ((now.unix_seconds() - listed_at) as f64 / SECONDS_PER_DAY).max(0.0) + 1.0;

    let periods: Vec<TimePeriod> = TimePeriod::ALL
        .into_iter()
        .filter(|period| period.days() <= age_days)
        .collect();

    if periods.is_empty() {
        vec![TimePeriod::ThreeHours]
    } else {
        periods
    }
}

/// Period to select when opening a coin: `7d` when available, else the longest available.
pub fn default_period(available: &[TimePeriod]) -> TimePeriod {
    if available.contains(&TimePeriod::SevenDays) {
        TimePeriod::SevenDays
    } else {
        available
            .last()
            .copied()
            .unwrap_or(TimePeriod::ThreeHours)
    }
}
