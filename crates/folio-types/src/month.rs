//! Settlement month token and calendar arithmetic.
//!
//! Every generated record is scoped to one `YYYY-MM` settlement month. The
//! month spans the half-open instant range `[start, end)` at UTC midnight,
//! matching the half-open service windows used by subscription proration.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Error parsing a settlement month token.
#[derive(Debug, thiserror::Error)]
#[error("invalid settlement month {input:?}, expected YYYY-MM")]
pub struct MonthParseError {
    /// The rejected input.
    pub input: String,
}

/// A calendar month used as the batch key for settlement runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SettlementMonth {
    year: i32,
    month: u32,
}

impl SettlementMonth {
    /// Parse a `YYYY-MM` token.
    pub fn parse(input: &str) -> Result<Self, MonthParseError> {
        let reject = || MonthParseError {
            input: input.to_string(),
        };
        let (y, m) = input.split_once('-').ok_or_else(reject)?;
        if y.len() != 4 || m.len() != 2 {
            return Err(reject());
        }
        let year: i32 = y.parse().map_err(|_| reject())?;
        let month: u32 = m.parse().map_err(|_| reject())?;
        if !(1..=12).contains(&month) {
            return Err(reject());
        }
        Ok(Self { year, month })
    }

    /// The month containing the given UTC date.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First day of the month.
    pub fn first_day(&self) -> NaiveDate {
        // year/month are validated at construction; day 1 always exists.
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// First day of the following month (exclusive upper bound).
    pub fn end_day(&self) -> NaiveDate {
        self.next().first_day()
    }

    /// Inclusive start instant, UTC midnight.
    pub fn start_instant(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.first_day().and_time(NaiveTime::MIN))
    }

    /// Exclusive end instant, UTC midnight of the next month.
    pub fn end_instant(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.end_day().and_time(NaiveTime::MIN))
    }

    /// The following calendar month.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Stable `YYYY-MM` key stored in the database.
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl std::fmt::Display for SettlementMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl TryFrom<String> for SettlementMonth {
    type Error = MonthParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SettlementMonth> for String {
    fn from(value: SettlementMonth) -> Self {
        value.key()
    }
}
