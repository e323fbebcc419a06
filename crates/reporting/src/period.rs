use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tillbook_core::{DomainError, DomainResult};

/// Time window a sales aggregate covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SalesPeriod {
    /// Every invoice ever recorded.
    All,
    /// One calendar day.
    Day { date: NaiveDate },
    /// One calendar month.
    Month { year: i32, month: u32 },
    /// Months `start_month..=end_month` of one year.
    MonthRange {
        year: i32,
        start_month: u32,
        end_month: u32,
    },
    /// Calendar days `start..=end`.
    DateRange { start: NaiveDate, end: NaiveDate },
    /// Instants `start..=end`.
    Between {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

fn check_month(month: u32) -> DomainResult<()> {
    if !(1..=12).contains(&month) {
        return Err(DomainError::validation(format!(
            "month must be between 1 and 12 (got {month})"
        )));
    }
    Ok(())
}

impl SalesPeriod {
    pub fn today(now: DateTime<Utc>) -> Self {
        Self::Day {
            date: now.date_naive(),
        }
    }

    pub fn current_month(now: DateTime<Utc>) -> Self {
        Self::Month {
            year: now.year(),
            month: now.month(),
        }
    }

    pub fn month(year: i32, month: u32) -> DomainResult<Self> {
        check_month(month)?;
        Ok(Self::Month { year, month })
    }

    pub fn month_range(year: i32, start_month: u32, end_month: u32) -> DomainResult<Self> {
        check_month(start_month)?;
        check_month(end_month)?;
        if start_month > end_month {
            return Err(DomainError::validation("invalid month range provided"));
        }
        Ok(Self::MonthRange {
            year,
            start_month,
            end_month,
        })
    }

    pub fn date_range(start: NaiveDate, end: NaiveDate) -> DomainResult<Self> {
        if start > end {
            return Err(DomainError::validation("start date must not be after end date"));
        }
        Ok(Self::DateRange { start, end })
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<Self> {
        if start > end {
            return Err(DomainError::validation("start must not be after end"));
        }
        Ok(Self::Between { start, end })
    }

    /// Whether an invoice created at `at` falls in this period.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let date = at.date_naive();
        match *self {
            Self::All => true,
            Self::Day { date: day } => date == day,
            Self::Month { year, month } => date.year() == year && date.month() == month,
            Self::MonthRange {
                year,
                start_month,
                end_month,
            } => date.year() == year && (start_month..=end_month).contains(&date.month()),
            Self::DateRange { start, end } => start <= date && date <= end,
            Self::Between { start, end } => start <= at && at <= end,
        }
    }
}
