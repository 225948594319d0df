//! Calendar month arithmetic.
//!
//! A [`MonthPeriod`] is a validated (year, month) pair. It knows its UTC month window,
//! its length in days, and where a nominal day-of-month lands once clamped to that
//! length.

use crate::errors::{Error, Result};
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::fmt;

/// Hour of day (UTC) every generated occurrence is stamped with.
///
/// Midday keeps the calendar date stable for any viewer within twelve hours of UTC.
pub const OCCURRENCE_HOUR: u32 = 12;

/// Half-open UTC instant range `[start, end)` covering a whole calendar month.
///
/// Consecutive windows tile the timeline, so every instant belongs to exactly one month
/// whatever its sub-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    /// First instant of the month (00:00:00 on day 1)
    pub start: DateTime<Utc>,
    /// First instant of the following month, excluded
    pub end: DateTime<Utc>,
}

impl MonthWindow {
    /// Whether `instant` falls inside the window.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// A validated calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthPeriod {
    year: i32,
    month: u32,
    first_day: NaiveDate,
    last_day: NaiveDate,
}

impl MonthPeriod {
    /// Creates the period for `month` (1-12) of `year`.
    ///
    /// # Errors
    /// [`Error::InvalidMonth`] when `month` is outside 1..=12, [`Error::InvalidYear`] when
    /// the month cannot be represented as a calendar date.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidMonth { month });
        }

        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or(Error::InvalidYear { year })?;
        let last_day = first_day
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or(Error::InvalidYear { year })?;

        Ok(Self {
            year,
            month,
            first_day,
            last_day,
        })
    }

    /// The month containing `date`.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        let first_day = date.with_day(1).unwrap_or(date);
        let last_day = first_day
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX);
        Self {
            year: date.year(),
            month: date.month(),
            first_day,
            last_day,
        }
    }

    /// Calendar year
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Calendar month, 1-12
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// First calendar day of the month
    #[must_use]
    pub const fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// Last calendar day of the month
    #[must_use]
    pub const fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    /// Number of days in the month (28-31)
    #[must_use]
    pub fn days_in_month(&self) -> u32 {
        self.last_day.day()
    }

    /// The `YYYY-MM` key identifying this month.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// The following month, if representable.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        self.last_day.succ_opt().map(Self::containing)
    }

    /// UTC window from midnight on day 1 up to midnight on the next month's day 1.
    #[must_use]
    pub fn window(&self) -> MonthWindow {
        let start = self.first_day.and_time(NaiveTime::MIN).and_utc();
        let end = self
            .last_day
            .succ_opt()
            .map_or(NaiveDateTime::MAX, |next| next.and_time(NaiveTime::MIN))
            .and_utc();
        MonthWindow { start, end }
    }

    /// Whether the calendar range `[start, end]` shares at least one day with this month.
    #[must_use]
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        !(self.last_day < start || self.first_day > end)
    }

    /// Day on which a charge nominally due on `day_of_month` falls in this month.
    ///
    /// Days past the end of the month clamp to the last day, so a 31st charge lands on
    /// the 30th in April and on the 28th or 29th in February.
    #[must_use]
    pub fn occurrence_date(&self, day_of_month: i32) -> NaiveDate {
        let nominal = u32::try_from(day_of_month).unwrap_or(1).max(1);
        let day = nominal.min(self.days_in_month());
        self.first_day
            .checked_add_days(Days::new(u64::from(day - 1)))
            .unwrap_or(self.last_day)
    }

    /// [`Self::occurrence_date`] stamped at the neutral hour in UTC.
    #[must_use]
    pub fn occurrence_instant(&self, day_of_month: i32) -> DateTime<Utc> {
        at_neutral_time(self.occurrence_date(day_of_month))
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first_day.format("%B %Y"))
    }
}

/// Stamps a calendar date at [`OCCURRENCE_HOUR`] UTC.
#[must_use]
pub fn at_neutral_time(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    midnight
        .checked_add_signed(chrono::Duration::hours(i64::from(OCCURRENCE_HOUR)))
        .unwrap_or(midnight)
        .and_utc()
}
