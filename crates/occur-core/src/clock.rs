//! Calendar arithmetic on UTC instants, performed in a configurable timezone.

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::timezone::resolve_local;

/// One step of a recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

/// What month and year arithmetic does with a day-of-month that the target
/// month does not have (the 31st landing in April, Feb 29 in a common year).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthOverflow {
    /// Use the last day of the target month: Jan 31 + 1 month = Feb 28 (or 29).
    #[default]
    Clamp,
    /// Spill the surplus days into the following month: Jan 31 + 1 month = Mar 3
    /// (or Mar 2 in a leap year).
    Roll,
}

/// Pure calendar arithmetic. Every instant is converted to local wall-clock
/// time in `timezone`, shifted there, and converted back, so a series anchored
/// at 10:00 local stays at 10:00 across DST changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarClock {
    timezone: Tz,
    overflow: MonthOverflow,
}

impl Default for CalendarClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl CalendarClock {
    pub fn new(timezone: Tz, overflow: MonthOverflow) -> Self {
        Self { timezone, overflow }
    }

    /// A UTC clock with the default `Clamp` overflow policy.
    pub fn utc() -> Self {
        Self::new(Tz::UTC, MonthOverflow::Clamp)
    }

    pub fn with_overflow(mut self, overflow: MonthOverflow) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn overflow(&self) -> MonthOverflow {
        self.overflow
    }

    /// Returns the instant `n` periods after `anchor`.
    ///
    /// The result is always computed from the anchor, never from a previous
    /// step, so clamped month-ends do not drift: a series anchored on Jan 31
    /// yields Feb 29, Mar 31, Apr 30, ...
    ///
    /// Returns `None` if the result is outside chrono's representable range.
    pub fn advance(&self, anchor: DateTime<Utc>, period: Period, n: u32) -> Option<DateTime<Utc>> {
        if n == 0 {
            return Some(anchor);
        }

        let local = anchor.with_timezone(&self.timezone).naive_local();
        let shifted = match period {
            Period::Day => local.checked_add_days(Days::new(u64::from(n)))?,
            Period::Week => local.checked_add_days(Days::new(7 * u64::from(n)))?,
            Period::Month => self.add_months(local, n)?,
            Period::Year => self.add_months(local, n.checked_mul(12)?)?,
        };

        resolve_local(&self.timezone, shifted)
    }

    fn add_months(&self, local: NaiveDateTime, months: u32) -> Option<NaiveDateTime> {
        match self.overflow {
            // chrono clamps to the last valid day of the target month.
            MonthOverflow::Clamp => local.checked_add_months(Months::new(months)),
            MonthOverflow::Roll => {
                let date = local.date();
                let first = date.with_day(1)?.checked_add_months(Months::new(months))?;
                let rolled = first.checked_add_days(Days::new(u64::from(date.day() - 1)))?;
                Some(rolled.and_time(local.time()))
            }
        }
    }

    /// Estimates how many whole periods separate `anchor` from `target`.
    ///
    /// The estimate is computed from calendar fields without walking and is
    /// within one or two periods of the true count; callers correct it with
    /// `advance`. Returns 0 when `target` is not after `anchor`.
    pub fn periods_between(&self, anchor: DateTime<Utc>, target: DateTime<Utc>, period: Period) -> u32 {
        if target <= anchor {
            return 0;
        }

        let from = anchor.with_timezone(&self.timezone).naive_local();
        let to = target.with_timezone(&self.timezone).naive_local();

        let estimate = match period {
            Period::Day => (to - from).num_days(),
            Period::Week => (to - from).num_days() / 7,
            Period::Month => months_between(from, to),
            Period::Year => months_between(from, to) / 12,
        };

        u32::try_from(estimate.max(0)).unwrap_or(u32::MAX)
    }

    /// Signed length of `[start, end]`.
    #[inline]
    pub fn duration(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Duration {
        end - start
    }

    #[inline]
    pub fn compare(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> Ordering {
        a.cmp(&b)
    }
}

fn months_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    i64::from(to.year() - from.year()) * 12 + i64::from(to.month()) - i64::from(from.month())
}
