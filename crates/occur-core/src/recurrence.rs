use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;

use crate::clock::{CalendarClock, Period};
use crate::models::{BaseEvent, Occurrence, Window};

/// How the expander reaches the first instance at or after the window start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeekStrategy {
    /// Estimate the period index of the window start from calendar fields and
    /// correct it with a few `advance` calls. Cost does not depend on how far
    /// the window is from the anchor.
    #[default]
    Jump,
    /// Step through every period from the anchor, skipping instances before
    /// the window. Linear in the distance from the anchor.
    Walk,
}

/// RecurrenceExpander: turns one base event into the virtual instances of its
/// series that fall inside a window.
///
/// The anchor itself is never emitted; it is the merger's job to decide
/// whether the anchor is in the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Expander {
    clock: CalendarClock,
    seek: SeekStrategy,
}

impl Expander {
    pub fn new(clock: CalendarClock) -> Self {
        Self {
            clock,
            seek: SeekStrategy::default(),
        }
    }

    pub fn with_seek(mut self, seek: SeekStrategy) -> Self {
        self.seek = seek;
        self
    }

    pub fn clock(&self) -> &CalendarClock {
        &self.clock
    }

    pub fn seek(&self) -> SeekStrategy {
        self.seek
    }

    /// Lazily expands `event` over `window`.
    ///
    /// # Behavior
    /// - Non-recurring events and empty windows yield nothing
    /// - If the series ends before the window starts, the returned iterator is
    ///   already exhausted and performs no calendar arithmetic
    /// - Instances are emitted in ascending order, from the first period after
    ///   the anchor, while `start <= min(recurrence_end_date, window.end)` and
    ///   `start >= window.start`
    /// - The series also ends at the first instance whose end is past the
    ///   last representable instant
    pub fn expand<'a>(&self, event: &'a BaseEvent, window: &Window) -> Instances<'a> {
        let Some(period) = event.recurrence().period() else {
            return Instances::exhausted(self.clock, event);
        };
        if window.is_empty() {
            return Instances::exhausted(self.clock, event);
        }

        let bound = match event.recurrence_end_date() {
            Some(series_end) if series_end < window.start => {
                return Instances::exhausted(self.clock, event);
            }
            Some(series_end) => series_end.min(window.end),
            None => window.end,
        };

        let first = self.first_index(event.start_date(), period, window.start);
        Instances::new(self.clock, event, period, first, window.start, bound)
    }

    /// Start of the first instance, anchor included, strictly after `after`
    /// and within the series' own end date.
    ///
    /// # Example
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use occur_core::{BaseEvent, EventId, Expander, NewEventData, RecurrenceKind};
    ///
    /// let event = BaseEvent::new(NewEventData {
    ///     id: EventId::new("review"),
    ///     start_date: Utc.with_ymd_and_hms(2024, 1, 31, 15, 0, 0).unwrap(),
    ///     end_date: Utc.with_ymd_and_hms(2024, 1, 31, 16, 0, 0).unwrap(),
    ///     recurrence: RecurrenceKind::Monthly,
    ///     ..Default::default()
    /// })
    /// .unwrap();
    ///
    /// let next = Expander::default().next_after(&event, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
    /// assert_eq!(next, Some(Utc.with_ymd_and_hms(2024, 2, 29, 15, 0, 0).unwrap()));
    /// ```
    pub fn next_after(&self, event: &BaseEvent, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if event.start_date() > after {
            return Some(event.start_date());
        }
        let period = event.recurrence().period()?;
        let from = after.checked_add_signed(Duration::nanoseconds(1))?;

        let n = self.seek_index(event.start_date(), period, from);
        let next = self.clock.advance(event.start_date(), period, n)?;
        match event.recurrence_end_date() {
            Some(series_end) if next > series_end => None,
            _ => Some(next),
        }
    }

    /// Up to `count` occurrences of `event` starting at or after `from`,
    /// anchor included, in ascending order.
    pub fn preview(&self, event: &BaseEvent, from: DateTime<Utc>, count: usize) -> Vec<Occurrence> {
        let mut result = Vec::with_capacity(count.min(64));
        if count == 0 {
            return result;
        }
        if event.start_date() >= from {
            result.push(Occurrence::anchor(event));
        }

        if let Some(period) = event.recurrence().period() {
            let bound = event.recurrence_end_date().unwrap_or(DateTime::<Utc>::MAX_UTC);
            let first = self.first_index(event.start_date(), period, from);
            let instances = Instances::new(self.clock, event, period, first, from, bound);
            result.extend(instances.take(count - result.len()));
        }

        result
    }

    /// Index to start iterating from: the seek target under `Jump`, the first
    /// period after the anchor under `Walk`.
    fn first_index(&self, anchor: DateTime<Utc>, period: Period, target: DateTime<Utc>) -> u32 {
        match self.seek {
            SeekStrategy::Walk => 1,
            SeekStrategy::Jump => self.seek_index(anchor, period, target),
        }
    }

    /// Index of the first period (at least 1) whose instance is at or after
    /// `target`. Instances grow strictly with the index, so the estimate from
    /// `periods_between` only needs a local correction.
    fn seek_index(&self, anchor: DateTime<Utc>, period: Period, target: DateTime<Utc>) -> u32 {
        let at_or_after = |n: u32| {
            self.clock
                .advance(anchor, period, n)
                .map_or(true, |instant| instant >= target)
        };

        let mut n = self.clock.periods_between(anchor, target, period).max(1);
        while n > 1 && at_or_after(n - 1) {
            n -= 1;
        }
        while !at_or_after(n) {
            match n.checked_add(1) {
                Some(next) => n = next,
                None => break,
            }
        }
        n
    }
}

/// Lazy sequence of virtual instances produced by `Expander::expand`.
#[derive(Debug, Clone)]
pub struct Instances<'a> {
    clock: CalendarClock,
    event: &'a BaseEvent,
    /// `None` once the sequence is exhausted.
    period: Option<Period>,
    index: u32,
    window_start: DateTime<Utc>,
    bound: DateTime<Utc>,
}

impl<'a> Instances<'a> {
    fn new(
        clock: CalendarClock,
        event: &'a BaseEvent,
        period: Period,
        index: u32,
        window_start: DateTime<Utc>,
        bound: DateTime<Utc>,
    ) -> Self {
        Self {
            clock,
            event,
            period: Some(period),
            index,
            window_start,
            bound,
        }
    }

    fn exhausted(clock: CalendarClock, event: &'a BaseEvent) -> Self {
        Self {
            clock,
            event,
            period: None,
            index: 0,
            window_start: event.start_date(),
            bound: event.start_date(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.period.is_none()
    }
}

impl Iterator for Instances<'_> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        let period = self.period?;

        loop {
            let start = match self.clock.advance(self.event.start_date(), period, self.index) {
                Some(start) if start <= self.bound => start,
                _ => {
                    self.period = None;
                    return None;
                }
            };

            match self.index.checked_add(1) {
                Some(next) => self.index = next,
                None => self.period = None,
            }

            if start >= self.window_start {
                let occurrence = Occurrence::instance(self.event, start);
                if occurrence.is_none() {
                    self.period = None;
                }
                return occurrence;
            }
            if self.period.is_none() {
                return None;
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.period {
            None => (0, Some(0)),
            Some(_) => (0, None),
        }
    }
}

impl FusedIterator for Instances<'_> {}
