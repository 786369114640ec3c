use chrono::{DateTime, Utc};

use crate::clock::CalendarClock;
use crate::merge::{sort_occurrences, OccurrenceMerger};
use crate::models::{BaseEvent, Occurrence, Window};
use crate::recurrence::Expander;

/// RangeQueryService: the entry point callers use to resolve occurrences.
///
/// Holds only configuration (clock and seek strategy), so it is cheap to
/// clone and safe to share between concurrent requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeQueryService {
    merger: OccurrenceMerger,
}

impl RangeQueryService {
    pub fn new(clock: CalendarClock) -> Self {
        Self::with_expander(Expander::new(clock))
    }

    pub fn with_expander(expander: Expander) -> Self {
        Self {
            merger: OccurrenceMerger::new(expander),
        }
    }

    pub fn expander(&self) -> &Expander {
        self.merger.expander()
    }

    /// Every occurrence of `events` overlapping `window`, sorted by start.
    ///
    /// An inverted window returns an empty list rather than an error.
    pub fn query(&self, events: &[BaseEvent], window: &Window) -> Vec<Occurrence> {
        if window.is_empty() {
            tracing::debug!(start = %window.start, end = %window.end, "empty window");
            return Vec::new();
        }

        let occurrences = self.merger.merge(events, window);
        tracing::debug!(
            start = %window.start,
            end = %window.end,
            events = events.len(),
            occurrences = occurrences.len(),
            "resolved window"
        );
        occurrences
    }

    /// The next `limit` occurrences across `events` that start at or after
    /// `from`, sorted like `query`.
    pub fn upcoming(&self, events: &[BaseEvent], from: DateTime<Utc>, limit: usize) -> Vec<Occurrence> {
        let mut occurrences: Vec<Occurrence> = events
            .iter()
            .flat_map(|event| self.expander().preview(event, from, limit))
            .collect();

        sort_occurrences(&mut occurrences);
        occurrences.dedup_by(|a, b| a.occurrence_id == b.occurrence_id);
        occurrences.truncate(limit);
        occurrences
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MonthOverflow;
    use crate::models::{EventId, NewEventData, RecurrenceKind};
    use chrono::{Duration, TimeZone};

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn event(id: &str, start: DateTime<Utc>, recurrence: RecurrenceKind) -> BaseEvent {
        BaseEvent::new(NewEventData {
            id: EventId::new(id),
            start_date: start,
            end_date: start + Duration::minutes(30),
            recurrence,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_query_empty_window() {
        let service = RangeQueryService::default();
        let events = vec![event("daily", utc(2024, 1, 1, 9), RecurrenceKind::Daily)];
        let inverted = Window::new(utc(2024, 2, 1, 0), utc(2024, 1, 1, 0));
        assert!(service.query(&events, &inverted).is_empty());
    }

    #[test]
    fn test_query_mixes_anchors_and_instances() {
        let service = RangeQueryService::default();
        let events = vec![
            event("weekly", utc(2024, 1, 1, 9), RecurrenceKind::Weekly),
            event("single", utc(2024, 1, 9, 12), RecurrenceKind::None),
        ];
        let window = Window::new(utc(2024, 1, 1, 0), utc(2024, 1, 10, 0));

        let occurrences = service.query(&events, &window);
        let result: Vec<(&str, bool)> = occurrences
            .iter()
            .map(|o| (o.source_event_id.as_str(), o.is_virtual))
            .collect();

        assert_eq!(
            result,
            vec![("weekly", false), ("weekly", true), ("single", false)]
        );
    }

    #[test]
    fn test_upcoming_interleaves_series() {
        let service = RangeQueryService::default();
        let events = vec![
            event("daily", utc(2024, 1, 1, 9), RecurrenceKind::Daily),
            event("weekly", utc(2024, 1, 1, 12), RecurrenceKind::Weekly),
        ];

        let upcoming = service.upcoming(&events, utc(2024, 1, 3, 0), 4);

        let starts: Vec<_> = upcoming.iter().map(|o| o.start_date).collect();
        assert_eq!(
            starts,
            vec![utc(2024, 1, 3, 9), utc(2024, 1, 4, 9), utc(2024, 1, 5, 9), utc(2024, 1, 6, 9)]
        );
    }

    #[test]
    fn test_upcoming_zero_limit() {
        let service = RangeQueryService::default();
        let events = vec![event("daily", utc(2024, 1, 1, 9), RecurrenceKind::Daily)];
        assert!(service.upcoming(&events, utc(2024, 1, 3, 0), 0).is_empty());
    }

    #[test]
    fn test_window_ending_at_max_does_not_overflow() {
        let service = RangeQueryService::default();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();
        let nightly = BaseEvent::new(NewEventData {
            id: EventId::new("nightly"),
            start_date: start,
            end_date: start + Duration::hours(1),
            recurrence: RecurrenceKind::Daily,
            ..Default::default()
        })
        .unwrap();
        let events = vec![nightly];
        let max = DateTime::<Utc>::MAX_UTC;

        let occurrences = service.query(&events, &Window::new(max - Duration::days(3), max));
        assert_eq!(occurrences.len(), 2);
        assert!(occurrences.iter().all(|o| o.end_date > o.start_date));

        let upcoming = service.upcoming(&events, max - Duration::days(3), 10);
        assert_eq!(upcoming, occurrences);
    }

    #[test]
    fn test_service_uses_configured_overflow() {
        let service = RangeQueryService::new(CalendarClock::utc().with_overflow(MonthOverflow::Roll));
        let events = vec![event("monthly", utc(2023, 1, 31, 9), RecurrenceKind::Monthly)];
        let window = Window::new(utc(2023, 2, 1, 0), utc(2023, 3, 15, 0));

        let starts: Vec<_> = service.query(&events, &window).iter().map(|o| o.start_date).collect();
        assert_eq!(starts, vec![utc(2023, 3, 3, 9)]);
    }
}
