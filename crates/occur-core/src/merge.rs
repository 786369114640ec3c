use crate::models::{BaseEvent, Occurrence, Window};
use crate::overlap::overlaps;
use crate::recurrence::Expander;

/// OccurrenceMerger: combines anchors that overlap a window with the virtual
/// instances of every recurring series, deduplicated and sorted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OccurrenceMerger {
    expander: Expander,
}

impl OccurrenceMerger {
    pub fn new(expander: Expander) -> Self {
        Self { expander }
    }

    pub fn expander(&self) -> &Expander {
        &self.expander
    }

    /// Resolves every occurrence of `events` that overlaps `window`.
    ///
    /// # Behavior
    /// - Each event whose anchor overlaps the window contributes its anchor as
    ///   a non-virtual occurrence
    /// - Each recurring event is expanded whether or not its anchor overlapped;
    ///   a series may start long before the window
    /// - The result is ordered by `(start_date, source_event_id)` and contains
    ///   each `occurrence_id` once
    pub fn merge(&self, events: &[BaseEvent], window: &Window) -> Vec<Occurrence> {
        let mut occurrences: Vec<Occurrence> = events
            .iter()
            .filter(|event| overlaps(event, window))
            .map(Occurrence::anchor)
            .collect();

        for event in events.iter().filter(|event| event.is_recurring()) {
            let before = occurrences.len();
            occurrences.extend(self.expander.expand(event, window));
            tracing::trace!(
                event = %event.id(),
                recurrence = %event.recurrence(),
                instances = occurrences.len() - before,
                "expanded series"
            );
        }

        sort_occurrences(&mut occurrences);
        occurrences.dedup_by(|a, b| a.occurrence_id == b.occurrence_id);
        occurrences
    }
}

/// Orders occurrences by start, then source event, then occurrence id, so
/// equal occurrences end up adjacent and output is deterministic.
pub(crate) fn sort_occurrences(occurrences: &mut [Occurrence]) {
    occurrences.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then_with(|| a.source_event_id.cmp(&b.source_event_id))
            .then_with(|| a.occurrence_id.cmp(&b.occurrence_id))
    });
}
