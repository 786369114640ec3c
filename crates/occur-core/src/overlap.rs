//! Coarse overlap test between an event's anchor instance and a query window.

use chrono::{DateTime, Utc};

use crate::models::{BaseEvent, Window};

/// Returns whether the anchor instance of `event` intersects `window`.
///
/// For recurring events this is only a candidate filter on the anchor; which
/// later instances fall in the window is decided by the expander.
#[inline]
pub fn overlaps(event: &BaseEvent, window: &Window) -> bool {
    span_overlaps(event.start_date(), event.end_date(), window)
}

/// Returns whether `[start, end]` intersects `window`. Both ranges are
/// inclusive. The span intersects when it starts inside the window, ends
/// inside it, or covers it entirely.
pub fn span_overlaps(start: DateTime<Utc>, end: DateTime<Utc>, window: &Window) -> bool {
    if window.is_empty() {
        return false;
    }

    window.contains(start) || window.contains(end) || (start <= window.start && end >= window.end)
}
