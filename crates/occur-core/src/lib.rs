//! # Occur Core Library
//!
//! Expands recurring calendar events into concrete occurrences and answers
//! "what happens between these two instants" queries.
//!
//! ## Features
//!
//! - **Lazy Expansion**: Recurring series are never materialized; instances
//!   are computed on demand for the requested window only
//! - **Closed-Form Seeking**: A series anchored decades ago is expanded in
//!   time proportional to the window, not to the series age
//! - **Calendar Arithmetic**: Monthly and yearly steps follow the wall clock
//!   of a configured IANA timezone, with explicit end-of-month policy
//! - **Stable Identity**: Virtual instances carry deterministic ids, so the
//!   same instance has the same id in every overlapping query
//!
//! ## Core Modules
//!
//! - [`models`]: Base events, windows and occurrences
//! - [`clock`]: Calendar arithmetic in a timezone
//! - [`overlap`]: Anchor/window intersection test
//! - [`recurrence`]: Lazy series expansion
//! - [`merge`]: Combining anchors with expanded instances
//! - [`service`]: The range query entry point
//! - [`store`]: Event store abstraction and in-memory snapshot
//! - [`timezone`]: Timezone utilities and validation
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use occur_core::{BaseEvent, EventId, NewEventData, RangeQueryService, RecurrenceKind, Window};
//!
//! let standup = BaseEvent::new(NewEventData {
//!     id: EventId::new("standup"),
//!     start_date: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
//!     end_date: Utc.with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap(),
//!     recurrence: RecurrenceKind::Daily,
//!     ..Default::default()
//! })?;
//!
//! let window = Window::new(
//!     Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2024, 1, 6, 23, 59, 0).unwrap(),
//! );
//!
//! let occurrences = RangeQueryService::default().query(&[standup], &window);
//! assert_eq!(occurrences.len(), 4);
//! # Ok::<(), occur_core::CoreError>(())
//! ```

pub mod clock;
pub mod error;
pub mod merge;
pub mod models;
pub mod overlap;
pub mod recurrence;
pub mod service;
pub mod store;
pub mod timezone;

pub use clock::{CalendarClock, MonthOverflow, Period};
pub use error::CoreError;
pub use merge::OccurrenceMerger;
pub use models::{BaseEvent, EventId, NewEventData, Occurrence, OccurrenceId, RecurrenceKind, Window};
pub use recurrence::{Expander, SeekStrategy};
pub use service::RangeQueryService;
pub use store::{EventStore, InMemoryEventStore, Principal};
