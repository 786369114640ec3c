use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::clock::Period;
use crate::error::CoreError;

/// Descriptive fields of an event (title, owner, metadata ...). The engine
/// never looks inside; they are copied onto every occurrence.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Opaque, stable identifier of a persisted event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RecurrenceKind {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurrence type: {0}")]
pub struct ParseRecurrenceKindError(String);

impl FromStr for RecurrenceKind {
    type Err = ParseRecurrenceKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(RecurrenceKind::None),
            "daily" => Ok(RecurrenceKind::Daily),
            "weekly" => Ok(RecurrenceKind::Weekly),
            "monthly" => Ok(RecurrenceKind::Monthly),
            "yearly" => Ok(RecurrenceKind::Yearly),
            _ => Err(ParseRecurrenceKindError(s.to_string())),
        }
    }
}

impl RecurrenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecurrenceKind::None => "none",
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::Monthly => "monthly",
            RecurrenceKind::Yearly => "yearly",
        }
    }

    /// The step between instances, or `None` for non-recurring events.
    pub fn period(self) -> Option<Period> {
        match self {
            RecurrenceKind::None => None,
            RecurrenceKind::Daily => Some(Period::Day),
            RecurrenceKind::Weekly => Some(Period::Week),
            RecurrenceKind::Monthly => Some(Period::Month),
            RecurrenceKind::Yearly => Some(Period::Year),
        }
    }

    #[inline]
    pub fn is_recurring(self) -> bool {
        self != RecurrenceKind::None
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RecurrenceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Null and unrecognized tags deserialize to `None` so that one malformed
/// record cannot fail a whole window query.
impl<'de> Deserialize<'de> for RecurrenceKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw {
            None => RecurrenceKind::None,
            Some(tag) => tag.parse().unwrap_or_else(|err: ParseRecurrenceKindError| {
                tracing::warn!(%err, "treating event as non-recurring");
                RecurrenceKind::None
            }),
        })
    }
}

// ============================================================================
// Base events
// ============================================================================

/// Input for constructing a `BaseEvent`.
#[derive(Debug, Clone, Default)]
pub struct NewEventData {
    pub id: EventId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub recurrence: RecurrenceKind,
    pub recurrence_end_date: Option<DateTime<Utc>>,
    pub payload: Payload,
}

/// A persisted event, optionally the anchor of a recurring series.
///
/// Fields are private: every `BaseEvent` in existence has passed validation,
/// either through `BaseEvent::new` or through deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EventRecord", into = "EventRecord")]
pub struct BaseEvent {
    id: EventId,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    recurrence: RecurrenceKind,
    recurrence_end_date: Option<DateTime<Utc>>,
    payload: Payload,
}

impl BaseEvent {
    /// Validates `data` and builds an event.
    ///
    /// # Errors
    /// - `InvalidInput` if the id is empty
    /// - `EndBeforeStart` if `end_date < start_date`
    /// - `RecurrenceEndBeforeStart` if `recurrence_end_date < start_date`
    pub fn new(data: NewEventData) -> Result<Self, CoreError> {
        if data.id.as_str().is_empty() {
            return Err(CoreError::InvalidInput("event id must not be empty".to_string()));
        }
        if data.end_date < data.start_date {
            return Err(CoreError::EndBeforeStart {
                id: data.id,
                start: data.start_date,
                end: data.end_date,
            });
        }
        if let Some(recurrence_end) = data.recurrence_end_date {
            if recurrence_end < data.start_date {
                return Err(CoreError::RecurrenceEndBeforeStart {
                    id: data.id,
                    start: data.start_date,
                    recurrence_end,
                });
            }
        }

        Ok(Self {
            id: data.id,
            start_date: data.start_date,
            end_date: data.end_date,
            recurrence: data.recurrence,
            recurrence_end_date: data.recurrence_end_date,
            payload: data.payload,
        })
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    pub fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }

    pub fn recurrence(&self) -> RecurrenceKind {
        self.recurrence
    }

    pub fn recurrence_end_date(&self) -> Option<DateTime<Utc>> {
        self.recurrence_end_date
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Length of every instance in the series.
    pub fn duration(&self) -> Duration {
        self.end_date - self.start_date
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_recurring()
    }
}

/// Persisted layout of a `BaseEvent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventRecord {
    id: EventId,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    #[serde(default, rename = "recurrenceType")]
    recurrence: RecurrenceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recurrence_end_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    payload: Payload,
}

impl TryFrom<EventRecord> for BaseEvent {
    type Error = CoreError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        BaseEvent::new(NewEventData {
            id: record.id,
            start_date: record.start_date,
            end_date: record.end_date,
            recurrence: record.recurrence,
            recurrence_end_date: record.recurrence_end_date,
            payload: record.payload,
        })
    }
}

impl From<BaseEvent> for EventRecord {
    fn from(event: BaseEvent) -> Self {
        Self {
            id: event.id,
            start_date: event.start_date,
            end_date: event.end_date,
            recurrence: event.recurrence,
            recurrence_end_date: event.recurrence_end_date,
            payload: event.payload,
        }
    }
}

// ============================================================================
// Query windows and occurrences
// ============================================================================

/// A query window, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// An inverted window (`end < start`) contains nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    #[inline]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn span(&self) -> Duration {
        self.end - self.start
    }
}

/// Namespace for occurrence identifiers. Changing it changes every virtual
/// occurrence id ever handed out.
const OCCURRENCE_NAMESPACE: Uuid = Uuid::from_u128(0x6f63_6375_7272_4e53_9a1c_3e5d_2b7f_0c41);

/// Identifier of one occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OccurrenceId(String);

impl OccurrenceId {
    /// The anchor instance is identified by its event id.
    pub fn anchor(source: &EventId) -> Self {
        Self(source.as_str().to_string())
    }

    /// Identifier of the virtual instance of `source` starting at `start`.
    ///
    /// A v5 UUID over the source id bytes, a NUL separator, then the start
    /// instant as big-endian Unix seconds and subsecond nanoseconds. The same
    /// `(source, start)` always yields the same id, whatever window produced it.
    pub fn derive(source: &EventId, start: DateTime<Utc>) -> Self {
        let source = source.as_str().as_bytes();
        let mut name = Vec::with_capacity(source.len() + 13);
        name.extend_from_slice(source);
        name.push(0);
        name.extend_from_slice(&start.timestamp().to_be_bytes());
        name.extend_from_slice(&start.timestamp_subsec_nanos().to_be_bytes());

        Self(Uuid::new_v5(&OCCURRENCE_NAMESPACE, &name).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A concrete occurrence of a base event. Computed per query, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub source_event_id: EventId,
    pub occurrence_id: OccurrenceId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_virtual: bool,
    #[serde(flatten)]
    pub payload: Payload,
}

impl Occurrence {
    /// The event itself, as stored.
    pub fn anchor(event: &BaseEvent) -> Self {
        Self {
            source_event_id: event.id.clone(),
            occurrence_id: OccurrenceId::anchor(&event.id),
            start_date: event.start_date,
            end_date: event.end_date,
            is_virtual: false,
            payload: event.payload.clone(),
        }
    }

    /// A computed instance of `event` starting at `start`.
    ///
    /// Returns `None` when the instance would end past the last representable
    /// instant.
    pub fn instance(event: &BaseEvent, start: DateTime<Utc>) -> Option<Self> {
        let end_date = start.checked_add_signed(event.duration())?;
        Some(Self {
            source_event_id: event.id.clone(),
            occurrence_id: OccurrenceId::derive(&event.id, start),
            start_date: start,
            end_date,
            is_virtual: true,
            payload: event.payload.clone(),
        })
    }
}
