use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::CoreError;
use crate::models::{BaseEvent, EventId};

/// Payload field naming the principal an event belongs to.
pub const OWNER_FIELD: &str = "ownerId";

/// The caller whose events are being queried.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of base events, owned by the surrounding application.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// All base events belonging to `principal`.
    async fn events_for(&self, principal: &Principal) -> Result<Vec<BaseEvent>, CoreError>;

    /// One event of `principal`, if it exists.
    async fn find_event(&self, principal: &Principal, id: &EventId) -> Result<Option<BaseEvent>, CoreError>;
}

#[async_trait]
impl<T> EventStore for Arc<T>
where
    T: EventStore + ?Sized,
{
    async fn events_for(&self, principal: &Principal) -> Result<Vec<BaseEvent>, CoreError> {
        (**self).events_for(principal).await
    }

    async fn find_event(&self, principal: &Principal, id: &EventId) -> Result<Option<BaseEvent>, CoreError> {
        (**self).find_event(principal, id).await
    }
}

/// An `EventStore` over an in-memory snapshot, grouped by principal.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    events: HashMap<Principal, Vec<BaseEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, principal: Principal, event: BaseEvent) {
        self.events.entry(principal).or_default().push(event);
    }

    /// Builds a store from persisted records. Each record must be a valid
    /// `BaseEvent` with a string `ownerId` field.
    ///
    /// # Errors
    /// `InvalidRecord` naming the first offending record's index.
    pub fn from_records(records: Vec<serde_json::Value>) -> Result<Self, CoreError> {
        let mut store = Self::new();

        for (index, record) in records.into_iter().enumerate() {
            let event: BaseEvent = serde_json::from_value(record).map_err(|err| CoreError::InvalidRecord {
                index,
                reason: err.to_string(),
            })?;
            let owner = event
                .payload()
                .get(OWNER_FIELD)
                .and_then(|value| value.as_str())
                .map(Principal::new)
                .ok_or_else(|| CoreError::InvalidRecord {
                    index,
                    reason: format!("missing string field '{}'", OWNER_FIELD),
                })?;
            store.insert(owner, event);
        }

        Ok(store)
    }

    /// Parses a JSON array of records.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let records: Vec<serde_json::Value> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    /// Loads a JSON snapshot file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        let store = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            principals = store.events.len(),
            events = store.len(),
            "loaded event snapshot"
        );
        Ok(store)
    }

    /// Total number of events across all principals.
    pub fn len(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn events_for(&self, principal: &Principal) -> Result<Vec<BaseEvent>, CoreError> {
        Ok(self.events.get(principal).cloned().unwrap_or_default())
    }

    async fn find_event(&self, principal: &Principal, id: &EventId) -> Result<Option<BaseEvent>, CoreError> {
        Ok(self
            .events
            .get(principal)
            .and_then(|events| events.iter().find(|event| event.id() == id))
            .cloned())
    }
}
