use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use occur_core::service::RangeQueryService;
use occur_core::store::InMemoryEventStore;
use occur_server::config::LimitsConfig;
use occur_server::router;
use occur_server::state::AppState;
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;
use tower::ServiceExt;

/// Test harness driving the router in-process, backed by a snapshot file
pub struct ServerTestHarness {
    app: Router,
    _snapshot: NamedTempFile,
}

impl ServerTestHarness {
    /// Create a harness over the standard fixtures
    pub async fn new() -> Self {
        Self::with_limits(LimitsConfig::default()).await
    }

    pub async fn with_limits(limits: LimitsConfig) -> Self {
        let mut snapshot = NamedTempFile::new().expect("Failed to create snapshot file");
        write!(snapshot, "{}", TestFixtures::events()).expect("Failed to write snapshot");

        let store = InMemoryEventStore::load(snapshot.path())
            .await
            .expect("Failed to load snapshot");
        let app = router(AppState::new(store, RangeQueryService::default(), limits));

        Self {
            app,
            _snapshot: snapshot,
        }
    }

    /// Send a GET, optionally as `principal`, and decode the JSON body
    pub async fn get(&self, uri: &str, principal: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().uri(uri);
        if let Some(principal) = principal {
            request = request.header("x-principal", principal);
        }
        let request = request.body(Body::empty()).expect("Failed to build request");

        let response = self.app.clone().oneshot(request).await.expect("Request failed");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = serde_json::from_slice(&bytes).expect("Body is not JSON");

        (status, body)
    }
}

/// Common test fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub fn events() -> Value {
        json!([
            {
                "id": "standup",
                "ownerId": "alice",
                "title": "Standup",
                "startDate": "2024-01-01T10:00:00Z",
                "endDate": "2024-01-01T10:15:00Z",
                "recurrenceType": "daily",
                "recurrenceEndDate": "2024-01-31T10:00:00Z"
            },
            {
                "id": "dentist",
                "ownerId": "alice",
                "title": "Dentist",
                "startDate": "2024-01-04T14:00:00Z",
                "endDate": "2024-01-04T15:00:00Z",
                "recurrenceType": null
            },
            {
                "id": "rent",
                "ownerId": "bob",
                "startDate": "2023-01-31T09:00:00Z",
                "endDate": "2023-01-31T09:30:00Z",
                "recurrenceType": "monthly"
            },
            {
                "id": "nightly",
                "ownerId": "dave",
                "startDate": "2024-01-01T23:30:00Z",
                "endDate": "2024-01-02T00:30:00Z",
                "recurrenceType": "daily"
            }
        ])
    }
}

pub mod assertions {
    use serde_json::Value;

    /// Field `key` of every element of a JSON array
    pub fn field<'a>(body: &'a Value, key: &str) -> Vec<&'a str> {
        body.as_array()
            .expect("Body is not an array")
            .iter()
            .map(|item| item[key].as_str().expect("Field is not a string"))
            .collect()
    }

    pub fn error_contains(body: &Value, needle: &str) -> bool {
        body["error"]
            .as_str()
            .map(|message| message.contains(needle))
            .unwrap_or(false)
    }
}
