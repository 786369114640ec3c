use chrono::Duration;
use occur_core::models::Window;
use occur_core::service::RangeQueryService;
use occur_core::store::EventStore;
use std::sync::Arc;

use crate::config::LimitsConfig;
use crate::error::AppError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn EventStore>,
    service: RangeQueryService,
    limits: LimitsConfig,
}

impl AppState {
    pub fn new(store: impl EventStore + 'static, service: RangeQueryService, limits: LimitsConfig) -> Self {
        Self {
            store: Arc::new(store),
            service,
            limits,
        }
    }

    pub fn store(&self) -> &dyn EventStore {
        self.store.as_ref()
    }

    pub fn service(&self) -> &RangeQueryService {
        &self.service
    }

    pub fn limits(&self) -> LimitsConfig {
        self.limits
    }

    /// Rejects windows wider than the configured maximum. Inverted windows
    /// pass; they resolve to an empty result.
    pub fn check_window(&self, window: &Window) -> Result<(), AppError> {
        let max = Duration::days(i64::from(self.limits.max_window_days));
        if window.span() > max {
            return Err(AppError::bad_request(format!(
                "window spans more than {} days",
                self.limits.max_window_days
            )));
        }
        Ok(())
    }
}
