use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use occur_core::error::CoreError;
use serde::Serialize;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error on its way to becoming an HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn new(status: StatusCode, error: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, anyhow::anyhow!(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, anyhow::anyhow!(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = ?self.error, "request failed");
        } else {
            tracing::warn!(status = %self.status, error = %self.error, "request rejected");
        }

        let body = Json(ErrorResponse {
            error: self.error.to_string(),
        });
        (self.status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let status = if err.is_invariant_violation() || matches!(err, CoreError::InvalidTimezone(_)) {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self::new(status, err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use occur_core::models::EventId;

    #[test]
    fn test_core_error_status() {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let invariant = CoreError::EndBeforeStart {
            id: EventId::new("evt"),
            start,
            end,
        };
        assert_eq!(AppError::from(invariant).status(), StatusCode::BAD_REQUEST);

        let io = CoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(AppError::from(io).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_follows_invariant_classification() {
        let cases = [
            CoreError::InvalidInput("missing id".to_string()),
            CoreError::InvalidTimezone("Mars/Olympus".to_string()),
            CoreError::InvalidRecord {
                index: 3,
                reason: "bad".to_string(),
            },
        ];
        let statuses: Vec<StatusCode> = cases.into_iter().map(|err| AppError::from(err).status()).collect();

        assert_eq!(
            statuses,
            vec![
                StatusCode::BAD_REQUEST,
                StatusCode::BAD_REQUEST,
                StatusCode::INTERNAL_SERVER_ERROR
            ]
        );
    }

    #[test]
    fn test_error_body_shape() {
        let response = AppError::not_found("Event not found: x").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
