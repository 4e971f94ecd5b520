use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use enb_core::Error;
use serde_json::json;
use tracing::error;

/// Maps domain errors onto status codes with a `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::DuplicateEntry { .. } | Error::FetchFailure { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> String {
        match &self.0 {
            Error::FetchFailure { .. } => "Could not fetch article content".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use enb_core::EntryKind;

    #[test]
    fn test_status_mapping() {
        let not_found = ApiError(Error::NotFound { kind: EntryKind::Keyword, id: 999 });
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.detail(), "Keyword not found");

        let duplicate = ApiError(Error::DuplicateEntry {
            kind: EntryKind::Company,
            value: "ENEOS".to_string(),
        });
        assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
        assert_eq!(duplicate.detail(), "Company already exists");

        let fetch = ApiError(Error::fetch_failure("https://example.com", "HTTP 503"));
        assert_eq!(fetch.status(), StatusCode::BAD_REQUEST);
        assert_eq!(fetch.detail(), "Could not fetch article content");

        let config = ApiError(Error::ConfigurationMissing("teams_webhook_url".to_string()));
        assert_eq!(config.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
