use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid settings: {0}")]
    Settings(#[from] validator::ValidationErrors),

    #[error("Malformed request: {0}")]
    Parse(String),

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Invalid value '{value}' for field '{field}': {source}")]
    Conversion {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Body of every error the API returns: `{"error": {"code", "message", "details"?}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails {
                code: code.to_string(),
                message: message.into(),
                details: Vec::new(),
            },
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.error.details = details;
        self
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Parse(_) | Error::Validation(_) | Error::Conversion { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing representation. Internal failures collapse into one generic
    /// message; their cause only goes to the logs.
    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            Error::Parse(msg) => ErrorResponse::new("INVALID_REQUEST", msg.clone()),
            Error::Validation(errors) => {
                ErrorResponse::new("VALIDATION_ERROR", "Request validation failed")
                    .with_details(errors.clone())
            }
            Error::Conversion { field, value, .. } => ErrorResponse::new(
                "CONVERSION_ERROR",
                format!("invalid value '{}' for field '{}'", value, field),
            ),
            Error::NotFound(msg) => ErrorResponse::new("NOT_FOUND", msg.clone()),
            _ => ErrorResponse::new("INTERNAL_ERROR", "An unexpected error occurred"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(component = "server", error = %self, "request failed");
        }
        (status, Json(self.to_error_response())).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_carry_every_message() {
        let err = Error::Validation(vec!["first".into(), "second".into()]);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = err.to_error_response();
        assert_eq!(body.error.code, "VALIDATION_ERROR");
        assert_eq!(body.error.details, vec!["first", "second"]);
    }

    #[test]
    fn conversion_error_names_field_and_value() {
        let source = chrono::NaiveDate::parse_from_str("2024-13-40", "%Y-%m-%d").unwrap_err();
        let err = Error::Conversion {
            field: "date_from",
            value: "2024-13-40".into(),
            source,
        };
        let body = err.to_error_response();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(body.error.code, "CONVERSION_ERROR");
        assert!(body.error.message.contains("date_from"));
        assert!(body.error.message.contains("2024-13-40"));
    }

    #[test]
    fn database_errors_do_not_leak_internals() {
        let err = Error::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = serde_json::to_value(err.to_error_response()).unwrap();
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "An unexpected error occurred");
        assert!(body["error"].get("details").is_none());
    }

    #[test]
    fn into_response_uses_mapped_status() {
        let response = Error::Parse("missing field `q`".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = Error::Internal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err = Error::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_error_response().error.code, "NOT_FOUND");
    }
}
