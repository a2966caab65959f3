use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;
use crate::application::query::QueryError;
use crate::application::sources::SourceError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const NOT_FOUND: &str = "not_found";
    pub const INVALID_FILTER: &str = "invalid_filter";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const SOURCE_UNAVAILABLE: &str = "source_unavailable";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
        }
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    /// A well-formed-but-invalid filter clause. Distinct from the
    /// unparsable-input case, which is silently downgraded to no filters.
    pub fn invalid_filter(err: QueryError) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_FILTER,
            "Filter clause rejected",
            Some(err.to_string()),
        )
    }
}

/// Map a data-source error to a consistent HTTP error response.
pub fn source_to_api(err: SourceError) -> ApiError {
    match err {
        SourceError::Unavailable(message) => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::SOURCE_UNAVAILABLE,
            "Data source temporarily unavailable",
            Some(message),
        ),
        SourceError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        // Attach a structured report so shared logging middleware can emit
        // rich diagnostics.
        ErrorReport::from_message(
            "infra::http",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
        )
        .attach(&mut response);
        response
    }
}
