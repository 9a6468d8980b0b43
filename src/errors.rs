use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use reqwest::StatusCode;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found")]
    NotFound,
    #[error("External error: {0}")]
    External(String),
    #[error("Unauthorized")]
    Unauthorized,
}

// All error responses share the dashboard envelope:
// { "success": false, "error": ..., "code"?: ..., "timestamp": ... }
fn envelope(status: StatusCode, message: &str, code: Option<&str>) -> axum::response::Response {
    let mut body = json!({
        "success": false,
        "error": message,
        "timestamp": Utc::now(),
    });
    if let Some(code) = code {
        body["code"] = json!(code);
    }
    (status, Json(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::NotFound => envelope(StatusCode::NOT_FOUND, "Not found", Some("NOT_FOUND")),
            AppError::Validation(msg) => envelope(StatusCode::BAD_REQUEST, &msg, Some("VALIDATION")),
            AppError::Unauthorized => {
                envelope(StatusCode::UNAUTHORIZED, "Unauthorized", Some("UNAUTHORIZED"))
            }
            AppError::External(msg) => envelope(StatusCode::BAD_GATEWAY, &msg, None),
            // Internal detail stays in the logs, not the response.
            AppError::Db(_) => envelope(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred",
                None,
            ),
        }
    }
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        AppError::Validation(value)
    }
}
