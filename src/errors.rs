use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Resource absent on a remote platform (student, customer, subscription).
    /// Expected outcome, surfaced as 404.
    NotFound(String),
    /// Bad request error (invalid input, unsupported upload).
    BadRequest(String),
    /// A remote platform answered with a non-success status or a malformed body.
    /// The remote status and body are echoed to the caller, never swallowed.
    RemoteApi {
        /// Which remote platform failed (flexge, asaas, zaia, openai).
        service: &'static str,
        /// Remote HTTP status, or 0 when the request never completed (timeout,
        /// connection error).
        status: u16,
        /// Remote response body or transport error text.
        body: String,
    },
    /// Internal server error.
    Internal(String),
}

impl AppError {
    /// Wraps a transport-level `reqwest` failure. Timeouts are not
    /// distinguished from any other failed call.
    pub fn remote(service: &'static str, err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16()).unwrap_or(0);
        AppError::RemoteApi {
            service,
            status,
            body: err.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::RemoteApi {
                service,
                status,
                body,
            } => write!(f, "{} returned {}: {}", service, status, body),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each error variant to an HTTP status code and JSON body.
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::RemoteApi {
                service,
                status,
                body,
            } => {
                tracing::error!("{} request failed with {}: {}", service, status, body);
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({
                        "error": format!("{} request failed", service),
                        "remote_status": status,
                        "remote_body": body,
                    })),
                )
                    .into_response()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
