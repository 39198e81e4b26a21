//! Envelope response format for all API responses.
//!
//! ```json
//! {
//!   "data": { ... },
//!   "meta": { "request_id": "...", "timestamp": "...", "response_time_ms": 5 }
//! }
//! ```

use std::time::Instant;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

/// Envelope response wrapping all API data.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ApiMeta,
    #[serde(skip)]
    status: StatusCode,
}

/// Metadata included in every response.
#[derive(Debug, Serialize)]
pub struct ApiMeta {
    pub request_id: String,
    /// RFC 3339 timestamp of the response.
    pub timestamp: String,
    pub response_time_ms: u64,
}

/// Per-request id and start time, captured when a handler begins.
pub struct RequestClock {
    request_id: String,
    start: Instant,
}

impl RequestClock {
    pub fn start() -> Self {
        Self {
            request_id: Uuid::now_v7().to_string(),
            start: Instant::now(),
        }
    }

    /// 200 OK envelope.
    pub fn ok<T: Serialize>(self, data: T) -> ApiResponse<T> {
        self.respond(StatusCode::OK, data)
    }

    /// 201 Created envelope.
    pub fn created<T: Serialize>(self, data: T) -> ApiResponse<T> {
        self.respond(StatusCode::CREATED, data)
    }

    fn respond<T: Serialize>(self, status: StatusCode, data: T) -> ApiResponse<T> {
        ApiResponse {
            data,
            meta: ApiMeta {
                request_id: self.request_id,
                timestamp: chrono::Utc::now().to_rfc3339(),
                response_time_ms: self.start.elapsed().as_millis() as u64,
            },
            status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = serde_json::to_string(&self).unwrap_or_else(|_| {
            r#"{"errors":[{"code":"SERIALIZATION_ERROR","message":"Failed to serialize response"}]}"#.to_string()
        });

        (
            self.status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}
