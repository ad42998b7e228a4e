//! Optimization service client.
//!
//! Talks to the remote optimization backend over HTTP/JSON using the
//! synchronous `ureq` client. The backend owns all loading logic; this module
//! only defines the wire contract:
//!
//! - **Endpoints**: the versioned path table, resolved against a base URL.
//! - **Client**: list flights, run an optimization, synthetic data, export.
//! - **Errors**: a transport/HTTP failure is a [`ClientError`]. A run that
//!   the backend reports as `success: false` is *not* an error; it comes back
//!   as an `Ok` result and is shown by the presenter's failure view.

pub mod cancel;
pub mod client;

pub use cancel::CancelToken;
pub use client::OptimizationClient;

use crate::model::{OptimizationRequest, OptimizationResult};

/// Versioned path prefix shared by every endpoint.
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

// ---------------------------------------------------------------------------
// Endpoint table
// ---------------------------------------------------------------------------

/// Absolute URLs for every backend operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
    prefix: String,
}

impl Endpoints {
    pub fn new(base_url: &str, prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        let prefix = if prefix.is_empty() || prefix.starts_with('/') {
            prefix.to_string()
        } else {
            format!("/{prefix}")
        };
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            prefix,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.prefix, path)
    }

    pub fn flights(&self) -> String {
        self.url("/optimization/flights")
    }

    pub fn run(&self) -> String {
        self.url("/optimization/run")
    }

    pub fn synthetic(&self) -> String {
        self.url("/optimization/synthetic/generate")
    }

    pub fn export_sheets(&self) -> String {
        self.url("/export/sheets")
    }

    pub fn export_sheets_status(&self) -> String {
        self.url("/export/sheets/status")
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Transport-level failure of a backend call.
///
/// The `Display` text is what the error banner shows: for a non-2xx response
/// it is the detail string the backend put in the body.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error("no flight selected")]
    EmptyFlight,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("{detail}")]
    Status { status: u16, detail: String },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("could not decode backend response: {0}")]
    Decode(String),
    #[error("request cancelled")]
    Cancelled,
}

impl ClientError {
    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short machine-readable kind, reported in dashboard error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyFlight | Self::InvalidRequest(_) => "invalid_request",
            Self::Status { .. } => "http_status",
            Self::Transport { .. } => "transport",
            Self::Decode(_) => "decode",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Pull the most useful message out of an error response body.
///
/// FastAPI puts it in `detail` (a string, or a list of validation errors);
/// other services use `error` or `message`. Falls back to the trimmed raw
/// body, then to the bare status line.
pub fn extract_detail(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["detail", "error", "message"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {
                    return s.trim().to_string();
                }
                Some(serde_json::Value::Null) | None => {}
                Some(other) => return other.to_string(),
            }
        }
    }

    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// The two operations the dashboard session needs from a backend.
///
/// Implemented by [`OptimizationClient`]; tests substitute an in-memory
/// backend.
pub trait OptimizationBackend: Send + Sync {
    fn list_flights(&self) -> Result<Vec<String>, ClientError>;

    /// Run an optimization. Returns [`ClientError::Cancelled`] once `cancel`
    /// is triggered, even if the backend is still working.
    fn run(
        &self,
        request: &OptimizationRequest,
        cancel: &CancelToken,
    ) -> Result<OptimizationResult, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_resolve_against_base() {
        let e = Endpoints::new("http://localhost:8000/", "/api/v1");
        assert_eq!(e.flights(), "http://localhost:8000/api/v1/optimization/flights");
        assert_eq!(e.run(), "http://localhost:8000/api/v1/optimization/run");
        assert_eq!(
            e.synthetic(),
            "http://localhost:8000/api/v1/optimization/synthetic/generate"
        );
        assert_eq!(e.export_sheets(), "http://localhost:8000/api/v1/export/sheets");
        assert_eq!(
            e.export_sheets_status(),
            "http://localhost:8000/api/v1/export/sheets/status"
        );
    }

    #[test]
    fn endpoints_normalize_prefix() {
        let e = Endpoints::new("http://host:9000", "api/v2/");
        assert_eq!(e.run(), "http://host:9000/api/v2/optimization/run");
        let bare = Endpoints::new("http://host:9000", "");
        assert_eq!(bare.flights(), "http://host:9000/optimization/flights");
    }

    #[test]
    fn detail_prefers_fastapi_detail_field() {
        let body = r#"{"detail": "Flight data not found: KL0001"}"#;
        assert_eq!(extract_detail(404, body), "Flight data not found: KL0001");
    }

    #[test]
    fn detail_renders_structured_detail_as_json() {
        let body = r#"{"detail": [{"loc": ["body", "flight_path"], "msg": "field required"}]}"#;
        let detail = extract_detail(422, body);
        assert!(detail.contains("field required"));
    }

    #[test]
    fn detail_falls_back_to_error_then_body_then_status() {
        assert_eq!(extract_detail(500, r#"{"error": "boom"}"#), "boom");
        assert_eq!(extract_detail(502, "Bad Gateway\n"), "Bad Gateway");
        assert_eq!(extract_detail(503, "  "), "HTTP 503");
        assert_eq!(extract_detail(500, r#"{"detail": null}"#), r#"{"detail": null}"#);
    }

    #[test]
    fn status_error_displays_detail_only() {
        let err = ClientError::Status {
            status: 400,
            detail: "Model infeasible".to_string(),
        };
        assert_eq!(err.to_string(), "Model infeasible");
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.kind(), "http_status");
    }
}
