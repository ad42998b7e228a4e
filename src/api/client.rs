/// Synchronous HTTP client for the optimization backend.
///
/// Every call carries an explicit timeout (the backend's solver can run for
/// minutes, so the run timeout is configurable). Long runs can additionally
/// be abandoned through a [`CancelToken`] via
/// [`run_cancellable`](OptimizationClient::run_cancellable).
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::{CancelToken, ClientError, Endpoints, OptimizationBackend, extract_detail};
use crate::config::schema::BackendConfig;
use crate::model::request::{DEFAULT_WORKSHEET, ExportRequest};
use crate::model::{OptimizationRequest, OptimizationResult, SyntheticDataRequest};

/// How often a cancellable call checks its token while waiting.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct OptimizationClient {
    endpoints: Endpoints,
    timeout: Duration,
    health_timeout: Duration,
}

impl OptimizationClient {
    /// Build a client from the resolved `[backend]` config section.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self {
            endpoints: Endpoints::new(&config.base_url, &config.api_prefix),
            timeout: Duration::from_millis(config.timeout_ms),
            health_timeout: Duration::from_millis(config.health_timeout_ms),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the backend answers the flights endpoint within the short
    /// health timeout.
    pub fn is_healthy(&self) -> bool {
        self.get_json(&self.endpoints.flights(), self.health_timeout)
            .is_ok()
    }

    /// `GET /optimization/flights`: identifiers accepted as `flight_path`.
    pub fn list_flights(&self) -> Result<Vec<String>, ClientError> {
        let value = self.get_json(&self.endpoints.flights(), self.timeout)?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// `POST /optimization/run`: blocks until the backend answers or the
    /// timeout elapses.
    pub fn run(&self, request: &OptimizationRequest) -> Result<OptimizationResult, ClientError> {
        if request.flight_path.trim().is_empty() {
            return Err(ClientError::EmptyFlight);
        }

        let value = self.post_json(&self.endpoints.run(), request, self.timeout)?;
        OptimizationResult::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Like [`run`](Self::run), but returns [`ClientError::Cancelled`] as soon
    /// as `cancel` is triggered.
    ///
    /// The request runs on a worker thread. A response that arrives after
    /// cancellation is dropped.
    pub fn run_cancellable(
        &self,
        request: &OptimizationRequest,
        cancel: &CancelToken,
    ) -> Result<OptimizationResult, ClientError> {
        if request.flight_path.trim().is_empty() {
            return Err(ClientError::EmptyFlight);
        }
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let (tx, rx) = mpsc::channel();
        let client = self.clone();
        let request = request.clone();
        thread::spawn(move || {
            let _ = tx.send(client.run(&request));
        });

        loop {
            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(_) if cancel.is_cancelled() => return Err(ClientError::Cancelled),
                Ok(result) => return result,
                Err(RecvTimeoutError::Timeout) => {
                    if cancel.is_cancelled() {
                        return Err(ClientError::Cancelled);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ClientError::Transport {
                        url: self.endpoints.run(),
                        message: "request worker exited without a response".to_string(),
                    });
                }
            }
        }
    }

    /// `POST /optimization/synthetic/generate`: the response shape is
    /// backend-defined and returned as-is.
    pub fn generate_synthetic(&self, params: &SyntheticDataRequest) -> Result<Value, ClientError> {
        params.validate().map_err(ClientError::InvalidRequest)?;
        self.post_json(&self.endpoints.synthetic(), params, self.timeout)
    }

    /// `POST /export/sheets`: push a result to a spreadsheet.
    pub fn export_to_sheets(
        &self,
        result: &OptimizationResult,
        spreadsheet_id: &str,
        worksheet_name: Option<&str>,
    ) -> Result<Value, ClientError> {
        let spreadsheet_id = spreadsheet_id.trim();
        if spreadsheet_id.is_empty() {
            return Err(ClientError::InvalidRequest(
                "spreadsheet id must not be empty".to_string(),
            ));
        }

        let body = ExportRequest {
            result,
            spreadsheet_id,
            worksheet_name: worksheet_name
                .filter(|w| !w.trim().is_empty())
                .unwrap_or(DEFAULT_WORKSHEET),
        };
        self.post_json(&self.endpoints.export_sheets(), &body, self.timeout)
    }

    /// `GET /export/sheets/status`.
    pub fn sheets_status(&self) -> Result<Value, ClientError> {
        self.get_json(&self.endpoints.export_sheets_status(), self.timeout)
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, ClientError> {
        let resp = ureq::get(url)
            .timeout(timeout)
            .call()
            .map_err(|e| map_ureq_error(url, e))?;
        resp.into_json()
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    fn post_json<B: Serialize>(
        &self,
        url: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<Value, ClientError> {
        let resp = ureq::post(url)
            .timeout(timeout)
            .send_json(body)
            .map_err(|e| map_ureq_error(url, e))?;
        resp.into_json()
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

impl OptimizationBackend for OptimizationClient {
    fn list_flights(&self) -> Result<Vec<String>, ClientError> {
        OptimizationClient::list_flights(self)
    }

    fn run(
        &self,
        request: &OptimizationRequest,
        cancel: &CancelToken,
    ) -> Result<OptimizationResult, ClientError> {
        self.run_cancellable(request, cancel)
    }
}

fn map_ureq_error(url: &str, err: ureq::Error) -> ClientError {
    match err {
        ureq::Error::Status(status, resp) => {
            let body = resp.into_string().unwrap_or_default();
            ClientError::Status {
                status,
                detail: extract_detail(status, &body),
            }
        }
        ureq::Error::Transport(transport) => ClientError::Transport {
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
