//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns an
//! [`HttpResponse`] with JSON content. Error bodies always have the shape
//! `{"error": "...", "kind": "..."}`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tiny_http::{Response, StatusCode};

use crate::api::ClientError;
use crate::dashboard::{RunOverrides, SessionError};
use crate::model::ModelType;
use crate::present::{ResultView, build_view};

use super::{AppState, HttpResponse, content_type};

/// Non-standard "client closed request", used when the operator cancels a
/// run.
const STATUS_CANCELLED: u16 = 499;

// ---------------------------------------------------------------------------
// JSON request / response types
// ---------------------------------------------------------------------------

/// `POST /api/run` body. Every field is optional; omitted fields keep the
/// session's current value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunRequest {
    flight: Option<String>,
    model: Option<ModelType>,
    restricted_locations: Option<Vec<String>>,
}

/// `POST /api/export` body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExportRequest {
    spreadsheet_id: Option<String>,
    worksheet_name: Option<String>,
}

#[derive(Serialize)]
struct FlightsResponse {
    flights: Vec<String>,
    selected: Option<String>,
}

#[derive(Serialize)]
struct CancelResponse {
    cancelled: bool,
}

#[derive(Serialize)]
struct HealthResponse {
    backend_url: String,
    backend_reachable: bool,
    busy: bool,
    export_configured: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON response with the given status.
fn json_with_status<T: Serialize>(status: u16, data: &T) -> Result<HttpResponse> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(with_json_header(
        Response::from_data(body.into_bytes()).with_status_code(StatusCode(status)),
    ))
}

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<HttpResponse> {
    json_with_status(200, data)
}

fn with_json_header(resp: HttpResponse) -> HttpResponse {
    match content_type("application/json; charset=utf-8") {
        Some(header) => resp.with_header(header),
        None => resp,
    }
}

/// `{"error": message, "kind": kind}` with the given status.
pub(crate) fn error_response(status: u16, kind: &str, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": message, "kind": kind }).to_string();
    with_json_header(Response::from_data(body.into_bytes()).with_status_code(StatusCode(status)))
}

/// HTTP status and error kind for a session error.
fn session_error_status(err: &SessionError) -> (u16, &'static str) {
    match err {
        SessionError::Busy => (409, "busy"),
        SessionError::NoFlightSelected | SessionError::UnknownFlight(_) => {
            (400, "invalid_request")
        }
        SessionError::NoResult => (409, "no_result"),
        SessionError::Client(ClientError::Cancelled) => (STATUS_CANCELLED, "cancelled"),
        SessionError::Client(e @ (ClientError::EmptyFlight | ClientError::InvalidRequest(_))) => {
            (400, e.kind())
        }
        SessionError::Client(e) => (502, e.kind()),
    }
}

fn session_error_response(err: &SessionError, message: &str) -> HttpResponse {
    let (status, kind) = session_error_status(err);
    error_response(status, kind, message)
}

fn parse_body<'a, T: Deserialize<'a> + Default>(body: &'a str) -> Result<T> {
    if body.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(body).context("invalid JSON in request body")
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/flights`: reload the flight list from the backend.
pub fn get_flights(state: &AppState) -> Result<HttpResponse> {
    match state.dashboard.load_flights() {
        Ok(flights) => json_response(&FlightsResponse {
            flights,
            selected: state.dashboard.snapshot().selected,
        }),
        Err(e) => {
            let message = state.dashboard.error().unwrap_or_else(|| e.to_string());
            Ok(session_error_response(&e, &message))
        }
    }
}

/// `GET /api/session`: the current session, including the derived view of
/// the current result.
pub fn get_session(state: &AppState) -> Result<HttpResponse> {
    json_response(&state.dashboard.snapshot())
}

/// `POST /api/run`: run an optimization and return the derived view.
///
/// Answers `409` while another run is outstanding. A `success: false` result
/// is a `200` carrying the failure view.
pub fn post_run(state: &AppState, body: &str) -> Result<HttpResponse> {
    let req: RunRequest = match parse_body(body) {
        Ok(req) => req,
        Err(e) => return Ok(error_response(400, "invalid_request", &format!("{e:#}"))),
    };

    let overrides = RunOverrides {
        flight: req.flight,
        model: req.model,
        restricted_locations: req.restricted_locations,
    };
    match state.dashboard.run_with(overrides) {
        Ok(view) => json_response(&view),
        Err(e) => Ok(session_error_response(&e, &e.to_string())),
    }
}

/// `POST /api/run/cancel`: cancel the outstanding run, if any.
pub fn post_cancel(state: &AppState) -> Result<HttpResponse> {
    json_response(&CancelResponse {
        cancelled: state.dashboard.cancel(),
    })
}

/// `POST /api/export`: export the current result to a spreadsheet.
pub fn post_export(state: &AppState, body: &str) -> Result<HttpResponse> {
    let req: ExportRequest = match parse_body(body) {
        Ok(req) => req,
        Err(e) => return Ok(error_response(400, "invalid_request", &format!("{e:#}"))),
    };

    let Some(result) = state.dashboard.current_result() else {
        let err = SessionError::NoResult;
        return Ok(session_error_response(&err, &err.to_string()));
    };
    if let ResultView::Failure { message } = build_view(&result, state.dashboard.display()) {
        return Ok(error_response(
            409,
            "no_result",
            &format!("the current run failed and cannot be exported: {message}"),
        ));
    }

    let spreadsheet_id = req
        .spreadsheet_id
        .unwrap_or_else(|| state.export.spreadsheet_id.clone());
    let worksheet = req
        .worksheet_name
        .unwrap_or_else(|| state.export.worksheet_name.clone());

    match state
        .dashboard
        .backend()
        .export_to_sheets(&result, &spreadsheet_id, Some(&worksheet))
    {
        Ok(value) => json_response(&value),
        Err(e) => Ok(session_error_response(
            &SessionError::Client(e.clone()),
            &e.to_string(),
        )),
    }
}

/// `GET /api/export/status`: the export service's own status document.
pub fn get_export_status(state: &AppState) -> Result<HttpResponse> {
    match state.dashboard.backend().sheets_status() {
        Ok(value) => json_response(&value),
        Err(e) => Ok(session_error_response(
            &SessionError::Client(e.clone()),
            &e.to_string(),
        )),
    }
}

/// `GET /api/health`: backend reachability and session state.
pub fn get_health(state: &AppState) -> Result<HttpResponse> {
    let client = state.dashboard.backend();
    json_response(&HealthResponse {
        backend_url: client.endpoints().base_url().to_string(),
        backend_reachable: client.is_healthy(),
        busy: state.dashboard.is_busy(),
        export_configured: !state.export.spreadsheet_id.trim().is_empty(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
