//! Embedded web dashboard for loadplan.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard: flight selector, run controls, result sections
//! - JSON API endpoints that drive one shared dashboard session
//!
//! Launched via `loadplan web` (default: `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::io::{Cursor, Read};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::api::OptimizationClient;
use crate::config::schema::{ExportConfig, LoadplanConfig};
use crate::dashboard::Dashboard;
use crate::history::RunLog;

pub type HttpResponse = Response<Cursor<Vec<u8>>>;

/// Everything a request handler can reach.
pub struct AppState {
    pub dashboard: Dashboard<OptimizationClient>,
    pub export: ExportConfig,
}

impl AppState {
    pub fn from_config(cfg: &LoadplanConfig) -> Self {
        let client = OptimizationClient::from_config(&cfg.backend);
        let dashboard = Dashboard::new(client, cfg.display.clone())
            .with_run_log(RunLog::from_config(&cfg.logging))
            .with_run_defaults(cfg.run.model, cfg.run.restricted_locations.clone());
        Self {
            dashboard,
            export: cfg.export.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server on the given address.
///
/// Blocks the current thread. Each request is handled on its own thread so
/// that a cancel or a session poll is answered while a run is outstanding.
/// Errors are handled per-request without crashing the server.
pub fn serve(addr: &str, cfg: &LoadplanConfig) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("loadplan dashboard running at http://{addr}");
    println!("Backend: {}", cfg.backend.base_url);
    println!("Press Ctrl+C to stop.\n");

    if cfg.web.open_browser {
        let _ = open_browser(&format!("http://{addr}"));
    }

    let state = Arc::new(AppState::from_config(cfg));
    // Best-effort: the page reloads the list itself if this fails.
    let _ = state.dashboard.load_flights();

    for request in server.incoming_requests() {
        let state = Arc::clone(&state);
        thread::spawn(move || handle(&state, request));
    }

    Ok(())
}

fn handle(state: &AppState, mut request: Request) {
    let method = request.method().clone();
    let url = request.url().to_string();

    // Read body up-front for methods that carry one
    let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
        let mut buf = String::new();
        let _ = request.as_reader().read_to_string(&mut buf);
        Some(buf)
    } else {
        None
    };

    let resp = match dispatch(state, &method, &url, body.as_deref()) {
        Ok(resp) => resp,
        Err(e) => api::error_response(500, "internal", &format!("{e:#}")),
    };
    let status = resp.status_code().0;
    let _ = request.respond(resp);

    // Brief access log
    println!(
        "{} {} {} {}",
        method,
        url,
        status,
        chrono::Local::now().format("%H:%M:%S")
    );
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
pub fn dispatch(
    state: &AppState,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<HttpResponse> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

        // API: Session
        (&Method::Get, "/api/flights") => api::get_flights(state),
        (&Method::Get, "/api/session") => api::get_session(state),
        (&Method::Post, "/api/run") => api::post_run(state, body.unwrap_or("")),
        (&Method::Post, "/api/run/cancel") => api::post_cancel(state),

        // API: Export
        (&Method::Post, "/api/export") => api::post_export(state, body.unwrap_or("")),
        (&Method::Get, "/api/export/status") => api::get_export_status(state),

        // API: Health
        (&Method::Get, "/api/health") => api::get_health(state),

        // 404
        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Serve the embedded single-page frontend.
fn serve_frontend() -> HttpResponse {
    let html = frontend::INDEX_HTML;
    let mut resp = Response::from_data(html.as_bytes().to_vec()).with_status_code(StatusCode(200));
    if let Some(header) = content_type("text/html; charset=utf-8") {
        resp = resp.with_header(header);
    }
    resp
}

/// 404 response.
fn not_found() -> HttpResponse {
    api::error_response(404, "not_found", "not found")
}

/// `Content-Type` header.
pub(crate) fn content_type(value: &str) -> Option<Header> {
    Header::from_bytes("Content-Type", value).ok()
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
