/// Web dashboard routing tests.
///
/// Drives `web::dispatch` directly against a scripted backend, so no
/// dashboard server is bound.
mod common;

use common::{FakeBackend, Reply, success_document, unreachable_base_url};
use loadplan::config::schema::LoadplanConfig;
use loadplan::dashboard::FLIGHTS_ERROR_PREFIX;
use loadplan::web::{AppState, dispatch};
use serde_json::json;
use tiny_http::Method;

fn status(state: &AppState, method: Method, url: &str, body: Option<&str>) -> u16 {
    dispatch(state, &method, url, body).unwrap().status_code().0
}

#[test]
fn serves_the_frontend_and_404s_unknown_paths() {
    let state = AppState::from_config(&offline_config());
    assert_eq!(status(&state, Method::Get, "/", None), 200);
    assert_eq!(status(&state, Method::Get, "/index.html?v=2", None), 200);
    assert_eq!(status(&state, Method::Get, "/api/unknown", None), 404);
    assert_eq!(status(&state, Method::Delete, "/api/run", None), 404);
}

#[test]
fn flights_endpoint_loads_the_session_list() {
    let backend = FakeBackend::start(vec![Reply::json(
        200,
        json!(["Data/KL0835", "Data/KL0836"]),
    )]);
    let state = AppState::from_config(&backend.config());

    assert_eq!(status(&state, Method::Get, "/api/flights", None), 200);
    let snapshot = state.dashboard.snapshot();
    assert_eq!(snapshot.flights, ["Data/KL0835", "Data/KL0836"]);
    assert_eq!(snapshot.selected.as_deref(), Some("Data/KL0835"));
}

#[test]
fn unreachable_backend_gives_bad_gateway_and_banner() {
    let state = AppState::from_config(&offline_config());
    assert_eq!(status(&state, Method::Get, "/api/flights", None), 502);
    let banner = state.dashboard.error().unwrap();
    assert!(banner.starts_with(FLIGHTS_ERROR_PREFIX));
}

#[test]
fn run_applies_body_and_stores_the_view() {
    let backend = FakeBackend::start(vec![
        Reply::json(200, json!(["Data/KL0835"])),
        Reply::json(200, success_document("KL0835")),
    ]);
    let state = AppState::from_config(&backend.config());
    assert_eq!(status(&state, Method::Get, "/api/flights", None), 200);
    backend.next_request();

    let body = r#"{"flight": "Data/KL0835", "model": "baseline", "restricted_locations": ["11P"]}"#;
    assert_eq!(status(&state, Method::Post, "/api/run", Some(body)), 200);

    let sent = backend.next_request().json();
    assert_eq!(sent["flight_path"], "Data/KL0835");
    assert_eq!(sent["model_type"], "baseline");
    assert_eq!(sent["restricted_locations"], json!(["11P"]));
    assert!(state.dashboard.snapshot().view.is_some());
    assert!(!state.dashboard.is_busy());
}

#[test]
fn run_rejects_bad_input() {
    let backend = FakeBackend::start(vec![Reply::json(200, json!(["Data/KL0835"]))]);
    let state = AppState::from_config(&backend.config());
    assert_eq!(status(&state, Method::Get, "/api/flights", None), 200);

    assert_eq!(
        status(&state, Method::Post, "/api/run", Some("{not json")),
        400
    );
    assert_eq!(
        status(
            &state,
            Method::Post,
            "/api/run",
            Some(r#"{"flight": "Data/XX0001"}"#)
        ),
        400
    );
}

#[test]
fn export_without_result_is_a_conflict() {
    let state = AppState::from_config(&offline_config());
    assert_eq!(status(&state, Method::Post, "/api/export", Some("")), 409);
}

#[test]
fn cancel_and_health_answer_without_a_run() {
    let state = AppState::from_config(&offline_config());
    assert_eq!(status(&state, Method::Post, "/api/run/cancel", None), 200);
    assert_eq!(status(&state, Method::Get, "/api/health", None), 200);
    assert_eq!(status(&state, Method::Get, "/api/session", None), 200);
}

fn offline_config() -> LoadplanConfig {
    let mut cfg = LoadplanConfig::default();
    cfg.backend.base_url = unreachable_base_url();
    cfg.backend.timeout_ms = 2_000;
    cfg.backend.health_timeout_ms = 500;
    cfg.logging.enabled = false;
    cfg
}
