/// Dashboard session tests with an in-memory backend.
///
/// Exercises the session flow the CLI and web dashboard share: loading
/// flights, selecting, running, busy rejection, cancellation, error banners
/// and the run log.
mod common;

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use common::success_document;
use loadplan::api::{CancelToken, ClientError, OptimizationBackend};
use loadplan::config::schema::DisplayConfig;
use loadplan::dashboard::{Dashboard, FLIGHTS_ERROR_PREFIX, RunOverrides, SessionError};
use loadplan::history::{RunLog, RunOutcome};
use loadplan::model::{ModelType, OptimizationRequest, OptimizationResult};
use loadplan::present::ResultView;
use serde_json::json;

/// Backend answering from fixed data and recording every run request.
#[derive(Default)]
struct InMemory {
    flights: Option<Vec<String>>,
    result: Option<serde_json::Value>,
    run_error: Mutex<Option<ClientError>>,
    /// Block each run until cancelled.
    hang: bool,
    runs: Mutex<Vec<OptimizationRequest>>,
}

impl InMemory {
    fn with_flights(flights: &[&str]) -> Self {
        Self {
            flights: Some(flights.iter().map(|f| f.to_string()).collect()),
            result: Some(success_document("KL0835")),
            ..Default::default()
        }
    }
}

impl OptimizationBackend for InMemory {
    fn list_flights(&self) -> Result<Vec<String>, ClientError> {
        self.flights.clone().ok_or(ClientError::Transport {
            url: "http://localhost:8000/api/v1/optimization/flights".to_string(),
            message: "Connection refused".to_string(),
        })
    }

    fn run(
        &self,
        request: &OptimizationRequest,
        cancel: &CancelToken,
    ) -> Result<OptimizationResult, ClientError> {
        self.runs.lock().unwrap().push(request.clone());
        if self.hang {
            while !cancel.is_cancelled() {
                thread::sleep(Duration::from_millis(10));
            }
            return Err(ClientError::Cancelled);
        }
        if let Some(err) = self.run_error.lock().unwrap().clone() {
            return Err(err);
        }
        let doc = self.result.clone().unwrap_or(json!({"success": false}));
        OptimizationResult::from_value(doc).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

fn session(backend: InMemory) -> Dashboard<InMemory> {
    Dashboard::new(backend, DisplayConfig::default())
}

// ---------------------------------------------------------------------------
// Flights
// ---------------------------------------------------------------------------

#[test]
fn loading_flights_selects_the_first() {
    let d = session(InMemory::with_flights(&["Data/KL0835", "Data/KL0836"]));
    let flights = d.load_flights().unwrap();
    assert_eq!(flights.len(), 2);
    assert_eq!(d.snapshot().selected.as_deref(), Some("Data/KL0835"));
}

#[test]
fn reloading_keeps_a_still_listed_selection() {
    let d = session(InMemory::with_flights(&["Data/KL0835", "Data/KL0836"]));
    d.load_flights().unwrap();
    d.select_flight("Data/KL0836").unwrap();
    d.load_flights().unwrap();
    assert_eq!(d.snapshot().selected.as_deref(), Some("Data/KL0836"));
}

#[test]
fn flight_load_failure_sets_prefixed_banner() {
    let d = session(InMemory::default());
    let err = d.load_flights().unwrap_err();
    assert!(matches!(
        err,
        SessionError::Client(ClientError::Transport { .. })
    ));
    let banner = d.error().unwrap();
    assert!(banner.starts_with(FLIGHTS_ERROR_PREFIX));
    assert!(banner.contains("Connection refused"));
}

#[test]
fn unlisted_flight_is_rejected_once_list_is_loaded() {
    let d = session(InMemory::with_flights(&["Data/KL0835"]));
    d.load_flights().unwrap();
    assert_eq!(
        d.select_flight("Data/XX0001"),
        Err(SessionError::UnknownFlight("Data/XX0001".to_string()))
    );
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

#[test]
fn select_and_run_shows_route_and_clears_error() {
    let d = session(InMemory::with_flights(&["Data/KL0835"]));
    d.select_flight("Data/KL0835").unwrap();
    d.set_model(ModelType::OptimizedActual);
    d.set_restricted_locations(vec!["21R".to_string()]);

    *d.backend().run_error.lock().unwrap() = Some(ClientError::Decode("truncated".to_string()));
    assert!(d.run().is_err());
    assert!(d.error().is_some());
    *d.backend().run_error.lock().unwrap() = None;

    let view = d.run().unwrap();
    let ResultView::Success(dashboard) = view else {
        panic!("expected a success view");
    };
    assert_eq!(dashboard.summary.route, "AMS → SIN");
    assert_eq!(dashboard.summary.flight_number, "KL0835");
    assert!(d.error().is_none());
    assert!(!d.is_busy());

    let runs = d.backend().runs.lock().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].flight_path, "Data/KL0835");
    assert_eq!(runs[0].model_type, ModelType::OptimizedActual);
    assert_eq!(runs[0].restricted_locations, ["21R"]);
}

#[test]
fn domain_failure_is_a_result_not_a_banner() {
    let backend = InMemory {
        result: Some(json!({"success": false, "error_message": "Model is infeasible"})),
        ..InMemory::with_flights(&["Data/KL0835"])
    };
    let d = session(backend);
    d.load_flights().unwrap();

    let view = d.run().unwrap();
    assert_eq!(
        view,
        ResultView::Failure {
            message: "Model is infeasible".to_string()
        }
    );
    assert!(d.error().is_none());
    assert!(d.current_result().is_some());
}

#[test]
fn transport_failure_sets_banner_and_drops_stale_result() {
    let d = session(InMemory::with_flights(&["Data/KL0835"]));
    d.load_flights().unwrap();
    d.run().unwrap();
    assert!(d.current_result().is_some());

    *d.backend().run_error.lock().unwrap() = Some(ClientError::Status {
        status: 500,
        detail: "solver crashed".to_string(),
    });
    let err = d.run().unwrap_err();
    assert_eq!(err.to_string(), "solver crashed");
    assert_eq!(d.error().as_deref(), Some("solver crashed"));
    assert!(d.current_result().is_none());
    assert!(d.snapshot().view.is_none());
}

#[test]
fn second_run_while_busy_is_rejected_and_cancel_releases() {
    let backend = InMemory {
        hang: true,
        ..InMemory::with_flights(&["Data/KL0835"])
    };
    let d = Arc::new(session(backend));
    d.load_flights().unwrap();

    let runner = Arc::clone(&d);
    let handle = thread::spawn(move || runner.run());

    while !d.is_busy() {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(d.run(), Err(SessionError::Busy));
    assert!(d.snapshot().busy);

    assert!(d.cancel());
    let outcome = handle.join().unwrap();
    assert_eq!(outcome, Err(SessionError::Client(ClientError::Cancelled)));
    assert!(!d.is_busy());
    assert_eq!(d.backend().runs.lock().unwrap().len(), 1);
}

#[test]
fn overrides_of_a_rejected_run_never_reach_the_outstanding_one() {
    let backend = InMemory {
        hang: true,
        ..InMemory::with_flights(&["Data/KL0835", "Data/KL0836"])
    };
    let d = Arc::new(session(backend));
    d.load_flights().unwrap();

    let runner = Arc::clone(&d);
    let handle = thread::spawn(move || {
        runner.run_with(RunOverrides {
            flight: Some("Data/KL0836".to_string()),
            model: Some(ModelType::Baseline),
            restricted_locations: None,
        })
    });
    while !d.is_busy() {
        thread::sleep(Duration::from_millis(5));
    }

    let second = d.run_with(RunOverrides {
        flight: Some("Data/KL0835".to_string()),
        model: Some(ModelType::OptimizedActual),
        restricted_locations: Some(vec!["21R".to_string()]),
    });
    assert_eq!(second, Err(SessionError::Busy));
    let snapshot = d.snapshot();
    assert_eq!(snapshot.selected.as_deref(), Some("Data/KL0836"));
    assert_eq!(snapshot.model, ModelType::Baseline);
    assert!(snapshot.restricted_locations.is_empty());

    assert!(d.cancel());
    let _ = handle.join().unwrap();
    let runs = d.backend().runs.lock().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].flight_path, "Data/KL0836");
    assert_eq!(runs[0].model_type, ModelType::Baseline);
}

#[test]
fn unknown_flight_override_leaves_the_session_untouched() {
    let d = session(InMemory::with_flights(&["Data/KL0835"]));
    d.load_flights().unwrap();

    let err = d
        .run_with(RunOverrides {
            flight: Some("Data/XX0001".to_string()),
            model: Some(ModelType::Baseline),
            restricted_locations: None,
        })
        .unwrap_err();
    assert_eq!(err, SessionError::UnknownFlight("Data/XX0001".to_string()));
    assert_eq!(d.snapshot().model, ModelType::DelgadoVenezian);
    assert!(!d.is_busy());
    assert!(d.backend().runs.lock().unwrap().is_empty());
}

#[test]
fn snapshot_carries_the_current_view() {
    let d = session(InMemory::with_flights(&["Data/KL0835"]));
    d.load_flights().unwrap();
    assert!(d.snapshot().view.is_none());

    d.run().unwrap();
    let snapshot = d.snapshot();
    assert!(matches!(snapshot.view, Some(ResultView::Success(_))));

    let value = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(value["view"]["kind"], "success");
    assert_eq!(value["model"], "delgado_venezian");
}

// ---------------------------------------------------------------------------
// Run log
// ---------------------------------------------------------------------------

#[test]
fn completed_runs_are_logged() {
    let path = std::env::temp_dir().join(format!(
        "loadplan-dashboard-log-{}.jsonl",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);

    let d = session(InMemory::with_flights(&["Data/KL0835"])).with_run_log(RunLog::at(&path));
    d.load_flights().unwrap();
    d.run().unwrap();

    let entries = RunLog::at(&path).read_all();
    let _ = std::fs::remove_file(&path);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].flight, "Data/KL0835");
    assert_eq!(entries[0].outcome, RunOutcome::Success);
}
