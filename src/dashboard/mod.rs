//! Dashboard session: the transient state behind both front ends.
//!
//! Holds the flight list, the selected flight and model, the busy flag, the
//! current result and the error banner. At most one run is in flight; the
//! state lock is never held across a backend call, so other readers (the web
//! dashboard's polling, a cancel request) are never blocked by a slow run.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde::Serialize;

use crate::api::{CancelToken, ClientError, OptimizationBackend};
use crate::config::schema::DisplayConfig;
use crate::history::{RunLog, RunLogEntry};
use crate::model::{ModelType, OptimizationRequest, OptimizationResult};
use crate::present::{ResultView, build_view};

/// Prefix of the error banner when the flight list cannot be loaded.
pub const FLIGHTS_ERROR_PREFIX: &str = "Failed to load flights: ";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("an optimization run is already in progress")]
    Busy,
    #[error("no flight selected")]
    NoFlightSelected,
    #[error("unknown flight: {0}")]
    UnknownFlight(String),
    #[error("no optimization result to export")]
    NoResult,
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Default)]
struct SessionState {
    flights: Vec<String>,
    selected: Option<String>,
    model: ModelType,
    restricted_locations: Vec<String>,
    busy: bool,
    error: Option<String>,
    result: Option<OptimizationResult>,
    cancel: Option<CancelToken>,
}

impl SessionState {
    /// Once a flight list is loaded, only listed flights are accepted.
    fn select(&mut self, flight: &str) -> Result<(), SessionError> {
        let flight = flight.trim();
        if flight.is_empty() {
            return Err(SessionError::NoFlightSelected);
        }
        if !self.flights.is_empty() && !self.flights.iter().any(|f| f == flight) {
            return Err(SessionError::UnknownFlight(flight.to_string()));
        }
        self.selected = Some(flight.to_string());
        Ok(())
    }
}

/// Per-run changes to the session; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOverrides {
    pub flight: Option<String>,
    pub model: Option<ModelType>,
    pub restricted_locations: Option<Vec<String>>,
}

/// Read-only copy of the session, as served to the web dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub flights: Vec<String>,
    pub selected: Option<String>,
    pub model: ModelType,
    pub restricted_locations: Vec<String>,
    pub busy: bool,
    pub error: Option<String>,
    pub view: Option<ResultView>,
}

/// A run that has been started but not yet completed.
#[derive(Debug)]
pub struct PendingRun {
    request: OptimizationRequest,
    cancel: CancelToken,
    started: Instant,
}

impl PendingRun {
    pub fn request(&self) -> &OptimizationRequest {
        &self.request
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

pub struct Dashboard<B> {
    backend: B,
    display: DisplayConfig,
    run_log: RunLog,
    state: Mutex<SessionState>,
}

impl<B: OptimizationBackend> Dashboard<B> {
    pub fn new(backend: B, display: DisplayConfig) -> Self {
        Self {
            backend,
            display,
            run_log: RunLog::disabled(),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn with_run_log(mut self, run_log: RunLog) -> Self {
        self.run_log = run_log;
        self
    }

    /// Initial model and restricted locations for new runs.
    pub fn with_run_defaults(self, model: ModelType, restricted_locations: Vec<String>) -> Self {
        {
            let mut state = self.state();
            state.model = model;
            state.restricted_locations = restricted_locations;
        }
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the flight list. Keeps the current selection if it is still
    /// listed, otherwise selects the first flight.
    pub fn load_flights(&self) -> Result<Vec<String>, SessionError> {
        let fetched = self.backend.list_flights();

        let mut state = self.state();
        match fetched {
            Ok(flights) => {
                let keep = state
                    .selected
                    .as_ref()
                    .is_some_and(|s| flights.contains(s));
                if !keep {
                    state.selected = flights.first().cloned();
                }
                state.flights = flights.clone();
                state.error = None;
                Ok(flights)
            }
            Err(e) => {
                state.error = Some(format!("{FLIGHTS_ERROR_PREFIX}{e}"));
                Err(e.into())
            }
        }
    }

    /// Select the flight for the next run. Once a flight list is loaded, only
    /// listed flights are accepted.
    pub fn select_flight(&self, flight: &str) -> Result<(), SessionError> {
        self.state().select(flight)
    }

    pub fn set_model(&self, model: ModelType) {
        self.state().model = model;
    }

    pub fn set_restricted_locations(&self, locations: Vec<String>) {
        self.state().restricted_locations = locations;
    }

    /// Mark the session busy and build the request for the selected flight.
    ///
    /// Clears the error banner and the previous result so nothing stale is
    /// shown while the run is outstanding.
    pub fn start_run(&self) -> Result<PendingRun, SessionError> {
        self.start_run_with(RunOverrides::default())
    }

    /// Like [`Dashboard::start_run`], applying `overrides` to the session
    /// first. Validation, the overrides and the busy flag all happen under one
    /// lock, so a concurrent caller can never swap the flight or model of a
    /// run between its selection and its start. Nothing is applied when the
    /// session is busy or the flight is rejected.
    pub fn start_run_with(&self, overrides: RunOverrides) -> Result<PendingRun, SessionError> {
        let mut state = self.state();
        if state.busy {
            return Err(SessionError::Busy);
        }
        if let Some(flight) = &overrides.flight {
            state.select(flight)?;
        }
        if let Some(model) = overrides.model {
            state.model = model;
        }
        if let Some(locations) = overrides.restricted_locations {
            state.restricted_locations = locations;
        }
        let Some(flight) = state.selected.clone() else {
            return Err(SessionError::NoFlightSelected);
        };

        let cancel = CancelToken::new();
        state.busy = true;
        state.error = None;
        state.result = None;
        state.cancel = Some(cancel.clone());

        Ok(PendingRun {
            request: OptimizationRequest::new(flight, state.model)
                .with_restricted_locations(state.restricted_locations.clone()),
            cancel,
            started: Instant::now(),
        })
    }

    /// Record the outcome of a started run and clear the busy flag.
    ///
    /// A `success: false` document is a result, not an error: it is stored
    /// and returned as a failure view. Transport errors set the error banner.
    pub fn complete_run(
        &self,
        pending: PendingRun,
        outcome: Result<OptimizationResult, ClientError>,
    ) -> Result<ResultView, SessionError> {
        self.run_log.record(&RunLogEntry::for_run(
            &pending.request,
            &outcome,
            pending.started.elapsed(),
        ));

        let mut state = self.state();
        state.busy = false;
        state.cancel = None;
        match outcome {
            Ok(result) => {
                let view = build_view(&result, &self.display);
                state.result = Some(result);
                Ok(view)
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Run an optimization for the selected flight and wait for it.
    pub fn run(&self) -> Result<ResultView, SessionError> {
        self.run_with(RunOverrides::default())
    }

    /// Apply `overrides` and run, atomically with respect to other runs.
    pub fn run_with(&self, overrides: RunOverrides) -> Result<ResultView, SessionError> {
        let pending = self.start_run_with(overrides)?;
        let outcome = self.backend.run(&pending.request, &pending.cancel);
        self.complete_run(pending, outcome)
    }

    /// Cancel the outstanding run. Returns `false` when nothing is running.
    pub fn cancel(&self) -> bool {
        match &self.state().cancel {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state().busy
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn current_result(&self) -> Option<OptimizationResult> {
        self.state().result.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            flights: state.flights.clone(),
            selected: state.selected.clone(),
            model: state.model,
            restricted_locations: state.restricted_locations.clone(),
            busy: state.busy,
            error: state.error.clone(),
            view: state.result.as_ref().map(|r| build_view(r, &self.display)),
        }
    }
}
