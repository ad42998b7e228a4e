use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::ClientError;
use crate::config;
use crate::config::schema::LoggingConfig;
use crate::model::{OptimizationRequest, OptimizationResult};
use crate::present::RunMode;
use crate::present::derive::classify_run_mode;

// ---------------------------------------------------------------------------
// Run log entry (JSONL)
// ---------------------------------------------------------------------------

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    /// The backend answered with `success: false`.
    DomainFailure,
    /// Network error or non-2xx status.
    TransportFailure,
    Cancelled,
}

/// A single entry in the run log (`~/.loadplan/run-log.jsonl`).
///
/// Records run metadata only; the result document itself is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub timestamp: String,
    pub flight: String,
    pub model: String,
    pub outcome: RunOutcome,
    pub latency_ms: u64,
    /// Only set for successful runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_mode: Option<RunMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunLogEntry {
    /// Describe a finished run.
    pub fn for_run(
        request: &OptimizationRequest,
        outcome: &Result<OptimizationResult, ClientError>,
        latency: Duration,
    ) -> Self {
        let (outcome, run_mode, error) = match outcome {
            Ok(result) if result.success => (RunOutcome::Success, Some(classify_run_mode(result)), None),
            Ok(result) => (RunOutcome::DomainFailure, None, result.error_message.clone()),
            Err(ClientError::Cancelled) => (RunOutcome::Cancelled, None, None),
            Err(e) => (RunOutcome::TransportFailure, None, Some(e.to_string())),
        };

        Self {
            timestamp: Utc::now().to_rfc3339(),
            flight: request.flight_path.clone(),
            model: request.model_type.as_str().to_string(),
            outcome,
            latency_ms: u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            run_mode,
            error,
        }
    }
}

// ---------------------------------------------------------------------------
// Run log
// ---------------------------------------------------------------------------

/// Handle on the JSONL run log. A disabled log ignores writes and reads as
/// empty.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    path: Option<PathBuf>,
}

impl RunLog {
    /// The log at `~/.loadplan/run-log.jsonl`, unless logging is disabled.
    pub fn from_config(config: &LoggingConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self {
            path: default_log_path(),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append an entry. Best-effort: failures are silently ignored so that
    /// logging never fails a run.
    pub fn record(&self, entry: &RunLogEntry) {
        let _ = self.append(entry);
    }

    /// Read all entries, skipping malformed lines. Returns an empty vec if the
    /// file does not exist or cannot be read.
    pub fn read_all(&self) -> Vec<RunLogEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<RunLogEntry>(&line).ok())
            .collect()
    }

    /// Entries from the last `days` days, or all entries when `None`.
    pub fn read_since_days(&self, days: Option<u32>) -> Vec<RunLogEntry> {
        let entries = self.read_all();
        let Some(days) = days else {
            return entries;
        };

        let cutoff = (Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();
        entries
            .into_iter()
            .filter(|e| e.timestamp >= cutoff)
            .collect()
    }

    fn append(&self, entry: &RunLogEntry) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }
}

/// Return the path to the run log file.
pub fn default_log_path() -> Option<PathBuf> {
    config::data_dir().map(|dir| dir.join("run-log.jsonl"))
}
