//! Run history reporter: aggregation over the JSONL run log.
//!
//! Provides the numbers behind `loadplan history`:
//! - **Totals**: run count, outcome distribution, fallback share
//! - **Flights**: per-flight run counts and latency
//! - **Daily**: runs per day for the selected window

use std::collections::HashMap;

use serde::Serialize;

use crate::history::logger::{RunLog, RunLogEntry, RunOutcome};
use crate::present::RunMode;

// ---------------------------------------------------------------------------
// Aggregated stats
// ---------------------------------------------------------------------------

/// Summary statistics for `loadplan history`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStats {
    pub total_runs: usize,
    pub outcomes: OutcomeDistribution,
    /// Successful runs the backend served from its fallback path.
    pub fallback_runs: usize,
    /// Mean latency over runs that got an answer (success or domain failure).
    pub avg_latency_ms: Option<f64>,
    pub flights: Vec<FlightStat>,
    pub daily: Vec<DailyEntry>,
}

/// Count of runs per outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutcomeDistribution {
    pub success: usize,
    pub domain_failure: usize,
    pub transport_failure: usize,
    pub cancelled: usize,
}

impl OutcomeDistribution {
    pub fn total(&self) -> usize {
        self.success + self.domain_failure + self.transport_failure + self.cancelled
    }

    /// Percentage for a given count, returns 0.0 if total is zero.
    pub fn pct(&self, count: usize) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            (count as f64 / total as f64) * 100.0
        }
    }
}

/// Per-flight aggregated statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightStat {
    pub flight: String,
    pub runs: usize,
    pub successes: usize,
    pub avg_latency_ms: Option<f64>,
    /// Model used most often for this flight.
    pub primary_model: String,
}

/// Runs on a single day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyEntry {
    pub date: String,
    pub runs: usize,
    pub successes: usize,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Aggregate the log, optionally restricted to the last `days` days.
pub fn compute_stats(log: &RunLog, days: Option<u32>) -> HistoryStats {
    build_stats(&log.read_since_days(days))
}

pub fn build_stats(entries: &[RunLogEntry]) -> HistoryStats {
    let mut outcomes = OutcomeDistribution::default();
    for entry in entries {
        match entry.outcome {
            RunOutcome::Success => outcomes.success += 1,
            RunOutcome::DomainFailure => outcomes.domain_failure += 1,
            RunOutcome::TransportFailure => outcomes.transport_failure += 1,
            RunOutcome::Cancelled => outcomes.cancelled += 1,
        }
    }

    let fallback_runs = entries
        .iter()
        .filter(|e| e.run_mode == Some(RunMode::Fallback))
        .count();

    HistoryStats {
        total_runs: entries.len(),
        outcomes,
        fallback_runs,
        avg_latency_ms: answered_latency(entries.iter()),
        flights: compute_flight_stats(entries),
        daily: compute_daily(entries),
    }
}

/// Mean latency of runs the backend actually answered. Cancelled runs and
/// transport failures measure the client, not the solver.
fn answered_latency<'a>(entries: impl Iterator<Item = &'a RunLogEntry>) -> Option<f64> {
    let latencies: Vec<u64> = entries
        .filter(|e| matches!(e.outcome, RunOutcome::Success | RunOutcome::DomainFailure))
        .map(|e| e.latency_ms)
        .collect();
    if latencies.is_empty() {
        None
    } else {
        Some(latencies.iter().sum::<u64>() as f64 / latencies.len() as f64)
    }
}

/// Group entries by flight, most-run flights first.
fn compute_flight_stats(entries: &[RunLogEntry]) -> Vec<FlightStat> {
    let mut groups: HashMap<&str, Vec<&RunLogEntry>> = HashMap::new();
    for entry in entries {
        groups.entry(entry.flight.as_str()).or_default().push(entry);
    }

    let mut stats: Vec<FlightStat> = groups
        .into_iter()
        .map(|(flight, group)| {
            let mut model_counts: HashMap<&str, usize> = HashMap::new();
            for e in &group {
                *model_counts.entry(&e.model).or_default() += 1;
            }
            let primary_model = model_counts
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
                .map(|(name, _)| name.to_string())
                .unwrap_or_default();

            FlightStat {
                flight: flight.to_string(),
                runs: group.len(),
                successes: group
                    .iter()
                    .filter(|e| e.outcome == RunOutcome::Success)
                    .count(),
                avg_latency_ms: answered_latency(group.iter().copied()),
                primary_model,
            }
        })
        .collect();

    stats.sort_by(|a, b| b.runs.cmp(&a.runs).then_with(|| a.flight.cmp(&b.flight)));
    stats
}

/// Runs per day (`YYYY-MM-DD` prefix of the timestamp), oldest first.
fn compute_daily(entries: &[RunLogEntry]) -> Vec<DailyEntry> {
    let mut daily: HashMap<String, (usize, usize)> = HashMap::new();
    for entry in entries {
        let date = entry.timestamp.get(..10).unwrap_or("unknown").to_string();
        let slot = daily.entry(date).or_default();
        slot.0 += 1;
        if entry.outcome == RunOutcome::Success {
            slot.1 += 1;
        }
    }

    let mut days: Vec<DailyEntry> = daily
        .into_iter()
        .map(|(date, (runs, successes))| DailyEntry {
            date,
            runs,
            successes,
        })
        .collect();
    days.sort_by(|a, b| a.date.cmp(&b.date));
    days
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(
        timestamp: &str,
        flight: &str,
        model: &str,
        outcome: RunOutcome,
        latency_ms: u64,
        run_mode: Option<RunMode>,
    ) -> RunLogEntry {
        RunLogEntry {
            timestamp: timestamp.to_string(),
            flight: flight.to_string(),
            model: model.to_string(),
            outcome,
            latency_ms,
            run_mode,
            error: None,
        }
    }

    fn sample_entries() -> Vec<RunLogEntry> {
        vec![
            entry(
                "2025-01-15T10:00:00+00:00",
                "KL0835",
                "delgado_venezian",
                RunOutcome::Success,
                4000,
                Some(RunMode::Optimizer),
            ),
            entry(
                "2025-01-15T11:00:00+00:00",
                "KL0835",
                "delgado_venezian",
                RunOutcome::Success,
                2000,
                Some(RunMode::Fallback),
            ),
            entry(
                "2025-01-16T09:00:00+00:00",
                "KL0601",
                "baseline",
                RunOutcome::DomainFailure,
                600,
                None,
            ),
            entry(
                "2025-01-16T09:30:00+00:00",
                "KL0835",
                "baseline",
                RunOutcome::TransportFailure,
                30000,
                None,
            ),
            entry(
                "2025-01-16T10:00:00+00:00",
                "KL0601",
                "baseline",
                RunOutcome::Cancelled,
                9000,
                None,
            ),
        ]
    }

    #[test]
    fn test_build_stats_totals() {
        let stats = build_stats(&sample_entries());

        assert_eq!(stats.total_runs, 5);
        assert_eq!(stats.outcomes.success, 2);
        assert_eq!(stats.outcomes.domain_failure, 1);
        assert_eq!(stats.outcomes.transport_failure, 1);
        assert_eq!(stats.outcomes.cancelled, 1);
        assert_eq!(stats.fallback_runs, 1);
        assert_eq!(stats.outcomes.pct(stats.outcomes.success), 40.0);
    }

    #[test]
    fn test_latency_ignores_unanswered_runs() {
        let stats = build_stats(&sample_entries());
        assert_eq!(stats.avg_latency_ms, Some(2200.0));
    }

    #[test]
    fn test_flight_grouping() {
        let stats = build_stats(&sample_entries());

        assert_eq!(stats.flights[0].flight, "KL0835");
        assert_eq!(stats.flights[0].runs, 3);
        assert_eq!(stats.flights[0].successes, 2);
        assert_eq!(stats.flights[0].primary_model, "delgado_venezian");
        assert_eq!(stats.flights[0].avg_latency_ms, Some(3000.0));

        let kl0601 = &stats.flights[1];
        assert_eq!(kl0601.runs, 2);
        assert_eq!(kl0601.avg_latency_ms, Some(600.0));
    }

    #[test]
    fn test_daily_grouping() {
        let stats = build_stats(&sample_entries());
        assert_eq!(stats.daily.len(), 2);
        assert_eq!(stats.daily[0].date, "2025-01-15");
        assert_eq!(stats.daily[0].successes, 2);
        assert_eq!(stats.daily[1].runs, 3);
    }

    #[test]
    fn test_empty_entries() {
        let stats = build_stats(&[]);
        assert_eq!(stats.total_runs, 0);
        assert_eq!(stats.avg_latency_ms, None);
        assert_eq!(stats.outcomes.pct(0), 0.0);
        assert!(stats.flights.is_empty());
    }
}
