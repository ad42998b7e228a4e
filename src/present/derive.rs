//! Pure derivations over a result document: aggregates, reconstructions and
//! classifications that the backend does not send ready-made.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::Keyed;
use crate::model::result::{OptimizationResult, ReportedRunMode, UldInfo, UldUtilization};

/// Visual emphasis for a metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Neutral,
    Good,
    Warning,
    Bad,
}

/// Whether a successful result came from the real solver or a fallback
/// heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Optimizer,
    Fallback,
    /// Not enough signal either way; shown without a banner.
    Unknown,
}

impl RunMode {
    pub fn label(self) -> &'static str {
        match self {
            RunMode::Optimizer => "Real optimization",
            RunMode::Fallback => "Fallback algorithm",
            RunMode::Unknown => "Unknown",
        }
    }
}

/// Run mode of a result. An explicit `run_mode` from the backend wins over
/// the warning heuristic.
pub fn classify_run_mode(result: &OptimizationResult) -> RunMode {
    match result.run_mode {
        Some(ReportedRunMode::Optimizer) => RunMode::Optimizer,
        Some(ReportedRunMode::Fallback) => RunMode::Fallback,
        None => classify_warnings(&result.warnings),
    }
}

/// Heuristic over free-text warnings. Backends that do not report
/// `run_mode` only signal a fallback through their warning wording.
pub fn classify_warnings(warnings: &[String]) -> RunMode {
    if warnings.is_empty() {
        return RunMode::Optimizer;
    }

    let lowered: Vec<String> = warnings.iter().map(|w| w.to_lowercase()).collect();
    if lowered
        .iter()
        .any(|w| w.contains("fallback") || w.contains("failed"))
    {
        RunMode::Fallback
    } else if lowered.iter().any(|w| w.contains("real-time optimization")) {
        RunMode::Optimizer
    } else {
        RunMode::Unknown
    }
}

// ---------------------------------------------------------------------------
// Commodities
// ---------------------------------------------------------------------------

/// One bar of the weight-by-commodity chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommodityWeight {
    /// Display label, possibly shortened.
    pub label: String,
    pub full_label: String,
    pub weight: f64,
}

/// `(commodity, weight)` pairs for the commodity chart.
///
/// Uses the backend's per-commodity totals when present, otherwise the raw
/// item list. Items without a commodity or a weight are skipped.
pub fn commodity_source(result: &OptimizationResult) -> Vec<(String, f64)> {
    if let Some(metrics) = &result.cargo_metrics
        && !metrics.weight_distribution_by_commodity.is_empty()
    {
        return metrics
            .weight_distribution_by_commodity
            .iter()
            .map(|(name, weight)| (name.to_string(), *weight))
            .collect();
    }

    result
        .cargo_items
        .iter()
        .filter_map(|item| Some((item.commodity.clone()?, item.weight?)))
        .collect()
}

/// Sum weights per commodity and keep the `limit` heaviest.
///
/// Ties keep the order in which the commodity was first seen.
pub fn top_commodities(
    entries: impl IntoIterator<Item = (String, f64)>,
    limit: usize,
    label_max_chars: usize,
) -> Vec<CommodityWeight> {
    let mut grouped: Keyed<f64> = Keyed::new();
    for (name, weight) in entries {
        let sum = grouped.get(&name).copied().unwrap_or(0.0) + weight;
        grouped.insert(name, sum);
    }

    let mut sorted: Vec<(&str, f64)> = grouped.iter().map(|(k, v)| (k, *v)).collect();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    sorted
        .into_iter()
        .take(limit)
        .map(|(name, weight)| CommodityWeight {
            label: truncate_label(name, label_max_chars),
            full_label: name.to_string(),
            weight,
        })
        .collect()
}

/// Shorten a label to `max_chars` characters followed by `...`.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let head: String = label.chars().take(max_chars).collect();
    format!("{head}...")
}

// ---------------------------------------------------------------------------
// ULDs
// ---------------------------------------------------------------------------

/// One row of the items-per-ULD chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UldItemRow {
    /// Key as sent by the backend.
    pub key: String,
    pub label: String,
    pub items: u64,
    pub weight: Option<f64>,
}

/// One bar of the weight-per-ULD chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UldWeightRow {
    pub label: String,
    pub weight: f64,
}

/// Cross-reference `items_per_uld` with the ULD list.
///
/// Keys are positions in `ulds`. Rows are ordered by index with
/// non-numeric keys last; empty ULDs are dropped and at most `limit` rows
/// are returned.
pub fn uld_item_rows(
    utilization: &UldUtilization,
    ulds: &[UldInfo],
    limit: usize,
    label_chars: usize,
) -> Vec<UldItemRow> {
    let mut keyed: Vec<(Option<usize>, usize, &str, u64)> = utilization
        .items_per_uld
        .iter()
        .enumerate()
        .filter(|(_, (_, items))| **items > 0)
        .map(|(pos, (key, items))| (key.trim().parse().ok(), pos, key, *items))
        .collect();
    keyed.sort_by_key(|(index, pos, _, _)| (index.is_none(), *index, *pos));

    keyed
        .into_iter()
        .take(limit)
        .map(|(index, _, key, items)| {
            let uld = index.and_then(|i| ulds.get(i));
            UldItemRow {
                key: key.to_string(),
                label: uld_label(key, uld, label_chars),
                items,
                weight: utilization
                    .weight_per_uld
                    .get(key)
                    .copied()
                    .or_else(|| uld.and_then(|u| u.weight)),
            }
        })
        .collect()
}

/// One bar per ULD for the first `limit` entries of `ulds`.
///
/// A ULD without its own weight falls back to `weight_per_uld` at its
/// position; ULDs with neither are skipped rather than drawn as zero.
pub fn uld_weight_rows(
    utilization: &UldUtilization,
    ulds: &[UldInfo],
    limit: usize,
    label_chars: usize,
) -> Vec<UldWeightRow> {
    ulds.iter()
        .take(limit)
        .enumerate()
        .filter_map(|(i, uld)| {
            let key = i.to_string();
            let weight = uld
                .weight
                .or_else(|| utilization.weight_per_uld.get(&key).copied())?;
            Some(UldWeightRow {
                label: uld_label(&key, Some(uld), label_chars),
                weight,
            })
        })
        .collect()
}

fn uld_label(key: &str, uld: Option<&UldInfo>, label_chars: usize) -> String {
    match uld {
        Some(u) if !u.serialnumber.is_empty() => u.serialnumber.chars().take(label_chars).collect(),
        _ => format!("ULD {key}"),
    }
}

// ---------------------------------------------------------------------------
// Shares
// ---------------------------------------------------------------------------

/// A labelled value with its share of the group total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub label: String,
    pub value: f64,
    /// `None` when the group total is zero.
    pub percent: Option<f64>,
}

pub fn weight_shares(map: &Keyed<f64>) -> Vec<Share> {
    shares(map.iter().map(|(k, v)| (k, *v)).collect())
}

pub fn count_shares(map: &Keyed<u64>) -> Vec<Share> {
    shares(map.iter().map(|(k, v)| (k, *v as f64)).collect())
}

fn shares(entries: Vec<(&str, f64)>) -> Vec<Share> {
    let total: f64 = entries.iter().map(|(_, v)| v).sum();
    entries
        .into_iter()
        .map(|(label, value)| Share {
            label: label.to_string(),
            value,
            percent: (total > 0.0).then(|| value / total * 100.0),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Baseline, delta and reconstructed optimized value for one key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub key: String,
    pub baseline: Option<f64>,
    pub difference: Option<f64>,
    /// `baseline + difference`; `None` unless both are known.
    pub optimized: Option<f64>,
}

impl ComparisonRow {
    pub fn new(key: impl Into<String>, baseline: Option<f64>, difference: Option<f64>) -> Self {
        Self {
            key: key.into(),
            baseline,
            difference,
            optimized: baseline.zip(difference).map(|(b, d)| b + d),
        }
    }
}

/// Rebuild optimized per-key values from baseline values and
/// `optimized - baseline` deltas.
///
/// Covers the union of keys, baseline keys first. Returns nothing when the
/// baseline map is empty.
pub fn reconstruct_rows(baseline: &Keyed<f64>, differences: &Keyed<f64>) -> Vec<ComparisonRow> {
    if baseline.is_empty() {
        return Vec::new();
    }

    let mut rows: Vec<ComparisonRow> = baseline
        .iter()
        .map(|(key, value)| ComparisonRow::new(key, Some(*value), differences.get(key).copied()))
        .collect();
    rows.extend(
        differences
            .iter()
            .filter(|(key, _)| !baseline.contains_key(key))
            .map(|(key, diff)| ComparisonRow::new(key, None, Some(*diff))),
    );
    rows
}

/// Sum of per-compartment deltas, or `None` when there are none.
pub fn difference_total(differences: &Keyed<f64>) -> Option<f64> {
    (!differences.is_empty()).then(|| differences.total())
}

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

pub fn safety_score_tone(score: f64) -> Tone {
    if score >= 0.9 {
        Tone::Good
    } else if score >= 0.7 {
        Tone::Warning
    } else {
        Tone::Bad
    }
}

pub fn solver_status_tone(status: &str) -> Tone {
    let status = status.to_lowercase();
    // "infeasible" contains "feasible"
    if status.contains("infeasible") || status.contains("error") {
        Tone::Bad
    } else if status.contains("optimal") {
        Tone::Good
    } else if status.contains("feasible") {
        Tone::Warning
    } else {
        Tone::Neutral
    }
}

/// Savings are good when positive and bad when negative.
pub fn savings_tone(value: Option<f64>) -> Tone {
    match value {
        Some(v) if v > 0.0 => Tone::Good,
        Some(v) if v < 0.0 => Tone::Bad,
        _ => Tone::Neutral,
    }
}
