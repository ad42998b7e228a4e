//! Result presenter: turns an [`OptimizationResult`] into display-ready
//! sections.
//!
//! [`build_view`] is pure. A failed run yields only a failure view; a
//! successful run yields a [`DashboardView`] whose optional sections are
//! `None` (or empty) whenever the backend did not send the data behind them.
//! The terminal renderer and the web dashboard both consume this view.

pub mod derive;
pub mod format;
pub mod render;

use serde::Serialize;

use crate::config::schema::DisplayConfig;
use crate::model::OptimizationResult;
use crate::model::result::{
    AnnualImpact, CargoMetrics, ComparisonMetrics, OptimizationMetrics, PerformanceMetrics,
    SafetyMetrics,
};

pub use derive::{
    ComparisonRow, CommodityWeight, RunMode, Share, Tone, UldItemRow, UldWeightRow,
};
use format::*;

/// Message shown when a failed result carries no `error_message`.
pub const GENERIC_FAILURE: &str = "Optimization failed without an error message";

/// What to show for one result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultView {
    Failure { message: String },
    Success(Box<DashboardView>),
}

/// A single formatted metric card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
    pub tone: Tone,
}

impl Metric {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            tone: Tone::Neutral,
        }
    }

    fn toned(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub summary: FlightSummary,
    pub performance: Option<MetricSection>,
    pub solver: Option<MetricSection>,
    pub weight: WeightSection,
    pub uld: UldSection,
    pub cargo: Option<CargoSection>,
    pub safety: Option<SafetySection>,
    pub comparison: Option<ComparisonSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightSummary {
    pub flight_number: String,
    pub route: String,
    pub date: String,
    pub aircraft: Option<String>,
    pub run_mode: RunMode,
    pub metrics: Vec<Metric>,
    pub warnings: Vec<String>,
}

/// A titled grid of metric cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSection {
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightSection {
    pub metrics: Vec<Metric>,
    pub by_compartment: Vec<Share>,
    pub by_side: Vec<Share>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UldSection {
    pub metrics: Vec<Metric>,
    pub by_type: Vec<Share>,
    pub items_per_uld: Vec<UldItemRow>,
    pub weight_per_uld: Vec<UldWeightRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CargoSection {
    pub metrics: Vec<Metric>,
    pub weight_ranges: Vec<Share>,
    pub top_commodities: Vec<CommodityWeight>,
    pub largest_items: Vec<LargestItemRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LargestItemRow {
    pub serialnumber: String,
    pub weight: String,
    pub commodity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetySection {
    pub score: Option<Metric>,
    pub checks: Vec<ComplianceCheck>,
    pub alerts: Vec<Metric>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceCheck {
    pub group: String,
    pub label: String,
    pub compliant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSection {
    /// `false` when the backend had no record of the actual loading.
    pub baseline_available: bool,
    pub savings: Vec<Metric>,
    pub key_metrics: Vec<ComparisonRow>,
    pub by_compartment: Vec<ComparisonRow>,
    pub by_side: Vec<ComparisonRow>,
    pub annual: Option<AnnualSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualSection {
    pub flights_per_year: Option<u64>,
    pub fuel_price_per_kg: Option<f64>,
    pub metrics: Vec<Metric>,
    /// Set when the optimized loading burns more fuel than the baseline.
    pub negative: bool,
}

/// Build the view for a result.
pub fn build_view(result: &OptimizationResult, display: &DisplayConfig) -> ResultView {
    if !result.success {
        let message = result
            .error_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(GENERIC_FAILURE)
            .to_string();
        return ResultView::Failure { message };
    }

    ResultView::Success(Box::new(DashboardView {
        summary: flight_summary(result),
        performance: result.performance_metrics.as_ref().and_then(performance_section),
        solver: result.optimization_metrics.as_ref().and_then(solver_section),
        weight: weight_section(result),
        uld: uld_section(result, display),
        cargo: cargo_section(result, display),
        safety: result.safety_metrics.as_ref().and_then(safety_section),
        comparison: result.comparison_metrics.as_ref().and_then(comparison_section),
    }))
}

fn non_empty(metrics: Vec<Metric>) -> Option<MetricSection> {
    (!metrics.is_empty()).then_some(MetricSection { metrics })
}

/// Push a metric only when the backend sent the value.
fn push_some<T>(
    metrics: &mut Vec<Metric>,
    label: &str,
    value: Option<T>,
    fmt: impl Fn(Option<T>) -> String,
) {
    if value.is_some() {
        metrics.push(Metric::new(label, fmt(value)));
    }
}

fn flight_summary(result: &OptimizationResult) -> FlightSummary {
    let info = &result.flight_info;
    let wd = &result.weight_distribution;
    let fuel = result.fuel_savings_kg.or_else(|| {
        result
            .performance_metrics
            .as_ref()
            .and_then(|p| p.fuel_savings_kg)
    });
    let runtime = result.runtime_seconds.or_else(|| {
        result
            .optimization_metrics
            .as_ref()
            .and_then(|o| o.runtime_seconds)
    });

    let metrics = vec![
        Metric::new("Total Weight", format_weight(Some(wd.total_weight))),
        Metric::new("ZFW", format_weight(Some(wd.zfw))),
        Metric::new("MAC ZFW", format_percent(Some(wd.mac_zfw), 2)),
        Metric::new("Fuel Savings", format_signed_weight(fuel)).toned(derive::savings_tone(fuel)),
        Metric::new("Runtime", format_runtime(runtime)),
    ];

    FlightSummary {
        flight_number: info.flight_number.clone(),
        route: info.route(),
        date: info.date.clone(),
        aircraft: info.aircraft_type.clone(),
        run_mode: derive::classify_run_mode(result),
        metrics,
        warnings: result.warnings.clone(),
    }
}

fn performance_section(p: &PerformanceMetrics) -> Option<MetricSection> {
    let mut metrics = Vec::new();
    if p.fuel_savings_kg.is_some() {
        metrics.push(
            Metric::new("Fuel Savings", format_signed_weight(p.fuel_savings_kg))
                .toned(derive::savings_tone(p.fuel_savings_kg)),
        );
    }
    push_some(&mut metrics, "Fuel Savings %", p.fuel_savings_percent, |v| {
        format_signed_percent(v, 2)
    });
    if p.cost_savings_usd.is_some() {
        metrics.push(
            Metric::new("Cost Savings", format_currency(p.cost_savings_usd))
                .toned(derive::savings_tone(p.cost_savings_usd)),
        );
    }
    push_some(&mut metrics, "CO2 Saved", p.co2_emissions_saved_kg, format_weight);
    push_some(&mut metrics, "Baseline Fuel", p.baseline_fuel_kg, format_weight);
    push_some(&mut metrics, "Optimized Fuel", p.optimized_fuel_kg, format_weight);
    push_some(&mut metrics, "Fuel Consumption", p.fuel_consumption_liters, |v| {
        v.map_or_else(|| NA.to_string(), |l| format!("{l:.1} L"))
    });
    push_some(&mut metrics, "Load Factor", p.load_factor, format_ratio);
    push_some(&mut metrics, "Efficiency Score", p.efficiency_score, |v| {
        format_decimal(v, 2)
    });
    non_empty(metrics)
}

fn solver_section(o: &OptimizationMetrics) -> Option<MetricSection> {
    let mut metrics = Vec::new();
    if let Some(status) = &o.solver_status {
        metrics.push(Metric::new("Solver Status", status.clone()).toned(derive::solver_status_tone(status)));
    }
    push_some(&mut metrics, "Runtime", o.runtime_seconds, format_runtime);
    push_some(&mut metrics, "Objective Value", o.objective_value, |v| {
        format_decimal(v, 2)
    });
    push_some(&mut metrics, "Gap", o.gap_percent, |v| format_percent(v, 2));
    push_some(&mut metrics, "Variables", o.number_of_variables, format_count);
    push_some(&mut metrics, "Constraints", o.number_of_constraints, format_count);
    push_some(&mut metrics, "Iterations", o.number_of_iterations, format_count);
    push_some(&mut metrics, "Nodes", o.number_of_nodes, format_count);
    non_empty(metrics)
}

fn weight_section(result: &OptimizationResult) -> WeightSection {
    let wd = &result.weight_distribution;
    let mut metrics = vec![
        Metric::new("Total Weight", format_weight(Some(wd.total_weight))),
        Metric::new("ZFW", format_weight(Some(wd.zfw))),
        Metric::new("MAC ZFW", format_percent(Some(wd.mac_zfw), 2)),
    ];
    push_some(&mut metrics, "Balance Ratio", wd.balance_ratio, |v| {
        format_decimal(v, 3)
    });
    push_some(&mut metrics, "Weight Variance", wd.weight_variance, |v| {
        format_decimal(v, 1)
    });
    push_some(&mut metrics, "CG X", wd.center_of_gravity_x, |v| {
        format_decimal(v, 2)
    });
    push_some(&mut metrics, "CG Y", wd.center_of_gravity_y, |v| {
        format_decimal(v, 2)
    });

    WeightSection {
        metrics,
        by_compartment: derive::weight_shares(&wd.by_compartment),
        by_side: derive::weight_shares(&wd.by_side),
    }
}

fn uld_section(result: &OptimizationResult, display: &DisplayConfig) -> UldSection {
    let util = &result.uld_utilization;
    let mut metrics = vec![
        Metric::new("Total ULDs", format_count(util.total_ulds)),
        Metric::new("Utilization Rate", format_ratio(Some(util.utilization_rate))),
    ];
    for (side, count) in util.ulds_by_side.iter() {
        metrics.push(Metric::new(format!("{side} Side ULDs"), format_number(*count)));
    }
    push_some(&mut metrics, "Empty ULDs", util.empty_ulds, format_count);
    push_some(&mut metrics, "Average ULD Weight", util.average_uld_weight, format_weight);
    push_some(&mut metrics, "Max ULD Weight", util.max_uld_weight, format_weight);
    push_some(&mut metrics, "Average Items per ULD", util.average_items_per_uld, |v| {
        format_decimal(v, 1)
    });
    push_some(&mut metrics, "ULL Efficiency", util.ull_efficiency_score, |v| {
        format_decimal(v, 2)
    });

    UldSection {
        metrics,
        by_type: derive::count_shares(&util.ulds_by_type),
        items_per_uld: derive::uld_item_rows(
            util,
            &result.ulds,
            display.uld_chart_limit,
            display.uld_label_chars,
        ),
        weight_per_uld: derive::uld_weight_rows(
            util,
            &result.ulds,
            display.uld_chart_limit,
            display.uld_label_chars,
        ),
    }
}

fn cargo_section(result: &OptimizationResult, display: &DisplayConfig) -> Option<CargoSection> {
    let top_commodities = derive::top_commodities(
        derive::commodity_source(result),
        display.top_commodities,
        display.label_max_chars,
    );
    let empty = CargoMetrics::default();
    let metrics_src = result.cargo_metrics.as_ref();
    let m = metrics_src.unwrap_or(&empty);

    let mut metrics = Vec::new();
    push_some(&mut metrics, "Total Items", m.total_items, format_count);
    push_some(&mut metrics, "Average Item Weight", m.average_item_weight, format_weight);
    push_some(&mut metrics, "Max Item Weight", m.max_item_weight, format_weight);
    push_some(&mut metrics, "Min Item Weight", m.min_item_weight, format_weight);
    push_some(&mut metrics, "Items Without ULD", m.items_without_uld, format_count);
    push_some(&mut metrics, "CRT Items", m.total_crt_items, format_count);
    push_some(&mut metrics, "COL Items", m.total_col_items, format_count);
    push_some(&mut metrics, "Dangerous Goods", m.total_dangerous_items, format_count);
    push_some(&mut metrics, "Total Volume", m.total_volume, |v| {
        v.map_or_else(|| NA.to_string(), |vol| format!("{vol:.2} m³"))
    });

    let largest_items: Vec<LargestItemRow> = m
        .largest_items
        .iter()
        .map(|item| LargestItemRow {
            serialnumber: item.serialnumber.clone(),
            weight: format_weight(item.weight),
            commodity: item.commodity.clone().unwrap_or_else(|| NA.to_string()),
        })
        .collect();

    let section = CargoSection {
        metrics,
        weight_ranges: derive::count_shares(&m.items_by_weight_range),
        top_commodities,
        largest_items,
    };
    let has_content = !section.metrics.is_empty()
        || !section.weight_ranges.is_empty()
        || !section.top_commodities.is_empty()
        || !section.largest_items.is_empty();
    has_content.then_some(section)
}

fn safety_section(s: &SafetyMetrics) -> Option<SafetySection> {
    let score = s.safety_score.map(|score| {
        Metric::new("Safety Score", format_ratio(Some(score))).toned(derive::safety_score_tone(score))
    });

    let mut checks: Vec<ComplianceCheck> = Vec::new();
    let groups = [
        ("Weight Limits", &s.weight_limits_compliance),
        ("Balance Limits", &s.balance_limits_compliance),
    ];
    for (group, map) in groups {
        checks.extend(map.iter().map(|(label, ok)| ComplianceCheck {
            group: group.to_string(),
            label: label.to_string(),
            compliant: *ok,
        }));
    }
    if let Some(ok) = s.cg_limits_compliance {
        checks.push(ComplianceCheck {
            group: "CG Limits".to_string(),
            label: "Center of gravity".to_string(),
            compliant: ok,
        });
    }

    let mut alerts = Vec::new();
    if !s.restricted_locations_used.is_empty() {
        alerts.push(
            Metric::new("Restricted Locations Used", s.restricted_locations_used.join(", "))
                .toned(Tone::Bad),
        );
    }
    if !s.max_weight_exceeded_positions.is_empty() {
        alerts.push(
            Metric::new(
                "Max Weight Exceeded",
                s.max_weight_exceeded_positions.join(", "),
            )
            .toned(Tone::Bad),
        );
    }
    if let Some(n) = s.temperature_constraints_violated.filter(|n| *n > 0) {
        alerts.push(Metric::new("Temperature Violations", format_number(n)).toned(Tone::Bad));
    }
    if let Some(n) = s.separation_constraints_violated.filter(|n| *n > 0) {
        alerts.push(Metric::new("Separation Violations", format_number(n)).toned(Tone::Bad));
    }

    if score.is_none() && checks.is_empty() && alerts.is_empty() {
        return None;
    }
    Some(SafetySection {
        score,
        checks,
        alerts,
    })
}

fn comparison_section(c: &ComparisonMetrics) -> Option<ComparisonSection> {
    let baseline = c.baseline.as_ref().filter(|b| b.has_data());
    let annual = c.annual_impact.as_ref().and_then(annual_section);

    let mut savings = Vec::new();
    if c.fuel_savings_kg.is_some() {
        savings.push(
            Metric::new("Fuel Savings", format_signed_weight(c.fuel_savings_kg))
                .toned(derive::savings_tone(c.fuel_savings_kg)),
        );
    }
    push_some(&mut savings, "Fuel Savings %", c.fuel_savings_percent, |v| {
        format_signed_percent(v, 2)
    });
    if c.cost_savings_usd.is_some() {
        savings.push(
            Metric::new("Cost Savings", format_currency(c.cost_savings_usd))
                .toned(derive::savings_tone(c.cost_savings_usd)),
        );
    }
    push_some(&mut savings, "CO2 Savings", c.co2_savings_kg, format_signed_weight);
    push_some(&mut savings, "MAC Difference", c.mac_difference, |v| {
        format_signed_percent(v, 2)
    });
    push_some(&mut savings, "Improvement", c.improvement_percentage, |v| {
        format_signed_percent(v, 2)
    });

    let Some(baseline) = baseline else {
        if annual.is_none() && savings.is_empty() {
            return None;
        }
        return Some(ComparisonSection {
            baseline_available: false,
            savings,
            key_metrics: Vec::new(),
            by_compartment: Vec::new(),
            by_side: Vec::new(),
            annual,
        });
    };

    let total_diff = derive::difference_total(&c.weight_difference_by_compartment);
    let key_metrics = vec![
        ComparisonRow::new("Total Weight", baseline.actual_total_weight, total_diff),
        ComparisonRow::new(
            "Total ULDs",
            baseline.actual_total_ulds.map(|n| n as f64),
            c.uld_count_difference.map(|n| n as f64),
        ),
        ComparisonRow::new("MAC ZFW", baseline.actual_mac_zfw, c.mac_difference),
    ];

    Some(ComparisonSection {
        baseline_available: true,
        savings,
        key_metrics,
        by_compartment: derive::reconstruct_rows(
            &baseline.actual_weight_by_compartment,
            &c.weight_difference_by_compartment,
        ),
        by_side: derive::reconstruct_rows(
            &baseline.actual_weight_by_side,
            &c.weight_difference_by_side,
        ),
        annual,
    })
}

fn annual_section(a: &AnnualImpact) -> Option<AnnualSection> {
    let mut metrics = Vec::new();
    push_some(&mut metrics, "Fuel Saved per Year", a.fuel_savings_per_year_kg, |v| {
        v.map_or_else(|| NA.to_string(), |kg| format!("{} kg", format_grouped(kg, 0)))
    });
    push_some(&mut metrics, "Fuel Saved per Year (L)", a.fuel_savings_per_year_liters, |v| {
        v.map_or_else(|| NA.to_string(), |l| format!("{} L", format_grouped(l, 0)))
    });
    if a.cost_savings_per_year_usd.is_some() {
        metrics.push(
            Metric::new("Cost Saved per Year", format_currency(a.cost_savings_per_year_usd))
                .toned(derive::savings_tone(a.cost_savings_per_year_usd)),
        );
    }
    let co2_tons = a
        .co2_reduction_per_year_tons
        .or_else(|| a.co2_reduction_per_year_kg.map(|kg| kg / 1000.0));
    push_some(&mut metrics, "CO2 Reduced per Year", co2_tons, |v| {
        v.map_or_else(|| NA.to_string(), |t| format!("{} t", format_grouped(t, 1)))
    });

    if metrics.is_empty() && a.flights_per_year.is_none() {
        return None;
    }
    Some(AnnualSection {
        flights_per_year: a.flights_per_year,
        fuel_price_per_kg: a.fuel_price_per_kg,
        metrics,
        negative: a.fuel_savings_per_year_kg.is_some_and(|kg| kg < 0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success() -> OptimizationResult {
        serde_json::from_value(serde_json::json!({
            "success": true,
            "flight_info": {"flight_number": "KL0835", "departure_airport": "AMS",
                            "arrival_airport": "SIN", "date": "2024-06-01"},
            "weight_distribution": {"by_compartment": {"C1": 600.0, "C2": 200.0},
                                    "by_side": {"Left": 400.0, "Right": 400.0},
                                    "total_weight": 800.0, "zfw": 180000.0, "mac_zfw": 27.4},
            "uld_utilization": {"utilization_rate": 0.8}
        }))
        .unwrap()
    }

    fn dashboard(result: &OptimizationResult) -> DashboardView {
        match build_view(result, &DisplayConfig::default()) {
            ResultView::Success(view) => *view,
            ResultView::Failure { message } => panic!("unexpected failure view: {message}"),
        }
    }

    #[test]
    fn failure_uses_error_message_or_generic_text() {
        let view = build_view(&OptimizationResult::failure("infeasible"), &DisplayConfig::default());
        assert_eq!(
            view,
            ResultView::Failure {
                message: "infeasible".to_string()
            }
        );

        let view = build_view(&OptimizationResult::failure(""), &DisplayConfig::default());
        assert_eq!(
            view,
            ResultView::Failure {
                message: GENERIC_FAILURE.to_string()
            }
        );
    }

    #[test]
    fn minimal_success_has_no_optional_sections() {
        let view = dashboard(&success());
        assert!(view.performance.is_none());
        assert!(view.solver.is_none());
        assert!(view.cargo.is_none());
        assert!(view.safety.is_none());
        assert!(view.comparison.is_none());
        assert_eq!(view.summary.route, "AMS → SIN");
        assert_eq!(view.summary.run_mode, RunMode::Optimizer);
    }

    #[test]
    fn summary_shows_na_for_missing_fuel_and_runtime() {
        let view = dashboard(&success());
        let fuel = view.summary.metrics.iter().find(|m| m.label == "Fuel Savings").unwrap();
        assert_eq!(fuel.value, "N/A");
        let runtime = view.summary.metrics.iter().find(|m| m.label == "Runtime").unwrap();
        assert_eq!(runtime.value, "N/A");
    }

    #[test]
    fn weight_shares_follow_backend_keys() {
        let view = dashboard(&success());
        assert_eq!(view.weight.by_compartment.len(), 2);
        assert_eq!(view.weight.by_compartment[0].percent, Some(75.0));
        assert_eq!(view.weight.by_side[1].label, "Right");
    }

    #[test]
    fn empty_performance_group_is_suppressed() {
        let mut result = success();
        result.performance_metrics = Some(PerformanceMetrics::default());
        assert!(dashboard(&result).performance.is_none());
    }

    #[test]
    fn comparison_without_baseline_is_flagged() {
        let mut result = success();
        result.comparison_metrics = Some(ComparisonMetrics {
            fuel_savings_kg: Some(12.0),
            ..Default::default()
        });
        let comparison = dashboard(&result).comparison.unwrap();
        assert!(!comparison.baseline_available);
        assert!(comparison.key_metrics.is_empty());
        assert_eq!(comparison.savings[0].value, "+12.0 kg");
    }

    #[test]
    fn solver_status_is_toned() {
        let mut result = success();
        result.optimization_metrics = Some(OptimizationMetrics {
            solver_status: Some("INFEASIBLE".to_string()),
            ..Default::default()
        });
        let solver = dashboard(&result).solver.unwrap();
        assert_eq!(solver.metrics[0].tone, Tone::Bad);
    }
}
