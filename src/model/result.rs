//! The optimization result document returned by `POST /optimization/run`.
//!
//! Only the weight-distribution totals (`total_weight`, `zfw`, `mac_zfw`) and
//! the ULD `utilization_rate` are required numbers. Everything else is
//! optional: `None` means "not computed for this run" and is rendered as
//! `N/A`, never as zero.

use serde::{Deserialize, Serialize};

use super::keyed::Keyed;

/// Identifying metadata for the flight a result belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightInfo {
    #[serde(default)]
    pub flight_number: String,
    #[serde(default)]
    pub departure_airport: String,
    #[serde(default)]
    pub arrival_airport: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aircraft_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aircraft_registration: Option<String>,
}

impl FlightInfo {
    /// Route string shown in the flight summary, e.g. `AMS → SIN`.
    pub fn route(&self) -> String {
        format!("{} → {}", self.departure_airport, self.arrival_airport)
    }
}

/// Weight (kg) by compartment, side and position, plus the required totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightDistribution {
    #[serde(default)]
    pub by_compartment: Keyed<f64>,
    #[serde(default)]
    pub by_side: Keyed<f64>,
    #[serde(default)]
    pub by_position: Keyed<f64>,
    pub total_weight: f64,
    pub zfw: f64,
    /// Percent mean aerodynamic chord at zero-fuel weight.
    pub mac_zfw: f64,

    #[serde(default)]
    pub weight_percentages_by_compartment: Keyed<f64>,
    #[serde(default)]
    pub weight_percentages_by_side: Keyed<f64>,
    #[serde(default)]
    pub balance_ratio: Option<f64>,
    #[serde(default)]
    pub compartment_utilization: Keyed<f64>,
    #[serde(default)]
    pub position_utilization: Keyed<f64>,
    #[serde(default)]
    pub max_weight_per_compartment: Keyed<f64>,
    #[serde(default)]
    pub max_weight_per_position: Keyed<f64>,
    #[serde(default)]
    pub weight_variance: Option<f64>,
    #[serde(default)]
    pub center_of_gravity_x: Option<f64>,
    #[serde(default)]
    pub center_of_gravity_y: Option<f64>,
}

/// ULD counts and weights. `items_per_uld` and `weight_per_uld` are keyed by
/// the ULD's index into [`OptimizationResult::ulds`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UldUtilization {
    #[serde(default)]
    pub total_ulds: Option<u64>,
    #[serde(default)]
    pub ulds_by_type: Keyed<u64>,
    #[serde(default)]
    pub ulds_by_side: Keyed<u64>,
    pub utilization_rate: f64,
    #[serde(default)]
    pub items_per_uld: Keyed<u64>,

    #[serde(default)]
    pub weight_per_uld: Keyed<f64>,
    #[serde(default)]
    pub volume_per_uld: Keyed<f64>,
    #[serde(default)]
    pub utilization_by_type: Keyed<f64>,
    #[serde(default)]
    pub empty_ulds: Option<u64>,
    #[serde(default)]
    pub average_uld_weight: Option<f64>,
    #[serde(default)]
    pub max_uld_weight: Option<f64>,
    #[serde(default)]
    pub min_uld_weight: Option<f64>,
    #[serde(default)]
    pub average_items_per_uld: Option<f64>,
    #[serde(default)]
    pub uld_weight_distribution: Keyed<u64>,
    #[serde(default)]
    pub ull_efficiency_score: Option<f64>,
    #[serde(default)]
    pub max_weight_by_type: Keyed<f64>,
    #[serde(default)]
    pub volume_utilization_by_type: Keyed<f64>,
}

/// A single cargo item as listed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CargoItem {
    pub index: Option<u64>,
    pub serialnumber: String,
    pub number_of_pieces: Option<u64>,
    pub weight: Option<f64>,
    pub volume: Option<f64>,
    #[serde(rename = "CRT")]
    pub crt: bool,
    #[serde(rename = "COL")]
    pub col: bool,
    pub dangerous: bool,
    pub commodity: Option<String>,
    pub uld_assignment: Option<u64>,
}

/// A single unit load device as listed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UldInfo {
    pub index: Option<u64>,
    #[serde(rename = "type")]
    pub uld_type: String,
    pub serialnumber: String,
    pub weight: Option<f64>,
    pub max_weight: Option<f64>,
    pub position: Option<String>,
    pub compartment: Option<String>,
}

/// One of the heaviest items, as preselected by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LargestItem {
    pub index: Option<u64>,
    pub serialnumber: String,
    pub weight: Option<f64>,
    pub commodity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CargoMetrics {
    pub total_items: Option<u64>,
    pub items_by_type: Keyed<u64>,
    pub items_by_weight_range: Keyed<u64>,
    pub items_without_uld: Option<u64>,
    pub average_item_weight: Option<f64>,
    pub max_item_weight: Option<f64>,
    pub min_item_weight: Option<f64>,
    pub total_crt_items: Option<u64>,
    pub total_col_items: Option<u64>,
    pub total_dangerous_items: Option<u64>,
    pub total_volume: Option<f64>,
    pub weight_distribution_by_commodity: Keyed<f64>,
    pub largest_items: Vec<LargestItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceMetrics {
    pub fuel_savings_kg: Option<f64>,
    pub fuel_savings_percent: Option<f64>,
    pub cost_savings_usd: Option<f64>,
    pub co2_emissions_saved_kg: Option<f64>,
    pub fuel_consumption_liters: Option<f64>,
    pub baseline_fuel_kg: Option<f64>,
    pub optimized_fuel_kg: Option<f64>,
    pub load_factor: Option<f64>,
    pub efficiency_score: Option<f64>,
}

/// Solver diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationMetrics {
    pub runtime_seconds: Option<f64>,
    pub solver_status: Option<String>,
    pub objective_value: Option<f64>,
    pub gap_percent: Option<f64>,
    pub number_of_variables: Option<u64>,
    pub number_of_constraints: Option<u64>,
    pub number_of_iterations: Option<u64>,
    pub number_of_nodes: Option<u64>,
    pub solution_time: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyMetrics {
    pub weight_limits_compliance: Keyed<bool>,
    pub balance_limits_compliance: Keyed<bool>,
    pub cg_limits_compliance: Option<bool>,
    pub restricted_locations_used: Vec<String>,
    pub temperature_constraints_violated: Option<u64>,
    pub separation_constraints_violated: Option<u64>,
    pub max_weight_exceeded_positions: Vec<String>,
    pub safety_score: Option<f64>,
}

/// What was actually loaded on the flight (the real-world baseline).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineLoading {
    pub actual_mac_zfw: Option<f64>,
    pub actual_weight_by_compartment: Keyed<f64>,
    pub actual_weight_by_side: Keyed<f64>,
    pub actual_total_weight: Option<f64>,
    pub actual_total_ulds: Option<i64>,
    pub trip_fuel: Option<f64>,
}

impl BaselineLoading {
    /// Whether any baseline field carries data.
    pub fn has_data(&self) -> bool {
        self.actual_mac_zfw.is_some()
            || !self.actual_weight_by_compartment.is_empty()
            || !self.actual_weight_by_side.is_empty()
            || self.actual_total_weight.is_some()
            || self.actual_total_ulds.is_some()
            || self.trip_fuel.is_some()
    }
}

/// Per-flight savings scaled to a year of flights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnualImpact {
    pub flights_per_year: Option<u64>,
    pub fuel_savings_per_year_kg: Option<f64>,
    pub fuel_savings_per_year_liters: Option<f64>,
    pub cost_savings_per_year_usd: Option<f64>,
    pub co2_reduction_per_year_kg: Option<f64>,
    pub co2_reduction_per_year_tons: Option<f64>,
    pub fuel_price_per_kg: Option<f64>,
    pub scaling_factor: Option<f64>,
}

/// Differences between the optimized loading and the baseline.
///
/// The backend sends `optimized - baseline` deltas, not absolute optimized
/// values; see [`crate::present::derive::reconstruct_rows`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonMetrics {
    #[serde(rename = "klm_actual")]
    pub baseline: Option<BaselineLoading>,
    pub weight_difference_by_compartment: Keyed<f64>,
    pub weight_difference_by_side: Keyed<f64>,
    pub uld_count_difference: Option<i64>,
    #[serde(rename = "fuel_savings_vs_klm_actual_kg")]
    pub fuel_savings_kg: Option<f64>,
    #[serde(rename = "fuel_savings_vs_klm_actual_percent")]
    pub fuel_savings_percent: Option<f64>,
    #[serde(rename = "cost_savings_vs_klm_actual_usd")]
    pub cost_savings_usd: Option<f64>,
    #[serde(rename = "co2_savings_vs_klm_actual_kg")]
    pub co2_savings_kg: Option<f64>,
    pub mac_difference: Option<f64>,
    pub improvement_percentage: Option<f64>,
    pub annual_impact: Option<AnnualImpact>,
}

/// Explicit run mode, when the backend reports one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportedRunMode {
    Optimizer,
    Fallback,
}

/// The full result document of one optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub success: bool,
    pub flight_info: FlightInfo,
    pub weight_distribution: WeightDistribution,
    pub uld_utilization: UldUtilization,
    #[serde(default)]
    pub cargo_items: Vec<CargoItem>,
    #[serde(default)]
    pub ulds: Vec<UldInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cargo_metrics: Option<CargoMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_metrics: Option<PerformanceMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization_metrics: Option<OptimizationMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_metrics: Option<SafetyMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_metrics: Option<ComparisonMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_savings_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_savings_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_mode: Option<ReportedRunMode>,
}

/// Lenient view of a `success: false` document, which may omit the
/// sections a successful run always carries.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FailureDocument {
    flight_info: FlightInfo,
    error_message: Option<String>,
    warnings: Vec<String>,
}

impl OptimizationResult {
    /// Decode a result document.
    ///
    /// A document with `success: false` is decoded leniently so that a domain
    /// failure is never reported as a decoding error. Successful documents
    /// must carry the required totals.
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        let failed = value.get("success").and_then(|v| v.as_bool()) == Some(false);
        if !failed {
            return serde_json::from_value(value);
        }

        if let Ok(full) = serde_json::from_value::<Self>(value.clone()) {
            return Ok(full);
        }

        let doc: FailureDocument = serde_json::from_value(value)?;
        Ok(Self {
            flight_info: doc.flight_info,
            error_message: doc.error_message,
            warnings: doc.warnings,
            ..Self::failure("")
        })
    }

    /// An empty failed result carrying only an error message.
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            flight_info: FlightInfo::default(),
            weight_distribution: WeightDistribution::default(),
            uld_utilization: UldUtilization::default(),
            cargo_items: Vec::new(),
            ulds: Vec::new(),
            cargo_metrics: None,
            performance_metrics: None,
            optimization_metrics: None,
            safety_metrics: None,
            comparison_metrics: None,
            fuel_savings_kg: None,
            fuel_savings_percent: None,
            runtime_seconds: None,
            error_message: (!message.is_empty()).then_some(message),
            warnings: Vec::new(),
            run_mode: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "success": true,
        "flight_info": {"flight_number": "KL0835", "departure_airport": "AMS",
                        "arrival_airport": "SIN", "date": "2024-06-01"},
        "weight_distribution": {"by_compartment": {"C1": 1200.0}, "by_side": {},
                                "by_position": {}, "total_weight": 1200.0,
                                "zfw": 180000.0, "mac_zfw": 27.4},
        "uld_utilization": {"total_ulds": 3, "ulds_by_type": {"PMC": 3},
                            "ulds_by_side": {"Left": 2}, "utilization_rate": 0.71,
                            "items_per_uld": {"0": 4, "2": 1}},
        "cargo_items": [],
        "ulds": [],
        "warnings": []
    }"#;

    #[test]
    fn decodes_minimal_success_document() {
        let value: serde_json::Value = serde_json::from_str(MINIMAL).unwrap();
        let result = OptimizationResult::from_value(value).unwrap();
        assert!(result.success);
        assert_eq!(result.flight_info.route(), "AMS → SIN");
        assert_eq!(result.uld_utilization.items_per_uld.get("2"), Some(&1));
        assert!(result.cargo_metrics.is_none());
        assert!(result.comparison_metrics.is_none());
        assert!(result.run_mode.is_none());
    }

    #[test]
    fn success_document_without_totals_is_rejected() {
        let value = serde_json::json!({
            "success": true,
            "flight_info": {},
            "weight_distribution": {"by_compartment": {}},
            "uld_utilization": {"utilization_rate": 0.5}
        });
        assert!(OptimizationResult::from_value(value).is_err());
    }

    #[test]
    fn failure_document_decodes_leniently() {
        let value = serde_json::json!({
            "success": false,
            "error_message": "Model infeasible",
            "warnings": ["Gurobi FAILED"]
        });
        let result = OptimizationResult::from_value(value).unwrap();
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("Model infeasible"));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn cargo_item_flags_use_backend_names() {
        let item: CargoItem = serde_json::from_str(
            r#"{"index": 1, "serialnumber": "AWB1", "weight": 12.5, "CRT": true, "COL": false}"#,
        )
        .unwrap();
        assert!(item.crt);
        assert!(!item.col);
        assert_eq!(item.commodity, None);
    }

    #[test]
    fn comparison_fields_map_from_baseline_names() {
        let metrics: ComparisonMetrics = serde_json::from_str(
            r#"{"klm_actual": {"actual_total_weight": 5000.0},
                "fuel_savings_vs_klm_actual_kg": 42.0,
                "weight_difference_by_compartment": {"C1": -50.0}}"#,
        )
        .unwrap();
        let baseline = metrics.baseline.unwrap();
        assert_eq!(baseline.actual_total_weight, Some(5000.0));
        assert!(baseline.has_data());
        assert_eq!(metrics.fuel_savings_kg, Some(42.0));
        assert_eq!(metrics.weight_difference_by_compartment.get("C1"), Some(&-50.0));
    }

    #[test]
    fn explicit_run_mode_is_decoded() {
        let mut value: serde_json::Value = serde_json::from_str(MINIMAL).unwrap();
        value["run_mode"] = serde_json::json!("fallback");
        let result = OptimizationResult::from_value(value).unwrap();
        assert_eq!(result.run_mode, Some(ReportedRunMode::Fallback));
    }
}
