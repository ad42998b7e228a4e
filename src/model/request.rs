//! Request bodies sent to the optimization backend.

use serde::{Deserialize, Serialize};

use super::result::OptimizationResult;

/// Loading model the backend should run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ModelType {
    #[default]
    DelgadoVenezian,
    Baseline,
    OptimizedActual,
    BaxFixed,
}

impl ModelType {
    pub const ALL: [ModelType; 4] = [
        Self::DelgadoVenezian,
        Self::Baseline,
        Self::OptimizedActual,
        Self::BaxFixed,
    ];

    /// Wire name, e.g. `delgado_venezian`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DelgadoVenezian => "delgado_venezian",
            Self::Baseline => "baseline",
            Self::OptimizedActual => "optimized_actual",
            Self::BaxFixed => "bax_fixed",
        }
    }

    /// Human-readable label for selectors.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DelgadoVenezian => "DelgadoVenezian",
            Self::Baseline => "Baseline",
            Self::OptimizedActual => "Optimized Actual",
            Self::BaxFixed => "BAX Fixed",
        }
    }

    /// Parse a wire name, accepting `-` in place of `_`.
    pub fn parse(val: &str) -> Option<Self> {
        let normalized = val.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|m| m.as_str() == normalized)
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /optimization/run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    /// One of the identifiers returned by the flights endpoint. The backend
    /// is the authority on validity; the client only rejects empty values.
    pub flight_path: String,
    #[serde(default)]
    pub model_type: ModelType,
    #[serde(default)]
    pub restricted_locations: Vec<String>,
}

impl OptimizationRequest {
    pub fn new(flight_path: impl Into<String>, model_type: ModelType) -> Self {
        Self {
            flight_path: flight_path.into(),
            model_type,
            restricted_locations: Vec::new(),
        }
    }

    pub fn with_restricted_locations(mut self, locations: Vec<String>) -> Self {
        self.restricted_locations = locations;
        self
    }
}

/// Body of `POST /optimization/synthetic/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticDataRequest {
    pub num_items: u32,
    pub num_ulds: u32,
    pub weight_range: (f64, f64),
    pub include_crt: bool,
    pub include_col: bool,
    pub include_dangerous: bool,
    pub flight_number: String,
    pub departure_airport: String,
    pub arrival_airport: String,
}

impl Default for SyntheticDataRequest {
    fn default() -> Self {
        Self {
            num_items: 50,
            num_ulds: 10,
            weight_range: (100.0, 1000.0),
            include_crt: true,
            include_col: true,
            include_dangerous: false,
            flight_number: "SYN001".to_string(),
            departure_airport: "AMS".to_string(),
            arrival_airport: "SIN".to_string(),
        }
    }
}

impl SyntheticDataRequest {
    pub const ITEMS_RANGE: std::ops::RangeInclusive<u32> = 1..=200;
    pub const ULDS_RANGE: std::ops::RangeInclusive<u32> = 1..=50;

    /// Check the bounds the backend enforces, so obviously bad requests fail
    /// before a round trip.
    pub fn validate(&self) -> Result<(), String> {
        if !Self::ITEMS_RANGE.contains(&self.num_items) {
            return Err(format!(
                "num_items must be between 1 and 200, got {}",
                self.num_items
            ));
        }
        if !Self::ULDS_RANGE.contains(&self.num_ulds) {
            return Err(format!(
                "num_ulds must be between 1 and 50, got {}",
                self.num_ulds
            ));
        }
        let (min, max) = self.weight_range;
        if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max {
            return Err(format!("invalid weight range {min}..{max}"));
        }
        if self.flight_number.trim().is_empty() {
            return Err("flight_number must not be empty".to_string());
        }
        Ok(())
    }
}

/// Worksheet used when none is given.
pub const DEFAULT_WORKSHEET: &str = "Optimization Results";

/// Body of `POST /export/sheets`.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRequest<'a> {
    pub result: &'a OptimizationResult,
    pub spreadsheet_id: &'a str,
    pub worksheet_name: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_type_serializes_to_wire_names() {
        assert_eq!(
            serde_json::to_string(&ModelType::DelgadoVenezian).unwrap(),
            "\"delgado_venezian\""
        );
        assert_eq!(
            serde_json::to_string(&ModelType::BaxFixed).unwrap(),
            "\"bax_fixed\""
        );
    }

    #[test]
    fn model_type_parse_accepts_variants() {
        assert_eq!(ModelType::parse("baseline"), Some(ModelType::Baseline));
        assert_eq!(
            ModelType::parse("optimized-actual"),
            Some(ModelType::OptimizedActual)
        );
        assert_eq!(ModelType::parse(" BAX_FIXED "), Some(ModelType::BaxFixed));
        assert_eq!(ModelType::parse("gurobi"), None);
    }

    #[test]
    fn run_request_body_shape() {
        let req = OptimizationRequest::new("Data/KL0835_2024-06-01", ModelType::Baseline)
            .with_restricted_locations(vec!["11L".to_string()]);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["flight_path"], "Data/KL0835_2024-06-01");
        assert_eq!(value["model_type"], "baseline");
        assert_eq!(value["restricted_locations"][0], "11L");
    }

    #[test]
    fn synthetic_defaults_are_valid() {
        let req = SyntheticDataRequest::default();
        assert!(req.validate().is_ok());
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["weight_range"], serde_json::json!([100.0, 1000.0]));
    }

    #[test]
    fn synthetic_rejects_out_of_range_counts() {
        let req = SyntheticDataRequest {
            num_items: 0,
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = SyntheticDataRequest {
            num_ulds: 51,
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = SyntheticDataRequest {
            weight_range: (500.0, 100.0),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
