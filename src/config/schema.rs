/// Configuration schema and defaults for loadplan.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[backend]`, `[run]`, `[display]`, `[export]`, `[web]` and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

use crate::model::ModelType;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level loadplan configuration.
///
/// Maps directly to the `~/.loadplan/config.toml` and `.loadplan.toml` file
/// schemas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadplanConfig {
    pub backend: BackendConfig,
    pub run: RunConfig,
    pub display: DisplayConfig,
    pub export: ExportConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Where the optimization service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL; all endpoint paths are relative to it.
    /// Can also be set via `LOADPLAN_API_URL`.
    pub base_url: String,
    /// Versioned path prefix.
    pub api_prefix: String,
    /// Timeout for every request, including optimization runs (milliseconds).
    pub timeout_ms: u64,
    /// Timeout for the health probe (milliseconds).
    pub health_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_prefix: crate::api::DEFAULT_API_PREFIX.to_string(),
            timeout_ms: 300_000,
            health_timeout_ms: 5_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [run]
// ---------------------------------------------------------------------------

/// Defaults for `loadplan run` and the dashboard run controls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub model: ModelType,
    /// Positions the optimizer must leave empty.
    pub restricted_locations: Vec<String>,
}

// ---------------------------------------------------------------------------
// [display]
// ---------------------------------------------------------------------------

/// Limits applied by the result presenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Number of commodities in the weight-by-commodity chart.
    pub top_commodities: usize,
    /// Commodity labels longer than this are shortened for display.
    pub label_max_chars: usize,
    /// Maximum rows in the per-ULD charts.
    pub uld_chart_limit: usize,
    /// ULD serial numbers are cut to this many characters in chart labels.
    pub uld_label_chars: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            top_commodities: 10,
            label_max_chars: 15,
            uld_chart_limit: 20,
            uld_label_chars: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// [export]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Default spreadsheet for `loadplan export`. Empty means "must be given
    /// on the command line".
    pub spreadsheet_id: String,
    pub worksheet_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            worksheet_name: crate::model::request::DEFAULT_WORKSHEET.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Address the embedded dashboard binds to.
    pub bind: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append one line per run to `~/.loadplan/run-log.jsonl`.
    pub enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Default annotated TOML
// ---------------------------------------------------------------------------

impl LoadplanConfig {
    /// The annotated file written by `loadplan config init`.
    pub fn default_toml() -> &'static str {
        DEFAULT_CONFIG_TOML
    }
}

const DEFAULT_CONFIG_TOML: &str = r#"# loadplan configuration
#
# Precedence (lowest to highest): built-in defaults, this file,
# ./.loadplan.toml in the working directory, LOADPLAN_* environment variables.

[backend]
# Optimization service base URL (env: LOADPLAN_API_URL)
base_url = "http://localhost:8000"
api_prefix = "/api/v1"
# Request timeout in milliseconds; optimization runs can take minutes
# (env: LOADPLAN_TIMEOUT_MS)
timeout_ms = 300000
health_timeout_ms = 5000

[run]
# delgado_venezian | baseline | optimized_actual | bax_fixed (env: LOADPLAN_MODEL)
model = "delgado_venezian"
restricted_locations = []

[display]
top_commodities = 10
label_max_chars = 15
uld_chart_limit = 20
uld_label_chars = 10

[export]
# env: LOADPLAN_SPREADSHEET_ID
spreadsheet_id = ""
worksheet_name = "Optimization Results"

[web]
bind = "127.0.0.1:9747"
open_browser = true

[logging]
# Run history in ~/.loadplan/run-log.jsonl (env: LOADPLAN_LOG)
enabled = true
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_matches_defaults() {
        let parsed: LoadplanConfig = toml::from_str(LoadplanConfig::default_toml()).unwrap();
        assert_eq!(parsed, LoadplanConfig::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let parsed: LoadplanConfig = toml::from_str(
            r#"
[backend]
base_url = "http://opt.internal:8080"
"#,
        )
        .unwrap();
        assert_eq!(parsed.backend.base_url, "http://opt.internal:8080");
        assert_eq!(parsed.backend.timeout_ms, 300_000);
        assert_eq!(parsed.display.top_commodities, 10);
    }

    #[test]
    fn model_uses_wire_names() {
        let parsed: LoadplanConfig = toml::from_str(
            r#"
[run]
model = "bax_fixed"
"#,
        )
        .unwrap();
        assert_eq!(parsed.run.model, ModelType::BaxFixed);
    }
}
