/// Configuration system for loadplan.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::LoadplanConfig::default()`]
/// 2. **User global config**: `~/.loadplan/config.toml`
/// 3. **Project local config**: `.loadplan.toml` in the current working directory
/// 4. **Environment variables**: `LOADPLAN_*` overrides (highest precedence)
///
/// Layers are merged table by table: a file that only sets
/// `backend.base_url` leaves every other key at the previous layer's value.
/// A layer that is malformed, or whose values have the wrong type, is
/// skipped as a whole.
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::LoadplanConfig;

use crate::model::ModelType;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges defaults → global TOML → project TOML → env vars. This is the
/// primary entry point for everything that needs configuration.
pub fn load() -> LoadplanConfig {
    let layers: Vec<toml::Value> = [global_config_path(), project_config_path()]
        .into_iter()
        .filter_map(load_toml_file)
        .collect();

    let mut config = resolve_layers(&layers);
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Load a TOML file as an untyped value tree. Missing or unparsable files
/// yield `None`.
fn load_toml_file(path: Option<PathBuf>) -> Option<toml::Value> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

/// Fold file layers over the built-in defaults.
fn resolve_layers(layers: &[toml::Value]) -> LoadplanConfig {
    let defaults = LoadplanConfig::default();
    let Ok(mut merged) = toml::Value::try_from(&defaults) else {
        return defaults;
    };

    for layer in layers {
        let mut candidate = merged.clone();
        merge_toml(&mut candidate, layer);
        if candidate.clone().try_into::<LoadplanConfig>().is_ok() {
            merged = candidate;
        }
    }

    merged.try_into().unwrap_or(defaults)
}

/// Recursively merge `overlay` into `base`. Tables merge key by key; any
/// other value in the overlay replaces the base value.
fn merge_toml(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base_table.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Directory holding the global config and the run log: `~/.loadplan`.
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".loadplan"))
}

/// Path to the user global config: `~/.loadplan/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("config.toml"))
}

/// Path to the project local config: `.loadplan.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".loadplan.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `LOADPLAN_API_URL`: backend base URL
/// - `LOADPLAN_TIMEOUT_MS`: request timeout
/// - `LOADPLAN_MODEL`: default model type
/// - `LOADPLAN_SPREADSHEET_ID`: default export spreadsheet
/// - `LOADPLAN_LOG`: run log on/off (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(config: &mut LoadplanConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(val) = env("LOADPLAN_API_URL")
        && !val.trim().is_empty()
    {
        config.backend.base_url = val.trim().to_string();
    }
    if let Some(val) = env("LOADPLAN_TIMEOUT_MS")
        && let Ok(ms) = val.trim().parse::<u64>()
    {
        config.backend.timeout_ms = ms;
    }
    if let Some(val) = env("LOADPLAN_MODEL")
        && let Some(model) = ModelType::parse(&val)
    {
        config.run.model = model;
    }
    if let Some(val) = env("LOADPLAN_SPREADSHEET_ID")
        && !val.trim().is_empty()
    {
        config.export.spreadsheet_id = val.trim().to_string();
    }
    if let Some(val) = env("LOADPLAN_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.loadplan/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.loadplan/ directory")?;
    }

    fs::write(&path, LoadplanConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `backend.base_url`. The new value takes the
/// type of the value it replaces (the defaults decide when the file does not
/// have the key yet), and the result must still be a valid configuration.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let mut root = toml::Value::try_from(LoadplanConfig::default())
        .context("failed to serialize default config")?;
    if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read config file")?;
        let existing: toml::Value =
            toml::from_str(&content).context("failed to parse config as TOML value")?;
        merge_toml(&mut root, &existing);
    }

    set_toml_value(&mut root, key, value)?;

    root.clone()
        .try_into::<LoadplanConfig>()
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(*leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .trim()
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .trim()
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::Array(_)) => toml::Value::Array(
            raw_value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| toml::Value::String(s.to_string()))
                .collect(),
        ),
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("unknown config key: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn layer(text: &str) -> toml::Value {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn no_layers_yields_defaults() {
        assert_eq!(resolve_layers(&[]), LoadplanConfig::default());
    }

    #[test]
    fn later_layers_override_field_by_field() {
        let global = layer(
            r#"
[backend]
base_url = "http://global:8000"
timeout_ms = 1000
"#,
        );
        let project = layer(
            r#"
[backend]
timeout_ms = 2000
"#,
        );
        let config = resolve_layers(&[global, project]);
        assert_eq!(config.backend.base_url, "http://global:8000");
        assert_eq!(config.backend.timeout_ms, 2000);
    }

    #[test]
    fn layer_with_wrong_types_is_skipped() {
        let bad = layer(
            r#"
[backend]
timeout_ms = "soon"
base_url = "http://ignored"
"#,
        );
        let good = layer(
            r#"
[display]
top_commodities = 5
"#,
        );
        let config = resolve_layers(&[bad, good]);
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.display.top_commodities, 5);
    }

    #[test]
    fn env_overrides_apply_last() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("LOADPLAN_API_URL", "http://opt:9000"),
            ("LOADPLAN_TIMEOUT_MS", "45000"),
            ("LOADPLAN_MODEL", "optimized-actual"),
            ("LOADPLAN_LOG", "off"),
        ]);
        let mut config = LoadplanConfig::default();
        apply_env_overrides(&mut config, |k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.backend.base_url, "http://opt:9000");
        assert_eq!(config.backend.timeout_ms, 45_000);
        assert_eq!(config.run.model, ModelType::OptimizedActual);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("LOADPLAN_API_URL", "  "),
            ("LOADPLAN_TIMEOUT_MS", "fast"),
            ("LOADPLAN_MODEL", "unknown"),
        ]);
        let mut config = LoadplanConfig::default();
        apply_env_overrides(&mut config, |k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config, LoadplanConfig::default());
    }

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy(" yes "));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn set_toml_value_keeps_types() {
        let mut root = toml::Value::try_from(LoadplanConfig::default()).unwrap();
        set_toml_value(&mut root, "backend.timeout_ms", "1500").unwrap();
        set_toml_value(&mut root, "web.open_browser", "no").unwrap();
        set_toml_value(&mut root, "run.restricted_locations", "11L, 12R,").unwrap();
        set_toml_value(&mut root, "backend.base_url", "http://x:1").unwrap();

        let config: LoadplanConfig = root.try_into().unwrap();
        assert_eq!(config.backend.timeout_ms, 1500);
        assert!(!config.web.open_browser);
        assert_eq!(config.run.restricted_locations, vec!["11L", "12R"]);
        assert_eq!(config.backend.base_url, "http://x:1");
    }

    #[test]
    fn set_toml_value_rejects_bad_input() {
        let mut root = toml::Value::try_from(LoadplanConfig::default()).unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "v").is_err());
        assert!(set_toml_value(&mut root, "backend.unknown", "v").is_err());
        assert!(set_toml_value(&mut root, "backend.timeout_ms", "abc").is_err());
        assert!(set_toml_value(&mut root, "", "v").is_err());
    }

    #[test]
    fn merge_toml_adds_missing_keys() {
        let mut base = layer("[a]\nx = 1\n");
        merge_toml(&mut base, &layer("[a]\ny = 2\n[b]\nz = 3\n"));
        assert_eq!(base["a"]["x"].as_integer(), Some(1));
        assert_eq!(base["a"]["y"].as_integer(), Some(2));
        assert_eq!(base["b"]["z"].as_integer(), Some(3));
    }
}
