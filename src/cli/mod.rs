//! CLI command implementations for loadplan.
//!
//! Provides subcommand handlers for:
//! - `loadplan flights`: list flights the backend can optimize
//! - `loadplan run`: run an optimization and print the result dashboard
//! - `loadplan synthetic`: ask the backend to generate a synthetic flight
//! - `loadplan export` / `export-status`: spreadsheet export
//! - `loadplan health`: check config, backend reachability and the run log
//! - `loadplan history`: run history report
//! - `loadplan config show|init|set|reset`: configuration management

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::api::OptimizationClient;
use crate::config;
use crate::config::schema::LoadplanConfig;
use crate::dashboard::{Dashboard, SessionError};
use crate::history::RunLog;
use crate::history::reporter::{self, HistoryStats};
use crate::model::{ModelType, OptimizationRequest, OptimizationResult, SyntheticDataRequest};
use crate::present::format::format_number;
use crate::present::{ResultView, build_view, render};

/// Output format for `loadplan history`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Output format for `loadplan run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunFormat {
    /// Colored dashboard.
    Table,
    /// The derived view as JSON.
    Json,
    /// The backend's result document as JSON.
    Raw,
}

impl RunFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("raw") => Self::Raw,
            _ => Self::Table,
        }
    }
}

/// Options for `loadplan run`; unset values come from the `[run]` config.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub flight: Option<String>,
    pub model: Option<ModelType>,
    pub restrict: Vec<String>,
}

// ---------------------------------------------------------------------------
// loadplan flights
// ---------------------------------------------------------------------------

/// List the flights the backend accepts as `flight_path`.
pub fn run_flights(cfg: &LoadplanConfig) -> Result<()> {
    let client = OptimizationClient::from_config(&cfg.backend);
    let flights = client
        .list_flights()
        .context("Failed to load flights")?;

    if flights.is_empty() {
        println!("{}", "The backend lists no flights.".yellow());
        return Ok(());
    }

    println!("{}", "Available Flights".bold().cyan());
    println!("{}", "=".repeat(40));
    for (i, flight) in flights.iter().enumerate() {
        println!("  {:>3}  {}", i + 1, flight);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// loadplan run
// ---------------------------------------------------------------------------

/// Run an optimization and print the result.
///
/// Without `--flight` the first listed flight is used. A `success: false`
/// answer prints the failure view and is not an error; transport failures
/// are.
pub fn run_optimization(cfg: &LoadplanConfig, opts: RunOptions, format: RunFormat) -> Result<()> {
    let client = OptimizationClient::from_config(&cfg.backend);
    let restrict = if opts.restrict.is_empty() {
        cfg.run.restricted_locations.clone()
    } else {
        opts.restrict
    };
    let dashboard = Dashboard::new(client, cfg.display.clone())
        .with_run_log(RunLog::from_config(&cfg.logging))
        .with_run_defaults(opts.model.unwrap_or(cfg.run.model), restrict);

    match opts.flight {
        Some(flight) => dashboard.select_flight(&flight)?,
        None => {
            dashboard.load_flights().map_err(|e| {
                anyhow::anyhow!(dashboard.error().unwrap_or_else(|| e.to_string()))
            })?;
        }
    }

    let snapshot = dashboard.snapshot();
    if format == RunFormat::Table
        && let Some(flight) = &snapshot.selected
    {
        eprintln!(
            "{} {} ({})",
            "Optimizing".dimmed(),
            flight.bold(),
            snapshot.model.label()
        );
    }

    let view = match dashboard.run() {
        Ok(view) => view,
        Err(SessionError::NoFlightSelected) => bail!("the backend lists no flights to optimize"),
        Err(e) => bail!("Optimization request failed: {e}"),
    };

    match format {
        RunFormat::Table => print!("{}", render::render(&view)),
        RunFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        RunFormat::Raw => {
            let result = dashboard
                .current_result()
                .context("run finished without a result")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// loadplan synthetic
// ---------------------------------------------------------------------------

/// Ask the backend to generate a synthetic flight and print its answer.
pub fn run_synthetic(cfg: &LoadplanConfig, params: &SyntheticDataRequest) -> Result<()> {
    let client = OptimizationClient::from_config(&cfg.backend);
    let response = client
        .generate_synthetic(params)
        .context("Synthetic data generation failed")?;

    println!(
        "{} {} items, {} ULDs for {} ({} → {})",
        "✓".green().bold(),
        params.num_items,
        params.num_ulds,
        params.flight_number.bold(),
        params.departure_airport,
        params.arrival_airport,
    );
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// loadplan export | export-status
// ---------------------------------------------------------------------------

/// Where the result to export comes from.
#[derive(Debug, Clone)]
pub enum ExportSource {
    /// Run a fresh optimization for this flight first.
    Flight(String),
    /// A result document saved with `loadplan run --format raw`.
    ResultFile(std::path::PathBuf),
}

/// Export a result to a spreadsheet.
pub fn run_export(
    cfg: &LoadplanConfig,
    source: ExportSource,
    spreadsheet_id: Option<&str>,
    worksheet: Option<&str>,
) -> Result<()> {
    let spreadsheet_id = spreadsheet_id.unwrap_or(cfg.export.spreadsheet_id.as_str());
    if spreadsheet_id.trim().is_empty() {
        bail!("no spreadsheet id: pass --spreadsheet-id or set export.spreadsheet_id");
    }
    let worksheet = worksheet.unwrap_or(cfg.export.worksheet_name.as_str());
    let client = OptimizationClient::from_config(&cfg.backend);

    let result = match source {
        ExportSource::ResultFile(path) => read_result_file(&path)?,
        ExportSource::Flight(flight) => {
            let request = OptimizationRequest::new(flight, cfg.run.model)
                .with_restricted_locations(cfg.run.restricted_locations.clone());
            client
                .run(&request)
                .context("Optimization request failed")?
        }
    };
    if let ResultView::Failure { message } = build_view(&result, &cfg.display) {
        bail!("refusing to export a failed optimization: {message}");
    }

    let response = client
        .export_to_sheets(&result, spreadsheet_id, Some(worksheet))
        .context("Export failed")?;
    println!(
        "{} Exported {} to worksheet {}",
        "✓".green().bold(),
        result.flight_info.flight_number.bold(),
        worksheet.bold()
    );
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn read_result_file(path: &Path) -> Result<OptimizationResult> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    OptimizationResult::from_value(value)
        .with_context(|| format!("{} is not an optimization result", path.display()))
}

/// Print the export service status.
pub fn run_export_status(cfg: &LoadplanConfig) -> Result<()> {
    let client = OptimizationClient::from_config(&cfg.backend);
    let status = client
        .sheets_status()
        .context("Failed to fetch export status")?;
    println!("{}", "Spreadsheet Export Status".bold().cyan());
    println!("{}", "=".repeat(40));
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// loadplan health
// ---------------------------------------------------------------------------

/// Check config files, backend reachability and the run log.
pub fn run_health() -> Result<()> {
    println!("{}", "loadplan Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.loadplan/config.toml found"
        } else {
            "not found (run `loadplan config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".loadplan.toml found"
        } else {
            "none (optional)"
        },
    );

    let client = OptimizationClient::from_config(&cfg.backend);
    let backend_ok = client.is_healthy();
    let backend_detail = if backend_ok {
        format!("reachable at {}", client.endpoints().base_url())
    } else {
        format!(
            "not reachable at {} (is the optimization service running?)",
            client.endpoints().base_url()
        )
    };
    print_health_item("Backend", backend_ok, &backend_detail);
    print_health_item(
        "Request timeout",
        true,
        &format!("{}s", client.timeout().as_secs()),
    );
    print_health_item("Default model", true, cfg.run.model.label());

    let log = RunLog::from_config(&cfg.logging);
    let log_exists = log.path().is_some_and(|p| p.exists());
    let log_detail = if !cfg.logging.enabled {
        "disabled".to_string()
    } else if log_exists {
        format!("{} entries", log.read_all().len())
    } else {
        "no log file yet".to_string()
    };
    print_health_item("Run log", log_exists, &log_detail);

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<20} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// loadplan history
// ---------------------------------------------------------------------------

/// Show the run history report.
pub fn run_history(cfg: &LoadplanConfig, format: OutputFormat, days: Option<u32>) -> Result<()> {
    let stats = reporter::compute_stats(&RunLog::from_config(&cfg.logging), days);

    if stats.total_runs == 0 {
        println!(
            "{}",
            "No runs logged yet. Run `loadplan run` to build up history.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Csv => print_history_csv(&stats),
        OutputFormat::Table => print_history_table(&stats, days),
    }
    Ok(())
}

fn print_history_table(stats: &HistoryStats, days: Option<u32>) {
    let title = match days {
        Some(d) => format!("Run History, Last {d} Days"),
        None => "Run History".to_string(),
    };
    println!("{}", title.bold().cyan());
    println!("{}", "=".repeat(60));
    println!();

    let o = &stats.outcomes;
    println!("  {} {}", "Total runs:     ".bold(), format_number(stats.total_runs as u64));
    println!(
        "  {} {}",
        "Avg latency:    ".bold(),
        stats
            .avg_latency_ms
            .map_or_else(|| "N/A".to_string(), |ms| format!("{:.1}s", ms / 1000.0))
    );
    println!("  {} {}", "Fallback runs:  ".bold(), stats.fallback_runs);
    println!();

    println!("{}", "Outcomes".bold().cyan());
    println!(
        "  Success: {} ({:.0}%)  Failed: {} ({:.0}%)  Transport: {} ({:.0}%)  Cancelled: {} ({:.0}%)",
        o.success,
        o.pct(o.success),
        o.domain_failure,
        o.pct(o.domain_failure),
        o.transport_failure,
        o.pct(o.transport_failure),
        o.cancelled,
        o.pct(o.cancelled),
    );
    println!();

    if !stats.flights.is_empty() {
        println!("{}", "Flights".bold().cyan());
        println!(
            "  {:<24} {:>6} {:>9} {:>12}  Model",
            "Flight", "Runs", "Success", "Avg latency"
        );
        println!("  {}", "-".repeat(68));
        for (i, f) in stats.flights.iter().take(15).enumerate() {
            let line = format!(
                "  {:<24} {:>6} {:>9} {:>12}  {}",
                truncate(&f.flight, 24),
                f.runs,
                f.successes,
                f.avg_latency_ms
                    .map_or_else(|| "N/A".to_string(), |ms| format!("{:.1}s", ms / 1000.0)),
                f.primary_model,
            );
            if i % 2 == 0 {
                println!("{}", line);
            } else {
                println!("{}", line.dimmed());
            }
        }
    }
}

fn print_history_csv(stats: &HistoryStats) {
    println!("flight,runs,successes,avg_latency_ms,primary_model");
    for f in &stats.flights {
        println!(
            "{},{},{},{},{}",
            f.flight,
            f.runs,
            f.successes,
            f.avg_latency_ms.map(|ms| format!("{ms:.0}")).unwrap_or_default(),
            f.primary_model,
        );
    }
}

// ---------------------------------------------------------------------------
// loadplan config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective loadplan Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    if global_exists {
        println!("  {} {}", "✓".green(), "~/.loadplan/config.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            "~/.loadplan/config.toml (not found)".dimmed()
        );
    }
    if project_exists {
        println!("  {} {}", "✓".green(), ".loadplan.toml".dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), ".loadplan.toml (not found)".dimmed());
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "LOADPLAN_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.loadplan/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point loadplan at your backend.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
