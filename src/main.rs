use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use loadplan::cli::{self, ExportSource, OutputFormat, RunFormat, RunOptions};
use loadplan::config;
use loadplan::model::{ModelType, SyntheticDataRequest};
use loadplan::web;

#[derive(Debug, Parser)]
#[command(name = "loadplan")]
#[command(about = "Cargo loading optimization dashboard")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List flights the backend can optimize
    Flights,
    /// Run an optimization and print the result dashboard
    Run {
        /// Flight identifier (default: first flight the backend lists)
        #[arg(long)]
        flight: Option<String>,
        /// Loading model (default: run.model from config)
        #[arg(long, value_enum)]
        model: Option<ModelType>,
        /// Location the optimizer must not use; repeatable
        #[arg(long = "restrict", value_name = "LOCATION")]
        restrict: Vec<String>,
        /// Output format: table (default), json, raw
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Generate a synthetic flight on the backend
    Synthetic {
        /// Number of cargo items (1-200)
        #[arg(long, default_value_t = 50)]
        items: u32,
        /// Number of ULDs (1-50)
        #[arg(long, default_value_t = 10)]
        ulds: u32,
        /// Minimum item weight in kg
        #[arg(long, default_value_t = 100.0)]
        min_weight: f64,
        /// Maximum item weight in kg
        #[arg(long, default_value_t = 1000.0)]
        max_weight: f64,
        /// Leave out temperature-controlled (CRT) items
        #[arg(long)]
        no_crt: bool,
        /// Leave out cool (COL) items
        #[arg(long)]
        no_col: bool,
        /// Include dangerous goods
        #[arg(long)]
        dangerous: bool,
        #[arg(long, default_value = "SYN001")]
        flight_number: String,
        #[arg(long, default_value = "AMS")]
        departure: String,
        #[arg(long, default_value = "SIN")]
        arrival: String,
    },
    /// Export a result to a spreadsheet
    Export {
        /// Run this flight and export the result
        #[arg(long, conflicts_with = "result", required_unless_present = "result")]
        flight: Option<String>,
        /// Export a result document saved with `run --format raw`
        #[arg(long)]
        result: Option<PathBuf>,
        /// Target spreadsheet (default: export.spreadsheet_id from config)
        #[arg(long)]
        spreadsheet_id: Option<String>,
        /// Target worksheet (default: export.worksheet_name from config)
        #[arg(long)]
        worksheet: Option<String>,
    },
    /// Show the spreadsheet export service status
    ExportStatus,
    /// Check config, backend reachability and the run log
    Health,
    /// Show the local run history
    History {
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Start the web dashboard
    Web {
        /// Bind address (default: web.bind from config)
        #[arg(long)]
        addr: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default global config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value in the global config, e.g. `backend.base_url`
    Set { key: String, value: String },
    /// Restore the default global config
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let cfg = config::load();

    match app.command {
        Commands::Flights => cli::run_flights(&cfg),
        Commands::Run {
            flight,
            model,
            restrict,
            format,
        } => {
            let opts = RunOptions {
                flight,
                model,
                restrict,
            };
            cli::run_optimization(&cfg, opts, RunFormat::from_str_opt(Some(&format)))
        }
        Commands::Synthetic {
            items,
            ulds,
            min_weight,
            max_weight,
            no_crt,
            no_col,
            dangerous,
            flight_number,
            departure,
            arrival,
        } => {
            let params = SyntheticDataRequest {
                num_items: items,
                num_ulds: ulds,
                weight_range: (min_weight, max_weight),
                include_crt: !no_crt,
                include_col: !no_col,
                include_dangerous: dangerous,
                flight_number,
                departure_airport: departure,
                arrival_airport: arrival,
            };
            cli::run_synthetic(&cfg, &params)
        }
        Commands::Export {
            flight,
            result,
            spreadsheet_id,
            worksheet,
        } => {
            let source = match (flight, result) {
                (_, Some(path)) => ExportSource::ResultFile(path),
                (Some(flight), None) => ExportSource::Flight(flight),
                (None, None) => anyhow::bail!("pass --flight or --result"),
            };
            cli::run_export(
                &cfg,
                source,
                spreadsheet_id.as_deref(),
                worksheet.as_deref(),
            )
        }
        Commands::ExportStatus => cli::run_export_status(&cfg),
        Commands::Health => cli::run_health(),
        Commands::History { days, format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_history(&cfg, fmt, days)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
        Commands::Web { addr } => {
            let addr = addr.unwrap_or_else(|| cfg.web.bind.clone());
            web::serve(&addr, &cfg)
        }
    }
}
