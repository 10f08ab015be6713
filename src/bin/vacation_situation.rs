//! Prints the vacation situation of a contract as JSON.
//!
//! ```text
//! vacation_situation request.json --config ./config/epas
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use epas_engine::config::ConfigLoader;
use epas_engine::error::{EngineError, EngineResult};
use epas_engine::requests::VacationSituationRequest;
use epas_engine::telemetry::init_tracing;

/// Vacation and law permission situation of a contract.
#[derive(Parser)]
#[command(name = "vacation_situation", version, about, long_about = None)]
struct Cli {
    /// JSON request file.
    request: PathBuf,

    /// Directory with office.yaml, absence_types.yaml and groups.yaml.
    #[arg(short, long, default_value = "./config/epas")]
    config: PathBuf,

    /// Print the report on one line.
    #[arg(long)]
    compact: bool,
}

fn run(cli: &Cli) -> EngineResult<String> {
    let loader = ConfigLoader::load(&cli.config)?;
    let source_name = cli.request.display().to_string();
    let json = std::fs::read_to_string(&cli.request).map_err(|e| EngineError::InvalidRequest {
        source_name: source_name.clone(),
        message: e.to_string(),
    })?;
    let request = VacationSituationRequest::from_json(&json, &source_name)?;
    let report = request.evaluate(loader.config())?;

    let rendered = if cli.compact {
        serde_json::to_string(&report)
    } else {
        serde_json::to_string_pretty(&report)
    };
    rendered.map_err(|e| EngineError::CalculationError {
        message: format!("report serialization failed: {}", e),
    })
}

fn main() -> ExitCode {
    init_tracing("warn");
    let cli = Cli::parse();

    match run(&cli) {
        Ok(report) => {
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "vacation situation failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
