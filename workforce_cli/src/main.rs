// src/main.rs

mod cli;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Command};
use headcount_forecast::{ForecastRow, ForecastTable, Planner, PlannerConfig};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!(input = %config.input_path().display(), output = %config.output_path.display(), "startup");

    if let Command::Show { department, region } = &args.command {
        let rows = stored_rows(&config.output_path, department.as_deref(), region.as_deref())
            .with_context(|| format!("reading {}", config.output_path.display()))?;
        if rows.is_empty() {
            println!("No stored forecasts");
        } else {
            print!("{}", render::forecast_table(&rows));
        }
        return Ok(());
    }

    let planner = Planner::from_config(&config)
        .with_context(|| format!("loading {}", config.input_path().display()))?;

    match args.command {
        Command::Departments => {
            for department in planner.data().departments() {
                println!("{}", department);
            }
        }
        Command::Regions => {
            for region in planner.data().regions() {
                println!("{}", region);
            }
        }
        Command::History { department, region } => {
            let series = planner.history(&department, &region);
            if series.is_empty() {
                println!("No history for {} ({})", department, region);
            } else {
                print!("{}", render::history_table(&series));
            }
        }
        Command::Forecast {
            department,
            region,
            horizon,
        } => {
            let horizon = horizon.map(usize::from).unwrap_or(config.default_horizon);
            let run = planner
                .run_forecast(&department, &region, horizon)
                .with_context(|| format!("forecasting {} ({})", department, region))?;

            if let Some(warning) = &run.warning {
                eprintln!("WARNING: {}", warning);
            }
            print!("{}", render::run_summary(&run, horizon));
            println!("Forecast saved to {}", planner.output_path().display());
        }
        // Served above from the forecast table alone
        Command::Show { .. } => {}
    }

    Ok(())
}

/// Defaults, then the config file, then command-line paths
fn load_config(args: &Args) -> Result<PlannerConfig> {
    let mut config = match &args.config {
        Some(path) => PlannerConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PlannerConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(output) = &args.output {
        config.output_path = output.clone();
    }
    Ok(config)
}

/// Stored forecast rows, optionally narrowed to one department and/or region.
/// Reads only the forecast table; the historical dataset is not needed.
fn stored_rows(
    output: &Path,
    department: Option<&str>,
    region: Option<&str>,
) -> headcount_forecast::Result<Vec<ForecastRow>> {
    let table = ForecastTable::load(output)?;
    Ok(table
        .rows()
        .iter()
        .filter(|row| department.map_or(true, |d| row.department == d))
        .filter(|row| region.map_or(true, |r| row.region == r))
        .cloned()
        .collect())
}
