// src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Workforce headcount planning and forecasting", long_about = None)]
pub struct Args {
    /// JSON config file; missing keys use defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding workforce_data.csv
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Forecast table to merge results into
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List departments in the historical data
    Departments,

    /// List regions in the historical data
    Regions,

    /// Show the historical headcount of one department/region
    History {
        #[arg(short, long)]
        department: String,

        #[arg(short, long)]
        region: String,
    },

    /// Forecast one department/region and save the result
    Forecast {
        #[arg(short, long)]
        department: String,

        #[arg(short, long)]
        region: String,

        /// Years to forecast (1-5); defaults to the configured horizon
        #[arg(short = 'H', long, value_parser = clap::value_parser!(u8).range(1..=5))]
        horizon: Option<u8>,
    },

    /// Show stored forecasts
    Show {
        #[arg(short, long)]
        department: Option<String>,

        #[arg(short, long)]
        region: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_arguments() {
        let args = Args::try_parse_from([
            "workforce", "forecast", "-d", "Retail", "-r", "West", "-H", "2",
        ])
        .unwrap();
        match args.command {
            Command::Forecast {
                department,
                region,
                horizon,
            } => {
                assert_eq!(department, "Retail");
                assert_eq!(region, "West");
                assert_eq!(horizon, Some(2));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_horizon_is_bounded() {
        let result = Args::try_parse_from([
            "workforce", "forecast", "-d", "Retail", "-r", "West", "-H", "6",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_paths_after_subcommand() {
        let args =
            Args::try_parse_from(["workforce", "show", "--output", "out/forecast.csv"]).unwrap();
        assert_eq!(args.output, Some(PathBuf::from("out/forecast.csv")));
    }

    #[test]
    fn test_command_tree_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
