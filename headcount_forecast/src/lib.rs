//! # Headcount Forecast
//!
//! Short-horizon workforce headcount forecasting per department and region.
//!
//! ## Features
//!
//! - Historical headcount loading and per department/region series selection
//! - Additive piecewise-linear trend model with simulated forecast intervals
//! - ARIMA(1,1,0) fallback when the trend model cannot fit or forecast
//! - Forecast table that keeps only the latest run for each department/region
//!
//! ## Quick Start
//!
//! ```no_run
//! use headcount_forecast::{Planner, PlannerConfig};
//!
//! let config = PlannerConfig::default();
//! let planner = Planner::from_config(&config)?;
//!
//! let run = planner.run_forecast("Retail", "West", 3)?;
//! if let Some(warning) = &run.warning {
//!     eprintln!("{}", warning);
//! }
//! for row in &run.rows {
//!     println!("{} {:.1} [{:.1}, {:.1}]", row.year, row.forecast_headcount, row.lower, row.upper);
//! }
//! # Ok::<(), headcount_forecast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod models;
pub mod planner;
pub mod table;
pub mod utils;

// Re-export commonly used types
pub use crate::config::PlannerConfig;
pub use crate::data::{DataLoader, HistoricalRecord, Series, WorkforceData};
pub use crate::engine::{ForecastEngine, ForecastRun, ModelUsed};
pub use crate::error::{ForecastError, Result};
pub use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
pub use crate::planner::Planner;
pub use crate::table::{ForecastRow, ForecastTable};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
