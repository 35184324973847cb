//! Planner configuration

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Largest horizon, in years, that a forecast may request
pub const MAX_HORIZON: usize = 5;

/// Settings for data locations and the forecasting models.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Directory holding the historical dataset
    pub data_dir: PathBuf,
    /// File name of the historical dataset inside `data_dir`
    pub input_file: String,
    /// Forecast table that runs are merged into
    pub output_path: PathBuf,
    /// Horizon used when none is given
    pub default_horizon: usize,
    /// Upper bound on the requested horizon
    pub max_horizon: usize,
    /// Interval width of the trend model
    pub interval_width: f64,
    /// Significance level of the ARIMA fallback interval
    pub fallback_alpha: f64,
    /// Maximum number of trend changepoints
    pub n_changepoints: usize,
    /// Share of the history eligible for changepoints
    pub changepoint_range: f64,
    /// Prior scale on trend rate changes
    pub changepoint_prior_scale: f64,
    /// Simulated trajectories behind the trend interval
    pub uncertainty_samples: usize,
    /// Seed for the trend simulation
    pub seed: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            input_file: "workforce_data.csv".to_string(),
            output_path: PathBuf::from("forecast.csv"),
            default_horizon: 3,
            max_horizon: MAX_HORIZON,
            interval_width: 0.95,
            fallback_alpha: 0.05,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            uncertainty_samples: 1000,
            seed: 0,
        }
    }
}

impl PlannerConfig {
    /// Load a JSON config file, falling back to defaults for missing keys
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Path of the historical dataset
    pub fn input_path(&self) -> PathBuf {
        self.data_dir.join(&self.input_file)
    }

    /// Check ranges of every setting
    pub fn validate(&self) -> Result<()> {
        if self.max_horizon == 0 || self.max_horizon > MAX_HORIZON {
            return Err(ForecastError::InvalidParameter(format!(
                "max_horizon must be between 1 and {}",
                MAX_HORIZON
            )));
        }
        self.check_horizon(self.default_horizon)?;
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(
                "interval_width must be between 0 and 1".to_string(),
            ));
        }
        if !(self.fallback_alpha > 0.0 && self.fallback_alpha < 1.0) {
            return Err(ForecastError::InvalidParameter(
                "fallback_alpha must be between 0 and 1".to_string(),
            ));
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::InvalidParameter(
                "changepoint_range must be in (0, 1]".to_string(),
            ));
        }
        if !(self.changepoint_prior_scale > 0.0) {
            return Err(ForecastError::InvalidParameter(
                "changepoint_prior_scale must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Check a requested horizon against `1..=max_horizon`
    pub fn check_horizon(&self, horizon: usize) -> Result<()> {
        if horizon == 0 || horizon > self.max_horizon {
            return Err(ForecastError::InvalidParameter(format!(
                "Horizon must be between 1 and {} years, got {}",
                self.max_horizon, horizon
            )));
        }
        Ok(())
    }
}
