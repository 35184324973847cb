//! Forecast engine: primary trend model with an ARIMA fallback

use crate::config::{PlannerConfig, MAX_HORIZON};
use crate::data::Series;
use crate::error::{ForecastError, Result};
use crate::models::{ArimaModel, ForecastModel, ForecastResult, TrainedForecastModel, TrendModel};
use crate::table::ForecastRow;
use crate::utils::{forecast_accuracy, future_years, ForecastAccuracy};
use std::fmt;
use tracing::{info, warn};

/// Which stage produced a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelUsed {
    Primary,
    Fallback,
}

impl fmt::Display for ModelUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelUsed::Primary => write!(f, "primary"),
            ModelUsed::Fallback => write!(f, "fallback"),
        }
    }
}

/// Outcome of one forecast request
#[derive(Debug, Clone)]
pub struct ForecastRun {
    /// One row per future year, in order
    pub rows: Vec<ForecastRow>,
    /// Stage that produced the rows
    pub model_used: ModelUsed,
    /// Name of the model that produced the rows
    pub model_name: String,
    /// Reason the primary model was abandoned, if it was
    pub warning: Option<String>,
    /// In-sample fit of the producing model
    pub accuracy: Option<ForecastAccuracy>,
}

/// A model's forecast together with its in-sample fit
struct StageOutput {
    result: ForecastResult,
    model_name: String,
    accuracy: Option<ForecastAccuracy>,
}

/// Two-stage forecaster over an annual series
#[derive(Debug, Clone)]
pub struct ForecastEngine<P = TrendModel, F = ArimaModel> {
    primary: P,
    fallback: F,
    max_horizon: usize,
}

impl ForecastEngine {
    /// Trend model and ARIMA(1,1,0) configured from planner settings
    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        config.validate()?;

        let primary = TrendModel::new()
            .with_changepoints(config.n_changepoints)
            .with_changepoint_range(config.changepoint_range)
            .with_changepoint_prior_scale(config.changepoint_prior_scale)
            .with_interval_width(config.interval_width)
            .with_uncertainty_samples(config.uncertainty_samples)
            .with_seed(config.seed);
        let fallback = ArimaModel::fallback().with_alpha(config.fallback_alpha)?;

        Ok(ForecastEngine::new(primary, fallback).with_max_horizon(config.max_horizon))
    }
}

impl Default for ForecastEngine {
    fn default() -> Self {
        ForecastEngine::new(TrendModel::new(), ArimaModel::fallback())
    }
}

impl<P: ForecastModel, F: ForecastModel> ForecastEngine<P, F> {
    /// Create an engine from a primary and a fallback model
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary,
            fallback,
            max_horizon: MAX_HORIZON,
        }
    }

    /// Set the largest accepted horizon
    pub fn with_max_horizon(mut self, max_horizon: usize) -> Self {
        self.max_horizon = max_horizon;
        self
    }

    /// Largest accepted horizon
    pub fn max_horizon(&self) -> usize {
        self.max_horizon
    }

    /// Forecast `horizon` years after the last observed year.
    ///
    /// A primary failure is logged and answered by the fallback model. A
    /// fallback failure ends the request with [`ForecastError::FallbackFailed`].
    pub fn forecast(&self, series: &Series, horizon: usize) -> Result<ForecastRun> {
        let last_year = series.last_year().ok_or_else(|| ForecastError::InsufficientData {
            department: series.department().to_string(),
            region: series.region().to_string(),
            reason: "no historical rows".to_string(),
        })?;

        if horizon == 0 || horizon > self.max_horizon {
            return Err(ForecastError::InvalidParameter(format!(
                "Horizon must be between 1 and {} years, got {}",
                self.max_horizon, horizon
            )));
        }

        let (output, model_used, warning) = match self.fit_primary(series, horizon) {
            Ok(output) => (output, ModelUsed::Primary, None),
            Err(primary_err) => {
                warn!(
                    department = series.department(),
                    region = series.region(),
                    error = %primary_err,
                    "primary model failed, falling back to {}",
                    self.fallback.name()
                );
                let output = self.fit_fallback(series, horizon).map_err(|fallback_err| {
                    ForecastError::FallbackFailed {
                        primary: primary_err.to_string(),
                        fallback: fallback_err.to_string(),
                    }
                })?;
                let warning = format!(
                    "{} failed, falling back to {}. Error: {}",
                    self.primary.name(),
                    self.fallback.name(),
                    primary_err
                );
                (output, ModelUsed::Fallback, Some(warning))
            }
        };

        let years = future_years(last_year, horizon)?;
        let intervals = output.result.intervals().ok_or_else(|| {
            ForecastError::ForecastingError("Forecast has no intervals".to_string())
        })?;

        let rows: Vec<ForecastRow> = years
            .iter()
            .zip(output.result.values().iter())
            .zip(intervals.iter())
            .map(|((year, value), (lower, upper))| ForecastRow {
                department: series.department().to_string(),
                region: series.region().to_string(),
                year: *year,
                forecast_headcount: *value,
                lower: *lower,
                upper: *upper,
            })
            .collect();

        info!(
            department = series.department(),
            region = series.region(),
            horizon,
            model = %output.model_name,
            "forecast complete"
        );

        Ok(ForecastRun {
            rows,
            model_used,
            model_name: output.model_name,
            warning,
            accuracy: output.accuracy,
        })
    }

    fn fit_primary(&self, series: &Series, horizon: usize) -> Result<StageOutput> {
        run_stage(&self.primary, series, horizon)
    }

    fn fit_fallback(&self, series: &Series, horizon: usize) -> Result<StageOutput> {
        run_stage(&self.fallback, series, horizon)
    }
}

/// Train, forecast, and check one model's output
fn run_stage<M: ForecastModel>(model: &M, series: &Series, horizon: usize) -> Result<StageOutput> {
    let trained = model.train(series)?;
    let result = trained.forecast(horizon)?;

    if result.horizons() != horizon {
        return Err(ForecastError::ForecastingError(format!(
            "{} returned {} periods instead of {}",
            trained.name(),
            result.horizons(),
            horizon
        )));
    }
    if !result.is_well_ordered() {
        return Err(ForecastError::ForecastingError(format!(
            "{} returned values outside their intervals",
            trained.name()
        )));
    }

    let accuracy = trained
        .predict()
        .and_then(|fitted| forecast_accuracy(fitted.values(), &series.values()))
        .ok();

    Ok(StageOutput {
        result,
        model_name: trained.name().to_string(),
        accuracy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retail_west() -> Series {
        Series::new(
            "Retail",
            "West",
            vec![(2019, 100.0), (2020, 105.0), (2021, 110.0), (2022, 108.0), (2023, 115.0)],
        )
    }

    #[test]
    fn test_primary_path_is_used_for_healthy_series() {
        let run = ForecastEngine::default().forecast(&retail_west(), 2).unwrap();
        assert_eq!(run.model_used, ModelUsed::Primary);
        assert!(run.warning.is_none());
        assert_eq!(run.rows.len(), 2);
        assert!(run.accuracy.is_some());
    }

    #[test]
    fn test_empty_series_is_insufficient_data() {
        let series = Series::new("Retail", "North", Vec::new());
        let err = ForecastEngine::default().forecast(&series, 2).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { .. }));
    }

    #[test]
    fn test_horizon_bounds() {
        let engine = ForecastEngine::default();
        assert!(engine.forecast(&retail_west(), 0).is_err());
        assert!(engine.forecast(&retail_west(), 6).is_err());
        assert!(engine.forecast(&retail_west(), 5).is_ok());
    }

    #[test]
    fn test_single_point_fails_both_stages() {
        let series = Series::new("Retail", "West", vec![(2023, 100.0)]);
        let err = ForecastEngine::default().forecast(&series, 1).unwrap_err();
        assert!(matches!(err, ForecastError::FallbackFailed { .. }));
    }

    #[test]
    fn test_model_used_display() {
        assert_eq!(ModelUsed::Primary.to_string(), "primary");
        assert_eq!(ModelUsed::Fallback.to_string(), "fallback");
    }
}
