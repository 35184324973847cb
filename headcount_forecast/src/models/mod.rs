//! Forecasting models for annual headcount series

use crate::data::Series;
use crate::error::{ForecastError, Result};
use std::fmt::Debug;

/// Forecast result containing predicted values
#[derive(Debug, Clone)]
pub struct ForecastResult {
    /// Forecasted values
    pub(crate) values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
    /// Confidence intervals (optional)
    pub(crate) intervals: Option<Vec<(f64, f64)>>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        Ok(Self {
            values,
            horizons,
            intervals: None,
        })
    }

    /// Create a new forecast result with confidence intervals
    pub fn new_with_intervals(
        values: Vec<f64>,
        horizons: usize,
        intervals: Vec<(f64, f64)>,
    ) -> Result<Self> {
        if values.len() != intervals.len() {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match intervals length ({})",
                values.len(),
                intervals.len()
            )));
        }

        let mut result = Self::new(values, horizons)?;
        result.intervals = Some(intervals);
        Ok(result)
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// Get the confidence intervals, if available
    pub fn intervals(&self) -> Option<&[(f64, f64)]> {
        self.intervals.as_deref()
    }

    /// Whether every value is finite and sits inside its interval
    pub fn is_well_ordered(&self) -> bool {
        match &self.intervals {
            Some(intervals) => self
                .values
                .iter()
                .zip(intervals.iter())
                .all(|(v, (lo, hi))| {
                    v.is_finite() && lo.is_finite() && hi.is_finite() && lo <= v && v <= hi
                }),
            None => false,
        }
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Generate forecast with intervals for future periods
    fn forecast(&self, horizons: usize) -> Result<ForecastResult>;

    /// In-sample fitted values for the training series
    fn predict(&self) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a headcount series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on an annual series
    fn train(&self, series: &Series) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Reject series containing NaN or infinite values
pub(crate) fn ensure_finite(values: &[f64], model: &str) -> Result<()> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::ForecastingError(format!(
            "{} cannot fit non-finite headcount values",
            model
        )));
    }
    Ok(())
}

pub mod arima;
pub mod trend;

pub use arima::{ArimaModel, TrainedArimaModel};
pub use trend::{TrainedTrendModel, TrendModel};
