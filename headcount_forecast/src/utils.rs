//! Utility functions for the headcount_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Months, NaiveDate};
use statrs::distribution::{ContinuousCDF, Normal};

/// January 1 of the given year
pub fn year_to_date(year: i32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| ForecastError::DataError(format!("Year out of range: {}", year)))
}

/// Calendar year of a date
pub fn date_to_year(date: NaiveDate) -> i32 {
    date.year()
}

/// Consecutive future years after `last_year`, stepped as year-start dates
pub fn future_years(last_year: i32, horizon: usize) -> Result<Vec<i32>> {
    let mut years = Vec::with_capacity(horizon);
    let mut current = year_to_date(last_year)?;

    for _ in 0..horizon {
        current = current.checked_add_months(Months::new(12)).ok_or_else(|| {
            ForecastError::DataError(format!("Cannot step past {}", current))
        })?;
        years.push(date_to_year(current));
    }

    Ok(years)
}

/// Two-sided standard normal critical value for the given confidence level
pub fn normal_critical_value(confidence_level: f64) -> Result<f64> {
    if confidence_level <= 0.0 || confidence_level >= 1.0 {
        return Err(ForecastError::InvalidParameter(
            "Confidence level must be between 0 and 1".to_string(),
        ));
    }

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| ForecastError::ForecastingError(e.to_string()))?;
    Ok(normal.inverse_cdf(0.5 + confidence_level / 2.0))
}

/// Linear-interpolated quantile of already sorted values
pub fn sorted_quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }

    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Calculate accuracy metrics for a forecast vs actual values
pub fn forecast_accuracy(forecast: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(ForecastError::ValidationError(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    let n = forecast.len() as f64;

    let errors: Vec<f64> = forecast
        .iter()
        .zip(actual.iter())
        .map(|(&f, &a)| a - f)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;
    let rmse = mse.sqrt();

    // Zero actuals are skipped but still count towards n
    let mape = actual
        .iter()
        .zip(errors.iter())
        .filter(|(a, _)| **a != 0.0)
        .map(|(a, e)| (e.abs() / a.abs()) * 100.0)
        .sum::<f64>()
        / n;

    let smape = actual
        .iter()
        .zip(forecast.iter())
        .map(|(&a, &f)| {
            let denom = a.abs() + f.abs();
            if denom == 0.0 {
                0.0
            } else {
                200.0 * (a - f).abs() / denom
            }
        })
        .sum::<f64>()
        / n;

    Ok(ForecastAccuracy {
        mae,
        mse,
        rmse,
        mape,
        smape,
    })
}

/// Forecast accuracy metrics
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error
    pub mape: f64,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
}

impl std::fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "In-sample fit:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  MAPE:  {:.4}%", self.mape)?;
        writeln!(f, "  SMAPE: {:.4}%", self.smape)?;
        Ok(())
    }
}
