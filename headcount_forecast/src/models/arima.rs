//! ARIMA models for annual headcount forecasting

use crate::data::Series;
use crate::error::{ForecastError, Result};
use crate::models::{ensure_finite, ForecastModel, ForecastResult, TrainedForecastModel};
use crate::utils::normal_critical_value;
use tracing::debug;

/// AR coefficients are kept strictly inside the stationary region
const MAX_AR_COEFFICIENT: f64 = 0.999;

/// ARIMA model (AutoRegressive Integrated Moving Average)
///
/// Only pure AR parts of order 0 or 1 are supported, which covers the
/// (1, 1, 0) order used as the fallback forecaster.
#[derive(Debug, Clone)]
pub struct ArimaModel {
    /// Name of the model
    name: String,
    /// AR order (p)
    p: usize,
    /// Differencing order (d)
    d: usize,
    /// MA order (q)
    q: usize,
    /// Significance level of the forecast interval
    alpha: f64,
}

/// Trained ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedArimaModel {
    /// Name of the model
    name: String,
    /// Differencing order (d)
    d: usize,
    /// Fitted AR coefficient (zero when p = 0)
    phi: f64,
    /// Mean of the differenced series (only estimated when d = 0)
    mean: f64,
    /// Innovation variance
    sigma2: f64,
    /// Significance level of the forecast interval
    alpha: f64,
    /// Original observations
    historical_data: Vec<f64>,
    /// Series at each differencing level, level 0 being the original
    levels: Vec<Vec<f64>>,
    /// Residuals of the differenced series
    residuals: Vec<f64>,
}

impl ArimaModel {
    /// Create a new ARIMA model
    pub fn new(p: usize, d: usize, q: usize) -> Result<Self> {
        if p > 1 || q != 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "ARIMA({},{},{}) is not supported; use p <= 1 and q = 0",
                p, d, q
            )));
        }

        Ok(Self {
            name: format!("ARIMA({},{},{})", p, d, q),
            p,
            d,
            q,
            alpha: 0.05,
        })
    }

    /// The (1, 1, 0) model used when the trend model fails
    pub fn fallback() -> Self {
        Self {
            name: "ARIMA(1,1,0)".to_string(),
            p: 1,
            d: 1,
            q: 0,
            alpha: 0.05,
        }
    }

    /// Set the significance level of the forecast interval
    pub fn with_alpha(mut self, alpha: f64) -> Result<Self> {
        if alpha <= 0.0 || alpha >= 1.0 {
            return Err(ForecastError::InvalidParameter(
                "Alpha must be between 0 and 1".to_string(),
            ));
        }
        self.alpha = alpha;
        Ok(self)
    }

    /// (p, d, q) order
    pub fn order(&self) -> (usize, usize, usize) {
        (self.p, self.d, self.q)
    }
}

impl ForecastModel for ArimaModel {
    type Trained = TrainedArimaModel;

    fn train(&self, series: &Series) -> Result<TrainedArimaModel> {
        let values = series.values();
        if values.len() < self.d + 1 {
            return Err(ForecastError::ForecastingError(format!(
                "Insufficient data for {}. Need at least {} observations.",
                self.name,
                self.d + 1
            )));
        }
        ensure_finite(&values, &self.name)?;

        let mut levels = vec![values.clone()];
        for _ in 0..self.d {
            let prev = &levels[levels.len() - 1];
            let next: Vec<f64> = prev.windows(2).map(|w| w[1] - w[0]).collect();
            levels.push(next);
        }
        let diffed = &levels[self.d];

        let mean = if self.d == 0 {
            diffed.iter().sum::<f64>() / diffed.len() as f64
        } else {
            0.0
        };
        let centered: Vec<f64> = diffed.iter().map(|x| x - mean).collect();

        // Conditional least squares for the AR(1) coefficient
        let phi = if self.p == 1 && centered.len() >= 2 {
            let num: f64 = centered.windows(2).map(|w| w[0] * w[1]).sum();
            let den: f64 = centered[..centered.len() - 1].iter().map(|x| x * x).sum();
            if den > f64::EPSILON {
                (num / den).clamp(-MAX_AR_COEFFICIENT, MAX_AR_COEFFICIENT)
            } else {
                0.0
            }
        } else {
            0.0
        };

        // First innovation is conditioned on a zero pre-sample value
        let residuals: Vec<f64> = centered
            .iter()
            .enumerate()
            .map(|(i, x)| if i == 0 { *x } else { x - phi * centered[i - 1] })
            .collect();
        let sigma2 = residuals.iter().map(|e| e * e).sum::<f64>() / residuals.len() as f64;

        debug!(
            department = series.department(),
            region = series.region(),
            phi,
            sigma2,
            model = %self.name,
            "fitted ARIMA model"
        );

        Ok(TrainedArimaModel {
            name: self.name.clone(),
            d: self.d,
            phi,
            mean,
            sigma2,
            alpha: self.alpha,
            historical_data: values,
            levels,
            residuals,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedArimaModel {
    /// Fitted AR coefficient
    pub fn ar_coefficient(&self) -> f64 {
        self.phi
    }

    /// Innovation variance
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Psi weights of the integrated process, used for forecast variance
    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        // Expand (1 - phi B)(1 - B)^d
        let mut poly = vec![1.0, -self.phi];
        for _ in 0..self.d {
            let mut next = vec![0.0; poly.len() + 1];
            for (i, c) in poly.iter().enumerate() {
                next[i] += c;
                next[i + 1] -= c;
            }
            poly = next;
        }

        let mut psi = Vec::with_capacity(horizon);
        psi.push(1.0);
        for j in 1..horizon {
            let value: f64 = (1..poly.len())
                .filter(|i| *i <= j)
                .map(|i| -poly[i] * psi[j - i])
                .sum();
            psi.push(value);
        }
        psi
    }
}

impl TrainedForecastModel for TrainedArimaModel {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        if self.historical_data.is_empty() {
            return Err(ForecastError::ForecastingError(
                "Model has not been fitted to data".to_string(),
            ));
        }
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Horizon must be at least 1".to_string(),
            ));
        }

        // AR recursion on the differenced scale
        let diffed = &self.levels[self.d];
        let mut last = diffed[diffed.len() - 1] - self.mean;
        let mut forecasts: Vec<f64> = (0..horizon)
            .map(|_| {
                last *= self.phi;
                last + self.mean
            })
            .collect();

        // Integrate back up to the original scale
        for level in self.levels[..self.d].iter().rev() {
            let mut running = level[level.len() - 1];
            forecasts = forecasts
                .iter()
                .map(|step| {
                    running += step;
                    running
                })
                .collect();
        }

        let z = normal_critical_value(1.0 - self.alpha)?;
        let psi = self.psi_weights(horizon);
        let mut cumulative = 0.0;
        let intervals: Vec<(f64, f64)> = forecasts
            .iter()
            .zip(psi.iter())
            .map(|(mean, w)| {
                cumulative += w * w;
                let margin = z * (self.sigma2 * cumulative).sqrt();
                (mean - margin, mean + margin)
            })
            .collect();

        ForecastResult::new_with_intervals(forecasts, horizon, intervals)
    }

    fn predict(&self) -> Result<ForecastResult> {
        // One-step-ahead fits; the first d points have no prediction
        let predictions: Vec<f64> = self
            .historical_data
            .iter()
            .enumerate()
            .map(|(i, y)| {
                if i < self.d {
                    *y
                } else {
                    y - self.residuals[i - self.d]
                }
            })
            .collect();

        let n = predictions.len();
        ForecastResult::new(predictions, n)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
