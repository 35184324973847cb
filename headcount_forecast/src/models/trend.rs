//! Additive piecewise-linear trend model with seasonality disabled
//!
//! The trend is `k * t + m` plus a rate change `delta_j` after each
//! potential changepoint `s_j`, with time scaled to `[0, 1]` over the history
//! and values scaled by the largest absolute observation. Rate changes get a
//! Gaussian prior, so the fit is a small penalised least-squares problem.
//!
//! Forecast intervals come from simulation: future changepoints arrive at the
//! same rate as in the history, their rate changes are Laplace distributed
//! with the mean absolute fitted change as scale, and Gaussian observation
//! noise is added on top.

use crate::data::Series;
use crate::error::{ForecastError, Result};
use crate::models::{ensure_finite, ForecastModel, ForecastResult, TrainedForecastModel};
use crate::utils::sorted_quantile;
use chrono::{Months, NaiveDate};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal, Poisson};
use tracing::debug;

/// Smallest spread of time values accepted for a line fit
const MIN_TIME_SPREAD: f64 = 1e-12;

/// Untrained trend model configuration
#[derive(Debug, Clone)]
pub struct TrendModel {
    /// Name of the model
    name: String,
    /// Maximum number of potential changepoints
    n_changepoints: usize,
    /// Share of the history in which changepoints may be placed
    changepoint_range: f64,
    /// Prior scale on rate changes
    changepoint_prior_scale: f64,
    /// Width of the forecast interval
    interval_width: f64,
    /// Number of simulated trajectories for intervals
    uncertainty_samples: usize,
    /// RNG seed for the simulation
    seed: u64,
}

/// Fitted trend model
#[derive(Debug, Clone)]
pub struct TrainedTrendModel {
    name: String,
    /// Date of the first observation
    start: NaiveDate,
    /// Date of the last observation
    end: NaiveDate,
    /// Length of the history in days
    t_scale: f64,
    /// Value scale
    y_scale: f64,
    /// Scaled time of each observation
    t_hist: Vec<f64>,
    /// Changepoint locations in scaled time
    changepoints: Vec<f64>,
    /// Base growth rate
    k: f64,
    /// Offset
    m: f64,
    /// Rate changes at each changepoint
    delta: Vec<f64>,
    /// Observation noise in scaled units
    sigma_obs: f64,
    interval_width: f64,
    uncertainty_samples: usize,
    seed: u64,
}

impl Default for TrendModel {
    fn default() -> Self {
        Self {
            name: "Additive trend".to_string(),
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            interval_width: 0.95,
            uncertainty_samples: 1000,
            seed: 0,
        }
    }
}

impl TrendModel {
    /// Create a trend model with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_changepoints(mut self, n: usize) -> Self {
        self.n_changepoints = n;
        self
    }

    pub fn with_changepoint_range(mut self, range: f64) -> Self {
        self.changepoint_range = range;
        self
    }

    pub fn with_changepoint_prior_scale(mut self, scale: f64) -> Self {
        self.changepoint_prior_scale = scale;
        self
    }

    pub fn with_interval_width(mut self, width: f64) -> Self {
        self.interval_width = width;
        self
    }

    pub fn with_uncertainty_samples(mut self, samples: usize) -> Self {
        self.uncertainty_samples = samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check that the settings are usable
    pub fn validate(&self) -> Result<()> {
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::InvalidParameter(
                "Changepoint range must be in (0, 1]".to_string(),
            ));
        }
        if !(self.changepoint_prior_scale > 0.0 && self.changepoint_prior_scale.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "Changepoint prior scale must be positive".to_string(),
            ));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(
                "Interval width must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Evenly spaced changepoints over the first part of the history
    fn select_changepoints(&self, t_hist: &[f64]) -> Vec<f64> {
        let hist_size = (t_hist.len() as f64 * self.changepoint_range).floor() as usize;
        let n = if self.n_changepoints + 1 > hist_size {
            hist_size.saturating_sub(1)
        } else {
            self.n_changepoints
        };
        if n == 0 {
            return Vec::new();
        }

        let last = (hist_size - 1) as f64;
        (1..=n)
            .map(|i| {
                let idx = (last * i as f64 / n as f64).round() as usize;
                t_hist[idx]
            })
            .collect()
    }
}

impl ForecastModel for TrendModel {
    type Trained = TrainedTrendModel;

    fn train(&self, series: &Series) -> Result<TrainedTrendModel> {
        self.validate()?;

        let values = series.values();
        if values.len() < 2 {
            return Err(ForecastError::ForecastingError(format!(
                "{} needs at least 2 observations, got {}",
                self.name,
                values.len()
            )));
        }
        ensure_finite(&values, &self.name)?;

        let dates = series.dates()?;
        let start = dates[0];
        let end = dates[dates.len() - 1];
        let t_scale = (end - start).num_days() as f64;
        if t_scale <= 0.0 {
            return Err(ForecastError::ForecastingError(format!(
                "{} needs observations from at least 2 distinct years",
                self.name
            )));
        }

        let t_hist: Vec<f64> = dates
            .iter()
            .map(|d| (*d - start).num_days() as f64 / t_scale)
            .collect();

        let y_scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };
        let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

        let changepoints = self.select_changepoints(&t_hist);

        // Noise level of a plain line sets the strength of the prior
        let (k0, m0) = ols_line(&t_hist, &y)?;
        let line_var = t_hist
            .iter()
            .zip(y.iter())
            .map(|(t, v)| (v - (k0 * t + m0)).powi(2))
            .sum::<f64>()
            / y.len() as f64;
        let penalty = line_var.max(1e-6) / self.changepoint_prior_scale.powi(2);

        let params = solve_trend(&t_hist, &y, &changepoints, penalty)?;
        let k = params[0];
        let m = params[1];
        let delta = params[2..].to_vec();

        let sigma_obs = (t_hist
            .iter()
            .zip(y.iter())
            .map(|(t, v)| (v - trend_at(*t, k, m, &changepoints, &delta)).powi(2))
            .sum::<f64>()
            / y.len() as f64)
            .sqrt();

        debug!(
            department = series.department(),
            region = series.region(),
            k,
            m,
            changepoints = changepoints.len(),
            sigma_obs,
            "fitted trend model"
        );

        Ok(TrainedTrendModel {
            name: self.name.clone(),
            start,
            end,
            t_scale,
            y_scale,
            t_hist,
            changepoints,
            k,
            m,
            delta,
            sigma_obs,
            interval_width: self.interval_width,
            uncertainty_samples: self.uncertainty_samples,
            seed: self.seed,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedTrendModel {
    /// Growth rate at the end of the history, in headcount per year
    pub fn final_rate(&self) -> f64 {
        let rate = self.k + self.delta.iter().sum::<f64>();
        rate * self.y_scale * 365.25 / self.t_scale
    }

    /// Number of changepoints used in the fit
    pub fn changepoint_count(&self) -> usize {
        self.changepoints.len()
    }

    /// Scaled time of each future year-start date
    fn future_times(&self, horizon: usize) -> Result<Vec<f64>> {
        let mut times = Vec::with_capacity(horizon);
        let mut current = self.end;
        for _ in 0..horizon {
            current = current.checked_add_months(Months::new(12)).ok_or_else(|| {
                ForecastError::ForecastingError(format!("Cannot step past {}", current))
            })?;
            times.push((current - self.start).num_days() as f64 / self.t_scale);
        }
        Ok(times)
    }

    /// Simulated (lower, upper) bounds in scaled units
    fn simulate_intervals(&self, times: &[f64]) -> Result<Vec<(f64, f64)>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let t_max = times.iter().cloned().fold(1.0_f64, f64::max);
        let n_hist_changes = self.changepoints.len() as f64;
        let laplace_scale =
            self.delta.iter().map(|d| d.abs()).sum::<f64>() / n_hist_changes.max(1.0) + 1e-8;

        let change_rate = n_hist_changes * (t_max - 1.0);
        let poisson = if change_rate > 0.0 {
            Some(Poisson::new(change_rate).map_err(|e| ForecastError::ForecastingError(e.to_string()))?)
        } else {
            None
        };
        let exp = Exp::new(1.0 / laplace_scale)
            .map_err(|e| ForecastError::ForecastingError(e.to_string()))?;
        let noise = Normal::new(0.0, self.sigma_obs)
            .map_err(|e| ForecastError::ForecastingError(e.to_string()))?;

        let mut samples: Vec<Vec<f64>> = vec![Vec::with_capacity(self.uncertainty_samples); times.len()];

        for _ in 0..self.uncertainty_samples {
            let n_changes = match &poisson {
                Some(p) => p.sample(&mut rng) as usize,
                None => 0,
            };
            let new_changes: Vec<(f64, f64)> = (0..n_changes)
                .map(|_| {
                    let at = rng.gen_range(1.0..t_max);
                    let size = exp.sample(&mut rng);
                    let size = if rng.gen::<bool>() { size } else { -size };
                    (at, size)
                })
                .collect();

            for (i, &t) in times.iter().enumerate() {
                let extra: f64 = new_changes
                    .iter()
                    .filter(|(at, _)| t >= *at)
                    .map(|(at, size)| (t - at) * size)
                    .sum();
                let base = trend_at(t, self.k, self.m, &self.changepoints, &self.delta);
                samples[i].push(base + extra + noise.sample(&mut rng));
            }
        }

        let lower_q = (1.0 - self.interval_width) / 2.0;
        let upper_q = (1.0 + self.interval_width) / 2.0;

        samples
            .into_iter()
            .map(|mut s| {
                s.sort_by(|a, b| a.total_cmp(b));
                match (sorted_quantile(&s, lower_q), sorted_quantile(&s, upper_q)) {
                    (Some(lo), Some(hi)) => Ok((lo, hi)),
                    _ => Err(ForecastError::ForecastingError(
                        "No uncertainty samples drawn".to_string(),
                    )),
                }
            })
            .collect()
    }
}

impl TrainedForecastModel for TrainedTrendModel {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Horizon must be at least 1".to_string(),
            ));
        }

        let times = self.future_times(horizon)?;
        let yhat: Vec<f64> = times
            .iter()
            .map(|t| trend_at(*t, self.k, self.m, &self.changepoints, &self.delta))
            .collect();

        let bounds = if self.uncertainty_samples == 0 {
            yhat.iter().map(|y| (*y, *y)).collect()
        } else {
            self.simulate_intervals(&times)?
        };

        // Simulated quantiles are not guaranteed to bracket the point trend
        let intervals: Vec<(f64, f64)> = yhat
            .iter()
            .zip(bounds.iter())
            .map(|(y, (lo, hi))| (lo.min(*y) * self.y_scale, hi.max(*y) * self.y_scale))
            .collect();
        let values: Vec<f64> = yhat.iter().map(|y| y * self.y_scale).collect();

        ForecastResult::new_with_intervals(values, horizon, intervals)
    }

    fn predict(&self) -> Result<ForecastResult> {
        let fitted: Vec<f64> = self
            .t_hist
            .iter()
            .map(|t| trend_at(*t, self.k, self.m, &self.changepoints, &self.delta) * self.y_scale)
            .collect();
        let n = fitted.len();
        ForecastResult::new(fitted, n)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Piecewise-linear trend value at scaled time `t`
fn trend_at(t: f64, k: f64, m: f64, changepoints: &[f64], delta: &[f64]) -> f64 {
    let mut value = k * t + m;
    for (s, d) in changepoints.iter().zip(delta.iter()) {
        if t >= *s {
            value += (t - s) * d;
        }
    }
    value
}

/// Ordinary least-squares line through (t, y)
fn ols_line(t: &[f64], y: &[f64]) -> Result<(f64, f64)> {
    let n = t.len() as f64;
    let t_mean = t.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (ti, yi) in t.iter().zip(y.iter()) {
        num += (ti - t_mean) * (yi - y_mean);
        den += (ti - t_mean).powi(2);
    }

    if den.abs() < MIN_TIME_SPREAD {
        return Err(ForecastError::ForecastingError(
            "Cannot fit a line: time values are too similar".to_string(),
        ));
    }

    let k = num / den;
    Ok((k, y_mean - k * t_mean))
}

/// Solve for `[k, m, delta...]` with a ridge penalty on the rate changes
fn solve_trend(t: &[f64], y: &[f64], changepoints: &[f64], penalty: f64) -> Result<Vec<f64>> {
    let dim = 2 + changepoints.len();
    let design = DMatrix::from_fn(t.len(), dim, |row, col| match col {
        0 => t[row],
        1 => 1.0,
        _ => {
            let s = changepoints[col - 2];
            if t[row] >= s {
                t[row] - s
            } else {
                0.0
            }
        }
    });
    let target = DVector::from_column_slice(y);

    let mut normal = design.transpose() * &design;
    for i in 2..dim {
        normal[(i, i)] += penalty;
    }
    let rhs = design.transpose() * target;

    solve_linear_system(normal, rhs)
}

/// LU solve of a square system
fn solve_linear_system(a: DMatrix<f64>, b: DVector<f64>) -> Result<Vec<f64>> {
    a.lu()
        .solve(&b)
        .filter(|x| x.iter().all(|v| v.is_finite()))
        .map(|x| x.iter().copied().collect())
        .ok_or_else(|| {
            ForecastError::ForecastingError("Trend design matrix is singular".to_string())
        })
}
