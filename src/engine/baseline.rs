//! Baseline decomposition engine
//!
//! A deterministic additive model: least-squares trend, weekday and
//! month-of-year seasonal offsets, and a linear adjustment per regressor.
//! Prediction intervals come from the in-sample residual spread. The
//! pipelines treat any engine as opaque; this one exists so the service is
//! usable without an external statistical dependency.

use crate::engine::{
    FitFrame, FitSettings, FittedModel, ForecastEngine, ForecastRow, FutureFrame,
};
use crate::error::{ForecastError, Result};
use crate::utils::z_score;
use chrono::{Datelike, NaiveDate};
use tracing::debug;

const MIN_TREND_WINDOW: usize = 2;
const VARIANCE_FLOOR: f64 = 1e-12;

/// Deterministic trend + seasonality engine
#[derive(Debug, Clone, Default)]
pub struct BaselineEngine;

impl BaselineEngine {
    pub fn new() -> Self {
        Self
    }
}

/// Linear effect of one fitted regressor
#[derive(Debug, Clone)]
struct RegressorEffect {
    name: String,
    beta: f64,
    mean: f64,
}

/// Baseline engine fitted to one historical frame
#[derive(Debug, Clone)]
pub struct FittedBaseline {
    origin: NaiveDate,
    intercept: f64,
    slope: f64,
    weekday_effects: [f64; 7],
    month_effects: [f64; 12],
    effects: Vec<RegressorEffect>,
    sigma: f64,
    interval_width: f64,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Ordinary least squares over (t, y), falling back to a flat line when the
/// time axis has no spread (e.g. all-duplicate timestamps)
fn linear_fit(ts: &[f64], ys: &[f64]) -> (f64, f64) {
    let t_mean = mean(ts);
    let y_mean = mean(ys);

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (t, y) in ts.iter().zip(ys.iter()) {
        covariance += (t - t_mean) * (y - y_mean);
        variance += (t - t_mean).powi(2);
    }

    if variance < VARIANCE_FLOOR {
        return (y_mean, 0.0);
    }
    let slope = covariance / variance;
    (y_mean - slope * t_mean, slope)
}

/// Mean of residuals per bin; bins with no data contribute nothing
fn binned_means<const N: usize>(residuals: &[f64], bins: &[usize]) -> [f64; N] {
    let mut sums = [0.0; N];
    let mut counts = [0usize; N];
    for (&residual, &bin) in residuals.iter().zip(bins.iter()) {
        sums[bin] += residual;
        counts[bin] += 1;
    }

    let mut means = [0.0; N];
    for i in 0..N {
        if counts[i] > 0 {
            means[i] = sums[i] / counts[i] as f64;
        }
    }
    means
}

fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

impl ForecastEngine for BaselineEngine {
    type Fitted = FittedBaseline;

    fn fit(&self, frame: &FitFrame, settings: &FitSettings) -> Result<Self::Fitted> {
        frame.check()?;

        let n = frame.len();
        let origin = frame.dates[0];
        let ts: Vec<f64> = frame
            .dates
            .iter()
            .map(|d| (*d - origin).num_days() as f64)
            .collect();

        // Higher flexibility shrinks the trend window so the line tracks
        // recent level changes instead of the whole history.
        let window_fraction = (1.0 - settings.trend_flexibility).clamp(0.2, 1.0);
        let window = ((n as f64 * window_fraction).ceil() as usize)
            .max(MIN_TREND_WINDOW)
            .min(n);
        let start = n - window;
        let (intercept, slope) = linear_fit(&ts[start..], &frame.values[start..]);

        let mut residuals: Vec<f64> = ts
            .iter()
            .zip(frame.values.iter())
            .map(|(t, y)| y - (intercept + slope * t))
            .collect();

        let weekday_effects = if settings.weekly_seasonality && n >= 14 {
            let bins: Vec<usize> = frame
                .dates
                .iter()
                .map(|d| d.weekday().num_days_from_monday() as usize)
                .collect();
            let effects = binned_means::<7>(&residuals, &bins);
            for (residual, bin) in residuals.iter_mut().zip(bins.iter()) {
                *residual -= effects[*bin];
            }
            effects
        } else {
            [0.0; 7]
        };

        let month_effects = if settings.yearly_seasonality {
            let bins: Vec<usize> = frame.dates.iter().map(|d| d.month0() as usize).collect();
            let effects = binned_means::<12>(&residuals, &bins);
            for (residual, bin) in residuals.iter_mut().zip(bins.iter()) {
                *residual -= effects[*bin];
            }
            effects
        } else {
            [0.0; 12]
        };

        let mut effects = Vec::with_capacity(frame.regressors.len());
        for regressor in &frame.regressors {
            if regressor.values.iter().any(|v| !v.is_finite()) {
                return Err(ForecastError::Engine(format!(
                    "Regressor '{}' contains non-finite values",
                    regressor.name
                )));
            }

            let x_mean = mean(&regressor.values);
            let mut covariance = 0.0;
            let mut variance = 0.0;
            for (x, residual) in regressor.values.iter().zip(residuals.iter()) {
                covariance += (x - x_mean) * residual;
                variance += (x - x_mean).powi(2);
            }
            let beta = if variance < VARIANCE_FLOOR {
                0.0
            } else {
                covariance / variance
            };

            for (residual, x) in residuals.iter_mut().zip(regressor.values.iter()) {
                *residual -= beta * (x - x_mean);
            }
            effects.push(RegressorEffect {
                name: regressor.name.clone(),
                beta,
                mean: x_mean,
            });
        }

        let sigma = sample_std_dev(&residuals);
        debug!(
            points = n,
            slope,
            sigma,
            regressors = effects.len(),
            "baseline engine fitted"
        );

        Ok(FittedBaseline {
            origin,
            intercept,
            slope,
            weekday_effects,
            month_effects,
            effects,
            sigma,
            interval_width: settings.interval_width,
        })
    }

    fn name(&self) -> &str {
        "baseline-decomposition"
    }
}

impl FittedModel for FittedBaseline {
    fn predict(&self, future: &FutureFrame) -> Result<Vec<ForecastRow>> {
        for effect in &self.effects {
            match future.regressor(&effect.name) {
                None => {
                    return Err(ForecastError::DataIntegrity(format!(
                        "No future values attached for regressor '{}'",
                        effect.name
                    )))
                }
                Some(values) if values.len() != future.dates.len() => {
                    return Err(ForecastError::DataIntegrity(format!(
                        "Regressor '{}' has {} future values but the horizon has {} rows",
                        effect.name,
                        values.len(),
                        future.dates.len()
                    )))
                }
                Some(_) => {}
            }
        }

        let margin = z_score(self.interval_width) * self.sigma;
        let mut rows = Vec::with_capacity(future.dates.len());
        for (i, date) in future.dates.iter().enumerate() {
            let t = (*date - self.origin).num_days() as f64;
            let trend = self.intercept + self.slope * t;
            let seasonal = self.weekday_effects
                [date.weekday().num_days_from_monday() as usize]
                + self.month_effects[date.month0() as usize];

            let mut adjustment = 0.0;
            for effect in &self.effects {
                let values = future.regressor(&effect.name).expect("checked above");
                adjustment += effect.beta * (values[i] - effect.mean);
            }

            let value = trend + seasonal + adjustment;
            rows.push(ForecastRow {
                date: *date,
                value,
                lower: value - margin,
                upper: value + margin,
                trend,
                seasonal,
            });
        }

        Ok(rows)
    }

    fn name(&self) -> &str {
        "baseline-decomposition"
    }
}
