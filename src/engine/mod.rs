//! Forecasting engine interface
//!
//! The statistical engine is an opaque collaborator: the pipelines only
//! rely on the fit/predict contract below. Fitting is expensive and
//! blocking; a fitted model holds per-fit state and is never shared across
//! requests.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use std::fmt::Debug;

pub mod baseline;

/// One exogenous column attached to a fit or future frame
#[derive(Debug, Clone, PartialEq)]
pub struct RegressorColumn {
    pub name: String,
    pub values: Vec<f64>,
}

/// Historical series handed to the engine for fitting
#[derive(Debug, Clone, PartialEq)]
pub struct FitFrame {
    /// Sorted observation timestamps
    pub dates: Vec<NaiveDate>,
    /// Target values, aligned with `dates`
    pub values: Vec<f64>,
    /// Exogenous columns, each aligned with `dates`
    pub regressors: Vec<RegressorColumn>,
}

impl FitFrame {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        Self {
            dates,
            values,
            regressors: Vec::new(),
        }
    }

    /// Verify internal alignment before any fit work starts
    pub fn check(&self) -> Result<()> {
        if self.dates.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if self.values.len() != self.dates.len() {
            return Err(ForecastError::DataIntegrity(format!(
                "Fit frame has {} values but {} timestamps",
                self.values.len(),
                self.dates.len()
            )));
        }
        for regressor in &self.regressors {
            if regressor.values.len() != self.dates.len() {
                return Err(ForecastError::DataIntegrity(format!(
                    "Regressor '{}' has {} values but the fit frame has {} rows",
                    regressor.name,
                    regressor.values.len(),
                    self.dates.len()
                )));
            }
        }
        if self.values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::DataIntegrity(
                "Fit frame contains non-finite target values".to_string(),
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Future horizon handed to a fitted model for prediction
#[derive(Debug, Clone, PartialEq)]
pub struct FutureFrame {
    /// Future timestamps, strictly after the fitted history
    pub dates: Vec<NaiveDate>,
    /// Resolved future values for every fitted regressor
    pub regressors: Vec<RegressorColumn>,
}

impl FutureFrame {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            regressors: Vec::new(),
        }
    }

    /// Future values for one regressor, if attached
    pub fn regressor(&self, name: &str) -> Option<&[f64]> {
        self.regressors
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.values.as_slice())
    }
}

/// Per-fit engine settings
#[derive(Debug, Clone, PartialEq)]
pub struct FitSettings {
    /// Width of the two-sided prediction interval
    pub interval_width: f64,
    /// How readily the trend reacts to recent level changes
    pub trend_flexibility: f64,
    pub weekly_seasonality: bool,
    pub yearly_seasonality: bool,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            interval_width: 0.95,
            trend_flexibility: 0.05,
            weekly_seasonality: true,
            yearly_seasonality: true,
        }
    }
}

/// One predicted step, with the decomposition used for strength metrics
///
/// The trend and seasonal components never reach the caller; they only feed
/// the metrics calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRow {
    pub date: NaiveDate,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
    pub trend: f64,
    pub seasonal: f64,
}

/// Forecast model fitted to one historical frame
pub trait FittedModel: Debug {
    /// Predict every timestamp in the future frame, in order
    fn predict(&self, future: &FutureFrame) -> Result<Vec<ForecastRow>>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecasting engine that can be fitted to a historical frame
pub trait ForecastEngine: Debug {
    /// The type of fitted model produced
    type Fitted: FittedModel;

    /// Fit the engine to a historical frame
    fn fit(&self, frame: &FitFrame, settings: &FitSettings) -> Result<Self::Fitted>;

    /// Name of the engine
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn empty_frame_fails_check() {
        let frame = FitFrame::new(Vec::new(), Vec::new());
        assert!(matches!(frame.check(), Err(ForecastError::EmptyData)));
    }

    #[test]
    fn misaligned_regressor_fails_check() {
        let mut frame = FitFrame::new(vec![date(1), date(2)], vec![1.0, 2.0]);
        frame.regressors.push(RegressorColumn {
            name: "mti".to_string(),
            values: vec![1.0],
        });
        assert!(matches!(
            frame.check(),
            Err(ForecastError::DataIntegrity(_))
        ));
    }

    #[test]
    fn non_finite_values_fail_check() {
        let frame = FitFrame::new(vec![date(1), date(2)], vec![1.0, f64::NAN]);
        assert!(matches!(
            frame.check(),
            Err(ForecastError::DataIntegrity(_))
        ));
    }

    #[test]
    fn future_frame_regressor_lookup() {
        let mut future = FutureFrame::new(vec![date(3)]);
        future.regressors.push(RegressorColumn {
            name: "inflation".to_string(),
            values: vec![0.2],
        });
        assert_eq!(future.regressor("inflation"), Some(&[0.2][..]));
        assert_eq!(future.regressor("mti"), None);
    }
}
