//! Regressor future-value resolution
//!
//! Every exogenous variable attached to a forecast needs values over the
//! future horizon before the main fit can run. Caller-supplied trajectories
//! are used verbatim; anything else is projected by recursively fitting the
//! engine on the regressor's own history. Projection happens in a distinct
//! phase before the main fit, so the fit/predict phase never triggers
//! further projection.

use crate::data::MetricFrame;
use crate::engine::{FitFrame, FitSettings, FittedModel, ForecastEngine, FutureFrame};
use crate::error::{ForecastError, Result};
use crate::utils::future_dates;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::info;

/// How a regressor's history is scoped before projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegressorScope {
    /// One trajectory for the whole dataset; duplicate observations are
    /// collapsed (the variable is shared across entities)
    Shared,
    /// Trajectory depends on the entity; history is filtered to one location
    PerLocation,
}

/// Resolved future trajectory for one regressor
#[derive(Debug, Clone, PartialEq)]
pub struct RegressorResolution {
    pub future: Vec<f64>,
    /// True when the engine projected the values, false when the caller
    /// supplied them
    pub projected: bool,
}

/// Resolve the future values of one regressor
///
/// The returned sequence is guaranteed to have exactly `horizon` entries;
/// any mismatch is a hard data-integrity failure.
pub fn resolve_regressor<E: ForecastEngine>(
    engine: &E,
    frame: &MetricFrame,
    name: &str,
    scope: RegressorScope,
    location_id: &str,
    horizon: usize,
    supplied: Option<&[f64]>,
) -> Result<RegressorResolution> {
    if let Some(values) = supplied {
        if values.len() != horizon {
            return Err(ForecastError::DataIntegrity(format!(
                "Supplied future values for '{name}' have length {}, expected {horizon}",
                values.len()
            )));
        }
        info!(regressor = name, horizon, "using caller-supplied projections");
        return Ok(RegressorResolution {
            future: values.to_vec(),
            projected: false,
        });
    }

    let (dates, values) = scoped_series(frame, name, scope, location_id)?;
    if dates.is_empty() {
        return Err(ForecastError::DataIntegrity(format!(
            "Regressor '{name}' has no observations in scope"
        )));
    }
    info!(
        regressor = name,
        points = dates.len(),
        horizon,
        "projecting regressor"
    );

    let last = *dates.last().expect("non-empty");
    let fitted = engine.fit(&FitFrame::new(dates, values), &FitSettings::default())?;
    let rows = fitted.predict(&FutureFrame::new(future_dates(last, horizon)))?;

    let future: Vec<f64> = rows.into_iter().map(|r| r.value).collect();
    if future.len() != horizon {
        return Err(ForecastError::DataIntegrity(format!(
            "Projection for '{name}' produced {} values, expected {horizon}",
            future.len()
        )));
    }

    Ok(RegressorResolution {
        future,
        projected: true,
    })
}

/// Extract the regressor's historical sub-series under the given scope
fn scoped_series(
    frame: &MetricFrame,
    name: &str,
    scope: RegressorScope,
    location_id: &str,
) -> Result<(Vec<NaiveDate>, Vec<f64>)> {
    let dates = frame.dates()?;
    let values = frame.column(name)?;

    match scope {
        RegressorScope::Shared => {
            // Collapse to the global set of observed (date, value) pairs;
            // the same reading repeated per entity must count once.
            let mut seen = HashSet::new();
            let mut out_dates = Vec::new();
            let mut out_values = Vec::new();
            for (date, value) in dates.into_iter().zip(values.into_iter()) {
                if seen.insert((date, value.to_bits())) {
                    out_dates.push(date);
                    out_values.push(value);
                }
            }
            Ok((out_dates, out_values))
        }
        RegressorScope::PerLocation => {
            let locations = frame.locations()?;
            match locations {
                Some(locations) if locations.iter().any(|l| l.is_some()) => {
                    let mut out_dates = Vec::new();
                    let mut out_values = Vec::new();
                    for ((date, value), location) in
                        dates.into_iter().zip(values).zip(locations)
                    {
                        if location.as_deref() == Some(location_id) {
                            out_dates.push(date);
                            out_values.push(value);
                        }
                    }
                    Ok((out_dates, out_values))
                }
                // No location information on the points: use everything.
                _ => Ok((dates, values)),
            }
        }
    }
}
