//! Forecast strength metrics
//!
//! The ratio of a component's standard deviation to the combined forecast's
//! standard deviation is a cheap, engine-agnostic proxy for how much of the
//! forecast's variability that component explains. Ratios are clamped into
//! [0, 1]; degenerate variances resolve to 0.0 instead of dividing by zero.

use crate::engine::ForecastRow;
use crate::utils::clamp01;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Normalized seasonality and trend strength of one forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthMetrics {
    pub seasonality_strength: f64,
    pub trend_strength: f64,
}

impl StrengthMetrics {
    pub fn zero() -> Self {
        Self {
            seasonality_strength: 0.0,
            trend_strength: 0.0,
        }
    }
}

fn component_strength(component_std: f64, combined_std: f64) -> f64 {
    if !component_std.is_finite() || !combined_std.is_finite() || combined_std <= 0.0 {
        return 0.0;
    }
    clamp01((component_std / combined_std).abs())
}

/// Derive strength metrics from a forecast's decomposition columns
pub fn strength_metrics(rows: &[ForecastRow]) -> StrengthMetrics {
    if rows.len() < 2 {
        return StrengthMetrics::zero();
    }

    let combined: Vec<f64> = rows.iter().map(|r| r.value).collect();
    let seasonal: Vec<f64> = rows.iter().map(|r| r.seasonal).collect();
    let trend: Vec<f64> = rows.iter().map(|r| r.trend).collect();

    let combined_std = combined.iter().std_dev();
    StrengthMetrics {
        seasonality_strength: component_strength(seasonal.iter().std_dev(), combined_std),
        trend_strength: component_strength(trend.iter().std_dev(), combined_std),
    }
}

/// Average the strengths of two forecasts into one reported pair
pub fn averaged(a: StrengthMetrics, b: StrengthMetrics) -> StrengthMetrics {
    StrengthMetrics {
        seasonality_strength: (a.seasonality_strength + b.seasonality_strength) / 2.0,
        trend_strength: (a.trend_strength + b.trend_strength) / 2.0,
    }
}
