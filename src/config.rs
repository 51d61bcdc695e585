//! Service configuration constants
//!
//! All state shared across requests lives here. Nothing is cached between
//! requests; every forecast fits fresh.

use serde::Deserialize;
use std::time::Duration;

/// Tunable thresholds and engine settings for the forecasting service
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Minimum fraction of expected daily observations that must be present
    pub density_threshold: f64,
    /// Intervals between observations longer than this are recorded as gaps
    pub gap_threshold_days: i64,
    /// Width of the prediction interval reported to callers
    pub interval_width: f64,
    /// Trend-change sensitivity for the demand fit
    pub demand_flexibility: f64,
    /// Trend-change sensitivity for the supplier quality fit
    pub quality_flexibility: f64,
    /// Trend-change sensitivity for the supplier lead-time fit
    pub lead_time_flexibility: f64,
    /// Cumulative engine time allowed per request, in seconds
    pub engine_time_budget_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            density_threshold: 0.7,
            gap_threshold_days: 7,
            interval_width: 0.95,
            demand_flexibility: 0.05,
            quality_flexibility: 0.05,
            lead_time_flexibility: 0.1,
            engine_time_budget_secs: 30,
        }
    }
}

impl ServiceConfig {
    pub fn engine_time_budget(&self) -> Duration {
        Duration::from_secs(self.engine_time_budget_secs)
    }
}
