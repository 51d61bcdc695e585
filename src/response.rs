//! External response contracts and assembly
//!
//! These types are the wire shapes of the two operations. Assembly shapes
//! engine output into them, applying the supplier-performance [0, 1] clamp
//! where the measured quantities are dimensionless ratios and filling safe
//! defaults (empty arrays) for regressors that were not used.

use crate::engine::ForecastRow;
use crate::metrics::StrengthMetrics;
use crate::utils::{clamp01, format_date};
use chrono::NaiveDate;
use serde::Serialize;

/// One forecast step as returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: String,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Forecast metadata reported on both operations
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastMetadata {
    pub confidence_interval: f64,
    pub seasonality_strength: f64,
    pub trend_strength: f64,
}

impl ForecastMetadata {
    pub fn new(confidence_interval: f64, strengths: StrengthMetrics) -> Self {
        Self {
            confidence_interval,
            seasonality_strength: strengths.seasonality_strength,
            trend_strength: strengths.trend_strength,
        }
    }
}

/// First and last historical dates, as diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: format_date(start),
            end: format_date(end),
        }
    }
}

/// Resolved future regressor trajectories echoed back to the caller
///
/// Regressors that were not used default to empty arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FutureRegressorValues {
    pub mti: Vec<f64>,
    pub inflation: Vec<f64>,
}

/// Diagnostics block of the demand forecast response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandDebugInfo {
    pub data_points: usize,
    pub date_range: DateRange,
    pub regressors_used: Vec<String>,
    pub future_periods: usize,
    /// Regressors whose futures were resolved by projection, as opposed to
    /// supplied by the caller
    pub generated_regressors: Vec<String>,
}

/// Successful demand forecast response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandForecastResponse {
    pub forecast: Vec<ForecastPoint>,
    /// Opaque rendered-image reference; empty when plotting is disabled
    pub plot: String,
    pub location_id: String,
    pub model_id: String,
    pub metadata: ForecastMetadata,
    pub future_regressors: FutureRegressorValues,
    pub debug_info: DemandDebugInfo,
}

/// Diagnostics block of the supplier performance response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierDebugInfo {
    pub data_points: usize,
    pub date_range: DateRange,
    pub future_periods: usize,
}

/// Rendered-image references for the two supplier forecasts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPlots {
    pub quality: String,
    pub lead_time: String,
}

/// Successful supplier performance response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPerformanceResponse {
    pub supplier_id: String,
    pub quality_forecast: Vec<ForecastPoint>,
    pub lead_time_forecast: Vec<ForecastPoint>,
    pub metadata: ForecastMetadata,
    pub plots: SupplierPlots,
    pub debug_info: SupplierDebugInfo,
}

/// Shape forecast rows for the caller, bounds passed through unchanged
pub fn forecast_points(rows: &[ForecastRow]) -> Vec<ForecastPoint> {
    rows.iter()
        .map(|row| ForecastPoint {
            date: format_date(row.date),
            value: row.value,
            lower: row.lower,
            upper: row.upper,
        })
        .collect()
}

/// Shape forecast rows for the caller with every bound clamped into [0, 1]
pub fn clamped_forecast_points(rows: &[ForecastRow]) -> Vec<ForecastPoint> {
    rows.iter()
        .map(|row| ForecastPoint {
            date: format_date(row.date),
            value: clamp01(row.value),
            lower: clamp01(row.lower),
            upper: clamp01(row.upper),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn row(value: f64, lower: f64, upper: f64) -> ForecastRow {
        ForecastRow {
            date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            value,
            lower,
            upper,
            trend: 0.0,
            seasonal: 0.0,
        }
    }

    #[test]
    fn points_pass_bounds_through() {
        let points = forecast_points(&[row(120.5, 100.0, 141.0)]);
        assert_eq!(
            points,
            vec![ForecastPoint {
                date: "2024-05-10".to_string(),
                value: 120.5,
                lower: 100.0,
                upper: 141.0,
            }]
        );
    }

    #[test]
    fn clamped_points_stay_in_unit_interval() {
        let points = clamped_forecast_points(&[row(1.2, -0.3, 1.5)]);
        assert_eq!(points[0].value, 1.0);
        assert_eq!(points[0].lower, 0.0);
        assert_eq!(points[0].upper, 1.0);
    }

    #[test]
    fn demand_response_serializes_to_contract_shape() {
        let response = DemandForecastResponse {
            forecast: forecast_points(&[row(10.0, 8.0, 12.0)]),
            plot: String::new(),
            location_id: "loc-1".to_string(),
            model_id: "m-1".to_string(),
            metadata: ForecastMetadata {
                confidence_interval: 0.95,
                seasonality_strength: 0.1,
                trend_strength: 0.9,
            },
            future_regressors: FutureRegressorValues::default(),
            debug_info: DemandDebugInfo {
                data_points: 120,
                date_range: DateRange::new(
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    NaiveDate::from_ymd_opt(2024, 4, 29).unwrap(),
                ),
                regressors_used: vec![],
                future_periods: 1,
                generated_regressors: vec![],
            },
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "forecast": [
                    {"date": "2024-05-10", "value": 10.0, "lower": 8.0, "upper": 12.0}
                ],
                "plot": "",
                "locationId": "loc-1",
                "modelId": "m-1",
                "metadata": {
                    "confidenceInterval": 0.95,
                    "seasonalityStrength": 0.1,
                    "trendStrength": 0.9,
                },
                "futureRegressors": {"mti": [], "inflation": []},
                "debugInfo": {
                    "dataPoints": 120,
                    "dateRange": {"start": "2024-01-01", "end": "2024-04-29"},
                    "regressorsUsed": [],
                    "futurePeriods": 1,
                    "generatedRegressors": [],
                },
            })
        );
    }
}
