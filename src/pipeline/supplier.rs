//! Supplier performance pipeline (dual series, no regressors)
//!
//! Two independent sub-pipelines run against the quality and lead-time
//! reliability series of one supplier. Data problems are repaired locally
//! here: null or non-numeric cells are dropped with a warning instead of
//! rejecting the request, and low density only warns. Both metrics are
//! dimensionless ratios, so every emitted bound is clamped into [0, 1].

use crate::config::ServiceConfig;
use crate::data::{coerce_numeric, parse_date, MetricFrame, NumericCell, SupplierPoint, SupplierRequest};
use crate::engine::{FitFrame, FitSettings, FittedModel, ForecastEngine, ForecastRow, FutureFrame};
use crate::error::{ForecastError, Result};
use crate::metrics::{averaged, strength_metrics};
use crate::pipeline::EngineBudget;
use crate::plot::PlotRenderer;
use crate::quality;
use crate::response::{
    clamped_forecast_points, DateRange, ForecastMetadata, ForecastPoint, SupplierDebugInfo,
    SupplierPerformanceResponse, SupplierPlots,
};
use crate::utils::{format_date, future_dates};
use crate::validate::{supplier_schema, validate};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

/// Run the supplier performance pipeline against a raw request payload
pub fn run<E, P>(
    config: &ServiceConfig,
    engine: &E,
    plots: &P,
    payload: &Value,
) -> Result<SupplierPerformanceResponse>
where
    E: ForecastEngine,
    P: PlotRenderer,
{
    let issues = validate(payload, &supplier_schema());
    if !issues.is_empty() {
        return Err(ForecastError::InvalidInput(issues));
    }

    let request: SupplierRequest = serde_json::from_value(payload.clone())
        .map_err(|e| ForecastError::DataFormat(format!("Malformed request: {e}")))?;
    let points = &request.historical_data;
    info!(
        supplier_id = %request.supplier_id,
        points = points.len(),
        "supplier performance forecast requested"
    );

    let dates: Vec<NaiveDate> = points
        .iter()
        .map(|p| parse_date(&p.date))
        .collect::<Result<_>>()?;
    let mut sorted_dates = dates.clone();
    sorted_dates.sort();

    let report = quality::assess(&sorted_dates, config.gap_threshold_days);
    if report.density < config.density_threshold {
        warn!(
            density = report.density,
            "low data density; results may be less reliable"
        );
    }
    for gap in &report.gaps {
        warn!(
            start = %format_date(gap.start),
            end = %format_date(gap.end),
            days = gap.days,
            "gap in historical data"
        );
    }

    let horizon = request.future_periods;
    let budget = EngineBudget::new(config.engine_time_budget());

    info!("generating quality rating forecast");
    let quality_rows = forecast_metric(
        config,
        engine,
        &budget,
        &dates,
        points,
        "qualityRating",
        |p| p.quality_rating.as_ref(),
        config.quality_flexibility,
        horizon,
    )?;

    info!("generating lead time reliability forecast");
    let lead_time_rows = forecast_metric(
        config,
        engine,
        &budget,
        &dates,
        points,
        "leadTimeReliability",
        |p| p.lead_time_reliability.as_ref(),
        config.lead_time_flexibility,
        horizon,
    )?;

    let strengths = averaged(
        strength_metrics(&quality_rows.rows),
        strength_metrics(&lead_time_rows.rows),
    );

    let rendered = SupplierPlots {
        quality: plots.render(&quality_rows.fit_frame, &quality_rows.rows)?,
        lead_time: plots.render(&lead_time_rows.fit_frame, &lead_time_rows.rows)?,
    };

    Ok(SupplierPerformanceResponse {
        supplier_id: request.supplier_id,
        quality_forecast: quality_rows.points,
        lead_time_forecast: lead_time_rows.points,
        metadata: ForecastMetadata::new(config.interval_width, strengths),
        plots: rendered,
        debug_info: SupplierDebugInfo {
            data_points: points.len(),
            date_range: DateRange::new(
                *sorted_dates.first().expect("validated non-empty"),
                *sorted_dates.last().expect("validated non-empty"),
            ),
            future_periods: horizon,
        },
    })
}

struct MetricForecast {
    fit_frame: FitFrame,
    rows: Vec<ForecastRow>,
    points: Vec<ForecastPoint>,
}

/// Clean one metric's series, fit, and predict its future horizon
#[allow(clippy::too_many_arguments)]
fn forecast_metric<E, F>(
    config: &ServiceConfig,
    engine: &E,
    budget: &EngineBudget,
    dates: &[NaiveDate],
    points: &[SupplierPoint],
    metric: &str,
    cell: F,
    trend_flexibility: f64,
    horizon: usize,
) -> Result<MetricForecast>
where
    E: ForecastEngine,
    F: Fn(&SupplierPoint) -> Option<&Value>,
{
    let (kept_dates, kept_values) = clean_series(dates, points, metric, cell)?;
    let frame = MetricFrame::from_columns(kept_dates, vec![(metric, kept_values)], None)?;

    let fit_frame = FitFrame::new(frame.dates()?, frame.column(metric)?);
    let settings = FitSettings {
        interval_width: config.interval_width,
        trend_flexibility,
        weekly_seasonality: true,
        yearly_seasonality: true,
    };
    let fitted = engine.fit(&fit_frame, &settings)?;
    budget.check()?;

    let last = *fit_frame.dates.last().expect("cleaned series is non-empty");
    // Completed predictions are kept even if they ran the budget out; the
    // budget only gates engine work that has not started yet.
    let rows = fitted.predict(&FutureFrame::new(future_dates(last, horizon)))?;

    let points = clamped_forecast_points(&rows);
    Ok(MetricForecast {
        fit_frame,
        rows,
        points,
    })
}

/// Drop unusable cells, keeping the rest of the series
fn clean_series<F>(
    dates: &[NaiveDate],
    points: &[SupplierPoint],
    metric: &str,
    cell: F,
) -> Result<(Vec<NaiveDate>, Vec<f64>)>
where
    F: Fn(&SupplierPoint) -> Option<&Value>,
{
    let mut kept_dates = Vec::with_capacity(points.len());
    let mut kept_values = Vec::with_capacity(points.len());
    let mut dropped_null = 0usize;
    let mut dropped_invalid = 0usize;

    for (point, date) in points.iter().zip(dates.iter()) {
        match coerce_numeric(cell(point)) {
            NumericCell::Number(v) => {
                kept_dates.push(*date);
                kept_values.push(v);
            }
            NumericCell::Missing => dropped_null += 1,
            NumericCell::Invalid => dropped_invalid += 1,
        }
    }

    if dropped_null > 0 {
        warn!(metric, dropped = dropped_null, "dropped rows with null values");
    }
    if dropped_invalid > 0 {
        warn!(
            metric,
            dropped = dropped_invalid,
            "dropped rows with non-numeric values"
        );
    }
    if kept_dates.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    Ok((kept_dates, kept_values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::baseline::BaselineEngine;
    use crate::plot::DisabledPlots;
    use serde_json::json;

    fn daily_payload(days: usize) -> Value {
        let points: Vec<Value> = (0..days)
            .map(|i| {
                let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64);
                json!({
                    "date": format_date(date),
                    "qualityRating": 0.9 - (i % 7) as f64 * 0.01,
                    "leadTimeReliability": 0.8 + (i % 5) as f64 * 0.01,
                })
            })
            .collect();
        json!({
            "historicalData": points,
            "futurePeriods": 14,
            "supplierId": "sup-1",
        })
    }

    fn run_default(payload: &Value) -> Result<SupplierPerformanceResponse> {
        run(
            &ServiceConfig::default(),
            &BaselineEngine::new(),
            &DisabledPlots,
            payload,
        )
    }

    #[test]
    fn null_cells_are_dropped_not_fatal() {
        let mut payload = daily_payload(60);
        payload["historicalData"][3]["qualityRating"] = json!(null);
        payload["historicalData"][8]["qualityRating"] = json!("poor");

        let response = run_default(&payload).unwrap();
        assert_eq!(response.quality_forecast.len(), 14);
        assert!(response
            .quality_forecast
            .iter()
            .all(|p| p.value.is_finite()));
    }

    #[test]
    fn all_cells_unusable_is_empty_data() {
        let mut payload = daily_payload(10);
        for point in payload["historicalData"].as_array_mut().unwrap() {
            point["qualityRating"] = json!(null);
        }

        let err = run_default(&payload).unwrap_err();
        assert!(matches!(err, ForecastError::EmptyData));
    }

    #[test]
    fn bounds_are_clamped_into_unit_interval() {
        let response = run_default(&daily_payload(90)).unwrap();
        for point in response
            .quality_forecast
            .iter()
            .chain(response.lead_time_forecast.iter())
        {
            assert!((0.0..=1.0).contains(&point.value));
            assert!((0.0..=1.0).contains(&point.lower));
            assert!((0.0..=1.0).contains(&point.upper));
        }
    }

    #[test]
    fn low_density_warns_but_proceeds() {
        // Every third day only: density ~0.34, well under the threshold.
        let points: Vec<Value> = (0..30)
            .map(|i| {
                let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64 * 3);
                json!({
                    "date": format_date(date),
                    "qualityRating": 0.9,
                    "leadTimeReliability": 0.85,
                })
            })
            .collect();
        let payload = json!({
            "historicalData": points,
            "futurePeriods": 7,
            "supplierId": "sup-2",
        });

        let response = run_default(&payload).unwrap();
        assert_eq!(response.quality_forecast.len(), 7);
        assert_eq!(response.lead_time_forecast.len(), 7);
    }

    #[test]
    fn metadata_averages_both_series() {
        let response = run_default(&daily_payload(90)).unwrap();
        assert_eq!(response.metadata.confidence_interval, 0.95);
        assert!((0.0..=1.0).contains(&response.metadata.seasonality_strength));
        assert!((0.0..=1.0).contains(&response.metadata.trend_strength));
    }
}
