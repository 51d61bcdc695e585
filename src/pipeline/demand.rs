//! Demand forecast pipeline (single series, with regressors)
//!
//! Stages: validate -> quality check -> resolve regressors -> fit ->
//! predict -> metrics -> assemble. Low density is terminal here; demand is
//! not bounded, so output is passed through unclamped. Regressor futures
//! are fully resolved before the main fit, so the fit/predict phase never
//! triggers further projection.

use crate::config::ServiceConfig;
use crate::data::{coerce_numeric, parse_date, DemandPoint, DemandRequest, MetricFrame, NumericCell};
use crate::engine::{FitFrame, FitSettings, FittedModel, ForecastEngine, FutureFrame, RegressorColumn};
use crate::error::{ForecastError, Result};
use crate::metrics::strength_metrics;
use crate::pipeline::EngineBudget;
use crate::plot::PlotRenderer;
use crate::quality;
use crate::regressors::{resolve_regressor, RegressorScope};
use crate::response::{
    forecast_points, DateRange, DemandDebugInfo, DemandForecastResponse, ForecastMetadata,
    FutureRegressorValues,
};
use crate::utils::{format_date, future_dates};
use crate::validate::{demand_schema, validate};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

/// The two regressors the demand model understands, in resolution order
const REGRESSORS: [(&str, RegressorScope); 2] = [
    ("mti", RegressorScope::Shared),
    ("inflation", RegressorScope::PerLocation),
];

/// Run the demand forecast pipeline against a raw request payload
pub fn run<E, P>(
    config: &ServiceConfig,
    engine: &E,
    plots: &P,
    payload: &Value,
) -> Result<DemandForecastResponse>
where
    E: ForecastEngine,
    P: PlotRenderer,
{
    let issues = validate(payload, &demand_schema());
    if !issues.is_empty() {
        return Err(ForecastError::InvalidInput(issues));
    }

    let request: DemandRequest = serde_json::from_value(payload.clone())
        .map_err(|e| ForecastError::DataFormat(format!("Malformed request: {e}")))?;
    let points = &request.historical_data;
    info!(
        points = points.len(),
        location_id = %request.location_id,
        "demand forecast requested"
    );

    let dates: Vec<NaiveDate> = points
        .iter()
        .map(|p| parse_date(&p.date))
        .collect::<Result<_>>()?;
    let demand = read_demand(points, &dates)?;

    let declared: Vec<(&str, RegressorScope)> = REGRESSORS
        .iter()
        .copied()
        .filter(|(name, _)| points.iter().any(|p| regressor_cell(p, name).is_some()))
        .collect();

    let mut columns = vec![("demand", demand)];
    for (name, _) in &declared {
        columns.push((*name, read_regressor(points, name)?));
    }

    let locations = if points.iter().any(|p| p.location_id.is_some()) {
        Some(points.iter().map(|p| p.location_id.clone()).collect())
    } else {
        None
    };
    let frame = MetricFrame::from_columns(dates, columns, locations)?;

    let sorted_dates = frame.dates()?;
    let report = quality::assess(&sorted_dates, config.gap_threshold_days);
    info!(
        density = report.density,
        points = report.points,
        span_days = report.span_days,
        "data density"
    );
    if report.density < config.density_threshold {
        return Err(ForecastError::LowDensity {
            density: report.density,
            threshold: config.density_threshold,
        });
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

    // Phase one: fully resolve every regressor's future trajectory.
    let mut regressors_used = Vec::new();
    let mut generated = Vec::new();
    let mut future_columns = Vec::new();
    for (name, scope) in &declared {
        let supplied = supplied_futures(&request, name);
        let resolution = resolve_regressor(
            engine,
            &frame,
            name,
            *scope,
            &request.location_id,
            horizon,
            supplied,
        )?;
        budget.check()?;

        regressors_used.push(name.to_string());
        if resolution.projected {
            generated.push(name.to_string());
        }
        future_columns.push(RegressorColumn {
            name: name.to_string(),
            values: resolution.future,
        });
    }

    // Phase two: one fit over the full history, one future-only prediction.
    let fit_frame = FitFrame {
        dates: sorted_dates.clone(),
        values: frame.column("demand")?,
        regressors: declared
            .iter()
            .map(|(name, _)| {
                Ok(RegressorColumn {
                    name: name.to_string(),
                    values: frame.column(name)?,
                })
            })
            .collect::<Result<_>>()?,
    };
    let settings = FitSettings {
        interval_width: config.interval_width,
        trend_flexibility: config.demand_flexibility,
        weekly_seasonality: true,
        yearly_seasonality: true,
    };
    info!(engine = engine.name(), "fitting demand model");
    let fitted = engine.fit(&fit_frame, &settings)?;
    budget.check()?;

    let last = *sorted_dates.last().expect("density check implies non-empty");
    let future = FutureFrame {
        dates: future_dates(last, horizon),
        regressors: future_columns,
    };
    // No budget check after this point: a prediction that completed is
    // returned even if it ran the budget out.
    let rows = fitted.predict(&future)?;
    info!(rows = rows.len(), "demand forecast generated");

    let strengths = strength_metrics(&rows);
    let plot = plots.render(&fit_frame, &rows)?;

    let mut future_regressors = FutureRegressorValues::default();
    for column in &future.regressors {
        match column.name.as_str() {
            "mti" => future_regressors.mti = column.values.clone(),
            "inflation" => future_regressors.inflation = column.values.clone(),
            _ => {}
        }
    }

    Ok(DemandForecastResponse {
        forecast: forecast_points(&rows),
        plot,
        location_id: request.location_id,
        model_id: request.model_id,
        metadata: ForecastMetadata::new(config.interval_width, strengths),
        future_regressors,
        debug_info: DemandDebugInfo {
            data_points: frame.len(),
            date_range: DateRange::new(frame.first_date()?, frame.last_date()?),
            regressors_used,
            future_periods: horizon,
            generated_regressors: generated,
        },
    })
}

/// Read the target column; nulls and non-numbers are terminal here
fn read_demand(points: &[DemandPoint], dates: &[NaiveDate]) -> Result<Vec<f64>> {
    let mut values = Vec::with_capacity(points.len());
    let mut missing_dates = Vec::new();
    let mut invalid = 0usize;

    for (point, date) in points.iter().zip(dates.iter()) {
        match coerce_numeric(point.demand.as_ref()) {
            NumericCell::Number(v) => values.push(v),
            NumericCell::Missing => missing_dates.push(format_date(*date)),
            NumericCell::Invalid => invalid += 1,
        }
    }

    if !missing_dates.is_empty() {
        let count = missing_dates.len();
        missing_dates.truncate(3);
        return Err(ForecastError::MissingValues {
            metric: "demand".to_string(),
            count,
            example_dates: missing_dates,
        });
    }
    if invalid > 0 {
        return Err(ForecastError::NonNumericValues {
            metric: "demand".to_string(),
        });
    }
    Ok(values)
}

/// Read a declared regressor column; the join into the fit frame must not
/// introduce missing values, so incomplete columns are terminal
fn read_regressor(points: &[DemandPoint], name: &str) -> Result<Vec<f64>> {
    let mut values = Vec::with_capacity(points.len());
    let mut bad = 0usize;

    for point in points {
        match coerce_numeric(regressor_cell(point, name)) {
            NumericCell::Number(v) => values.push(v),
            NumericCell::Missing | NumericCell::Invalid => bad += 1,
        }
    }

    if bad > 0 {
        return Err(ForecastError::DataIntegrity(format!(
            "Regressor '{name}' has {bad} rows with missing or non-numeric values"
        )));
    }
    Ok(values)
}

fn regressor_cell<'a>(point: &'a DemandPoint, name: &str) -> Option<&'a Value> {
    match name {
        "mti" => point.mti.as_ref(),
        "inflation" => point.inflation.as_ref(),
        _ => None,
    }
}

fn supplied_futures<'a>(request: &'a DemandRequest, name: &str) -> Option<&'a [f64]> {
    let supplied = request.future_regressors.as_ref()?;
    match name {
        "mti" => supplied.mti.as_deref(),
        "inflation" => supplied.inflation.as_deref(),
        _ => None,
    }
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
                json!({"date": format_date(date), "demand": 100.0 + i as f64})
            })
            .collect();
        json!({
            "historicalData": points,
            "futurePeriods": 10,
            "locationId": "loc-1",
            "modelId": "m-1",
        })
    }

    fn run_default(payload: &Value) -> Result<DemandForecastResponse> {
        run(
            &ServiceConfig::default(),
            &BaselineEngine::new(),
            &DisabledPlots,
            payload,
        )
    }

    #[test]
    fn null_demand_is_terminal_with_example_dates() {
        let mut payload = daily_payload(30);
        payload["historicalData"][4]["demand"] = json!(null);
        payload["historicalData"][9]["demand"] = json!(null);

        let err = run_default(&payload).unwrap_err();
        match err {
            ForecastError::MissingValues {
                metric,
                count,
                example_dates,
            } => {
                assert_eq!(metric, "demand");
                assert_eq!(count, 2);
                assert_eq!(example_dates, vec!["2024-01-05", "2024-01-10"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_numeric_demand_is_terminal() {
        let mut payload = daily_payload(30);
        payload["historicalData"][2]["demand"] = json!("lots");

        let err = run_default(&payload).unwrap_err();
        assert!(matches!(err, ForecastError::NonNumericValues { .. }));
    }

    #[test]
    fn numeric_string_demand_is_coerced() {
        let mut payload = daily_payload(30);
        payload["historicalData"][2]["demand"] = json!("103.5");
        assert!(run_default(&payload).is_ok());
    }

    #[test]
    fn incomplete_regressor_column_is_terminal() {
        let mut payload = daily_payload(30);
        // Declared on one point only; every other row is a hole.
        payload["historicalData"][0]["mti"] = json!(101.0);

        let err = run_default(&payload).unwrap_err();
        assert!(matches!(err, ForecastError::DataIntegrity(_)));
    }

    #[test]
    fn unparseable_date_is_a_data_format_error() {
        let mut payload = daily_payload(30);
        payload["historicalData"][0]["date"] = json!("soon");

        let err = run_default(&payload).unwrap_err();
        assert!(matches!(err, ForecastError::DataFormat(_)));
    }

    /// Engine whose prediction outlives the time budget
    #[derive(Debug)]
    struct SlowPredictEngine;

    impl ForecastEngine for SlowPredictEngine {
        type Fitted = SlowFitted;

        fn fit(&self, frame: &FitFrame, settings: &FitSettings) -> Result<SlowFitted> {
            Ok(SlowFitted {
                inner: BaselineEngine::new().fit(frame, settings)?,
            })
        }

        fn name(&self) -> &str {
            "slow-predict"
        }
    }

    #[derive(Debug)]
    struct SlowFitted {
        inner: crate::engine::baseline::FittedBaseline,
    }

    impl FittedModel for SlowFitted {
        fn predict(&self, future: &FutureFrame) -> Result<Vec<crate::engine::ForecastRow>> {
            std::thread::sleep(std::time::Duration::from_millis(1100));
            self.inner.predict(future)
        }

        fn name(&self) -> &str {
            "slow-predict"
        }
    }

    #[test]
    fn forecast_finished_past_the_budget_is_not_discarded() {
        let config = ServiceConfig {
            engine_time_budget_secs: 1,
            ..ServiceConfig::default()
        };

        let response = run(&config, &SlowPredictEngine, &DisabledPlots, &daily_payload(30))
            .unwrap();
        assert_eq!(response.forecast.len(), 10);
    }
}
