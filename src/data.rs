//! Request payloads and the historical metric frame
//!
//! Payloads arrive as JSON and are deserialized leniently: metric cells are
//! kept as raw JSON values so each pipeline can apply its own policy for
//! null or non-numeric entries (reject for demand, drop for supplier
//! performance). Cleaned observations are stored in a [`MetricFrame`], a
//! Polars DataFrame sorted by timestamp with typed column extraction.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Deserialize;
use serde_json::Value;

/// Name of the timestamp column inside a [`MetricFrame`]
pub const TIME_COLUMN: &str = "ds";
/// Name of the location column inside a [`MetricFrame`]
pub const LOCATION_COLUMN: &str = "locationId";

/// Demand forecast request body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandRequest {
    pub historical_data: Vec<DemandPoint>,
    pub future_periods: usize,
    pub location_id: String,
    pub model_id: String,
    #[serde(default)]
    pub future_regressors: Option<SuppliedRegressors>,
}

/// One historical demand observation, metric cells kept raw
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandPoint {
    pub date: String,
    #[serde(default)]
    pub demand: Option<Value>,
    #[serde(default)]
    pub mti: Option<Value>,
    #[serde(default)]
    pub inflation: Option<Value>,
    #[serde(default)]
    pub location_id: Option<String>,
}

/// Caller-supplied future regressor trajectories
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuppliedRegressors {
    #[serde(default)]
    pub mti: Option<Vec<f64>>,
    #[serde(default)]
    pub inflation: Option<Vec<f64>>,
}

/// Supplier performance request body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierRequest {
    pub historical_data: Vec<SupplierPoint>,
    pub future_periods: usize,
    pub supplier_id: String,
}

/// One historical supplier observation, metric cells kept raw
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPoint {
    pub date: String,
    #[serde(default)]
    pub quality_rating: Option<Value>,
    #[serde(default)]
    pub lead_time_reliability: Option<Value>,
}

/// Outcome of reading one metric cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericCell {
    /// Cell absent or JSON null
    Missing,
    /// Usable numeric value
    Number(f64),
    /// Present but not readable as a number
    Invalid,
}

/// Coerce a raw JSON cell into a number, accepting numeric strings
pub fn coerce_numeric(cell: Option<&Value>) -> NumericCell {
    match cell {
        None | Some(Value::Null) => NumericCell::Missing,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() => NumericCell::Number(v),
            _ => NumericCell::Invalid,
        },
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => NumericCell::Number(v),
            _ => NumericCell::Invalid,
        },
        Some(_) => NumericCell::Invalid,
    }
}

/// Parse a caller-supplied date, accepting plain dates and timestamps
///
/// Timezone offsets are stripped; the calendar date is kept as-is.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(datetime.date());
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Ok(datetime.date_naive());
    }
    Err(ForecastError::DataFormat(format!(
        "Unparseable date '{raw}': expected an ISO-8601 date"
    )))
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid epoch")
}

fn date_to_days(date: NaiveDate) -> i64 {
    (date - epoch()).num_days()
}

fn days_to_date(days: i64) -> NaiveDate {
    epoch() + chrono::Duration::days(days)
}

/// Historical observations for one or more metrics, sorted by timestamp
///
/// Backed by a Polars DataFrame with an epoch-day `ds` column, one `f64`
/// column per metric and an optional location column. Duplicate timestamps
/// are permitted; the sort is stable.
#[derive(Debug, Clone)]
pub struct MetricFrame {
    df: DataFrame,
}

impl MetricFrame {
    /// Build a sorted frame from parallel columns
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        metrics: Vec<(&str, Vec<f64>)>,
        locations: Option<Vec<Option<String>>>,
    ) -> Result<Self> {
        for (name, values) in &metrics {
            if values.len() != dates.len() {
                return Err(ForecastError::DataIntegrity(format!(
                    "Column '{}' has {} values but {} timestamps",
                    name,
                    values.len(),
                    dates.len()
                )));
            }
        }
        if let Some(locations) = &locations {
            if locations.len() != dates.len() {
                return Err(ForecastError::DataIntegrity(format!(
                    "Location column has {} values but {} timestamps",
                    locations.len(),
                    dates.len()
                )));
            }
        }

        let mut order: Vec<usize> = (0..dates.len()).collect();
        order.sort_by_key(|&i| dates[i]);

        let ds: Vec<i64> = order.iter().map(|&i| date_to_days(dates[i])).collect();
        let mut columns = vec![Series::new(TIME_COLUMN, ds)];
        for (name, values) in &metrics {
            let sorted: Vec<f64> = order.iter().map(|&i| values[i]).collect();
            columns.push(Series::new(name, sorted));
        }
        if let Some(locations) = &locations {
            let sorted: Vec<Option<String>> =
                order.iter().map(|&i| locations[i].clone()).collect();
            columns.push(Series::new(LOCATION_COLUMN, sorted));
        }

        Ok(Self {
            df: DataFrame::new(columns)?,
        })
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.df.height()
    }

    /// Check if the frame is empty
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Sorted timestamps
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        let col = self.df.column(TIME_COLUMN)?;
        Ok(col
            .i64()?
            .into_iter()
            .flatten()
            .map(days_to_date)
            .collect())
    }

    /// One metric column, in timestamp order
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let col = self.df.column(name)?;
        Ok(col.f64()?.into_iter().flatten().collect())
    }

    /// Whether the frame carries a metric column with this name
    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_names().iter().any(|c| *c == name)
    }

    /// Location of each observation, if any point declared one
    pub fn locations(&self) -> Result<Option<Vec<Option<String>>>> {
        if !self.has_column(LOCATION_COLUMN) {
            return Ok(None);
        }
        let col = self.df.column(LOCATION_COLUMN)?;
        let values: Vec<Option<String>> = col
            .utf8()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect();
        Ok(Some(values))
    }

    /// Earliest timestamp in the frame
    pub fn first_date(&self) -> Result<NaiveDate> {
        self.dates()?
            .first()
            .copied()
            .ok_or(ForecastError::EmptyData)
    }

    /// Latest timestamp in the frame
    pub fn last_date(&self) -> Result<NaiveDate> {
        self.dates()?
            .last()
            .copied()
            .ok_or(ForecastError::EmptyData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("2024-02-29", 2024, 2, 29)]
    #[case("2024-02-29T13:45:00", 2024, 2, 29)]
    #[case("2024-02-29T13:45:00.250", 2024, 2, 29)]
    #[case("2024-02-29T13:45:00+02:00", 2024, 2, 29)]
    fn parse_date_accepts_common_shapes(
        #[case] raw: &str,
        #[case] y: i32,
        #[case] m: u32,
        #[case] d: u32,
    ) {
        assert_eq!(parse_date(raw).unwrap(), date(y, m, d));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        let err = parse_date("yesterday").unwrap_err();
        assert!(matches!(err, ForecastError::DataFormat(_)));
    }

    #[test]
    fn coerce_numeric_policies() {
        assert_eq!(coerce_numeric(None), NumericCell::Missing);
        assert_eq!(coerce_numeric(Some(&json!(null))), NumericCell::Missing);
        assert_eq!(coerce_numeric(Some(&json!(3.5))), NumericCell::Number(3.5));
        assert_eq!(coerce_numeric(Some(&json!("3.5"))), NumericCell::Number(3.5));
        assert_eq!(coerce_numeric(Some(&json!("high"))), NumericCell::Invalid);
        assert_eq!(coerce_numeric(Some(&json!([1.0]))), NumericCell::Invalid);
    }

    #[test]
    fn frame_sorts_by_date() {
        let frame = MetricFrame::from_columns(
            vec![date(2024, 1, 3), date(2024, 1, 1), date(2024, 1, 2)],
            vec![("demand", vec![3.0, 1.0, 2.0])],
            None,
        )
        .unwrap();

        assert_eq!(
            frame.dates().unwrap(),
            vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]
        );
        assert_eq!(frame.column("demand").unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(frame.first_date().unwrap(), date(2024, 1, 1));
        assert_eq!(frame.last_date().unwrap(), date(2024, 1, 3));
    }

    #[test]
    fn frame_carries_locations() {
        let frame = MetricFrame::from_columns(
            vec![date(2024, 1, 2), date(2024, 1, 1)],
            vec![("inflation", vec![0.2, 0.1])],
            Some(vec![Some("b".to_string()), None]),
        )
        .unwrap();

        assert_eq!(
            frame.locations().unwrap(),
            Some(vec![None, Some("b".to_string())])
        );
    }

    #[test]
    fn frame_rejects_misaligned_columns() {
        let err = MetricFrame::from_columns(
            vec![date(2024, 1, 1)],
            vec![("demand", vec![1.0, 2.0])],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ForecastError::DataIntegrity(_)));
    }

    #[test]
    fn demand_request_deserializes_camel_case() {
        let request: DemandRequest = serde_json::from_value(json!({
            "historicalData": [
                {"date": "2024-01-01", "demand": 5, "mti": 101.2, "locationId": "loc-1"},
            ],
            "futurePeriods": 14,
            "locationId": "loc-1",
            "modelId": "m-1",
            "futureRegressors": {"mti": [101.0, 102.0]},
        }))
        .unwrap();

        assert_eq!(request.future_periods, 14);
        assert_eq!(request.historical_data.len(), 1);
        assert_eq!(
            request.historical_data[0].location_id.as_deref(),
            Some("loc-1")
        );
        assert_eq!(
            request.future_regressors.unwrap().mti.unwrap(),
            vec![101.0, 102.0]
        );
    }
}
