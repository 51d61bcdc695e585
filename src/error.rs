//! Error types for the supply_forecast crate

use polars::prelude::PolarsError;
use serde::Serialize;
use thiserror::Error;

/// Custom error types for the supply_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Request failed schema validation; one entry per issue found
    #[error("Invalid input data")]
    InvalidInput(Vec<String>),

    /// Target metric has null or absent values
    #[error("Missing {metric} values detected")]
    MissingValues {
        metric: String,
        count: usize,
        example_dates: Vec<String>,
    },

    /// Target metric has values that cannot be read as numbers
    #[error("Non-numeric {metric} values detected")]
    NonNumericValues { metric: String },

    /// Too few of the expected daily observations are present
    #[error("Insufficient data density")]
    LowDensity { density: f64, threshold: f64 },

    /// No usable data points remain after cleaning
    #[error("Empty dataset provided")]
    EmptyData,

    /// Malformed dates, undeserializable payloads and similar caller mistakes
    #[error("Data processing error: {0}")]
    DataFormat(String),

    /// Misaligned or incomplete data that would corrupt the forecast
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// Error raised by the forecasting engine during fit or predict
    #[error("Engine error: {0}")]
    Engine(String),

    /// Cumulative engine time exceeded the configured budget
    #[error("Forecast exceeded the engine time budget of {budget_secs}s")]
    Timeout { budget_secs: u64 },

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    Polars(String),

    /// Anything unanticipated reaching the outermost boundary
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::Polars(err.to_string())
    }
}

/// Whether an error is the caller's fault or the service's
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Client,
    Server,
}

impl ErrorClass {
    /// Suggested HTTP status for a transport binding
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorClass::Client => 400,
            ErrorClass::Server => 500,
        }
    }
}

/// Details attached to an error body: a single message or an itemized list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorDetails {
    Text(String),
    List(Vec<String>),
}

/// Wire shape of a failed operation
///
/// Client errors serialize as `{error, details}`; server errors additionally
/// carry a `type` field naming the error category. Stack traces are never
/// included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: ErrorDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_dates: Option<Vec<String>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ForecastError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ForecastError::InvalidInput(_)
            | ForecastError::MissingValues { .. }
            | ForecastError::NonNumericValues { .. }
            | ForecastError::LowDensity { .. }
            | ForecastError::EmptyData
            | ForecastError::DataFormat(_)
            | ForecastError::DataIntegrity(_) => ErrorClass::Client,
            ForecastError::Engine(_)
            | ForecastError::Timeout { .. }
            | ForecastError::Polars(_)
            | ForecastError::Internal(_) => ErrorClass::Server,
        }
    }

    /// Category name reported in the `type` field of server error bodies
    pub fn category(&self) -> &'static str {
        match self {
            ForecastError::InvalidInput(_) => "InvalidInput",
            ForecastError::MissingValues { .. } => "MissingValues",
            ForecastError::NonNumericValues { .. } => "NonNumericValues",
            ForecastError::LowDensity { .. } => "LowDensity",
            ForecastError::EmptyData => "EmptyData",
            ForecastError::DataFormat(_) => "DataFormat",
            ForecastError::DataIntegrity(_) => "DataIntegrity",
            ForecastError::Engine(_) => "EngineError",
            ForecastError::Timeout { .. } => "Timeout",
            ForecastError::Polars(_) => "PolarsError",
            ForecastError::Internal(_) => "InternalError",
        }
    }

    /// Build the structured body returned to the caller
    pub fn body(&self) -> ErrorBody {
        let (error, details, example_dates) = match self {
            ForecastError::InvalidInput(issues) => (
                "Invalid input data".to_string(),
                ErrorDetails::List(issues.clone()),
                None,
            ),
            ForecastError::MissingValues {
                metric,
                count,
                example_dates,
            } => (
                format!("Missing {metric} values detected"),
                ErrorDetails::Text(format!("Found {count} rows with missing {metric} values")),
                Some(example_dates.clone()),
            ),
            ForecastError::NonNumericValues { metric } => (
                format!("Non-numeric {metric} values detected"),
                ErrorDetails::Text(format!("All {metric} values must be numeric")),
                None,
            ),
            ForecastError::LowDensity { density, threshold } => (
                "Insufficient data density".to_string(),
                ErrorDetails::Text(format!(
                    "Only {:.2}% of days have data points. Need at least {:.0}% coverage.",
                    density * 100.0,
                    threshold * 100.0
                )),
                None,
            ),
            ForecastError::EmptyData => (
                "Empty dataset provided".to_string(),
                ErrorDetails::Text(
                    "The historical data array contains no valid data points".to_string(),
                ),
                None,
            ),
            ForecastError::DataFormat(msg) => (
                "Data processing error".to_string(),
                ErrorDetails::Text(msg.clone()),
                None,
            ),
            ForecastError::DataIntegrity(msg) => (
                "Data processing error".to_string(),
                ErrorDetails::Text(msg.clone()),
                None,
            ),
            other => (
                "Unexpected error during data processing".to_string(),
                ErrorDetails::Text(other.to_string()),
                None,
            ),
        };

        let kind = match self.class() {
            ErrorClass::Client => None,
            ErrorClass::Server => Some(self.category().to_string()),
        };

        ErrorBody {
            error,
            details,
            example_dates,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn validation_body_is_client_shaped() {
        let err = ForecastError::InvalidInput(vec![
            "Missing required field: futurePeriods".to_string(),
        ]);
        assert_eq!(err.class(), ErrorClass::Client);
        assert_eq!(err.class().status_code(), 400);

        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(
            body,
            json!({
                "error": "Invalid input data",
                "details": ["Missing required field: futurePeriods"],
            })
        );
    }

    #[test]
    fn missing_values_body_carries_example_dates() {
        let err = ForecastError::MissingValues {
            metric: "demand".to_string(),
            count: 4,
            example_dates: vec!["2024-01-02".to_string(), "2024-01-05".to_string()],
        };
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(
            body,
            json!({
                "error": "Missing demand values detected",
                "details": "Found 4 rows with missing demand values",
                "example_dates": ["2024-01-02", "2024-01-05"],
            })
        );
    }

    #[test]
    fn density_body_formats_percentages() {
        let err = ForecastError::LowDensity {
            density: 0.5,
            threshold: 0.7,
        };
        let body = err.body();
        assert_eq!(
            body.details,
            ErrorDetails::Text(
                "Only 50.00% of days have data points. Need at least 70% coverage.".to_string()
            )
        );
    }

    #[test]
    fn engine_body_is_server_shaped_with_type() {
        let err = ForecastError::Engine("singular design matrix".to_string());
        assert_eq!(err.class(), ErrorClass::Server);
        assert_eq!(err.class().status_code(), 500);

        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(
            body,
            json!({
                "error": "Unexpected error during data processing",
                "details": "Engine error: singular design matrix",
                "type": "EngineError",
            })
        );
    }
}
