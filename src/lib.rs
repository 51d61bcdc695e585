//! # Supply Forecast
//!
//! A Rust library for supply chain forecasting orchestration: it validates
//! historical measurements, assesses their quality, resolves future values
//! for exogenous regressors, drives a forecasting engine to produce point
//! and interval forecasts, and derives normalized trend/seasonality
//! strength metrics.
//!
//! ## Features
//!
//! - Declarative request validation with itemized issues
//! - Data-quality diagnostics (daily density, gap detection)
//! - Regressor projection (recursive forecasting of exogenous inputs)
//! - Demand forecasts with regressors; dual supplier-performance forecasts
//! - Strength metrics derived from the forecast decomposition
//! - Pluggable engine and plot renderer behind traits
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use supply_forecast::ForecastService;
//!
//! let points: Vec<_> = (0..30)
//!     .map(|i| {
//!         json!({
//!             "date": format!("2024-01-{:02}", i + 1),
//!             "demand": 100.0 + i as f64,
//!         })
//!     })
//!     .collect();
//! let payload = json!({
//!     "historicalData": points,
//!     "futurePeriods": 7,
//!     "locationId": "loc-1",
//!     "modelId": "baseline",
//! });
//!
//! let service = ForecastService::default();
//! let response = service.demand_forecast(&payload)?;
//! assert_eq!(response.forecast.len(), 7);
//! assert_eq!(response.metadata.confidence_interval, 0.95);
//! # Ok::<(), supply_forecast::ForecastError>(())
//! ```
//!
//! Errors map to the wire contract via [`ForecastError::body`] and
//! [`ForecastError::class`]: client errors are validation and data
//! problems, server errors are engine and internal failures.

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod plot;
pub mod quality;
pub mod regressors;
pub mod response;
pub mod service;
pub mod utils;
pub mod validate;

// Re-export commonly used types
pub use crate::config::ServiceConfig;
pub use crate::engine::baseline::BaselineEngine;
pub use crate::engine::{
    FitFrame, FitSettings, FittedModel, ForecastEngine, ForecastRow, FutureFrame,
};
pub use crate::error::{ErrorBody, ErrorClass, ForecastError, Result};
pub use crate::metrics::StrengthMetrics;
pub use crate::plot::{DisabledPlots, PlotRenderer};
pub use crate::response::{DemandForecastResponse, SupplierPerformanceResponse};
pub use crate::service::ForecastService;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
