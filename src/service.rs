//! Forecasting service facade
//!
//! Ties configuration, an engine, and a plot renderer into the two public
//! operations. The service holds no per-request state: every call fits a
//! fresh model, so instances can be shared freely across worker threads as
//! long as the engine itself is stateless between fits.

use crate::config::ServiceConfig;
use crate::engine::baseline::BaselineEngine;
use crate::engine::ForecastEngine;
use crate::error::Result;
use crate::pipeline;
use crate::plot::{DisabledPlots, PlotRenderer};
use crate::response::{DemandForecastResponse, SupplierPerformanceResponse};
use serde_json::Value;
use tracing::error;

/// The forecasting orchestration service
#[derive(Debug)]
pub struct ForecastService<E, P = DisabledPlots> {
    config: ServiceConfig,
    engine: E,
    plots: P,
}

impl ForecastService<BaselineEngine, DisabledPlots> {
    /// Service with the baseline engine, no plotting, and default settings
    pub fn baseline(config: ServiceConfig) -> Self {
        Self::new(config, BaselineEngine::new(), DisabledPlots)
    }
}

impl<E, P> ForecastService<E, P>
where
    E: ForecastEngine,
    P: PlotRenderer,
{
    pub fn new(config: ServiceConfig, engine: E, plots: P) -> Self {
        Self {
            config,
            engine,
            plots,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Forecast demand for one location, with optional regressors
    pub fn demand_forecast(&self, payload: &Value) -> Result<DemandForecastResponse> {
        pipeline::demand::run(&self.config, &self.engine, &self.plots, payload).map_err(|e| {
            error!(error = %e, body = ?e.body(), "demand forecast failed");
            e
        })
    }

    /// Forecast quality and lead-time reliability for one supplier
    pub fn supplier_performance(
        &self,
        payload: &Value,
    ) -> Result<SupplierPerformanceResponse> {
        pipeline::supplier::run(&self.config, &self.engine, &self.plots, payload).map_err(
            |e| {
                error!(error = %e, body = ?e.body(), "supplier performance forecast failed");
                e
            },
        )
    }
}

impl Default for ForecastService<BaselineEngine, DisabledPlots> {
    fn default() -> Self {
        Self::baseline(ServiceConfig::default())
    }
}
