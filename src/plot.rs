//! Plot rendering boundary
//!
//! Rendering is an external concern; the pipelines only need an opaque
//! reference (e.g. a base64-encoded image) to place in the response. The
//! default renderer is disabled and yields empty references.

use crate::engine::{FitFrame, ForecastRow};
use crate::error::Result;
use std::fmt::Debug;

/// Renders a fitted history plus its forecast into an opaque reference
pub trait PlotRenderer: Debug {
    fn render(&self, history: &FitFrame, forecast: &[ForecastRow]) -> Result<String>;
}

/// Renderer that produces empty references
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPlots;

impl PlotRenderer for DisabledPlots {
    fn render(&self, _history: &FitFrame, _forecast: &[ForecastRow]) -> Result<String> {
        Ok(String::new())
    }
}
