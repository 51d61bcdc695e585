//! Forecast orchestration pipelines
//!
//! Each operation runs as a sequence of stages, every stage returning a
//! `Result` so termination points are visible in the signatures: validation,
//! quality checks, regressor resolution, fit, predict, metrics, assembly.

use crate::error::{ForecastError, Result};
use std::time::{Duration, Instant};

pub mod demand;
pub mod supplier;

/// Tracks cumulative engine time against the configured budget
///
/// Engine invocations are the only slow stages, so the budget is checked
/// after each of them rather than preemptively.
#[derive(Debug)]
pub(crate) struct EngineBudget {
    started: Instant,
    budget: Duration,
}

impl EngineBudget {
    pub(crate) fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.started.elapsed() > self.budget {
            return Err(ForecastError::Timeout {
                budget_secs: self.budget.as_secs(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_budget_passes() {
        let budget = EngineBudget::new(Duration::from_secs(30));
        assert!(budget.check().is_ok());
    }

    #[test]
    fn exhausted_budget_times_out() {
        let budget = EngineBudget::new(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        assert!(matches!(
            budget.check(),
            Err(ForecastError::Timeout { .. })
        ));
    }
}
