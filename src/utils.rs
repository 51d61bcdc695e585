//! Utility functions for the supply_forecast crate

use chrono::{Duration, NaiveDate};

/// Generate daily timestamps strictly after `last`
pub fn future_dates(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(horizon);
    let mut current = last;

    for _ in 0..horizon {
        current += Duration::days(1);
        dates.push(current);
    }

    dates
}

/// Standard-normal multiplier for a two-sided interval of the given width
pub fn z_score(interval_width: f64) -> f64 {
    match interval_width {
        w if w >= 0.99 => 2.576,
        w if w >= 0.95 => 1.96,
        w if w >= 0.90 => 1.645,
        _ => 1.0,
    }
}

/// Clamp a dimensionless ratio into [0, 1]
pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Format a date the way the wire contract expects
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
