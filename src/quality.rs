//! Temporal data-quality diagnostics
//!
//! Density measures the fraction of expected daily observations actually
//! present; gaps are stretches between consecutive observations longer than
//! the configured threshold. Whether low density rejects the request is a
//! pipeline policy, not decided here.

use chrono::NaiveDate;

/// A stretch between consecutive observations exceeding the gap threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gap {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: i64,
}

/// Density and gap summary for one sorted series
#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    pub density: f64,
    pub gaps: Vec<Gap>,
    pub points: usize,
    pub span_days: i64,
}

/// Assess a series of timestamps, which must already be sorted
pub fn assess(dates: &[NaiveDate], gap_threshold_days: i64) -> QualityReport {
    if dates.is_empty() {
        return QualityReport {
            density: 0.0,
            gaps: Vec::new(),
            points: 0,
            span_days: 0,
        };
    }

    let span_days = (*dates.last().expect("non-empty") - dates[0]).num_days();
    // A single point has no span; expect one point so density is 1.0.
    let expected_points = span_days + 1;
    let density = dates.len() as f64 / expected_points as f64;

    let gaps = dates
        .windows(2)
        .filter_map(|pair| {
            let days = (pair[1] - pair[0]).num_days();
            (days > gap_threshold_days).then(|| Gap {
                start: pair[0],
                end: pair[1],
                days,
            })
        })
        .collect();

    QualityReport {
        density,
        gaps,
        points: dates.len(),
        span_days,
    }
}
