//! Descriptive statistics
//!
//! Generic numeric summary reused by the anonymity assessment and
//! other analytics. An empty series is always reported as an error,
//! never silently replaced by a default.

use serde::Serialize;

use epigis_core::{Error, Result};

/// Divisor used for the variance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ddof {
    /// Population variance, divide by n
    #[default]
    Population,
    /// Sample variance, divide by n - 1
    Sample,
}

/// Summary of a numeric series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub range: f64,
}

/// Summarize a series with the population variance.
pub fn summarize(values: &[f64]) -> Result<StatsSummary> {
    summarize_with(values, Ddof::Population)
}

/// Summarize a series.
///
/// The median is the middle value, or the average of the two middle
/// values for an even count. `Ddof::Sample` needs at least two values.
pub fn summarize_with(values: &[f64], ddof: Ddof) -> Result<StatsSummary> {
    if values.is_empty() {
        return Err(Error::EmptySeries);
    }

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let sum_sq = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
    let divisor = match ddof {
        Ddof::Population => count as f64,
        Ddof::Sample => {
            if count < 2 {
                return Err(Error::InvalidParameter {
                    name: "ddof",
                    value: "sample".to_string(),
                    reason: "sample variance needs at least two values".to_string(),
                });
            }
            (count - 1) as f64
        }
    };
    let variance = sum_sq / divisor;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let min = sorted[0];
    let max = sorted[count - 1];
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };

    Ok(StatsSummary {
        count,
        min,
        max,
        mean,
        median,
        variance,
        std_dev: variance.sqrt(),
        range: max - min,
    })
}

impl StatsSummary {
    /// Key–value rows for display or export.
    pub fn rows(&self) -> Vec<(String, String)> {
        vec![
            ("Count".to_string(), self.count.to_string()),
            ("Min".to_string(), format_value(self.min)),
            ("Average".to_string(), format!("{:.6}", self.mean)),
            ("Max".to_string(), format_value(self.max)),
            ("Median".to_string(), format!("{:.6}", self.median)),
            ("Range".to_string(), format_value(self.range)),
            ("Variance".to_string(), format!("{:.6}", self.variance)),
            (
                "Standard deviation".to_string(),
                format!("{:.6}", self.std_dev),
            ),
        ]
    }
}

/// Whole numbers print without a fractional part; counts usually are.
pub(crate) fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}
