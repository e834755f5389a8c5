//! Descriptive statistics over the final fitness values of repeated runs.

#![allow(clippy::cast_precision_loss)]

use std::fmt::Write as _;

/// Descriptive statistics of an integer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Sample size.
    pub count: usize,
    /// Median (the 0.5 quantile).
    pub median: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation, with the n-1 divisor.
    pub std_dev: f64,
    /// Standard error of the mean.
    pub std_error: f64,
    /// Smallest value.
    pub min: u32,
    /// Biggest value.
    pub max: u32,
    /// The 0.25 quantile.
    pub lower_quartile: f64,
    /// The 0.75 quantile.
    pub upper_quartile: f64,
}

impl Summary {
    /// Summarize a non-empty sample.
    ///
    /// Returns `None` on an empty sample.
    #[must_use]
    pub fn of(values: &[u32]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_unstable();

        let count = sorted.len();
        let mean = sorted.iter().map(|&v| f64::from(v)).sum::<f64>() / count as f64;
        let std_dev = if count > 1 {
            let variance = sorted
                .iter()
                .map(|&v| (f64::from(v) - mean).powi(2))
                .sum::<f64>()
                / (count - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        Some(Self {
            count,
            median: quantile(&sorted, 0.5),
            mean,
            std_dev,
            std_error: std_dev / (count as f64).sqrt(),
            min: sorted[0],
            max: sorted[count - 1],
            lower_quartile: quantile(&sorted, 0.25),
            upper_quartile: quantile(&sorted, 0.75),
        })
    }

    /// Render the summary as a plain-text report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Statistics over {} runs", self.count);
        let _ = writeln!(out, "Median: {:.2}", self.median);
        let _ = writeln!(out, "Arithmetic mean: {:.2}", self.mean);
        let _ = writeln!(out, "Standard error of the mean: {:.2}", self.std_error);
        let _ = writeln!(out, "Smallest value: {}", self.min);
        let _ = writeln!(out, "Biggest value: {}", self.max);
        let _ = writeln!(out, "Lower quartile: {:.2}", self.lower_quartile);
        let _ = writeln!(out, "Upper quartile: {:.2}", self.upper_quartile);
        let _ = writeln!(out, "Standard deviation: {:.2}", self.std_dev);
        out
    }
}

/// The p-quantile by the n*p rule: when n*p is fractional take the value at
/// ceil(n*p), otherwise average the values at n*p and n*p + 1 (1-based).
fn quantile(sorted: &[u32], p: f64) -> f64 {
    let np = sorted.len() as f64 * p;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    if np.fract() != 0.0 {
        let index = np.ceil() as usize - 1;
        f64::from(sorted[index])
    } else {
        let index = np as usize;
        f64::midpoint(f64::from(sorted[index - 1]), f64::from(sorted[index]))
    }
}
