//! Performance metrics: pure functions over a compounded portfolio series.
//!
//! Every metric is a pure function: series in, scalar (or per-year table) out.
//! No dependencies on the orchestrator, configuration, or caching.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use glidepath_core::domain::{PortfolioSeries, MONTHS_PER_YEAR};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("series has no periods")]
    EmptySeries,
    #[error("elapsed years must be positive and finite, got {0}")]
    InvalidElapsed(f64),
}

/// Aggregate performance metrics for one portfolio series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// `(final - base) / base` as a fraction.
    pub total_return: f64,
    /// Compound annual growth rate as a fraction.
    pub cagr: f64,
    /// Calendar-year returns as fractions. A partial final year covers only its months.
    pub annual_returns: BTreeMap<i32, f64>,
    /// Maximum drawdown in percent, always `<= 0`.
    pub max_drawdown_pct: f64,
    pub final_value: f64,
    /// Standard deviation of monthly returns, annualized, in percent.
    pub annualized_volatility_pct: f64,
    pub best_year: Option<YearReturn>,
    pub worst_year: Option<YearReturn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearReturn {
    pub year: i32,
    pub value: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from a series and its elapsed time in years.
    pub fn compute(series: &PortfolioSeries, years_elapsed: f64) -> Result<Self, MetricsError> {
        if series.is_empty() {
            return Err(MetricsError::EmptySeries);
        }
        if !(years_elapsed > 0.0 && years_elapsed.is_finite()) {
            return Err(MetricsError::InvalidElapsed(years_elapsed));
        }

        let annual = annual_returns(series);
        let best_year = extreme_year(&annual, |a, b| a > b);
        let worst_year = extreme_year(&annual, |a, b| a < b);

        Ok(Self {
            total_return: total_return(series),
            cagr: cagr(series.final_value(), series.base_value, years_elapsed),
            max_drawdown_pct: max_drawdown_pct(series),
            final_value: series.final_value(),
            annualized_volatility_pct: annualized_volatility_pct(&series.period_returns()),
            annual_returns: annual,
            best_year,
            worst_year,
        })
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - base) / base.
pub fn total_return(series: &PortfolioSeries) -> f64 {
    if series.base_value <= 0.0 {
        return 0.0;
    }
    (series.final_value() - series.base_value) / series.base_value
}

/// Compound Annual Growth Rate over `years_elapsed` (fractional years allowed).
///
/// Returns -1.0 for a wiped-out series and 0.0 for non-positive elapsed time.
pub fn cagr(final_value: f64, base_value: f64, years_elapsed: f64) -> f64 {
    if years_elapsed <= 0.0 || base_value <= 0.0 {
        return 0.0;
    }
    if final_value <= 0.0 {
        return -1.0;
    }
    (final_value / base_value).powf(1.0 / years_elapsed) - 1.0
}

/// Calendar-year returns.
///
/// Each year's denominator is the value at the last period of the prior year;
/// the first tracked year uses the base value.
pub fn annual_returns(series: &PortfolioSeries) -> BTreeMap<i32, f64> {
    let mut out = BTreeMap::new();
    let mut year_start = series.base_value;
    let mut points = series.points.iter().peekable();

    while let Some(point) = points.next() {
        let year_ends = points.peek().map_or(true, |next| next.year != point.year);
        if year_ends {
            let r = if year_start > 0.0 {
                point.value / year_start - 1.0
            } else {
                0.0
            };
            out.insert(point.year, r);
            year_start = point.value;
        }
    }
    out
}

/// Maximum drawdown in percent (e.g., -15.0 = 15% drawdown).
///
/// The running peak starts at the base value and only moves up. Returns 0.0
/// if the series never declines from its running peak.
pub fn max_drawdown_pct(series: &PortfolioSeries) -> f64 {
    let mut peak = series.base_value;
    let mut max_dd = 0.0_f64;

    for value in series.values() {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let dd = (value - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd * 100.0
}

/// Sample standard deviation of monthly returns × √12, in percent.
pub fn annualized_volatility_pct(monthly_returns: &[f64]) -> f64 {
    std_dev(monthly_returns) * (MONTHS_PER_YEAR as f64).sqrt() * 100.0
}

// ─── Helpers ────────────────────────────────────────────────────────

fn extreme_year<F>(annual: &BTreeMap<i32, f64>, better: F) -> Option<YearReturn>
where
    F: Fn(f64, f64) -> bool,
{
    annual.iter().fold(None, |acc, (&year, &value)| match acc {
        Some(YearReturn { value: current, .. }) if !better(value, current) => acc,
        _ => Some(YearReturn { year, value }),
    })
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
