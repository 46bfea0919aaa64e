use serde::{Deserialize, Serialize};

use super::asset::AssetId;
use super::horizon::Period;

/// Starting index value of every portfolio series.
pub const BASE_VALUE: f64 = 100.0;

/// One synthesized monthly return (fraction, `0.01` = +1%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u32,
    pub value: f64,
}

impl MonthlyReturn {
    pub fn period(&self) -> Period {
        Period {
            year: self.year,
            month: self.month,
        }
    }
}

/// Chronological monthly returns for one asset class over a horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturnSeries {
    pub asset: AssetId,
    pub points: Vec<MonthlyReturn>,
}

impl MonthlyReturnSeries {
    pub fn new(asset: AssetId) -> Self {
        Self {
            asset,
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Compounded return of `year`'s months, in percent. `None` if the year is absent.
    pub fn compounded_year_pct(&self, year: i32) -> Option<f64> {
        let mut months = self.points.iter().filter(|p| p.year == year).peekable();
        months.peek()?;
        let factor: f64 = months.map(|p| 1.0 + p.value).product();
        Some((factor - 1.0) * 100.0)
    }
}

/// Cumulative value after one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub month: u32,
    pub value: f64,
}

impl SeriesPoint {
    pub fn period(&self) -> Period {
        Period {
            year: self.year,
            month: self.month,
        }
    }

    pub fn label(&self) -> String {
        self.period().label()
    }
}

/// Compounded index for one named portfolio, starting from [`BASE_VALUE`].
///
/// `points[i]` is the value at the end of period `i`; the base itself is not
/// a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSeries {
    pub name: String,
    pub base_value: f64,
    pub points: Vec<SeriesPoint>,
}

impl PortfolioSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_value: BASE_VALUE,
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Last value, or the base if no period has been compounded.
    pub fn final_value(&self) -> f64 {
        self.points.last().map_or(self.base_value, |p| p.value)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    /// Per-period returns recovered from consecutive values (base included).
    pub fn period_returns(&self) -> Vec<f64> {
        let mut prev = self.base_value;
        self.points
            .iter()
            .map(|p| {
                let r = if prev > 0.0 { p.value / prev - 1.0 } else { 0.0 };
                prev = p.value;
                r
            })
            .collect()
    }
}
