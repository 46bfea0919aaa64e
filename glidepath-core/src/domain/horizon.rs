use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

pub const MONTHS_PER_YEAR: u32 = 12;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HorizonError {
    #[error("horizon contains no periods")]
    Empty,
    #[error("horizon end year {end} is before start year {start}")]
    Reversed { start: i32, end: i32 },
    #[error("final year months must be in 1..=12, got {0}")]
    InvalidFinalMonths(u32),
}

/// Backtest window: full calendar years from `start_year`, with the final
/// year covering only its first `final_year_months` months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub start_year: i32,
    pub end_year: i32,
    #[serde(default = "full_year")]
    pub final_year_months: u32,
}

fn full_year() -> u32 {
    MONTHS_PER_YEAR
}

impl Horizon {
    /// Build and validate a horizon.
    pub fn new(start_year: i32, end_year: i32, final_year_months: u32) -> Result<Self, HorizonError> {
        let horizon = Self {
            start_year,
            end_year,
            final_year_months,
        };
        horizon.validate()?;
        Ok(horizon)
    }

    /// Horizon covering every month of `start_year..=end_year`.
    pub fn full_years(start_year: i32, end_year: i32) -> Result<Self, HorizonError> {
        Self::new(start_year, end_year, MONTHS_PER_YEAR)
    }

    pub fn validate(&self) -> Result<(), HorizonError> {
        if self.end_year < self.start_year {
            return Err(HorizonError::Reversed {
                start: self.start_year,
                end: self.end_year,
            });
        }
        if self.final_year_months == 0 {
            return if self.start_year == self.end_year {
                Err(HorizonError::Empty)
            } else {
                Err(HorizonError::InvalidFinalMonths(0))
            };
        }
        if self.final_year_months > MONTHS_PER_YEAR {
            return Err(HorizonError::InvalidFinalMonths(self.final_year_months));
        }
        Ok(())
    }

    /// Number of monthly periods: `12 * (end - start) + final_year_months`.
    pub fn period_count(&self) -> usize {
        if self.end_year < self.start_year {
            return 0;
        }
        let full = (self.end_year - self.start_year) as usize * MONTHS_PER_YEAR as usize;
        full + self.final_year_months.min(MONTHS_PER_YEAR) as usize
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    /// Months tracked in `year` (12, or fewer for the final year, 0 outside).
    pub fn months_in(&self, year: i32) -> u32 {
        if year < self.start_year || year > self.end_year {
            0
        } else if year == self.end_year {
            self.final_year_months.min(MONTHS_PER_YEAR)
        } else {
            MONTHS_PER_YEAR
        }
    }

    pub fn is_partial(&self) -> bool {
        self.final_year_months < MONTHS_PER_YEAR
    }

    /// Elapsed time in years, counting a partial final year as a fraction.
    pub fn years_elapsed(&self) -> f64 {
        self.period_count() as f64 / MONTHS_PER_YEAR as f64
    }

    /// All periods in chronological order.
    pub fn periods(&self) -> impl Iterator<Item = Period> + '_ {
        self.years().flat_map(move |year| {
            (1..=self.months_in(year)).map(move |month| Period { year, month })
        })
    }
}

/// One calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Label in `YYYY-MM` form.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_years_period_count() {
        let h = Horizon::full_years(2022, 2023).unwrap();
        assert_eq!(h.period_count(), 24);
        assert!((h.years_elapsed() - 2.0).abs() < 1e-12);
        assert!(!h.is_partial());
    }

    #[test]
    fn partial_final_year() {
        let h = Horizon::new(2020, 2023, 5).unwrap();
        assert_eq!(h.period_count(), 41);
        assert_eq!(h.months_in(2022), 12);
        assert_eq!(h.months_in(2023), 5);
        assert_eq!(h.months_in(2024), 0);
        let last = h.periods().last().unwrap();
        assert_eq!(last, Period { year: 2023, month: 5 });
    }

    #[test]
    fn single_month_horizon() {
        let h = Horizon::new(2024, 2024, 1).unwrap();
        assert_eq!(h.period_count(), 1);
        assert!((h.years_elapsed() - 1.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn zero_months_single_year_is_empty() {
        assert_eq!(Horizon::new(2024, 2024, 0), Err(HorizonError::Empty));
    }

    #[test]
    fn reversed_years_rejected() {
        assert_eq!(
            Horizon::new(2024, 2023, 12),
            Err(HorizonError::Reversed { start: 2024, end: 2023 })
        );
    }

    #[test]
    fn thirteen_months_rejected() {
        assert_eq!(
            Horizon::new(2020, 2021, 13),
            Err(HorizonError::InvalidFinalMonths(13))
        );
    }

    #[test]
    fn period_labels() {
        let p = Period { year: 2022, month: 3 };
        assert_eq!(p.label(), "2022-03");
    }

    #[test]
    fn final_months_default_to_twelve() {
        let h: Horizon = serde_json::from_str(r#"{"start_year":2020,"end_year":2021}"#).unwrap();
        assert_eq!(h.final_year_months, 12);
    }
}
