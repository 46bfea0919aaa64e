//! Monthly return synthesis.
//!
//! Turns an annual return target into monthly returns with realistic
//! month-to-month variation, then rescales them so they compound exactly to
//! the target:
//!
//! 1. geometric monthly rate `m = (1 + r)^(1/n) - 1`
//! 2. `raw_i = m + volatility * noise_i` from a chained [`NoiseStream`]
//! 3. `k = ((1 + r) / Π(1 + raw_i))^(1/n) - 1`
//! 4. `adj_i = (1 + raw_i)(1 + k) - 1`
//!
//! `n` is 12 for a full year, or the months covered for a partial final year.

use thiserror::Error;

use crate::domain::{
    AnnualReturnTable, AssetId, Horizon, MonthlyReturn, MonthlyReturnSeries, MONTHS_PER_YEAR,
};
use crate::rng::{NoiseStream, SeedStrategy};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthError {
    #[error("annual return is not finite: {0}")]
    NonFinite(f64),
    #[error("volatility must be finite and non-negative, got {0}")]
    InvalidVolatility(f64),
    #[error("month count must be in 1..=12, got {0}")]
    InvalidMonths(u32),
    #[error("degenerate annual return {annual_return_pct}%: {reason}")]
    DegenerateReturn {
        annual_return_pct: f64,
        reason: &'static str,
    },
    #[error("no annual return for '{asset}' in {year}")]
    MissingReturn { asset: AssetId, year: i32 },
}

/// Twelve monthly returns compounding exactly to `annual_return_pct`.
pub fn synthesize(
    annual_return_pct: f64,
    volatility: f64,
    seed: u64,
) -> Result<[f64; 12], SynthError> {
    let months = synthesize_partial(annual_return_pct, volatility, seed, MONTHS_PER_YEAR)?;
    let mut out = [0.0; 12];
    out.copy_from_slice(&months);
    Ok(out)
}

/// `months` monthly returns compounding exactly to `target_pct` over those months.
pub fn synthesize_partial(
    target_pct: f64,
    volatility: f64,
    seed: u64,
    months: u32,
) -> Result<Vec<f64>, SynthError> {
    if !target_pct.is_finite() {
        return Err(SynthError::NonFinite(target_pct));
    }
    if !volatility.is_finite() || volatility < 0.0 {
        return Err(SynthError::InvalidVolatility(volatility));
    }
    if months == 0 || months > MONTHS_PER_YEAR {
        return Err(SynthError::InvalidMonths(months));
    }

    let target = 1.0 + target_pct / 100.0;
    if target <= 0.0 {
        return Err(degenerate(target_pct, "total loss of 100% or more"));
    }

    let n = months as f64;
    let monthly_rate = target.powf(1.0 / n) - 1.0;
    let raw: Vec<f64> = NoiseStream::new(seed)
        .take(months as usize)
        .map(|noise| monthly_rate + volatility * noise)
        .collect();

    if raw.iter().any(|r| 1.0 + r <= 0.0) {
        return Err(degenerate(target_pct, "noise pushed a monthly factor to zero or below"));
    }
    let actual: f64 = raw.iter().map(|r| 1.0 + r).product();
    if !(actual > 0.0 && actual.is_finite()) {
        return Err(degenerate(target_pct, "compounded raw factor is not positive"));
    }

    let k = (target / actual).powf(1.0 / n) - 1.0;
    Ok(raw.iter().map(|r| (1.0 + r) * (1.0 + k) - 1.0).collect())
}

fn degenerate(annual_return_pct: f64, reason: &'static str) -> SynthError {
    SynthError::DegenerateReturn {
        annual_return_pct,
        reason,
    }
}

/// Full monthly path for one asset over `horizon`.
///
/// Each year is synthesized independently with the seed chosen by `seeds`;
/// the final year of a partial horizon uses its covered month count.
pub fn synthesize_series(
    asset: &AssetId,
    table: &AnnualReturnTable,
    horizon: &Horizon,
    volatility: f64,
    seeds: &SeedStrategy,
) -> Result<MonthlyReturnSeries, SynthError> {
    let mut series = MonthlyReturnSeries::new(asset.clone());
    series.points.reserve(horizon.period_count());

    for year in horizon.years() {
        let pct = table
            .get(asset.as_str(), year)
            .ok_or_else(|| SynthError::MissingReturn {
                asset: asset.clone(),
                year,
            })?;
        let seed = seeds.seed_for(asset, year, pct);
        let months = synthesize_partial(pct, volatility, seed, horizon.months_in(year))?;
        series
            .points
            .extend(months.into_iter().enumerate().map(|(i, value)| MonthlyReturn {
                year,
                month: i as u32 + 1,
                value,
            }));
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compound(months: &[f64]) -> f64 {
        (months.iter().map(|r| 1.0 + r).product::<f64>() - 1.0) * 100.0
    }

    #[test]
    fn compounds_to_target() {
        for &pct in &[-45.0, -30.0, -0.8, 0.0, 7.5, 42.7, 150.0] {
            let months = synthesize(pct, 0.04, 1234).unwrap();
            let got = compound(&months);
            assert!(
                ((1.0 + got / 100.0) / (1.0 + pct / 100.0) - 1.0).abs() < 1e-9,
                "target {pct}, got {got}"
            );
        }
    }

    #[test]
    fn months_vary() {
        let months = synthesize(10.0, 0.03, 99).unwrap();
        let min = months.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = months.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(max - min > 0.01, "expected month-to-month variation");
    }

    #[test]
    fn zero_volatility_gives_flat_geometric_months() {
        let months = synthesize(12.0, 0.0, 5).unwrap();
        let m = 1.12_f64.powf(1.0 / 12.0) - 1.0;
        for r in months {
            assert!((r - m).abs() < 1e-12);
        }
    }

    #[test]
    fn deterministic() {
        assert_eq!(synthesize(8.0, 0.05, 42).unwrap(), synthesize(8.0, 0.05, 42).unwrap());
        assert_ne!(synthesize(8.0, 0.05, 42).unwrap(), synthesize(8.0, 0.05, 43).unwrap());
    }

    #[test]
    fn total_wipeout_is_degenerate() {
        assert!(matches!(
            synthesize(-100.0, 0.03, 1),
            Err(SynthError::DegenerateReturn { .. })
        ));
        assert!(matches!(
            synthesize(-150.0, 0.03, 1),
            Err(SynthError::DegenerateReturn { .. })
        ));
    }

    #[test]
    fn extreme_noise_is_degenerate() {
        // -95% gives m ≈ -0.22; noise of amplitude 2 drives factors below zero
        assert!(matches!(
            synthesize(-95.0, 2.0, 0),
            Err(SynthError::DegenerateReturn { .. })
        ));
    }

    #[test]
    fn invalid_inputs() {
        assert!(matches!(synthesize(f64::NAN, 0.03, 1), Err(SynthError::NonFinite(_))));
        assert!(matches!(synthesize(5.0, -0.1, 1), Err(SynthError::InvalidVolatility(_))));
        assert!(matches!(
            synthesize_partial(5.0, 0.03, 1, 0),
            Err(SynthError::InvalidMonths(0))
        ));
        assert!(matches!(
            synthesize_partial(5.0, 0.03, 1, 13),
            Err(SynthError::InvalidMonths(13))
        ));
    }

    #[test]
    fn partial_year_compounds_to_ytd_target() {
        let months = synthesize_partial(6.0, 0.04, 77, 5).unwrap();
        assert_eq!(months.len(), 5);
        assert!((compound(&months) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn single_month_equals_target() {
        let months = synthesize_partial(2.5, 0.05, 3, 1).unwrap();
        assert!((months[0] - 0.025).abs() < 1e-12);
    }

    #[test]
    fn series_covers_horizon() {
        let table = AnnualReturnTable::new().with_asset("gold", [(2022, -0.8), (2023, 13.1), (2024, 9.0)]);
        let horizon = Horizon::new(2022, 2024, 3).unwrap();
        let asset = AssetId::new("gold");
        let s = synthesize_series(&asset, &table, &horizon, 0.04, &SeedStrategy::default()).unwrap();
        assert_eq!(s.len(), 27);
        assert!((s.compounded_year_pct(2023).unwrap() - 13.1).abs() < 1e-9);
        assert!((s.compounded_year_pct(2024).unwrap() - 9.0).abs() < 1e-9);
        assert_eq!(s.points.last().map(|p| (p.year, p.month)), Some((2024, 3)));
    }

    #[test]
    fn series_missing_year() {
        let table = AnnualReturnTable::new().with_asset("gold", [(2022, -0.8)]);
        let horizon = Horizon::full_years(2022, 2023).unwrap();
        let err = synthesize_series(&AssetId::new("gold"), &table, &horizon, 0.04, &SeedStrategy::default())
            .unwrap_err();
        assert_eq!(
            err,
            SynthError::MissingReturn {
                asset: AssetId::new("gold"),
                year: 2023
            }
        );
    }
}
