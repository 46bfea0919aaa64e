//! Portfolio compounding over shared asset paths.
//!
//! Every portfolio in a comparison is compounded against the same
//! [`AssetPaths`] value, so differences between the resulting series come
//! only from weighting. `AssetPaths` is built once and borrowed by each
//! `compound` call; there is no way to compound a portfolio against paths
//! synthesized separately for it.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::domain::{
    AnnualReturnTable, AssetId, Horizon, MonthlyReturnSeries, Period, PortfolioSeries,
    PortfolioWeights, SeriesPoint,
};
use crate::rng::SeedStrategy;
use crate::synth::{synthesize_series, SynthError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompoundError {
    #[error("portfolio '{portfolio}' references asset '{asset}' with no synthesized path")]
    MissingAsset { portfolio: String, asset: AssetId },
    #[error("path for '{asset}' has {actual} periods, horizon needs {expected}")]
    LengthMismatch {
        asset: AssetId,
        expected: usize,
        actual: usize,
    },
    #[error("path for '{asset}' starts at {actual}, horizon starts at {expected}")]
    Misaligned {
        asset: AssetId,
        expected: Period,
        actual: Period,
    },
}

/// Synthesized monthly paths for every asset in a comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetPaths {
    horizon: Horizon,
    series: BTreeMap<AssetId, MonthlyReturnSeries>,
}

impl AssetPaths {
    /// Synthesize one path per asset, each exactly once.
    pub fn synthesize<'a, I, V>(
        assets: I,
        table: &AnnualReturnTable,
        horizon: &Horizon,
        volatility: V,
        seeds: &SeedStrategy,
    ) -> Result<Self, SynthError>
    where
        I: IntoIterator<Item = &'a AssetId>,
        V: Fn(&AssetId) -> f64,
    {
        let unique: BTreeSet<&AssetId> = assets.into_iter().collect();
        let mut series = BTreeMap::new();
        for asset in unique {
            let path = synthesize_series(asset, table, horizon, volatility(asset), seeds)?;
            series.insert(asset.clone(), path);
        }
        Ok(Self {
            horizon: *horizon,
            series,
        })
    }

    /// Wrap pre-built paths, checking each covers the horizon from its first month.
    pub fn from_series<I>(horizon: Horizon, paths: I) -> Result<Self, CompoundError>
    where
        I: IntoIterator<Item = MonthlyReturnSeries>,
    {
        let expected = horizon.period_count();
        let start = horizon.periods().next();
        let mut series = BTreeMap::new();
        for path in paths {
            if path.len() < expected {
                return Err(CompoundError::LengthMismatch {
                    asset: path.asset.clone(),
                    expected,
                    actual: path.len(),
                });
            }
            if let (Some(start), Some(first)) = (start, path.points.first()) {
                if first.period() != start {
                    return Err(CompoundError::Misaligned {
                        asset: path.asset.clone(),
                        expected: start,
                        actual: first.period(),
                    });
                }
            }
            series.insert(path.asset.clone(), path);
        }
        Ok(Self { horizon, series })
    }

    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    pub fn get(&self, asset: &str) -> Option<&MonthlyReturnSeries> {
        self.series.get(asset)
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetId> {
        self.series.keys()
    }

    /// Path for `asset`, checked to cover the horizon.
    fn path_for(&self, portfolio: &str, asset: &AssetId) -> Result<&MonthlyReturnSeries, CompoundError> {
        let path = self
            .series
            .get(asset)
            .ok_or_else(|| CompoundError::MissingAsset {
                portfolio: portfolio.to_string(),
                asset: asset.clone(),
            })?;
        let expected = self.horizon.period_count();
        if path.len() < expected {
            return Err(CompoundError::LengthMismatch {
                asset: asset.clone(),
                expected,
                actual: path.len(),
            });
        }
        Ok(path)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Compound one portfolio from the base value over the paths' horizon.
///
/// Period return is `Σ weight/100 * asset_return`; the index updates as
/// `value *= 1 + period_return`.
pub fn compound(
    paths: &AssetPaths,
    name: &str,
    weights: &PortfolioWeights,
) -> Result<PortfolioSeries, CompoundError> {
    let expected = paths.horizon.period_count();
    let legs = weights
        .iter()
        .map(|(asset, weight)| paths.path_for(name, asset).map(|path| (weight / 100.0, path)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut series = PortfolioSeries::new(name);
    series.points.reserve(expected);
    let mut value = series.base_value;

    for (t, period) in paths.horizon.periods().enumerate() {
        let period_return: f64 = legs
            .iter()
            .map(|(w, path)| w * path.points[t].value)
            .sum();
        value *= 1.0 + period_return;
        series.points.push(SeriesPoint {
            year: period.year,
            month: period.month,
            value,
        });
    }

    Ok(series)
}

/// Compound every named portfolio against the same paths.
pub fn compound_all(
    paths: &AssetPaths,
    portfolios: &BTreeMap<String, PortfolioWeights>,
) -> Result<BTreeMap<String, PortfolioSeries>, CompoundError> {
    portfolios
        .iter()
        .map(|(name, weights)| -> Result<_, CompoundError> {
            Ok((name.clone(), compound(paths, name, weights)?))
        })
        .collect()
}
