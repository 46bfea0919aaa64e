use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::asset::AssetId;
use super::returns::AnnualReturnTable;

/// Maximum allowed distance between a portfolio's weight total and 100.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightError {
    #[error("portfolio has no weights")]
    Empty,
    #[error("weight for '{asset}' is negative ({weight})")]
    Negative { asset: AssetId, weight: f64 },
    #[error("weight for '{asset}' is not finite")]
    NonFinite { asset: AssetId },
    #[error("weights sum to {total}, expected 100")]
    BadSum { total: f64 },
    #[error("asset '{0}' has no entry in the annual return table")]
    UnknownAsset(AssetId),
}

/// Portfolio allocation: asset class → weight in percent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioWeights(BTreeMap<AssetId, f64>);

/// Named portfolios compared within one vintage (e.g. "current", "prior", "benchmark").
pub type PortfolioWeightSet = BTreeMap<String, PortfolioWeights>;

impl PortfolioWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, A>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, f64)>,
        A: Into<AssetId>,
    {
        Self(pairs.into_iter().map(|(a, w)| (a.into(), w)).collect())
    }

    pub fn with(mut self, asset: impl Into<AssetId>, weight: f64) -> Self {
        self.0.insert(asset.into(), weight);
        self
    }

    pub fn get(&self, asset: &str) -> Option<f64> {
        self.0.get(asset).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, f64)> {
        self.0.iter().map(|(a, w)| (a, *w))
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetId> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Check non-negativity and that weights sum to 100 within tolerance.
    pub fn validate(&self) -> Result<(), WeightError> {
        if self.0.is_empty() {
            return Err(WeightError::Empty);
        }
        for (asset, &weight) in &self.0 {
            if !weight.is_finite() {
                return Err(WeightError::NonFinite {
                    asset: asset.clone(),
                });
            }
            if weight < 0.0 {
                return Err(WeightError::Negative {
                    asset: asset.clone(),
                    weight,
                });
            }
        }
        let total = self.total();
        if (total - 100.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightError::BadSum { total });
        }
        Ok(())
    }

    /// `validate()` plus: every referenced asset exists in `table`.
    pub fn validate_against(&self, table: &AnnualReturnTable) -> Result<(), WeightError> {
        self.validate()?;
        match self.0.keys().find(|a| !table.contains_asset(a.as_str())) {
            Some(missing) => Err(WeightError::UnknownAsset(missing.clone())),
            None => Ok(()),
        }
    }
}
