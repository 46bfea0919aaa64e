use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::asset::AssetId;
use super::horizon::Horizon;

/// Annual percentage returns per asset class and calendar year.
///
/// `-30.0` means a 30% loss. The final year of a partial horizon holds the
/// year-to-date return over the months covered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnualReturnTable {
    returns: BTreeMap<AssetId, BTreeMap<i32, f64>>,
}

impl AnnualReturnTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of several years for one asset.
    pub fn with_asset<I>(mut self, asset: impl Into<AssetId>, years: I) -> Self
    where
        I: IntoIterator<Item = (i32, f64)>,
    {
        let entry = self.returns.entry(asset.into()).or_default();
        entry.extend(years);
        self
    }

    pub fn insert(&mut self, asset: impl Into<AssetId>, year: i32, pct: f64) {
        self.returns.entry(asset.into()).or_default().insert(year, pct);
    }

    pub fn get(&self, asset: &str, year: i32) -> Option<f64> {
        self.returns.get(asset).and_then(|years| years.get(&year)).copied()
    }

    pub fn contains_asset(&self, asset: &str) -> bool {
        self.returns.contains_key(asset)
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetId> {
        self.returns.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// First year of `horizon` with no entry for `asset`, if any.
    pub fn first_missing_year(&self, asset: &str, horizon: &Horizon) -> Option<i32> {
        match self.returns.get(asset) {
            None => Some(horizon.start_year),
            Some(years) => horizon.years().find(|y| !years.contains_key(y)),
        }
    }
}
