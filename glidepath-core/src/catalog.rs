//! Asset class catalog: labels and default monthly volatility.
//!
//! Reference data only: the synthesizer never consults it directly. Callers
//! resolve a volatility per asset (override first, then catalog, then
//! [`DEFAULT_MONTHLY_VOLATILITY`]) before synthesis.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{AssetClass, AssetId};

/// Noise amplitude for assets absent from the catalog.
pub const DEFAULT_MONTHLY_VOLATILITY: f64 = 0.03;

/// Known asset classes keyed by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetCatalog {
    pub assets: BTreeMap<AssetId, AssetClass>,
}

impl AssetCatalog {
    pub fn new<I: IntoIterator<Item = AssetClass>>(classes: I) -> Self {
        Self {
            assets: classes.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }

    /// Asset classes used by the target-date fund dashboards.
    pub fn default_tdf() -> Self {
        Self::new([
            AssetClass::new("us_growth", "US Growth Equity", 0.055),
            AssetClass::new("us_value", "US Value Equity", 0.045),
            AssetClass::new("us_equity", "US Total Market", 0.045),
            AssetClass::new("dev_equity", "Developed ex-US Equity", 0.045),
            AssetClass::new("em_equity", "Emerging Markets Equity", 0.06),
            AssetClass::new("kr_equity", "Korea Equity", 0.06),
            AssetClass::new("us_bond", "US Aggregate Bond", 0.012),
            AssetClass::new("us_tips", "US Inflation-Linked Bond", 0.015),
            AssetClass::new("kr_bond", "Korea Government Bond", 0.008),
            AssetClass::new("reits", "Global REITs", 0.055),
            AssetClass::new("gold", "Gold", 0.04),
            AssetClass::new("cash", "Cash", 0.001),
        ])
    }

    pub fn get(&self, id: &str) -> Option<&AssetClass> {
        self.assets.get(id)
    }

    /// Human label, falling back to the id itself.
    pub fn label_for<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map_or(id, |c| c.label.as_str())
    }

    pub fn volatility_for(&self, id: &str) -> f64 {
        self.get(id)
            .map_or(DEFAULT_MONTHLY_VOLATILITY, |c| c.default_volatility)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::default_tdf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_lookups() {
        let c = AssetCatalog::default_tdf();
        assert_eq!(c.label_for("kr_bond"), "Korea Government Bond");
        assert!((c.volatility_for("gold") - 0.04).abs() < 1e-12);
    }

    #[test]
    fn unknown_asset_falls_back() {
        let c = AssetCatalog::default_tdf();
        assert_eq!(c.label_for("bitcoin"), "bitcoin");
        assert_eq!(c.volatility_for("bitcoin"), DEFAULT_MONTHLY_VOLATILITY);
    }

    #[test]
    fn equity_noisier_than_bonds() {
        let c = AssetCatalog::default_tdf();
        assert!(c.volatility_for("us_growth") > c.volatility_for("us_bond"));
        assert!(c.volatility_for("us_bond") > c.volatility_for("cash"));
    }
}
