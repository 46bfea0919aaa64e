//! In-memory backtest scenario: return table, vintages, and simulation parameters.
//!
//! A `Scenario` is what the orchestrator runs. It is usually built from a
//! TOML [`ScenarioConfig`](crate::config::ScenarioConfig), but tests and
//! library callers construct it directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use glidepath_core::{
    AnnualReturnTable, AssetCatalog, AssetId, Horizon, PortfolioWeightSet, ScenarioHash,
    SeedStrategy,
};

/// Identifier of a target-date vintage, e.g. `"2040"`.
pub type VintageId = String;

/// Parameters shared by every vintage in a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub horizon: Horizon,
    #[serde(default)]
    pub seed: SeedStrategy,
    /// Per-asset monthly volatility overrides. Assets not listed here fall
    /// back to the catalog default.
    #[serde(default)]
    pub volatility: BTreeMap<AssetId, f64>,
}

impl SimulationParams {
    pub fn new(horizon: Horizon) -> Self {
        Self {
            horizon,
            seed: SeedStrategy::default(),
            volatility: BTreeMap::new(),
        }
    }

    pub fn with_seed(mut self, seed: SeedStrategy) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_volatility(mut self, asset: impl Into<AssetId>, volatility: f64) -> Self {
        self.volatility.insert(asset.into(), volatility);
        self
    }

    /// Override, then catalog, then the global default.
    pub fn volatility_for(&self, asset: &AssetId, catalog: &AssetCatalog) -> f64 {
        self.volatility
            .get(asset)
            .copied()
            .unwrap_or_else(|| catalog.volatility_for(asset.as_str()))
    }
}

/// Everything needed to run any vintage of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub table: AnnualReturnTable,
    pub vintages: BTreeMap<VintageId, PortfolioWeightSet>,
    pub params: SimulationParams,
}

impl Scenario {
    pub fn new(name: impl Into<String>, table: AnnualReturnTable, params: SimulationParams) -> Self {
        Self {
            name: name.into(),
            table,
            vintages: BTreeMap::new(),
            params,
        }
    }

    pub fn with_vintage(mut self, id: impl Into<VintageId>, portfolios: PortfolioWeightSet) -> Self {
        self.vintages.insert(id.into(), portfolios);
        self
    }

    pub fn vintage(&self, id: &str) -> Option<&PortfolioWeightSet> {
        self.vintages.get(id)
    }

    pub fn vintage_ids(&self) -> impl Iterator<Item = &str> {
        self.vintages.keys().map(String::as_str)
    }

    /// Content hash of the inputs that determine a vintage's result.
    ///
    /// The scenario name is not part of the hash; renaming a scenario keeps
    /// its cached results valid.
    pub fn fingerprint(&self) -> Result<ScenarioHash, serde_json::Error> {
        #[derive(Serialize)]
        struct Inputs<'a> {
            table: &'a AnnualReturnTable,
            vintages: &'a BTreeMap<VintageId, PortfolioWeightSet>,
            params: &'a SimulationParams,
        }
        ScenarioHash::of(&Inputs {
            table: &self.table,
            vintages: &self.vintages,
            params: &self.params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glidepath_core::PortfolioWeights;

    fn scenario() -> Scenario {
        let table = AnnualReturnTable::new()
            .with_asset("us_equity", [(2022, -18.1), (2023, 26.3)])
            .with_asset("us_bond", [(2022, -13.0), (2023, 5.5)]);
        let params = SimulationParams::new(Horizon::full_years(2022, 2023).unwrap());
        let mut set = PortfolioWeightSet::new();
        set.insert(
            "current".into(),
            PortfolioWeights::from_pairs([("us_equity", 60.0), ("us_bond", 40.0)]),
        );
        Scenario::new("demo", table, params).with_vintage("2040", set)
    }

    #[test]
    fn volatility_resolution_order() {
        let catalog = AssetCatalog::default_tdf();
        let params = SimulationParams::new(Horizon::full_years(2022, 2023).unwrap())
            .with_volatility("gold", 0.02);

        assert_eq!(params.volatility_for(&AssetId::new("gold"), &catalog), 0.02);
        assert_eq!(params.volatility_for(&AssetId::new("kr_bond"), &catalog), 0.008);
        assert_eq!(
            params.volatility_for(&AssetId::new("crypto"), &catalog),
            glidepath_core::DEFAULT_MONTHLY_VOLATILITY
        );
    }

    #[test]
    fn fingerprint_ignores_name() {
        let a = scenario();
        let mut b = scenario();
        b.name = "renamed".into();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn fingerprint_tracks_seed() {
        let a = scenario();
        let mut b = scenario();
        b.params.seed = SeedStrategy::AnnualReturn;
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn vintage_lookup() {
        let s = scenario();
        assert!(s.vintage("2040").is_some());
        assert!(s.vintage("2050").is_none());
        assert_eq!(s.vintage_ids().collect::<Vec<_>>(), vec!["2040"]);
    }
}
