//! Backtest runner: wires together synthesis, compounding, and metrics.
//!
//! `run_backtest()` is the single pipeline entry point: validate the vintage's
//! weights and return coverage, synthesize one path per referenced asset,
//! compound every portfolio against those shared paths, and compute metrics.
//! It is a pure function of its inputs; caching lives in the orchestrator.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use glidepath_core::{
    compound_all, AnnualReturnTable, AssetCatalog, AssetId, AssetPaths, CompoundError, Horizon,
    HorizonError, PortfolioSeries, PortfolioWeightSet, PortfolioWeights, RunId, ScenarioHash,
    SeedStrategy, SynthError, WeightError,
};

use crate::metrics::{MetricsError, PerformanceMetrics};
use crate::scenario::{SimulationParams, VintageId};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("unknown vintage '{0}'")]
    UnknownVintage(String),
    #[error("vintage '{0}' has no portfolios")]
    EmptyVintage(String),
    #[error("vintage '{vintage}', portfolio '{portfolio}': {source}")]
    InvalidWeights {
        vintage: String,
        portfolio: String,
        #[source]
        source: WeightError,
    },
    #[error("no annual return for '{asset}' in {year}")]
    MissingReturns { asset: AssetId, year: i32 },
    #[error("invalid horizon: {0}")]
    Horizon(#[from] HorizonError),
    #[error("synthesis error: {0}")]
    Synthesis(#[from] SynthError),
    #[error("compounding error: {0}")]
    Compound(#[from] CompoundError),
    #[error("metrics error for '{portfolio}': {source}")]
    Metrics {
        portfolio: String,
        #[source]
        source: MetricsError,
    },
    #[error("failed to fingerprint inputs: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Series and metrics for one named portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioOutcome {
    pub name: String,
    pub weights: PortfolioWeights,
    pub series: PortfolioSeries,
    pub metrics: PerformanceMetrics,
}

/// Complete result of one vintage run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub vintage_id: VintageId,
    pub horizon: Horizon,
    pub seed: SeedStrategy,
    /// Monthly volatility actually used for each referenced asset.
    pub volatility: BTreeMap<AssetId, f64>,
    /// Catalog label for each referenced asset.
    #[serde(default)]
    pub asset_labels: BTreeMap<AssetId, String>,
    pub scenario_hash: ScenarioHash,
    pub run_id: RunId,
    pub portfolios: BTreeMap<String, PortfolioOutcome>,
    /// year → portfolio → calendar-year return (fraction).
    pub annual_returns: BTreeMap<i32, BTreeMap<String, f64>>,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn portfolio(&self, name: &str) -> Option<&PortfolioOutcome> {
        self.portfolios.get(name)
    }

    pub fn portfolio_names(&self) -> impl Iterator<Item = &str> {
        self.portfolios.keys().map(String::as_str)
    }

    /// Portfolio with the highest final value.
    pub fn best_portfolio(&self) -> Option<&PortfolioOutcome> {
        self.portfolios
            .values()
            .max_by(|a, b| a.metrics.final_value.total_cmp(&b.metrics.final_value))
    }
}

/// Fingerprint and memoization key for one vintage of a scenario.
///
/// Hashes the return table, the vintage's weight set, the horizon, the seed
/// strategy, and the resolved per-asset volatility.
pub fn run_id_for(
    vintage_id: &str,
    table: &AnnualReturnTable,
    portfolios: &PortfolioWeightSet,
    params: &SimulationParams,
    catalog: &AssetCatalog,
) -> Result<(ScenarioHash, RunId), serde_json::Error> {
    #[derive(Serialize)]
    struct Inputs<'a> {
        table: &'a AnnualReturnTable,
        portfolios: &'a PortfolioWeightSet,
        horizon: &'a Horizon,
        seed: &'a SeedStrategy,
        volatility: BTreeMap<AssetId, f64>,
    }
    let hash = ScenarioHash::of(&Inputs {
        table,
        portfolios,
        horizon: &params.horizon,
        seed: &params.seed,
        volatility: resolve_volatility(portfolios, params, catalog),
    })?;
    let run_id = RunId::derive(&hash, vintage_id);
    Ok((hash, run_id))
}

/// Run the full pipeline for one vintage.
///
/// Every vintage of a scenario shares the same return table; with the same
/// seed strategy, two vintages referencing an asset see identical paths for it.
pub fn run_backtest(
    vintage_id: &str,
    table: &AnnualReturnTable,
    vintages: &BTreeMap<VintageId, PortfolioWeightSet>,
    params: &SimulationParams,
    catalog: &AssetCatalog,
) -> Result<BacktestResult, RunError> {
    let horizon = params.horizon;
    horizon.validate()?;

    let portfolios = vintages
        .get(vintage_id)
        .ok_or_else(|| RunError::UnknownVintage(vintage_id.to_string()))?;
    if portfolios.is_empty() {
        return Err(RunError::EmptyVintage(vintage_id.to_string()));
    }

    for (name, weights) in portfolios {
        weights
            .validate_against(table)
            .map_err(|source| RunError::InvalidWeights {
                vintage: vintage_id.to_string(),
                portfolio: name.clone(),
                source,
            })?;
    }

    let assets = referenced_assets(portfolios);
    for asset in &assets {
        if let Some(year) = table.first_missing_year(asset.as_str(), &horizon) {
            return Err(RunError::MissingReturns {
                asset: (*asset).clone(),
                year,
            });
        }
    }

    let volatility = resolve_volatility(portfolios, params, catalog);
    let paths = AssetPaths::synthesize(
        assets.iter().copied(),
        table,
        &horizon,
        |asset| volatility.get(asset).copied().unwrap_or_default(),
        &params.seed,
    )?;
    let series = compound_all(&paths, portfolios)?;

    let years_elapsed = horizon.years_elapsed();
    let mut outcomes = BTreeMap::new();
    let mut annual_returns: BTreeMap<i32, BTreeMap<String, f64>> = BTreeMap::new();
    for (name, series) in series {
        let metrics = PerformanceMetrics::compute(&series, years_elapsed).map_err(|source| {
            RunError::Metrics {
                portfolio: name.clone(),
                source,
            }
        })?;
        for (&year, &r) in &metrics.annual_returns {
            annual_returns.entry(year).or_default().insert(name.clone(), r);
        }
        let weights = portfolios.get(&name).cloned().unwrap_or_default();
        outcomes.insert(
            name.clone(),
            PortfolioOutcome {
                name,
                weights,
                series,
                metrics,
            },
        );
    }

    let (scenario_hash, run_id) = run_id_for(vintage_id, table, portfolios, params, catalog)?;
    let asset_labels = volatility
        .keys()
        .map(|asset| (asset.clone(), catalog.label_for(asset.as_str()).to_string()))
        .collect();

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        vintage_id: vintage_id.to_string(),
        horizon,
        seed: params.seed,
        volatility,
        asset_labels,
        scenario_hash,
        run_id,
        portfolios: outcomes,
        annual_returns,
    })
}

/// Union of assets referenced by any portfolio, each once.
fn referenced_assets(portfolios: &PortfolioWeightSet) -> BTreeSet<&AssetId> {
    portfolios.values().flat_map(PortfolioWeights::assets).collect()
}

fn resolve_volatility(
    portfolios: &PortfolioWeightSet,
    params: &SimulationParams,
    catalog: &AssetCatalog,
) -> BTreeMap<AssetId, f64> {
    referenced_assets(portfolios)
        .into_iter()
        .map(|asset| (asset.clone(), params.volatility_for(asset, catalog)))
        .collect()
}
