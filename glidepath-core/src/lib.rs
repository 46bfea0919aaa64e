//! Glidepath Core: synthetic-return engine for target-date portfolio backtests.
//!
//! This crate contains the computational heart of the backtester:
//! - Domain types (asset classes, annual return tables, weights, horizons, series)
//! - Seeded linear congruential noise with per-(asset, year) seed strategies
//! - Monthly return synthesis that compounds exactly to annual targets
//! - Portfolio compounding of several weight sets over shared asset paths
//! - Input fingerprinting for memoization
//!
//! Everything here is a pure function of its inputs. Nothing logs or performs I/O.

pub mod catalog;
pub mod compound;
pub mod domain;
pub mod fingerprint;
pub mod rng;
pub mod synth;

pub use catalog::{AssetCatalog, DEFAULT_MONTHLY_VOLATILITY};
pub use compound::{compound, compound_all, AssetPaths, CompoundError};
pub use domain::{
    AnnualReturnTable, AssetClass, AssetId, Horizon, HorizonError, MonthlyReturnSeries, Period,
    PortfolioSeries, PortfolioWeightSet, PortfolioWeights, WeightError,
};
pub use fingerprint::{RunId, ScenarioHash};
pub use rng::{NoiseStream, SeedStrategy};
pub use synth::{synthesize, synthesize_partial, synthesize_series, SynthError};
