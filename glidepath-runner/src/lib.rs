//! Glidepath Runner: backtest orchestration, metrics, sweeps, caching, export.
//!
//! This crate builds on `glidepath-core` to provide:
//! - Performance metrics over compounded portfolio series
//! - Scenario configuration loaded from TOML, with a built-in sample
//! - Single-vintage runner and a memoizing orchestrator
//! - Parallel sweep across all vintages of a scenario
//! - In-memory and on-disk result caches keyed by input fingerprint
//! - JSON, CSV and Markdown artifact export

pub mod cache;
pub mod config;
pub mod export;
pub mod metrics;
pub mod orchestrator;
pub mod runner;
pub mod scenario;
pub mod sweep;

pub use cache::{MemoCache, ResultCache};
pub use config::{ConfigError, ScenarioConfig};
pub use metrics::{MetricsError, PerformanceMetrics, YearReturn};
pub use orchestrator::BacktestOrchestrator;
pub use runner::{
    run_backtest, run_id_for, BacktestResult, PortfolioOutcome, RunError, SCHEMA_VERSION,
};
pub use scenario::{Scenario, SimulationParams, VintageId};
pub use sweep::{VintageComparison, VintageSweep};
