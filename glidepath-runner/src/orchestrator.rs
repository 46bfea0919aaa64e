//! Backtest orchestrator: runs vintages of a scenario with memoization.
//!
//! Lookup order for a vintage: in-memory memo, then the optional on-disk
//! result cache, then the pipeline. Fresh results are written to both.

use std::sync::Arc;

use glidepath_core::AssetCatalog;

use crate::cache::{MemoCache, ResultCache};
use crate::runner::{run_backtest, run_id_for, BacktestResult, RunError};
use crate::scenario::Scenario;
use crate::sweep::{VintageComparison, VintageSweep};

pub struct BacktestOrchestrator {
    scenario: Scenario,
    catalog: AssetCatalog,
    memo: MemoCache,
    disk: Option<ResultCache>,
}

impl BacktestOrchestrator {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            catalog: AssetCatalog::default_tdf(),
            memo: MemoCache::new(),
            disk: None,
        }
    }

    pub fn with_catalog(mut self, catalog: AssetCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Share a memo cache with other orchestrators.
    pub fn with_memo(mut self, memo: MemoCache) -> Self {
        self.memo = memo;
        self
    }

    pub fn with_result_cache(mut self, cache: ResultCache) -> Self {
        self.disk = Some(cache);
        self
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn memo(&self) -> &MemoCache {
        &self.memo
    }

    pub fn result_cache(&self) -> Option<&ResultCache> {
        self.disk.as_ref()
    }

    /// Run one vintage, reusing a memoized or cached result when the inputs match.
    pub fn run(&self, vintage_id: &str) -> Result<Arc<BacktestResult>, RunError> {
        let portfolios = self
            .scenario
            .vintage(vintage_id)
            .ok_or_else(|| RunError::UnknownVintage(vintage_id.to_string()))?;
        let (_, run_id) = run_id_for(
            vintage_id,
            &self.scenario.table,
            portfolios,
            &self.scenario.params,
            &self.catalog,
        )?;

        if let Some(hit) = self.memo.get(&run_id) {
            tracing::trace!(vintage = vintage_id, "memo hit");
            return Ok(hit);
        }

        if let Some(disk) = &self.disk {
            match disk.get(&run_id) {
                Ok(Some(result)) => return Ok(self.memo.insert(result)),
                Ok(None) => {}
                Err(e) => tracing::warn!(vintage = vintage_id, error = %e, "ignoring unreadable cache entry"),
            }
        }

        let result = run_backtest(
            vintage_id,
            &self.scenario.table,
            &self.scenario.vintages,
            &self.scenario.params,
            &self.catalog,
        )?;

        if let Some(disk) = &self.disk {
            if let Err(e) = disk.put(&result) {
                tracing::warn!(vintage = vintage_id, error = %e, "failed to cache result");
            }
        }

        Ok(self.memo.insert(result))
    }

    /// Run every vintage in parallel.
    pub fn run_all(&self) -> Result<VintageComparison, RunError> {
        VintageSweep::new(self).run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glidepath_core::{
        AnnualReturnTable, Horizon, PortfolioWeightSet, PortfolioWeights, SeedStrategy,
    };

    use crate::scenario::SimulationParams;

    fn scenario() -> Scenario {
        let table = AnnualReturnTable::new()
            .with_asset("us_equity", [(2021, 28.7), (2022, -18.1), (2023, 26.3)])
            .with_asset("us_bond", [(2021, -1.5), (2022, -13.0), (2023, 5.5)]);
        let params = SimulationParams::new(Horizon::new(2021, 2023, 6).unwrap());
        let set = |equity: f64| -> PortfolioWeightSet {
            PortfolioWeightSet::from([(
                "current".to_string(),
                PortfolioWeights::from_pairs([("us_equity", equity), ("us_bond", 100.0 - equity)]),
            )])
        };
        Scenario::new("test", table, params)
            .with_vintage("2030", set(40.0))
            .with_vintage("2050", set(80.0))
    }

    #[test]
    fn second_run_hits_memo() {
        let orch = BacktestOrchestrator::new(scenario());
        let first = orch.run("2030").unwrap();
        let second = orch.run("2030").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(orch.memo().len(), 1);
    }

    #[test]
    fn changed_inputs_miss_memo() {
        let memo = MemoCache::new();
        let a = BacktestOrchestrator::new(scenario()).with_memo(memo.clone());
        let mut changed = scenario();
        changed.params.seed = SeedStrategy::Composite { master_seed: 7 };
        let b = BacktestOrchestrator::new(changed).with_memo(memo.clone());

        let ra = a.run("2030").unwrap();
        let rb = b.run("2030").unwrap();
        assert_ne!(ra.run_id, rb.run_id);
        assert_eq!(memo.len(), 2);
    }

    #[test]
    fn unknown_vintage() {
        let orch = BacktestOrchestrator::new(scenario());
        assert!(matches!(orch.run("2099"), Err(RunError::UnknownVintage(_))));
    }

    #[test]
    fn disk_cache_survives_new_orchestrator() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(dir.path()).unwrap();

        let first = BacktestOrchestrator::new(scenario()).with_result_cache(cache.clone());
        let r1 = first.run("2050").unwrap();
        assert_eq!(cache.len().unwrap(), 1);

        let second = BacktestOrchestrator::new(scenario()).with_result_cache(cache.clone());
        let r2 = second.run("2050").unwrap();
        assert_eq!(r1.run_id, r2.run_id);
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn corrupt_cache_entry_is_recomputed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(dir.path()).unwrap();
        let orch = BacktestOrchestrator::new(scenario());
        let run_id = orch.run("2030").unwrap().run_id.clone();
        std::fs::write(dir.path().join(format!("{run_id}.json")), "{ not json").unwrap();

        let fresh = BacktestOrchestrator::new(scenario()).with_result_cache(cache);
        let result = fresh.run("2030").unwrap();
        assert_eq!(result.run_id, run_id);
    }

    #[test]
    fn run_all_covers_every_vintage() {
        let orch = BacktestOrchestrator::new(scenario());
        let comparison = orch.run_all().unwrap();
        assert_eq!(comparison.vintage_ids().collect::<Vec<_>>(), vec!["2030", "2050"]);
        assert_eq!(orch.memo().len(), 2);
    }
}
