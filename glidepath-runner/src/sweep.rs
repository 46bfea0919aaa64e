//! Vintage sweep: runs every vintage of a scenario, optionally in parallel.

use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::orchestrator::BacktestOrchestrator;
use crate::runner::{BacktestResult, RunError};
use crate::scenario::VintageId;

/// Sweep executor over all vintages of an orchestrator's scenario.
pub struct VintageSweep<'a> {
    orchestrator: &'a BacktestOrchestrator,
    parallel: bool,
}

impl<'a> VintageSweep<'a> {
    pub fn new(orchestrator: &'a BacktestOrchestrator) -> Self {
        Self {
            orchestrator,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn run(&self) -> Result<VintageComparison, RunError> {
        self.run_with_progress(|_, _, _| {})
    }

    /// Runs the sweep, invoking the callback after each vintage completes with
    /// the number completed so far, the total, and the result.
    pub fn run_with_progress<F>(&self, progress: F) -> Result<VintageComparison, RunError>
    where
        F: Fn(usize, usize, &BacktestResult) + Send + Sync,
    {
        let scenario = self.orchestrator.scenario();
        let ids: Vec<&str> = scenario.vintage_ids().collect();
        let total = ids.len();
        let done = std::sync::atomic::AtomicUsize::new(0);
        let started = Instant::now();

        tracing::info!(
            scenario = %scenario.name,
            vintages = total,
            parallel = self.parallel,
            "starting vintage sweep"
        );

        let run_one = |id: &&str| -> Result<(VintageId, Arc<BacktestResult>), RunError> {
            let result = self.orchestrator.run(id)?;
            let n = done.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1;
            progress(n, total, &result);
            Ok((id.to_string(), result))
        };

        let results: BTreeMap<VintageId, Arc<BacktestResult>> = if self.parallel {
            ids.par_iter().map(run_one).collect::<Result<_, _>>()?
        } else {
            ids.iter().map(run_one).collect::<Result<_, _>>()?
        };

        tracing::info!(
            vintages = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "vintage sweep complete"
        );

        Ok(VintageComparison {
            scenario: scenario.name.clone(),
            results,
        })
    }
}

/// Results for every vintage of a scenario, keyed by vintage id.
#[derive(Debug, Clone)]
pub struct VintageComparison {
    pub scenario: String,
    pub results: BTreeMap<VintageId, Arc<BacktestResult>>,
}

impl VintageComparison {
    pub fn get(&self, vintage_id: &str) -> Option<&BacktestResult> {
        self.results.get(vintage_id).map(Arc::as_ref)
    }

    pub fn vintage_ids(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Final value of `portfolio` in each vintage that has it.
    pub fn final_values(&self, portfolio: &str) -> BTreeMap<&str, f64> {
        self.results
            .iter()
            .filter_map(|(id, r)| {
                r.portfolio(portfolio)
                    .map(|p| (id.as_str(), p.metrics.final_value))
            })
            .collect()
    }

    /// Vintages ranked by `portfolio`'s final value, best first.
    pub fn ranked_by_final_value(&self, portfolio: &str) -> Vec<(&str, f64)> {
        let mut ranked: Vec<_> = self.final_values(portfolio).into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glidepath_core::{AnnualReturnTable, Horizon, PortfolioWeightSet, PortfolioWeights};
    use std::sync::Mutex;

    use crate::scenario::{Scenario, SimulationParams};

    fn orchestrator() -> BacktestOrchestrator {
        let table = AnnualReturnTable::new()
            .with_asset("us_equity", [(2020, 18.4), (2021, 28.7), (2022, -18.1)])
            .with_asset("us_bond", [(2020, 7.5), (2021, -1.5), (2022, -13.0)]);
        let params = SimulationParams::new(Horizon::full_years(2020, 2022).unwrap());
        let mut scenario = Scenario::new("sweep", table, params);
        for (id, equity) in [("2030", 40.0), ("2040", 60.0), ("2050", 90.0)] {
            let set = PortfolioWeightSet::from([
                (
                    "current".to_string(),
                    PortfolioWeights::from_pairs([
                        ("us_equity", equity),
                        ("us_bond", 100.0 - equity),
                    ]),
                ),
                (
                    "benchmark".to_string(),
                    PortfolioWeights::from_pairs([("us_equity", 50.0), ("us_bond", 50.0)]),
                ),
            ]);
            scenario = scenario.with_vintage(id, set);
        }
        BacktestOrchestrator::new(scenario)
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let orch = orchestrator();
        let seq = VintageSweep::new(&orch).with_parallelism(false).run().unwrap();
        let par = VintageSweep::new(&orchestrator()).run().unwrap();

        assert_eq!(seq.len(), 3);
        for id in seq.vintage_ids() {
            assert_eq!(
                seq.get(id).unwrap().portfolios,
                par.get(id).unwrap().portfolios
            );
        }
    }

    #[test]
    fn progress_reports_every_vintage() {
        let orch = orchestrator();
        let seen = Mutex::new(Vec::new());
        VintageSweep::new(&orch)
            .run_with_progress(|n, total, r| {
                assert_eq!(total, 3);
                seen.lock().unwrap().push((n, r.vintage_id.clone()));
            })
            .unwrap();

        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen.iter().map(|(n, _)| *n).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn benchmark_identical_across_vintages() {
        // Same weights, same table, same seeds: the benchmark cannot differ
        let comparison = orchestrator().run_all().unwrap();
        let finals = comparison.final_values("benchmark");
        assert_eq!(finals.len(), 3);
        let first = finals["2030"];
        assert!(finals.values().all(|&v| v == first));
    }

    #[test]
    fn ranking_is_descending() {
        let comparison = orchestrator().run_all().unwrap();
        let ranked = comparison.ranked_by_final_value("current");
        assert_eq!(ranked.len(), 3);
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
        assert!(comparison.final_values("missing").is_empty());
    }
}
