use glidepath_runner::{
    BacktestOrchestrator, MemoCache, ResultCache, ScenarioConfig, VintageSweep,
};

fn orchestrator() -> BacktestOrchestrator {
    BacktestOrchestrator::new(ScenarioConfig::sample().to_scenario().unwrap())
}

#[test]
fn hard_fail_concurrency_torture() {
    let serial_orch = orchestrator();
    let serial = VintageSweep::new(&serial_orch)
        .with_parallelism(false)
        .run()
        .unwrap();

    // Many parallel sweeps sharing one memo must agree with the serial sweep
    let memo = MemoCache::new();
    std::thread::scope(|s| {
        for _ in 0..4 {
            let memo = memo.clone();
            let serial = &serial;
            s.spawn(move || {
                let orch = orchestrator().with_memo(memo);
                let parallel = orch.run_all().unwrap();
                assert_eq!(serial.len(), parallel.len());
                for id in serial.vintage_ids() {
                    let left = serial.get(id).unwrap();
                    let right = parallel.get(id).unwrap();
                    assert_eq!(left.run_id, right.run_id);
                    assert_eq!(left.portfolios, right.portfolios);
                    assert_eq!(left.annual_returns, right.annual_returns);
                }
            });
        }
    });
    assert_eq!(memo.len(), serial.len());
}

#[test]
fn hard_fail_cache_mutation() {
    let temp_dir = tempfile::tempdir().unwrap();
    let cache = ResultCache::new(temp_dir.path()).unwrap();

    let first = orchestrator().with_result_cache(cache.clone());
    let original = first.run("2040").unwrap();
    assert_eq!(cache.len().unwrap(), 1);

    // Truncate the cached file; a fresh orchestrator must recompute, not fail
    let path = temp_dir.path().join(format!("{}.json", original.run_id));
    let json = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, &json[..json.len() / 2]).unwrap();

    let second = orchestrator().with_result_cache(cache.clone());
    let recomputed = second.run("2040").unwrap();
    assert_eq!(recomputed.run_id, original.run_id);
    assert_eq!(recomputed.portfolios, original.portfolios);

    // The recomputed result overwrote the damaged entry
    assert!(cache.get(&original.run_id).unwrap().is_some());
}

#[test]
fn hard_fail_seed_change_invalidates_cache() {
    let temp_dir = tempfile::tempdir().unwrap();
    let cache = ResultCache::new(temp_dir.path()).unwrap();

    let base = ScenarioConfig::sample();
    let mut reseeded = base.clone();
    reseeded.seed = glidepath_core::SeedStrategy::Composite { master_seed: 7 };

    let a = BacktestOrchestrator::new(base.to_scenario().unwrap())
        .with_result_cache(cache.clone())
        .run("2030")
        .unwrap();
    let b = BacktestOrchestrator::new(reseeded.to_scenario().unwrap())
        .with_result_cache(cache.clone())
        .run("2030")
        .unwrap();

    assert_ne!(a.run_id, b.run_id);
    assert_ne!(
        a.portfolio("current").unwrap().metrics.final_value,
        b.portfolio("current").unwrap().metrics.final_value
    );
    assert_eq!(cache.len().unwrap(), 2);
}
