//! Result caching keyed by `RunId`.
//!
//! - `MemoCache`: in-process, thread-safe, shared by a vintage sweep.
//! - `ResultCache`: one pretty-printed JSON file per result on disk.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use glidepath_core::RunId;

use crate::runner::BacktestResult;

/// In-memory memoization of backtest results.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoCache {
    inner: Arc<Mutex<HashMap<RunId, Arc<BacktestResult>>>>,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, run_id: &RunId) -> Option<Arc<BacktestResult>> {
        self.lock().get(run_id).cloned()
    }

    /// Store a result, returning the shared handle.
    pub fn insert(&self, result: BacktestResult) -> Arc<BacktestResult> {
        let result = Arc::new(result);
        self.lock().insert(result.run_id.clone(), Arc::clone(&result));
        result
    }

    pub fn contains(&self, run_id: &RunId) -> bool {
        self.lock().contains_key(run_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // Every update is a single map call; a poisoned map is still consistent.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RunId, Arc<BacktestResult>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// On-disk cache for backtest results.
///
/// Results are keyed by RunId (content hash of the inputs plus vintage).
#[derive(Debug, Clone)]
pub struct ResultCache {
    cache_dir: PathBuf,
}

impl ResultCache {
    /// Creates a new cache with the specified directory.
    ///
    /// The directory will be created if it doesn't exist.
    pub fn new(cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&cache_dir).with_context(|| {
            format!("failed to create cache directory {}", cache_dir.display())
        })?;

        Ok(Self { cache_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Checks if a result is cached for the given RunId.
    pub fn contains(&self, run_id: &RunId) -> bool {
        self.result_path(run_id).exists()
    }

    /// Retrieves a cached result by RunId.
    ///
    /// Returns `None` if the result is not cached.
    pub fn get(&self, run_id: &RunId) -> Result<Option<BacktestResult>> {
        let path = self.result_path(run_id);

        if !path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&path).context("failed to read cached result")?;
        let result: BacktestResult =
            serde_json::from_str(&json).context("failed to deserialize cached result")?;

        tracing::debug!(run_id = %run_id, "cache hit");
        Ok(Some(result))
    }

    /// Stores a result in the cache.
    pub fn put(&self, result: &BacktestResult) -> Result<()> {
        let path = self.result_path(&result.run_id);
        let json = serde_json::to_string_pretty(result).context("failed to serialize result")?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write cached result {}", path.display()))?;

        tracing::debug!(run_id = %result.run_id, path = %path.display(), "cached result");
        Ok(())
    }

    /// Removes a result from the cache.
    pub fn remove(&self, run_id: &RunId) -> Result<()> {
        let path = self.result_path(run_id);

        if path.exists() {
            std::fs::remove_file(&path).context("failed to remove cached result")?;
        }

        Ok(())
    }

    /// Clears all cached results, returning how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let entries = self.entries()?;
        for path in &entries {
            std::fs::remove_file(path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
        tracing::info!(removed = entries.len(), dir = %self.cache_dir.display(), "cleared result cache");
        Ok(entries.len())
    }

    /// Returns the number of cached results.
    pub fn len(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Total size in bytes of all cached results.
    pub fn size_bytes(&self) -> Result<u64> {
        let mut total = 0;
        for path in self.entries()? {
            total += std::fs::metadata(&path)
                .with_context(|| format!("failed to stat {}", path.display()))?
                .len();
        }
        Ok(total)
    }

    fn entries(&self) -> Result<Vec<PathBuf>> {
        let read_dir = std::fs::read_dir(&self.cache_dir).with_context(|| {
            format!("failed to read cache directory {}", self.cache_dir.display())
        })?;
        Ok(read_dir
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")
            })
            .collect())
    }

    /// Returns the file path for a given RunId.
    fn result_path(&self, run_id: &RunId) -> PathBuf {
        self.cache_dir.join(format!("{}.json", run_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glidepath_core::{
        AnnualReturnTable, AssetCatalog, Horizon, PortfolioWeightSet, PortfolioWeights,
    };
    use std::collections::BTreeMap;

    use crate::runner::run_backtest;
    use crate::scenario::SimulationParams;

    fn create_test_result(vintage: &str) -> BacktestResult {
        let table = AnnualReturnTable::new()
            .with_asset("us_equity", [(2022, -18.1), (2023, 26.3)])
            .with_asset("us_bond", [(2022, -13.0), (2023, 5.5)]);
        let mut set = PortfolioWeightSet::new();
        set.insert(
            "current".into(),
            PortfolioWeights::from_pairs([("us_equity", 60.0), ("us_bond", 40.0)]),
        );
        let vintages = BTreeMap::from([(vintage.to_string(), set)]);
        let params = SimulationParams::new(Horizon::full_years(2022, 2023).unwrap());
        run_backtest(vintage, &table, &vintages, &params, &AssetCatalog::default_tdf()).unwrap()
    }

    #[test]
    fn test_cache_put_get() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(temp_dir.path()).unwrap();

        let result = create_test_result("2040");
        let run_id = result.run_id.clone();

        // Initially not cached
        assert!(!cache.contains(&run_id));
        assert!(cache.get(&run_id).unwrap().is_none());

        cache.put(&result).unwrap();

        assert!(cache.contains(&run_id));
        let retrieved = cache.get(&run_id).unwrap().unwrap();
        assert_eq!(retrieved.run_id, run_id);
        assert_eq!(retrieved.vintage_id, "2040");
        let a = retrieved.portfolio("current").unwrap().metrics.final_value;
        let b = result.portfolio("current").unwrap().metrics.final_value;
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_cache_remove() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(temp_dir.path()).unwrap();

        let result = create_test_result("2040");
        cache.put(&result).unwrap();
        assert!(cache.contains(&result.run_id));

        cache.remove(&result.run_id).unwrap();
        assert!(!cache.contains(&result.run_id));
    }

    #[test]
    fn test_cache_clear() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(temp_dir.path()).unwrap();

        for vintage in ["2030", "2040", "2050"] {
            cache.put(&create_test_result(vintage)).unwrap();
        }
        // Non-result files are left alone
        std::fs::write(temp_dir.path().join("notes.txt"), "keep").unwrap();

        assert_eq!(cache.len().unwrap(), 3);
        assert!(cache.size_bytes().unwrap() > 0);

        assert_eq!(cache.clear().unwrap(), 3);
        assert!(cache.is_empty().unwrap());
        assert!(temp_dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_cache_creates_nested_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let cache = ResultCache::new(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(cache.dir(), nested.as_path());
    }

    #[test]
    fn test_memo_shared_between_clones() {
        let memo = MemoCache::new();
        let other = memo.clone();
        let result = create_test_result("2040");
        let run_id = result.run_id.clone();

        assert!(memo.get(&run_id).is_none());
        other.insert(result);
        assert!(memo.contains(&run_id));
        assert_eq!(memo.len(), 1);

        memo.clear();
        assert!(other.is_empty());
    }
}
