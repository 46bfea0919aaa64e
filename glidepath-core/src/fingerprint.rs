//! Input fingerprinting: deterministic identification of backtest inputs.
//!
//! - `ScenarioHash`: content hash of any serializable input (return table,
//!   weights, horizon, seed strategy).
//! - `RunId`: scenario hash + vintage, the memoization key for one result.
//!
//! Inputs use `BTreeMap` throughout, so serde_json output has a stable key
//! order and equal inputs hash equally.

use serde::{Deserialize, Serialize};
use std::fmt;

/// BLAKE3 hex digest of canonical JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScenarioHash(pub String);

impl ScenarioHash {
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string(value)?;
        Ok(Self(blake3::hash(json.as_bytes()).to_hex().to_string()))
    }

    /// First 12 hex chars, for file names and log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ScenarioHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Memoization key for one vintage run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn derive(scenario: &ScenarioHash, vintage_id: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(scenario.0.as_bytes());
        hasher.update(b"/");
        hasher.update(vintage_id.as_bytes());
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnnualReturnTable, PortfolioWeights};

    #[test]
    fn equal_inputs_hash_equal() {
        let a = AnnualReturnTable::new().with_asset("gold", [(2023, 13.1), (2022, -0.8)]);
        let b = AnnualReturnTable::new().with_asset("gold", [(2022, -0.8), (2023, 13.1)]);
        assert_eq!(ScenarioHash::of(&a).unwrap(), ScenarioHash::of(&b).unwrap());
    }

    #[test]
    fn different_inputs_hash_differently() {
        let a = PortfolioWeights::from_pairs([("gold", 100.0)]);
        let b = PortfolioWeights::from_pairs([("kr_bond", 100.0)]);
        assert_ne!(ScenarioHash::of(&a).unwrap(), ScenarioHash::of(&b).unwrap());
    }

    #[test]
    fn run_id_depends_on_vintage() {
        let h = ScenarioHash::of(&1u32).unwrap();
        assert_eq!(RunId::derive(&h, "2040"), RunId::derive(&h, "2040"));
        assert_ne!(RunId::derive(&h, "2040"), RunId::derive(&h, "2050"));
    }

    #[test]
    fn short_hash() {
        let h = ScenarioHash::of("x").unwrap();
        assert_eq!(h.short().len(), 12);
        assert!(h.0.starts_with(h.short()));
    }
}
