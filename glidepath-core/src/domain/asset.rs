use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Asset class identifier (e.g. `us_growth`, `gold`, `kr_bond`).
///
/// Ordered so that maps keyed by `AssetId` iterate deterministically; every
/// weighted sum in the compounder walks assets in this order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AssetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for AssetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Immutable reference data for one asset class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetClass {
    pub id: AssetId,
    pub label: String,
    /// Monthly noise amplitude used by the synthesizer when no override is given.
    pub default_volatility: f64,
}

impl AssetClass {
    pub fn new(id: impl Into<String>, label: impl Into<String>, default_volatility: f64) -> Self {
        Self {
            id: AssetId::new(id),
            label: label.into(),
            default_volatility,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn asset_id_lookup_by_str() {
        let mut m = BTreeMap::new();
        m.insert(AssetId::new("gold"), 1.0);
        assert_eq!(m.get("gold"), Some(&1.0));
    }

    #[test]
    fn asset_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&AssetId::new("kr_bond")).unwrap();
        assert_eq!(json, "\"kr_bond\"");
    }
}
