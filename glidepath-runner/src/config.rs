//! TOML scenario configuration.
//!
//! ```toml
//! name = "tdf-comparison"
//!
//! [horizon]
//! start_year = 2019
//! end_year = 2025
//! final_year_months = 6
//!
//! [seed]
//! strategy = "composite"
//! master_seed = 42
//!
//! [volatility]
//! gold = 0.04
//!
//! [returns.us_growth]
//! 2019 = 36.4
//! 2020 = 38.5
//!
//! [vintages.2040.current]
//! us_growth = 40.0
//! us_bond = 60.0
//! ```
//!
//! Year keys are strings in TOML and are parsed when the config is turned
//! into a [`Scenario`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use glidepath_core::{AnnualReturnTable, Horizon, HorizonError, PortfolioWeights, SeedStrategy};

use crate::scenario::{Scenario, SimulationParams};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("asset '{asset}' has non-integer year key '{key}'")]
    InvalidYear { asset: String, key: String },
    #[error("scenario defines no vintages")]
    NoVintages,
    #[error("volatility for '{asset}' must be non-negative and finite, got {value}")]
    InvalidVolatility { asset: String, value: f64 },
    #[error("invalid horizon: {0}")]
    Horizon(#[from] HorizonError),
}

/// Scenario as written on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub horizon: Horizon,
    #[serde(default)]
    pub seed: SeedStrategy,
    #[serde(default)]
    pub volatility: BTreeMap<String, f64>,
    /// asset → year → annual percent return.
    pub returns: BTreeMap<String, BTreeMap<String, f64>>,
    /// vintage → portfolio → asset → weight percent.
    pub vintages: BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>>,
}

fn default_name() -> String {
    "scenario".into()
}

impl ScenarioConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate and convert into an in-memory [`Scenario`].
    ///
    /// Weights are not validated here; the orchestrator reports weight
    /// problems per vintage and portfolio when it runs.
    pub fn to_scenario(&self) -> Result<Scenario, ConfigError> {
        self.horizon.validate()?;
        if self.vintages.is_empty() {
            return Err(ConfigError::NoVintages);
        }

        let mut table = AnnualReturnTable::new();
        for (asset, years) in &self.returns {
            for (key, &pct) in years {
                let year: i32 = key.trim().parse().map_err(|_| ConfigError::InvalidYear {
                    asset: asset.clone(),
                    key: key.clone(),
                })?;
                table.insert(asset.as_str(), year, pct);
            }
        }

        let mut params = SimulationParams::new(self.horizon).with_seed(self.seed);
        for (asset, &value) in &self.volatility {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::InvalidVolatility {
                    asset: asset.clone(),
                    value,
                });
            }
            params = params.with_volatility(asset.as_str(), value);
        }

        let mut scenario = Scenario::new(self.name.clone(), table, params);
        for (vintage, portfolios) in &self.vintages {
            let set = portfolios
                .iter()
                .map(|(name, weights)| {
                    let weights = PortfolioWeights::from_pairs(
                        weights.iter().map(|(asset, &w)| (asset.as_str(), w)),
                    );
                    (name.clone(), weights)
                })
                .collect();
            scenario = scenario.with_vintage(vintage.as_str(), set);
        }
        Ok(scenario)
    }

    /// Built-in target-date fund comparison: three vintages, each with the
    /// fund's current glide-path weights, the prior allocation, and a plain
    /// benchmark, over 2019 through mid-2025.
    pub fn sample() -> Self {
        let mut returns: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        let mut add = |asset: &str, pcts: [f64; 7]| {
            let years: BTreeMap<String, f64> = (2019..=2025)
                .zip(pcts)
                .map(|(year, pct)| (year.to_string(), pct))
                .collect();
            returns.insert(asset.to_string(), years);
        };
        add("us_growth", [36.4, 38.5, 27.6, -29.1, 42.7, 33.4, 6.1]);
        add("us_value", [26.5, 2.8, 25.2, -7.5, 11.5, 14.4, 6.0]);
        add("dev_equity", [22.0, 7.8, 11.3, -14.5, 18.2, 3.8, 19.4]);
        add("em_equity", [18.4, 18.3, -2.5, -20.1, 9.8, 7.5, 15.3]);
        add("us_bond", [8.7, 7.5, -1.5, -13.0, 5.5, 1.3, 4.0]);
        add("kr_bond", [1.6, 2.1, -0.6, -3.2, 7.3, 5.9, 2.4]);
        add("gold", [18.3, 25.1, -3.6, -0.3, 13.1, 27.2, 25.9]);
        add("cash", [2.2, 0.5, 0.1, 1.5, 5.1, 5.3, 2.1]);

        fn portfolio(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
            pairs.iter().map(|&(a, w)| (a.to_string(), w)).collect()
        }
        fn vintage(
            current: &[(&str, f64)],
            prior: &[(&str, f64)],
            benchmark: &[(&str, f64)],
        ) -> BTreeMap<String, BTreeMap<String, f64>> {
            BTreeMap::from([
                ("current".to_string(), portfolio(current)),
                ("prior".to_string(), portfolio(prior)),
                ("benchmark".to_string(), portfolio(benchmark)),
            ])
        }

        let mut vintages = BTreeMap::new();
        vintages.insert(
            "2030".to_string(),
            vintage(
                &[
                    ("us_growth", 20.0),
                    ("us_value", 12.0),
                    ("dev_equity", 10.0),
                    ("em_equity", 3.0),
                    ("us_bond", 30.0),
                    ("kr_bond", 15.0),
                    ("gold", 5.0),
                    ("cash", 5.0),
                ],
                &[
                    ("us_growth", 18.0),
                    ("us_value", 14.0),
                    ("dev_equity", 10.0),
                    ("em_equity", 3.0),
                    ("us_bond", 33.0),
                    ("kr_bond", 17.0),
                    ("cash", 5.0),
                ],
                &[
                    ("us_growth", 25.0),
                    ("us_value", 15.0),
                    ("dev_equity", 10.0),
                    ("us_bond", 40.0),
                    ("kr_bond", 10.0),
                ],
            ),
        );
        vintages.insert(
            "2040".to_string(),
            vintage(
                &[
                    ("us_growth", 32.0),
                    ("us_value", 18.0),
                    ("dev_equity", 14.0),
                    ("em_equity", 6.0),
                    ("us_bond", 15.0),
                    ("kr_bond", 10.0),
                    ("gold", 5.0),
                ],
                &[
                    ("us_growth", 30.0),
                    ("us_value", 20.0),
                    ("dev_equity", 15.0),
                    ("em_equity", 5.0),
                    ("us_bond", 18.0),
                    ("kr_bond", 12.0),
                ],
                &[
                    ("us_growth", 35.0),
                    ("us_value", 20.0),
                    ("dev_equity", 15.0),
                    ("us_bond", 20.0),
                    ("kr_bond", 10.0),
                ],
            ),
        );
        vintages.insert(
            "2050".to_string(),
            vintage(
                &[
                    ("us_growth", 40.0),
                    ("us_value", 20.0),
                    ("dev_equity", 18.0),
                    ("em_equity", 8.0),
                    ("us_bond", 6.0),
                    ("kr_bond", 3.0),
                    ("gold", 5.0),
                ],
                &[
                    ("us_growth", 38.0),
                    ("us_value", 22.0),
                    ("dev_equity", 18.0),
                    ("em_equity", 7.0),
                    ("us_bond", 10.0),
                    ("kr_bond", 5.0),
                ],
                &[
                    ("us_growth", 45.0),
                    ("us_value", 20.0),
                    ("dev_equity", 20.0),
                    ("us_bond", 10.0),
                    ("kr_bond", 5.0),
                ],
            ),
        );

        Self {
            name: "tdf-sample".into(),
            horizon: Horizon {
                start_year: 2019,
                end_year: 2025,
                final_year_months: 6,
            },
            seed: SeedStrategy::default(),
            volatility: BTreeMap::new(),
            returns,
            vintages,
        }
    }
}
