//! Seeded noise generator.
//!
//! A linear congruential recurrence `seed' = (seed * A + C) mod M` drives all
//! month-to-month variation. Statistical quality is irrelevant here; what
//! matters is that a given seed reproduces the same sequence on every run and
//! in every implementation, so that competing portfolios see identical paths.
//!
//! Seeds for a particular `(asset, year)` come from a [`SeedStrategy`].

use serde::{Deserialize, Serialize};

use crate::domain::AssetId;

pub const LCG_MULTIPLIER: u64 = 9301;
pub const LCG_INCREMENT: u64 = 49297;
pub const LCG_MODULUS: u64 = 233_280;

/// Advance the recurrence once.
///
/// Returns the noise value in `[-1, 1)` and the next seed. Seeds outside
/// `[0, M)` are reduced first.
pub fn next(seed: u64) -> (f64, u64) {
    let next_seed = ((seed % LCG_MODULUS) * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;
    let unit = next_seed as f64 / LCG_MODULUS as f64;
    (2.0 * (unit - 0.5), next_seed)
}

/// Endless noise sequence: each draw's output seed feeds the next.
#[derive(Debug, Clone)]
pub struct NoiseStream {
    seed: u64,
}

impl NoiseStream {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Iterator for NoiseStream {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let (value, seed) = next(self.seed);
        self.seed = seed;
        Some(value)
    }
}

/// How the initial seed for one `(asset, year)` synthesis is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SeedStrategy {
    /// Seed from the annual return value itself. Two assets with the same
    /// return in the same year receive identical noise.
    AnnualReturn,
    /// BLAKE3 of `(master_seed, asset, year)`. Independent of evaluation order.
    Composite { master_seed: u64 },
}

impl Default for SeedStrategy {
    fn default() -> Self {
        SeedStrategy::Composite { master_seed: 42 }
    }
}

impl SeedStrategy {
    pub fn seed_for(&self, asset: &AssetId, year: i32, annual_return_pct: f64) -> u64 {
        match *self {
            SeedStrategy::AnnualReturn => annual_return_seed(annual_return_pct),
            SeedStrategy::Composite { master_seed } => composite_seed(master_seed, asset, year),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SeedStrategy::AnnualReturn => "annual_return",
            SeedStrategy::Composite { .. } => "composite",
        }
    }
}

/// Seed from a percentage return: basis points, Euclidean-reduced into `[0, M)`.
///
/// `-30.0` and `30.0` map to different seeds.
pub fn annual_return_seed(annual_return_pct: f64) -> u64 {
    let bps = (annual_return_pct * 100.0).round() as i64;
    bps.rem_euclid(LCG_MODULUS as i64) as u64
}

/// Hash-derived seed for `(master_seed, asset, year)`, reduced into `[0, M)`.
pub fn composite_seed(master_seed: u64, asset: &AssetId, year: i32) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&master_seed.to_le_bytes());
    hasher.update(asset.as_str().as_bytes());
    hasher.update(&year.to_le_bytes());
    let hash = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(head) % LCG_MODULUS
}
