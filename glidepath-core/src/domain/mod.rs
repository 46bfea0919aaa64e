//! Domain types: asset classes, annual return tables, portfolio weights,
//! horizons, and monthly/portfolio series.

pub mod asset;
pub mod horizon;
pub mod returns;
pub mod series;
pub mod weights;

pub use asset::{AssetClass, AssetId};
pub use horizon::{Horizon, HorizonError, Period, MONTHS_PER_YEAR};
pub use returns::AnnualReturnTable;
pub use series::{MonthlyReturn, MonthlyReturnSeries, PortfolioSeries, SeriesPoint, BASE_VALUE};
pub use weights::{PortfolioWeightSet, PortfolioWeights, WeightError, WEIGHT_SUM_TOLERANCE};
