pub mod core;
pub mod exchanges;
pub mod market;
pub mod utils;

pub use crate::core::{
    errors::ExchangeError,
    outcome::{Failure, RequestOutcome},
    traits::{AccountInfo, ExchangeConnector, MarketDataSource, OrderPlacer},
    types::*,
};
pub use exchanges::bybit::BybitConnector;
pub use market::{MarketDataAggregator, MarketDataCache};
