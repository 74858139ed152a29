pub mod aggregator;
pub mod cache;

pub use aggregator::MarketDataAggregator;
pub use cache::{CacheEntry, MarketDataCache};
