pub mod converters;
pub mod provider;
pub mod types;

pub use provider::BinanceTickerProvider;
pub use types::BinanceTicker24h;
