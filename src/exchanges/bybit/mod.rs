pub mod builder;
pub mod connector;
pub mod conversions;
pub mod provider;
pub mod rest;
pub mod signer;
pub mod types;

// Re-export main components
pub use builder::{
    build_connector, build_connector_from_env, build_connector_with_clock, build_rest_client,
};
pub use connector::{Account, BybitConnector, MarketData, Trading};
pub use provider::BybitTickerProvider;
pub use signer::BybitSigner;
pub use types::{
    BybitApiResponse, BybitCoinBalance, BybitFundingRate, BybitList, BybitOpenOrder,
    BybitOrderAck, BybitPosition, BybitTicker, BybitWallet,
};
