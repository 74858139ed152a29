pub mod conversions;
pub mod provider;
pub mod types;

pub use provider::OkxTickerProvider;
pub use types::{OkxResponse, OkxTicker};
