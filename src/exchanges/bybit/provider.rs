use crate::core::errors::ExchangeError;
use crate::core::kernel::check_venue_status;
use crate::core::traits::TickerProvider;
use crate::core::types::{Category, ProviderKind, TickerSnapshot};
use crate::exchanges::bybit::conversions::convert_bybit_ticker;
use crate::exchanges::bybit::types::{BybitApiResponse, BybitList, BybitTicker};
use chrono::{DateTime, Utc};
use serde_json::Value;

pub const BYBIT_PUBLIC_URL: &str = "https://api.bybit.com";

/// Linear-perpetual tickers from the venue's public market endpoint
#[derive(Debug, Clone)]
pub struct BybitTickerProvider {
    base_url: String,
    category: Category,
}

impl BybitTickerProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            category: Category::Linear,
        }
    }

    #[must_use]
    pub const fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }
}

impl Default for BybitTickerProvider {
    fn default() -> Self {
        Self::new(BYBIT_PUBLIC_URL)
    }
}

impl TickerProvider for BybitTickerProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Bybit
    }

    fn ticker_url(&self, symbol: &str) -> Result<String, ExchangeError> {
        Ok(format!(
            "{}/v5/market/tickers?category={}&symbol={}",
            self.base_url.trim_end_matches('/'),
            self.category,
            symbol
        ))
    }

    fn parse_ticker(
        &self,
        symbol: &str,
        payload: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<TickerSnapshot, ExchangeError> {
        let payload = check_venue_status(payload.clone())?;
        let response: BybitApiResponse<BybitList<BybitTicker>> = serde_json::from_value(payload)?;

        let ticker = response
            .result
            .list
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| {
                ExchangeError::protocol(None, format!("No ticker returned for {}", symbol))
            })?;

        convert_bybit_ticker(ticker, fetched_at)
    }
}
