use crate::core::errors::ExchangeError;
use crate::core::traits::TickerProvider;
use crate::core::types::{ProviderKind, TickerSnapshot};
use crate::exchanges::binance::converters::convert_binance_ticker;
use crate::exchanges::binance::types::BinanceTicker24h;
use chrono::{DateTime, Utc};
use serde_json::Value;

pub const BINANCE_PUBLIC_URL: &str = "https://api.binance.com";

#[derive(Debug, Clone)]
pub struct BinanceTickerProvider {
    base_url: String,
}

impl BinanceTickerProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for BinanceTickerProvider {
    fn default() -> Self {
        Self::new(BINANCE_PUBLIC_URL)
    }
}

impl TickerProvider for BinanceTickerProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Binance
    }

    fn ticker_url(&self, symbol: &str) -> Result<String, ExchangeError> {
        Ok(format!(
            "{}/api/v3/ticker/24hr?symbol={}",
            self.base_url.trim_end_matches('/'),
            symbol
        ))
    }

    // Error bodies arrive with 4xx statuses and are classified by the transport
    fn parse_ticker(
        &self,
        _symbol: &str,
        payload: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<TickerSnapshot, ExchangeError> {
        let ticker: BinanceTicker24h = serde_json::from_value(payload.clone())?;
        convert_binance_ticker(&ticker, fetched_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[test]
    fn test_percent_is_not_rescaled() {
        let payload = json!({
            "symbol": "BTCUSDT",
            "priceChange": "512.00",
            "priceChangePercent": "1.230",
            "lastPrice": "42000.00",
            "highPrice": "43000.00",
            "lowPrice": "41000.00",
            "volume": "25000.5",
            "quoteVolume": "1050000000"
        });
        let snapshot = BinanceTickerProvider::default()
            .parse_ticker("BTCUSDT", &payload, Utc::now())
            .unwrap();
        assert_eq!(snapshot.change_percent_24h, Decimal::new(123, 2));
        assert_eq!(snapshot.funding_rate, None);
        assert_eq!(snapshot.source, ProviderKind::Binance);
    }

    #[test]
    fn test_body_without_ticker_fields_is_protocol_error() {
        let payload = json!({"code": -1121, "msg": "Invalid symbol."});
        let err = BinanceTickerProvider::default()
            .parse_ticker("BTCUSDT", &payload, Utc::now())
            .unwrap_err();
        assert!(matches!(err, ExchangeError::ProtocolError { status: None, .. }));
    }

    #[test]
    fn test_ticker_url() {
        assert_eq!(
            BinanceTickerProvider::default().ticker_url("ETHUSDT").unwrap(),
            "https://api.binance.com/api/v3/ticker/24hr?symbol=ETHUSDT"
        );
    }
}
