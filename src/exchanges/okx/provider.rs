use crate::core::errors::ExchangeError;
use crate::core::traits::TickerProvider;
use crate::core::types::{ProviderKind, TickerSnapshot};
use crate::exchanges::okx::conversions::{convert_okx_ticker, okx_swap_inst_id};
use crate::exchanges::okx::types::{OkxResponse, OkxTicker};
use chrono::{DateTime, Utc};
use serde_json::Value;

pub const OKX_PUBLIC_URL: &str = "https://www.okx.com";

#[derive(Debug, Clone)]
pub struct OkxTickerProvider {
    base_url: String,
}

impl OkxTickerProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for OkxTickerProvider {
    fn default() -> Self {
        Self::new(OKX_PUBLIC_URL)
    }
}

impl TickerProvider for OkxTickerProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Okx
    }

    fn ticker_url(&self, symbol: &str) -> Result<String, ExchangeError> {
        Ok(format!(
            "{}/api/v5/market/ticker?instId={}",
            self.base_url.trim_end_matches('/'),
            okx_swap_inst_id(symbol)?
        ))
    }

    fn parse_ticker(
        &self,
        symbol: &str,
        payload: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<TickerSnapshot, ExchangeError> {
        let response: OkxResponse<OkxTicker> = serde_json::from_value(payload.clone())?;

        if response.code != "0" {
            return Err(ExchangeError::VenueError {
                code: response.code.parse().unwrap_or(i32::MIN),
                message: response.msg,
            });
        }

        let ticker = response.data.first().ok_or_else(|| {
            ExchangeError::protocol(None, format!("No ticker returned for {}", symbol))
        })?;

        convert_okx_ticker(symbol, ticker, fetched_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[test]
    fn test_ticker_url_uses_swap_instrument() {
        assert_eq!(
            OkxTickerProvider::default().ticker_url("BTCUSDT").unwrap(),
            "https://www.okx.com/api/v5/market/ticker?instId=BTC-USDT-SWAP"
        );
    }

    #[test]
    fn test_ticker_url_rejects_unmapped_symbol() {
        let err = OkxTickerProvider::default().ticker_url("ETHPERP").unwrap_err();
        assert_eq!(err.kind(), crate::core::errors::ErrorKind::Protocol);
    }

    #[test]
    fn test_change_derived_from_open() {
        let payload = json!({
            "code": "0",
            "msg": "",
            "data": [{
                "instType": "SWAP",
                "instId": "BTC-USDT-SWAP",
                "last": "41000",
                "open24h": "40000",
                "high24h": "41500",
                "low24h": "39500",
                "volCcy24h": "1500.5",
                "vol24h": "150050",
                "ts": "1700000000000"
            }]
        });
        let snapshot = OkxTickerProvider::default()
            .parse_ticker("BTCUSDT", &payload, Utc::now())
            .unwrap();
        assert_eq!(snapshot.change_percent_24h, Decimal::new(25, 1));
        assert_eq!(snapshot.symbol, "BTCUSDT");
        assert_eq!(snapshot.volume_24h.value(), Decimal::new(15_005, 1));
    }

    #[test]
    fn test_non_zero_code_is_venue_error() {
        let payload = json!({"code": "51001", "msg": "Instrument ID does not exist", "data": []});
        let err = OkxTickerProvider::default()
            .parse_ticker("BTCUSDT", &payload, Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            ExchangeError::VenueError {
                code: 51001,
                message: "Instrument ID does not exist".to_string()
            }
        );
    }
}
