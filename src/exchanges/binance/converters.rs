use crate::core::errors::ExchangeError;
use crate::core::types::conversion::{required_decimal, required_price, required_volume};
use crate::core::types::{ProviderKind, TickerSnapshot};
use crate::exchanges::binance::types::BinanceTicker24h;
use chrono::{DateTime, Utc};

/// Convert a spot 24h ticker. Spot markets carry no funding rate.
pub fn convert_binance_ticker(
    ticker: &BinanceTicker24h,
    fetched_at: DateTime<Utc>,
) -> Result<TickerSnapshot, ExchangeError> {
    Ok(TickerSnapshot {
        symbol: ticker.symbol.clone(),
        last_price: required_price("lastPrice", &ticker.last_price)?,
        change_percent_24h: required_decimal("priceChangePercent", &ticker.price_change_percent)?,
        high_24h: required_price("highPrice", &ticker.high_price)?,
        low_24h: required_price("lowPrice", &ticker.low_price)?,
        volume_24h: required_volume("volume", &ticker.volume)?,
        funding_rate: None,
        fetched_at,
        source: ProviderKind::Binance,
    })
}
