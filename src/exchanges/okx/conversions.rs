use crate::core::errors::ExchangeError;
use crate::core::types::conversion::{
    required_decimal, required_price, string_to_decimal,
};
use crate::core::types::{ProviderKind, Symbol, TickerSnapshot, Volume};
use crate::exchanges::okx::types::OkxTicker;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Instrument id of the perpetual swap for a concatenated venue symbol.
///
/// OKX names instruments `BASE-QUOTE-SWAP`, so the symbol has to split on a
/// known quote asset. One that does not is a failure of this provider only.
pub fn okx_swap_inst_id(symbol: &str) -> Result<String, ExchangeError> {
    let pair = Symbol::from_string(symbol).map_err(|e| {
        ExchangeError::protocol(None, format!("No OKX instrument for {}: {}", symbol, e))
    })?;
    Ok(format!("{}-{}-SWAP", pair.base, pair.quote))
}

/// Convert an OKX ticker. OKX reports no change field, so the 24h change is
/// derived from `open24h`.
pub fn convert_okx_ticker(
    symbol: &str,
    ticker: &OkxTicker,
    fetched_at: DateTime<Utc>,
) -> Result<TickerSnapshot, ExchangeError> {
    let last = required_decimal("last", &ticker.last)?;
    let open = required_decimal("open24h", &ticker.open_24h)?;
    let change_percent_24h = if open.is_zero() {
        Decimal::ZERO
    } else {
        (last - open) / open * Decimal::ONE_HUNDRED
    };

    // volCcy24h is denominated in the base asset for swaps; fall back to contracts
    let volume = match string_to_decimal(&ticker.vol_ccy_24h) {
        v if v.is_zero() => required_decimal("vol24h", &ticker.vol_24h)?,
        v => v,
    };

    Ok(TickerSnapshot {
        symbol: symbol.to_string(),
        last_price: required_price("last", &ticker.last)?,
        change_percent_24h,
        high_24h: required_price("high24h", &ticker.high_24h)?,
        low_24h: required_price("low24h", &ticker.low_24h)?,
        volume_24h: Volume::new(volume),
        funding_rate: None,
        fetched_at,
        source: ProviderKind::Okx,
    })
}
