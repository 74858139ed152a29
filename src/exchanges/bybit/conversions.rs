use crate::core::errors::ExchangeError;
use crate::core::types::conversion::{
    optional_decimal, required_decimal, required_price, required_volume, string_to_decimal,
};
use crate::core::types::{
    AccountType, Balance, FundingRate, OpenOrder, OrderAck, OrderSide, Position, Price,
    ProviderKind, Quantity, TickerSnapshot, WalletBalance,
};
use crate::exchanges::bybit::types::{
    BybitCoinBalance, BybitFundingRate, BybitOpenOrder, BybitOrderAck, BybitPosition,
    BybitTicker, BybitWallet,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Convert a V5 ticker into the canonical snapshot; `price24hPcnt` is
/// fractional and is scaled to percent here.
pub fn convert_bybit_ticker(
    ticker: &BybitTicker,
    fetched_at: DateTime<Utc>,
) -> Result<TickerSnapshot, ExchangeError> {
    let fraction = required_decimal("price24hPcnt", &ticker.price_24h_pcnt)?;

    Ok(TickerSnapshot {
        symbol: ticker.symbol.clone(),
        last_price: required_price("lastPrice", &ticker.last_price)?,
        change_percent_24h: fraction * Decimal::ONE_HUNDRED,
        high_24h: required_price("highPrice24h", &ticker.high_price_24h)?,
        low_24h: required_price("lowPrice24h", &ticker.low_price_24h)?,
        volume_24h: required_volume("volume24h", &ticker.volume_24h)?,
        funding_rate: optional_decimal(ticker.funding_rate.as_deref()),
        fetched_at,
        source: ProviderKind::Bybit,
    })
}

pub fn convert_bybit_funding_rate(rate: &BybitFundingRate) -> Result<FundingRate, ExchangeError> {
    let funding_time = rate.funding_rate_timestamp.trim().parse::<i64>().map_err(|e| {
        ExchangeError::protocol(
            None,
            format!(
                "Invalid fundingRateTimestamp '{}': {}",
                rate.funding_rate_timestamp, e
            ),
        )
    })?;

    Ok(FundingRate {
        symbol: rate.symbol.clone(),
        funding_rate: required_decimal("fundingRate", &rate.funding_rate)?,
        funding_time,
    })
}

pub fn convert_bybit_balance(coin: &BybitCoinBalance) -> Balance {
    Balance {
        coin: coin.coin.clone(),
        wallet_balance: string_to_decimal(&coin.wallet_balance),
        equity: string_to_decimal(&coin.equity),
        unrealised_pnl: string_to_decimal(&coin.unrealised_pnl),
        usd_value: string_to_decimal(&coin.usd_value),
    }
}

/// The venue answers a single account type per call; an empty list means
/// the account holds nothing.
pub fn convert_bybit_wallet(account_type: AccountType, wallets: &[BybitWallet]) -> WalletBalance {
    let Some(wallet) = wallets.first() else {
        return WalletBalance {
            account_type,
            total_equity: Decimal::ZERO,
            total_wallet_balance: Decimal::ZERO,
            total_available_balance: Decimal::ZERO,
            coins: Vec::new(),
        };
    };

    WalletBalance {
        account_type,
        total_equity: string_to_decimal(&wallet.total_equity),
        total_wallet_balance: string_to_decimal(&wallet.total_wallet_balance),
        total_available_balance: string_to_decimal(&wallet.total_available_balance),
        coins: wallet.coin.iter().map(convert_bybit_balance).collect(),
    }
}

/// Convert a position slot; flat slots (empty side or zero size) yield `None`
pub fn convert_bybit_position(position: &BybitPosition) -> Result<Option<Position>, ExchangeError> {
    let size = string_to_decimal(&position.size);
    if position.side.is_empty() || size.is_zero() {
        return Ok(None);
    }

    let side = convert_order_side(&position.side)?;

    Ok(Some(Position {
        symbol: position.symbol.clone(),
        side,
        size: Quantity::new(size),
        entry_price: Price::new(string_to_decimal(&position.avg_price)),
        mark_price: Price::new(string_to_decimal(&position.mark_price)),
        leverage: string_to_decimal(&position.leverage),
        unrealised_pnl: string_to_decimal(&position.unrealised_pnl),
        position_idx: position.position_idx,
    }))
}

pub fn convert_bybit_open_order(order: &BybitOpenOrder) -> Result<OpenOrder, ExchangeError> {
    Ok(OpenOrder {
        order_id: order.order_id.clone(),
        order_link_id: order.order_link_id.clone(),
        symbol: order.symbol.clone(),
        side: convert_order_side(&order.side)?,
        order_type: order.order_type.clone(),
        price: Price::new(string_to_decimal(&order.price)),
        quantity: Quantity::new(string_to_decimal(&order.qty)),
        status: order.order_status.clone(),
        created_time: order.created_time.trim().parse().unwrap_or_default(),
    })
}

pub fn convert_bybit_order_ack(ack: BybitOrderAck) -> OrderAck {
    OrderAck {
        order_id: ack.order_id,
        order_link_id: ack.order_link_id,
    }
}

pub fn convert_order_side(side: &str) -> Result<OrderSide, ExchangeError> {
    side.parse::<OrderSide>()
        .map_err(|e| ExchangeError::protocol(None, format!("Unexpected order side: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker() -> BybitTicker {
        serde_json::from_value(serde_json::json!({
            "symbol": "BTCUSDT",
            "lastPrice": "42000.5",
            "price24hPcnt": "0.0123",
            "highPrice24h": "43000",
            "lowPrice24h": "41000",
            "volume24h": "1234.5",
            "turnover24h": "51849000",
            "fundingRate": "0.0001"
        }))
        .unwrap()
    }

    #[test]
    fn test_ticker_scales_fraction_to_percent() {
        let snapshot = convert_bybit_ticker(&ticker(), Utc::now()).unwrap();
        assert_eq!(snapshot.change_percent_24h, Decimal::new(123, 2));
        assert_eq!(snapshot.last_price, Price::new(Decimal::new(420_005, 1)));
        assert_eq!(snapshot.funding_rate, Some(Decimal::new(1, 4)));
        assert_eq!(snapshot.source, ProviderKind::Bybit);
    }

    #[test]
    fn test_ticker_rejects_missing_price() {
        let mut bad = ticker();
        bad.last_price = String::new();
        let err = convert_bybit_ticker(&bad, Utc::now()).unwrap_err();
        assert!(matches!(err, ExchangeError::ProtocolError { .. }));
    }

    #[test]
    fn test_flat_position_is_skipped() {
        let flat: BybitPosition = serde_json::from_value(serde_json::json!({
            "symbol": "BTCUSDT", "side": "", "size": "0"
        }))
        .unwrap();
        assert!(convert_bybit_position(&flat).unwrap().is_none());

        let long: BybitPosition = serde_json::from_value(serde_json::json!({
            "symbol": "BTCUSDT", "side": "Buy", "size": "0.01",
            "avgPrice": "42000", "markPrice": "42100", "leverage": "10",
            "unrealisedPnl": "1"
        }))
        .unwrap();
        let position = convert_bybit_position(&long).unwrap().unwrap();
        assert_eq!(position.side, OrderSide::Buy);
        assert_eq!(position.size, Quantity::new(Decimal::new(1, 2)));
        assert_eq!(position.leverage, Decimal::TEN);
        assert_eq!(position.position_idx, 0);
    }

    #[test]
    fn test_hedge_slot_keeps_position_idx() {
        let short: BybitPosition = serde_json::from_value(serde_json::json!({
            "symbol": "BTCUSDT", "side": "Sell", "size": "0.2", "positionIdx": 2
        }))
        .unwrap();
        let position = convert_bybit_position(&short).unwrap().unwrap();
        assert_eq!(position.side, OrderSide::Sell);
        assert_eq!(position.position_idx, 2);
    }

    #[test]
    fn test_empty_wallet_list() {
        let wallet = convert_bybit_wallet(AccountType::Unified, &[]);
        assert!(wallet.coins.is_empty());
        assert_eq!(wallet.total_equity, Decimal::ZERO);
    }
}
