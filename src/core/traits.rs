use crate::core::{
    errors::ExchangeError,
    outcome::RequestOutcome,
    types::{
        AccountType, Category, FundingRate, MarketQuote, OpenOrder, OrderAck, OrderRequest,
        Position, ProviderKind, TickerSnapshot, WalletBalance,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

/// Adapter for one public market-data provider.
///
/// An adapter only knows where the provider's 24h ticker lives and how to
/// map its JSON into a [`TickerSnapshot`]. Fetching, caching and fallback
/// belong to the aggregator.
///
/// `symbol` is the trimmed, upper-cased venue symbol as the caller gave it.
/// An adapter that needs another instrument naming derives it itself and
/// reports an unmappable symbol as an error, which the aggregator treats
/// like any other provider failure.
pub trait TickerProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Absolute URL of the ticker endpoint for `symbol`
    fn ticker_url(&self, symbol: &str) -> Result<String, ExchangeError>;

    /// Normalize a raw provider payload
    fn parse_ticker(
        &self,
        symbol: &str,
        payload: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<TickerSnapshot, ExchangeError>;
}

#[async_trait]
pub trait MarketDataSource {
    /// Latest 24h ticker, possibly served from cache
    async fn get_ticker(&self, symbol: &str) -> RequestOutcome<MarketQuote>;

    /// Most recent funding rate entries for a derivatives symbol
    async fn get_funding_rate(
        &self,
        category: Category,
        symbol: &str,
    ) -> RequestOutcome<Vec<FundingRate>>;
}

#[async_trait]
pub trait OrderPlacer {
    /// Place a new order
    async fn place_order(&self, order: OrderRequest) -> RequestOutcome<OrderAck>;

    /// Cancel an existing order
    async fn cancel_order(
        &self,
        category: Category,
        symbol: &str,
        order_id: &str,
    ) -> RequestOutcome<OrderAck>;

    async fn set_leverage(
        &self,
        category: Category,
        symbol: &str,
        leverage: Decimal,
    ) -> RequestOutcome<()>;

    /// Flatten every open position on `symbol` with reduce-only market orders,
    /// returning the last acknowledgement
    async fn close_position(&self, category: Category, symbol: &str) -> RequestOutcome<OrderAck>;
}

#[async_trait]
pub trait AccountInfo {
    async fn get_wallet_balance(&self, account_type: AccountType)
        -> RequestOutcome<WalletBalance>;

    async fn get_positions(
        &self,
        category: Category,
        symbol: Option<&str>,
    ) -> RequestOutcome<Vec<Position>>;

    async fn get_open_orders(&self, category: Category) -> RequestOutcome<Vec<OpenOrder>>;
}

/// Composite trait for a full venue connector
#[async_trait]
pub trait ExchangeConnector: MarketDataSource + OrderPlacer + AccountInfo {}
