use crate::core::kernel::RestClient;
use crate::core::outcome::RequestOutcome;
use crate::core::traits::{AccountInfo, ExchangeConnector, MarketDataSource, OrderPlacer};
use crate::core::types::{
    AccountType, Category, FundingRate, MarketQuote, OpenOrder, OrderAck, OrderRequest, Position,
    WalletBalance,
};
use crate::market::MarketDataAggregator;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

pub mod account;
pub mod market_data;
pub mod trading;

pub use account::Account;
pub use market_data::MarketData;
pub use trading::Trading;

/// Bybit connector that composes all sub-trait implementations
pub struct BybitConnector<R: RestClient> {
    pub market: MarketData<R>,
    pub trading: Trading<R>,
    pub account: Account<R>,
    can_sign: bool,
}

impl<R: RestClient + Clone> BybitConnector<R> {
    pub fn new(rest: R, aggregator: Arc<MarketDataAggregator>) -> Self {
        Self {
            can_sign: rest.can_sign(),
            market: MarketData::new(&rest, aggregator),
            trading: Trading::new(&rest),
            account: Account::new(&rest),
        }
    }

    /// False in public-data-only mode
    pub const fn can_sign(&self) -> bool {
        self.can_sign
    }
}

// Implement traits for the connector by delegating to sub-components
#[async_trait]
impl<R: RestClient + Clone> MarketDataSource for BybitConnector<R> {
    async fn get_ticker(&self, symbol: &str) -> RequestOutcome<MarketQuote> {
        self.market.get_ticker(symbol).await
    }

    async fn get_funding_rate(
        &self,
        category: Category,
        symbol: &str,
    ) -> RequestOutcome<Vec<FundingRate>> {
        self.market.get_funding_rate(category, symbol).await
    }
}

#[async_trait]
impl<R: RestClient + Clone> OrderPlacer for BybitConnector<R> {
    async fn place_order(&self, order: OrderRequest) -> RequestOutcome<OrderAck> {
        self.trading.place_order(order).await
    }

    async fn cancel_order(
        &self,
        category: Category,
        symbol: &str,
        order_id: &str,
    ) -> RequestOutcome<OrderAck> {
        self.trading.cancel_order(category, symbol, order_id).await
    }

    async fn set_leverage(
        &self,
        category: Category,
        symbol: &str,
        leverage: Decimal,
    ) -> RequestOutcome<()> {
        self.trading.set_leverage(category, symbol, leverage).await
    }

    async fn close_position(&self, category: Category, symbol: &str) -> RequestOutcome<OrderAck> {
        self.trading.close_position(category, symbol).await
    }
}

#[async_trait]
impl<R: RestClient + Clone> AccountInfo for BybitConnector<R> {
    async fn get_wallet_balance(
        &self,
        account_type: AccountType,
    ) -> RequestOutcome<WalletBalance> {
        self.account.get_wallet_balance(account_type).await
    }

    async fn get_positions(
        &self,
        category: Category,
        symbol: Option<&str>,
    ) -> RequestOutcome<Vec<Position>> {
        self.account.get_positions(category, symbol).await
    }

    async fn get_open_orders(&self, category: Category) -> RequestOutcome<Vec<OpenOrder>> {
        self.account.get_open_orders(category).await
    }
}

impl<R: RestClient + Clone> ExchangeConnector for BybitConnector<R> {}
