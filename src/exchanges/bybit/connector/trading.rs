use crate::core::errors::{ExchangeError, NO_OPEN_POSITION_CODE};
use crate::core::kernel::RestClient;
use crate::core::outcome::RequestOutcome;
use crate::core::traits::OrderPlacer;
use crate::core::types::{Category, OrderAck, OrderRequest, Position};
use crate::exchanges::bybit::connector::account::Account;
use crate::exchanges::bybit::conversions::convert_bybit_order_ack;
use crate::exchanges::bybit::rest::BybitRestClient;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{info, instrument};

/// Trading implementation for Bybit
pub struct Trading<R: RestClient> {
    rest: BybitRestClient<R>,
    account: Account<R>,
}

impl<R: RestClient> Trading<R> {
    pub fn new(rest: &R) -> Self
    where
        R: Clone,
    {
        Self {
            rest: BybitRestClient::new(rest.clone()),
            account: Account::new(rest),
        }
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        let ack = self.rest.place_order(order).await?;
        info!(
            order_id = %ack.order_id,
            symbol = %order.symbol,
            side = %order.side.as_str(),
            "Order accepted"
        );
        Ok(convert_bybit_order_ack(ack))
    }

    /// Flatten every open slot for `symbol`. Hedge mode can hold both sides
    /// at once, and each close has to name its slot.
    async fn close(&self, category: Category, symbol: &str) -> Result<OrderAck, ExchangeError> {
        let positions: Vec<Position> = self
            .account
            .fetch_positions(category, Some(symbol))
            .await?
            .into_iter()
            .filter(|p| p.symbol.eq_ignore_ascii_case(symbol))
            .collect();

        let mut last_ack = None;
        for position in positions {
            let mut order =
                OrderRequest::market(position.symbol, position.side.opposite(), position.size)
                    .category(category)
                    .reduce_only();
            if position.position_idx != 0 {
                order = order.position_idx(position.position_idx);
            }
            last_ack = Some(self.submit_order(&order).await?);
        }

        last_ack.ok_or_else(|| ExchangeError::VenueError {
            code: NO_OPEN_POSITION_CODE,
            message: format!("No open position for {}", symbol),
        })
    }
}

#[async_trait]
impl<R: RestClient> OrderPlacer for Trading<R> {
    #[instrument(skip(self, order), fields(exchange = "bybit", symbol = %order.symbol))]
    async fn place_order(&self, order: OrderRequest) -> RequestOutcome<OrderAck> {
        self.submit_order(&order).await.into()
    }

    #[instrument(skip(self), fields(exchange = "bybit"))]
    async fn cancel_order(
        &self,
        category: Category,
        symbol: &str,
        order_id: &str,
    ) -> RequestOutcome<OrderAck> {
        self.rest
            .cancel_order(category, symbol, order_id)
            .await
            .map(convert_bybit_order_ack)
            .into()
    }

    #[instrument(skip(self), fields(exchange = "bybit"))]
    async fn set_leverage(
        &self,
        category: Category,
        symbol: &str,
        leverage: Decimal,
    ) -> RequestOutcome<()> {
        self.rest.set_leverage(category, symbol, leverage).await.into()
    }

    #[instrument(skip(self), fields(exchange = "bybit"))]
    async fn close_position(&self, category: Category, symbol: &str) -> RequestOutcome<OrderAck> {
        self.close(category, symbol).await.into()
    }
}
