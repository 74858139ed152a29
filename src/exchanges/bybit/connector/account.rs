use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::outcome::RequestOutcome;
use crate::core::traits::AccountInfo;
use crate::core::types::{AccountType, Category, OpenOrder, Position, WalletBalance};
use crate::exchanges::bybit::conversions::{
    convert_bybit_open_order, convert_bybit_position, convert_bybit_wallet,
};
use crate::exchanges::bybit::rest::BybitRestClient;
use async_trait::async_trait;
use tracing::instrument;

/// Account implementation for Bybit
pub struct Account<R: RestClient> {
    rest: BybitRestClient<R>,
}

impl<R: RestClient> Account<R> {
    pub fn new(rest: &R) -> Self
    where
        R: Clone,
    {
        Self {
            rest: BybitRestClient::new(rest.clone()),
        }
    }

    /// Open positions only; flat slots are dropped
    pub async fn fetch_positions(
        &self,
        category: Category,
        symbol: Option<&str>,
    ) -> Result<Vec<Position>, ExchangeError> {
        let mut positions = Vec::new();
        for raw in self.rest.get_positions(category, symbol).await? {
            if let Some(position) = convert_bybit_position(&raw)? {
                positions.push(position);
            }
        }
        Ok(positions)
    }

    async fn fetch_wallet_balance(
        &self,
        account_type: AccountType,
    ) -> Result<WalletBalance, ExchangeError> {
        let wallets = self.rest.get_wallet_balance(account_type).await?;
        Ok(convert_bybit_wallet(account_type, &wallets))
    }

    async fn fetch_open_orders(&self, category: Category) -> Result<Vec<OpenOrder>, ExchangeError> {
        self.rest
            .get_open_orders(category)
            .await?
            .iter()
            .map(convert_bybit_open_order)
            .collect()
    }
}

#[async_trait]
impl<R: RestClient> AccountInfo for Account<R> {
    #[instrument(skip(self), fields(exchange = "bybit"))]
    async fn get_wallet_balance(
        &self,
        account_type: AccountType,
    ) -> RequestOutcome<WalletBalance> {
        self.fetch_wallet_balance(account_type).await.into()
    }

    #[instrument(skip(self), fields(exchange = "bybit"))]
    async fn get_positions(
        &self,
        category: Category,
        symbol: Option<&str>,
    ) -> RequestOutcome<Vec<Position>> {
        self.fetch_positions(category, symbol).await.into()
    }

    #[instrument(skip(self), fields(exchange = "bybit"))]
    async fn get_open_orders(&self, category: Category) -> RequestOutcome<Vec<OpenOrder>> {
        self.fetch_open_orders(category).await.into()
    }
}
