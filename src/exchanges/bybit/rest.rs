use crate::core::errors::ExchangeError;
use crate::core::kernel::{check_venue_status, RequestParams, RestClient};
use crate::core::types::{AccountType, Category, OrderRequest, OrderType};
use crate::exchanges::bybit::types::{
    BybitApiResponse, BybitFundingRate, BybitList, BybitOpenOrder, BybitOrderAck, BybitPosition,
    BybitWallet,
};
use reqwest::Method;
use rust_decimal::Decimal;

/// `retCode` returned when the requested leverage is already set
pub const LEVERAGE_NOT_MODIFIED_CODE: i32 = 110_043;

/// Settle coin the venue requires on linear list queries without a symbol
const LINEAR_SETTLE_COIN: &str = "USDT";

/// Thin typed wrapper around `RestClient` for the V5 API
#[derive(Clone)]
pub struct BybitRestClient<R: RestClient> {
    client: R,
}

impl<R: RestClient> BybitRestClient<R> {
    pub fn new(client: R) -> Self {
        Self { client }
    }

    pub fn can_sign(&self) -> bool {
        self.client.can_sign()
    }

    async fn get_result<T: serde::de::DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        params: RequestParams,
    ) -> Result<T, ExchangeError> {
        let response: BybitApiResponse<T> = self
            .client
            .signed_request_json(Method::GET, endpoint, params)
            .await?;
        Ok(response.result)
    }

    async fn post_result<T: serde::de::DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        params: RequestParams,
    ) -> Result<T, ExchangeError> {
        let response: BybitApiResponse<T> = self
            .client
            .signed_request_json(Method::POST, endpoint, params)
            .await?;
        Ok(response.result)
    }

    /// Funding history is public; only the latest entry is requested
    pub async fn get_funding_history(
        &self,
        category: Category,
        symbol: &str,
    ) -> Result<Vec<BybitFundingRate>, ExchangeError> {
        let url = format!(
            "/v5/market/funding/history?category={}&symbol={}&limit=1",
            category, symbol
        );
        let payload = check_venue_status(self.client.get_json(&url).await?)?;
        let response: BybitApiResponse<BybitList<BybitFundingRate>> =
            serde_json::from_value(payload)?;
        Ok(response.result.list)
    }

    pub async fn get_wallet_balance(
        &self,
        account_type: AccountType,
    ) -> Result<Vec<BybitWallet>, ExchangeError> {
        let params = RequestParams::new().with("accountType", account_type.as_str());
        let result: BybitList<BybitWallet> =
            self.get_result("/v5/account/wallet-balance", params).await?;
        Ok(result.list)
    }

    pub async fn get_positions(
        &self,
        category: Category,
        symbol: Option<&str>,
    ) -> Result<Vec<BybitPosition>, ExchangeError> {
        let params = list_params(category, symbol);
        let result: BybitList<BybitPosition> =
            self.get_result("/v5/position/list", params).await?;
        Ok(result.list)
    }

    pub async fn get_open_orders(
        &self,
        category: Category,
    ) -> Result<Vec<BybitOpenOrder>, ExchangeError> {
        let params = list_params(category, None);
        let result: BybitList<BybitOpenOrder> =
            self.get_result("/v5/order/realtime", params).await?;
        Ok(result.list)
    }

    pub async fn place_order(&self, order: &OrderRequest) -> Result<BybitOrderAck, ExchangeError> {
        let params = order_params(order)?;
        self.post_result("/v5/order/create", params).await
    }

    pub async fn cancel_order(
        &self,
        category: Category,
        symbol: &str,
        order_id: &str,
    ) -> Result<BybitOrderAck, ExchangeError> {
        let params = RequestParams::new()
            .with("category", category.as_str())
            .with("symbol", symbol)
            .with("orderId", order_id);
        self.post_result("/v5/order/cancel", params).await
    }

    /// Set equal buy and sell leverage; an unchanged leverage counts as success
    pub async fn set_leverage(
        &self,
        category: Category,
        symbol: &str,
        leverage: Decimal,
    ) -> Result<(), ExchangeError> {
        if leverage <= Decimal::ZERO {
            return Err(ExchangeError::ConfigurationError(format!(
                "Leverage must be positive, got {}",
                leverage
            )));
        }

        let leverage = leverage.normalize().to_string();
        let params = RequestParams::new()
            .with("category", category.as_str())
            .with("symbol", symbol)
            .with("buyLeverage", leverage.clone())
            .with("sellLeverage", leverage);

        match self
            .client
            .signed_request(Method::POST, "/v5/position/set-leverage", params)
            .await
        {
            Ok(_) => Ok(()),
            Err(ExchangeError::VenueError { code, .. }) if code == LEVERAGE_NOT_MODIFIED_CODE => {
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn list_params(category: Category, symbol: Option<&str>) -> RequestParams {
    let mut params = RequestParams::new().with("category", category.as_str());
    match symbol {
        Some(symbol) => params.insert("symbol", symbol),
        None if category == Category::Linear => params.insert("settleCoin", LINEAR_SETTLE_COIN),
        None => {}
    }
    params
}

/// Wire parameters for an order, in the venue's documented order
pub fn order_params(order: &OrderRequest) -> Result<RequestParams, ExchangeError> {
    if order.quantity.value() <= Decimal::ZERO {
        return Err(ExchangeError::ConfigurationError(format!(
            "Order quantity must be positive, got {}",
            order.quantity
        )));
    }

    let mut params = RequestParams::new()
        .with("category", order.category.as_str())
        .with("symbol", order.symbol.as_str())
        .with("side", order.side.as_str())
        .with("orderType", order.order_type.as_str())
        .with("qty", order.quantity.to_string());

    match (order.order_type, order.price) {
        (OrderType::Limit, Some(price)) => params.insert("price", price.to_string()),
        (OrderType::Limit, None) => {
            return Err(ExchangeError::ConfigurationError(
                "Price is required for limit orders".to_string(),
            ))
        }
        (OrderType::Market, _) => {}
    }

    if order.reduce_only {
        params.insert("reduceOnly", "true");
    }
    if let Some(idx) = order.position_idx {
        params.insert("positionIdx", idx.to_string());
    }

    Ok(params)
}
