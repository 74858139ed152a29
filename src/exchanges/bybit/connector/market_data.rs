use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::outcome::RequestOutcome;
use crate::core::traits::MarketDataSource;
use crate::core::types::{Category, FundingRate, MarketQuote};
use crate::exchanges::bybit::conversions::convert_bybit_funding_rate;
use crate::exchanges::bybit::rest::BybitRestClient;
use crate::market::MarketDataAggregator;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

/// Market data operations: tickers through the aggregator, funding from the venue
pub struct MarketData<R: RestClient> {
    rest: BybitRestClient<R>,
    aggregator: Arc<MarketDataAggregator>,
}

impl<R: RestClient + Clone> MarketData<R> {
    pub fn new(rest: &R, aggregator: Arc<MarketDataAggregator>) -> Self {
        Self {
            rest: BybitRestClient::new(rest.clone()),
            aggregator,
        }
    }

    pub fn aggregator(&self) -> &Arc<MarketDataAggregator> {
        &self.aggregator
    }

    async fn fetch_funding_rate(
        &self,
        category: Category,
        symbol: &str,
    ) -> Result<Vec<FundingRate>, ExchangeError> {
        self.rest
            .get_funding_history(category, symbol)
            .await?
            .iter()
            .map(convert_bybit_funding_rate)
            .collect()
    }
}

#[async_trait]
impl<R: RestClient + Clone> MarketDataSource for MarketData<R> {
    async fn get_ticker(&self, symbol: &str) -> RequestOutcome<MarketQuote> {
        self.aggregator.get_ticker(symbol).await
    }

    #[instrument(skip(self), fields(exchange = "bybit", category = %category, symbol = %symbol))]
    async fn get_funding_rate(
        &self,
        category: Category,
        symbol: &str,
    ) -> RequestOutcome<Vec<FundingRate>> {
        if !category.has_funding() {
            return RequestOutcome::unsupported(format!(
                "funding rates are not available for {} instruments",
                category
            ));
        }
        self.fetch_funding_rate(category, symbol).await.into()
    }
}
