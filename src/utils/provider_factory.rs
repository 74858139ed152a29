use crate::core::clock::Clock;
use crate::core::config::{ExchangeConfig, MarketDataConfig};
use crate::core::kernel::PublicTransport;
use crate::core::traits::TickerProvider;
use crate::core::types::ProviderKind;
use crate::exchanges::binance::BinanceTickerProvider;
use crate::exchanges::bybit::BybitTickerProvider;
use crate::exchanges::okx::OkxTickerProvider;
use crate::market::{MarketDataAggregator, MarketDataCache};
use std::sync::Arc;

/// Factory for market-data provider adapters
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the adapter for one provider. The venue adapter follows the
    /// venue base URL so testnet and overrides apply to it as well.
    pub fn create_provider(kind: ProviderKind, config: &ExchangeConfig) -> Arc<dyn TickerProvider> {
        match kind {
            ProviderKind::Bybit => Arc::new(BybitTickerProvider::new(config.venue_base_url())),
            ProviderKind::Binance => Arc::new(BinanceTickerProvider::default()),
            ProviderKind::Okx => Arc::new(OkxTickerProvider::default()),
        }
    }

    /// Adapters in the configured priority order
    pub fn create_providers(
        market: &MarketDataConfig,
        config: &ExchangeConfig,
    ) -> Vec<Arc<dyn TickerProvider>> {
        market
            .providers
            .iter()
            .map(|kind| Self::create_provider(*kind, config))
            .collect()
    }

    /// Aggregator with a fresh cache using the configured TTL
    pub fn create_aggregator(
        market: &MarketDataConfig,
        config: &ExchangeConfig,
        transport: Arc<dyn PublicTransport>,
        clock: Arc<dyn Clock>,
    ) -> MarketDataAggregator {
        let cache = Arc::new(MarketDataCache::new(market.cache_ttl(), clock.clone()));
        MarketDataAggregator::new(Self::create_providers(market, config), transport, cache)
            .with_clock(clock)
    }
}
