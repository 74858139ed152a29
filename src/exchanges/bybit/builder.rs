use crate::core::clock::{Clock, SystemClock};
use crate::core::config::{ExchangeConfig, MarketDataConfig};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ReqwestRest, RestClientBuilder, RestClientConfig};
use crate::exchanges::bybit::connector::BybitConnector;
use crate::exchanges::bybit::signer::BybitSigner;
use crate::utils::ProviderFactory;
use std::sync::Arc;
use tracing::info;

/// Build the REST client for the venue. The signer is always attached; in
/// public-only mode it refuses to sign instead of being absent.
pub fn build_rest_client(
    config: &ExchangeConfig,
    clock: Arc<dyn Clock>,
) -> Result<ReqwestRest, ExchangeError> {
    let rest_config = RestClientConfig::from_exchange_config(config, "bybit");
    let signer = Arc::new(BybitSigner::from_config(config));

    RestClientBuilder::new(rest_config)
        .with_signer(signer)
        .with_clock(clock)
        .build()
}

/// Create a Bybit connector with the default provider chain
pub fn build_connector(
    config: ExchangeConfig,
    market: MarketDataConfig,
) -> Result<BybitConnector<ReqwestRest>, ExchangeError> {
    build_connector_with_clock(config, market, Arc::new(SystemClock))
}

/// Create a Bybit connector stamping requests and cache entries with `clock`
pub fn build_connector_with_clock(
    config: ExchangeConfig,
    market: MarketDataConfig,
    clock: Arc<dyn Clock>,
) -> Result<BybitConnector<ReqwestRest>, ExchangeError> {
    let rest = build_rest_client(&config, clock.clone())?;

    // Provider traffic shares the venue client's proxy and timeout settings.
    let transport = Arc::new(rest.clone());
    let aggregator =
        ProviderFactory::create_aggregator(&market, &config, transport, clock);

    let providers = aggregator.provider_kinds();
    let connector = BybitConnector::new(rest, Arc::new(aggregator));
    info!(
        base_url = %config.venue_base_url(),
        providers = ?providers,
        proxied = config.proxy_url.is_some(),
        can_sign = connector.can_sign(),
        "Bybit connector ready"
    );

    Ok(connector)
}

/// Load configuration from the environment (`BYBIT_*`, `MARKET_*`) and build
pub fn build_connector_from_env() -> Result<BybitConnector<ReqwestRest>, ExchangeError> {
    #[cfg(feature = "env-file")]
    let config = ExchangeConfig::from_env_file("BYBIT")?;
    #[cfg(not(feature = "env-file"))]
    let config = ExchangeConfig::from_env("BYBIT")?;

    let market = MarketDataConfig::from_env()?;
    build_connector(config, market)
}
