use crate::core::clock::{Clock, SystemClock};
use crate::core::errors::ExchangeError;
use crate::core::kernel::PublicTransport;
use crate::core::outcome::RequestOutcome;
use crate::core::traits::TickerProvider;
use crate::core::types::{Freshness, MarketQuote, ProviderKind, TickerSnapshot};
use crate::market::cache::{CacheEntry, MarketDataCache};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Resolves tickers through the cache and an ordered list of providers.
///
/// A fresh cache entry short-circuits the network. Otherwise providers are
/// tried in priority order and the first success is written through to the
/// cache. When every provider fails, any cached entry is served tagged
/// [`Freshness::Stale`]; with nothing cached the last failure is returned.
pub struct MarketDataAggregator {
    providers: Vec<Arc<dyn TickerProvider>>,
    transport: Arc<dyn PublicTransport>,
    cache: Arc<MarketDataCache>,
    clock: Arc<dyn Clock>,
}

impl MarketDataAggregator {
    pub fn new(
        providers: Vec<Arc<dyn TickerProvider>>,
        transport: Arc<dyn PublicTransport>,
        cache: Arc<MarketDataCache>,
    ) -> Self {
        Self {
            providers,
            transport,
            cache,
            clock: Arc::new(SystemClock),
        }
    }

    /// Override the clock used to stamp `fetched_at`
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache(&self) -> &Arc<MarketDataCache> {
        &self.cache
    }

    pub fn provider_kinds(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    pub async fn get_ticker(&self, symbol: &str) -> RequestOutcome<MarketQuote> {
        self.fetch_ticker(symbol).await.into()
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn fetch_ticker(&self, symbol: &str) -> Result<MarketQuote, ExchangeError> {
        let cached = self.cache.get(symbol);
        if let Some(entry) = &cached {
            if self.cache.is_fresh(entry) {
                debug!(source = %entry.snapshot.source, "Serving fresh cached ticker");
                return Ok(quote(entry, Freshness::Cached));
            }
        }

        let venue_symbol = symbol.trim().to_uppercase();

        let mut failures: Vec<(ProviderKind, ExchangeError)> = Vec::new();
        for provider in &self.providers {
            match self.fetch_from(provider.as_ref(), &venue_symbol).await {
                Ok(snapshot) => {
                    self.cache.put(symbol, snapshot.clone());
                    return Ok(MarketQuote {
                        snapshot,
                        freshness: Freshness::Live,
                    });
                }
                Err(e) => {
                    warn!(provider = %provider.kind(), error = %e, "Market data provider failed");
                    failures.push((provider.kind(), e));
                }
            }
        }

        // A concurrent call may have refreshed the entry while we were waiting.
        if let Some(entry) = self.cache.get(symbol).or(cached) {
            let freshness = if self.cache.is_fresh(&entry) {
                Freshness::Cached
            } else {
                Freshness::Stale
            };
            warn!(
                inserted_at = %entry.inserted_at,
                "All market data providers failed; serving cached ticker"
            );
            return Ok(quote(&entry, freshness));
        }

        Err(exhausted(failures))
    }

    async fn fetch_from(
        &self,
        provider: &dyn TickerProvider,
        symbol: &str,
    ) -> Result<TickerSnapshot, ExchangeError> {
        let url = provider.ticker_url(symbol)?;
        let payload = self.transport.get_json(&url).await?;
        provider.parse_ticker(symbol, &payload, self.clock.now())
    }
}

fn quote(entry: &CacheEntry, freshness: Freshness) -> MarketQuote {
    MarketQuote {
        snapshot: entry.snapshot.clone(),
        freshness,
    }
}

/// Collapse per-provider failures into one error shaped like the last one
fn exhausted(failures: Vec<(ProviderKind, ExchangeError)>) -> ExchangeError {
    let summary = failures
        .iter()
        .map(|(kind, e)| format!("{}: {}", kind, e))
        .collect::<Vec<_>>()
        .join("; ");

    match failures.into_iter().last() {
        Some((_, last)) => {
            last.with_message(format!("all market data providers failed ({})", summary))
        }
        None => ExchangeError::ConfigurationError(
            "no market data providers configured".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_keeps_last_kind() {
        let err = exhausted(vec![
            (
                ProviderKind::Bybit,
                ExchangeError::RateLimited("HTTP 429".to_string()),
            ),
            (
                ProviderKind::Binance,
                ExchangeError::TransportError("connection refused".to_string()),
            ),
        ]);
        assert!(matches!(err, ExchangeError::TransportError(_)));
        let message = err.to_string();
        assert!(message.contains("bybit: Rate limited: HTTP 429"));
        assert!(message.contains("binance: Transport error: connection refused"));
    }

    #[test]
    fn test_exhausted_without_providers() {
        assert!(matches!(
            exhausted(Vec::new()),
            ExchangeError::ConfigurationError(_)
        ));
    }
}
