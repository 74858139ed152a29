/// Transport kernel shared by the venue client and market-data providers
///
/// # Components
///
/// - `RequestParams` / `RequestBuilder`: insertion-ordered parameters, clock
///   stamping and authentication headers
/// - `Signer` / `RsaKey`: pluggable request signing, RSA PKCS#1 v1.5 over SHA-256
/// - `RestClient` / `ReqwestRest`: signed HTTP calls with uniform error
///   classification
/// - `PublicTransport`: unauthenticated JSON GETs used by market-data providers
///
/// # Example
/// ```rust,no_run
/// use flowradar::core::config::ExchangeConfig;
/// use flowradar::core::kernel::*;
/// use flowradar::exchanges::bybit::signer::BybitSigner;
/// use reqwest::Method;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExchangeConfig::from_env("BYBIT")?;
/// let rest = RestClientBuilder::new(RestClientConfig::from_exchange_config(&config, "bybit"))
///     .with_signer(Arc::new(BybitSigner::from_config(&config)))
///     .build()?;
///
/// let params = RequestParams::new().with("accountType", "UNIFIED");
/// let wallet = rest
///     .request(Method::GET, "/v5/account/wallet-balance", params)
///     .await;
/// println!("{:?}", wallet);
/// # Ok(())
/// # }
/// ```
pub mod request;
pub mod rest;
pub mod signer;

pub use request::{HeaderSet, RequestBuilder, RequestParams, SignedRequest, DEFAULT_USER_AGENT};
pub use rest::{
    check_venue_status, truncate_body, PublicTransport, ReqwestRest, RestClient, RestClientBuilder,
    RestClientConfig, MAX_ERROR_BODY_CHARS,
};
pub use signer::{RsaKey, Signer};
