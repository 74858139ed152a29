use crate::core::clock::{Clock, SystemClock};
use crate::core::config::{ExchangeConfig, DEFAULT_TIMEOUT_SECONDS};
use crate::core::errors::{ExchangeError, RATE_LIMIT_STATUS};
use crate::core::kernel::request::{RequestBuilder, RequestParams, DEFAULT_USER_AGENT};
use crate::core::kernel::signer::Signer;
use crate::core::outcome::RequestOutcome;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Proxy, Request, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, trace, warn};

/// Longest slice of a response body echoed back in error messages
pub const MAX_ERROR_BODY_CHARS: usize = 256;

/// Venue status code meaning "too many visits"
const VENUE_RATE_LIMIT_CODE: i64 = 10006;

/// Unauthenticated GET access to market-data providers
///
/// Kept separate from signing so the aggregator can be driven by any
/// transport, including in-memory fakes.
#[async_trait]
pub trait PublicTransport: Send + Sync {
    /// GET `url` and return its JSON body
    async fn get_json(&self, url: &str) -> Result<Value, ExchangeError>;
}

/// REST client trait for the venue
#[async_trait]
pub trait RestClient: PublicTransport {
    /// Whether signed requests can be produced
    fn can_sign(&self) -> bool;

    /// Sign and send a private request, returning the venue payload
    async fn signed_request(
        &self,
        method: Method,
        endpoint: &str,
        params: RequestParams,
    ) -> Result<Value, ExchangeError>;

    /// Sign and send a private request with strongly-typed response
    async fn signed_request_json<T: DeserializeOwned + Send>(
        &self,
        method: Method,
        endpoint: &str,
        params: RequestParams,
    ) -> Result<T, ExchangeError> {
        let value = self.signed_request(method, endpoint, params).await?;
        serde_json::from_value(value).map_err(ExchangeError::from)
    }
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
    /// Proxy every request is routed through, if any
    pub proxy_url: Option<String>,
}

impl RestClientConfig {
    /// Create a new configuration
    ///
    /// # Arguments
    /// * `base_url` - Base URL for the API
    /// * `exchange_name` - Name of the exchange
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url,
            exchange_name,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy_url: None,
        }
    }

    /// Derive transport settings from an exchange configuration
    pub fn from_exchange_config(config: &ExchangeConfig, exchange_name: &str) -> Self {
        Self::new(config.venue_base_url(), exchange_name.to_string())
            .with_timeout(config.timeout_seconds)
            .with_proxy(config.proxy_url.clone())
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Route all traffic through `proxy_url`
    pub fn with_proxy(mut self, proxy_url: Option<String>) -> Self {
        self.proxy_url = proxy_url;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    clock: Arc<dyn Clock>,
}

impl RestClientBuilder {
    /// Create a new builder with the given configuration
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Override the clock used to stamp requests
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the REST client
    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent);

        builder = match &self.config.proxy_url {
            Some(proxy_url) => builder.proxy(Proxy::all(proxy_url).map_err(|e| {
                ExchangeError::ConfigurationError(format!(
                    "Invalid proxy URL '{}': {}",
                    proxy_url, e
                ))
            })?),
            // Ambient HTTP(S)_PROXY variables are ignored unless configured here.
            None => builder.no_proxy(),
        };

        let client = builder.build().map_err(|e| {
            ExchangeError::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        let request_builder = self.signer.as_ref().map(|signer| {
            RequestBuilder::new(signer.api_key(), signer.recv_window_ms(), self.clock.clone())
                .with_user_agent(self.config.user_agent.clone())
        });

        Ok(ReqwestRest {
            client,
            config: self.config,
            signer: self.signer,
            request_builder,
        })
    }
}

/// Authenticated venue client built on reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    request_builder: Option<RequestBuilder>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("can_sign", &self.can_sign())
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    /// Build the fully signed request without sending it
    pub fn prepare(
        &self,
        method: Method,
        endpoint: &str,
        params: RequestParams,
    ) -> Result<Request, ExchangeError> {
        let (signer, builder) = match (&self.signer, &self.request_builder) {
            (Some(signer), Some(builder)) => (signer, builder),
            _ => {
                return Err(ExchangeError::ConfigurationError(
                    "Authentication required but no signer provided".to_string(),
                ))
            }
        };

        // Stamp, sort and sign in one synchronous step.
        let signed = builder.build(method, endpoint, params);
        let signature = signer.sign(signed.timestamp, &signed.params)?;
        let headers = builder.headers(signed.timestamp, &signature)?;

        let mut request = self
            .client
            .request(signed.method.clone(), signed.url(&self.config.base_url))
            .headers(headers);
        if let Some(body) = signed.body()? {
            request = request.body(body);
        }

        request.build().map_err(ExchangeError::from)
    }

    /// Signed venue call returning the uniform outcome shape
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: RequestParams,
    ) -> RequestOutcome<Value> {
        self.signed_request(method, endpoint, params).await.into()
    }

    /// Signed venue call decoded into `T`
    pub async fn request_json<T: DeserializeOwned + Send>(
        &self,
        method: Method,
        endpoint: &str,
        params: RequestParams,
    ) -> RequestOutcome<T> {
        self.signed_request_json(method, endpoint, params)
            .await
            .into()
    }

    /// Unsigned GET; paths starting with `/` are resolved against the venue base URL
    pub async fn public_request(&self, url: &str) -> RequestOutcome<Value> {
        self.get_json(url).await.into()
    }

    fn resolve_url(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{}", self.config.base_url.trim_end_matches('/'), url)
        } else {
            url.to_string()
        }
    }

    /// Handle the response and extract JSON
    #[instrument(skip(self, response), fields(exchange = %self.config.exchange_name, status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<Value, ExchangeError> {
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));
        let response_text = response.text().await.map_err(|e| {
            ExchangeError::TransportError(format!("Failed to read response body: {}", e))
        })?;

        trace!("Response body: {}", response_text);

        if status.as_u16() == RATE_LIMIT_STATUS {
            return Err(ExchangeError::RateLimited(format!(
                "HTTP 429 from {}: {}",
                self.config.exchange_name,
                truncate_body(&response_text)
            )));
        }

        if !status.is_success() {
            return Err(ExchangeError::protocol(
                Some(status.as_u16()),
                format!("HTTP {}: {}", status.as_u16(), truncate_body(&response_text)),
            ));
        }

        if !is_json {
            return Err(ExchangeError::protocol(
                None,
                format!("Expected JSON response, got: {}", truncate_body(&response_text)),
            ));
        }

        serde_json::from_str(&response_text).map_err(|e| {
            ExchangeError::protocol(
                None,
                format!(
                    "Failed to parse JSON response ({}): {}",
                    e,
                    truncate_body(&response_text)
                ),
            )
        })
    }
}

/// Reject 2xx payloads whose embedded `retCode` is non-zero
pub fn check_venue_status(value: Value) -> Result<Value, ExchangeError> {
    let Some(code) = value.get("retCode").and_then(Value::as_i64) else {
        return Ok(value);
    };
    if code == 0 {
        return Ok(value);
    }

    let message = value
        .get("retMsg")
        .and_then(Value::as_str)
        .unwrap_or("unknown venue error")
        .to_string();

    if code == VENUE_RATE_LIMIT_CODE {
        Err(ExchangeError::RateLimited(message))
    } else {
        Err(ExchangeError::VenueError {
            code: i32::try_from(code).unwrap_or(i32::MIN),
            message,
        })
    }
}

/// Cut a body down for inclusion in an error message
pub fn truncate_body(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(MAX_ERROR_BODY_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[async_trait]
impl PublicTransport for ReqwestRest {
    #[instrument(skip(self), fields(exchange = %self.config.exchange_name))]
    async fn get_json(&self, url: &str) -> Result<Value, ExchangeError> {
        let url = self.resolve_url(url);
        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Public request failed");
            ExchangeError::from(e)
        })?;
        self.handle_response(response).await
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    fn can_sign(&self) -> bool {
        self.signer.as_ref().is_some_and(|s| s.can_sign())
    }

    #[instrument(skip(self, params), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint))]
    async fn signed_request(
        &self,
        method: Method,
        endpoint: &str,
        params: RequestParams,
    ) -> Result<Value, ExchangeError> {
        let request = self.prepare(method, endpoint, params)?;

        let response = self.client.execute(request).await.map_err(|e| {
            warn!(error = %e, "Signed request failed");
            ExchangeError::from(e)
        })?;

        let value = self.handle_response(response).await?;
        check_venue_status(value)
    }
}
