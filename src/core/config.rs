use crate::core::types::ProviderKind;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

/// Receive window used when none is configured, in milliseconds
pub const DEFAULT_RECV_WINDOW_MS: u64 = 5000;
/// Timeout applied to every outbound request unless overridden
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;
/// Freshness window for cached tickers
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 60;

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub api_key: Secret<String>,
    pub private_key_pem: Option<Secret<String>>,
    pub recv_window_ms: u64,
    pub proxy_url: Option<String>,
    pub testnet: bool,
    pub base_url: Option<String>,
    pub timeout_seconds: u64,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ExchangeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ExchangeConfig", 7)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field(
            "private_key_pem",
            &self.private_key_pem.as_ref().map(|_| "[REDACTED]"),
        )?;
        state.serialize_field("recv_window_ms", &self.recv_window_ms)?;
        state.serialize_field("proxy_url", &self.proxy_url)?;
        state.serialize_field("testnet", &self.testnet)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("timeout_seconds", &self.timeout_seconds)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ExchangeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ExchangeConfigHelper {
            #[serde(default)]
            api_key: String,
            #[serde(default)]
            private_key_pem: Option<String>,
            #[serde(default = "default_recv_window")]
            recv_window_ms: u64,
            #[serde(default)]
            proxy_url: Option<String>,
            #[serde(default)]
            testnet: bool,
            #[serde(default)]
            base_url: Option<String>,
            #[serde(default = "default_timeout")]
            timeout_seconds: u64,
        }

        let helper = ExchangeConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(helper.api_key),
            private_key_pem: non_empty(helper.private_key_pem).map(Secret::new),
            recv_window_ms: helper.recv_window_ms,
            proxy_url: non_empty(helper.proxy_url),
            testnet: helper.testnet,
            base_url: non_empty(helper.base_url),
            timeout_seconds: helper.timeout_seconds,
        })
    }
}

const fn default_recv_window() -> u64 {
    DEFAULT_RECV_WINDOW_MS
}

const fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_u64_var(name: &str) -> Result<Option<u64>, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse::<u64>().map(Some).map_err(|_| {
            ConfigError::InvalidConfiguration(format!("{} must be an integer, got '{}'", name, raw))
        }),
        _ => Ok(None),
    }
}

impl ExchangeConfig {
    /// Create a new configuration with an API key and RSA private key PEM
    #[must_use]
    pub fn new(api_key: String, private_key_pem: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            private_key_pem: non_empty(Some(private_key_pem)).map(Secret::new),
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
            proxy_url: None,
            testnet: false,
            base_url: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{EXCHANGE}_API_KEY` (optional, public-only mode without it)
    /// - `{EXCHANGE}_PRIVATE_KEY` (optional, PEM; `\n` escapes are accepted)
    /// - `{EXCHANGE}_RECV_WINDOW` (optional, defaults to 5000 ms)
    /// - `{EXCHANGE}_PROXY_URL` (optional)
    /// - `{EXCHANGE}_TESTNET` (optional, defaults to false)
    /// - `{EXCHANGE}_BASE_URL` (optional)
    /// - `{EXCHANGE}_TIMEOUT_SECONDS` (optional, defaults to 15)
    pub fn from_env(exchange_prefix: &str) -> Result<Self, ConfigError> {
        let prefix = exchange_prefix.to_uppercase();
        let var = |suffix: &str| non_empty(env::var(format!("{}_{}", prefix, suffix)).ok());

        let testnet = var("TESTNET")
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Ok(Self {
            api_key: Secret::new(var("API_KEY").unwrap_or_default()),
            private_key_pem: var("PRIVATE_KEY").map(Secret::new),
            recv_window_ms: parse_u64_var(&format!("{}_RECV_WINDOW", prefix))?
                .unwrap_or(DEFAULT_RECV_WINDOW_MS),
            proxy_url: var("PROXY_URL"),
            testnet,
            base_url: var("BASE_URL"),
            timeout_seconds: parse_u64_var(&format!("{}_TIMEOUT_SECONDS", prefix))?
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        })
    }

    /// Create configuration from .env file and environment variables
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(exchange_prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(exchange_prefix, ".env")
    }

    /// Create configuration from a specific .env file path
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(
        exchange_prefix: &str,
        env_file_path: &str,
    ) -> Result<Self, ConfigError> {
        load_env_file(env_file_path)?;
        Self::from_env(exchange_prefix)
    }

    /// Configuration for public market data only
    #[must_use]
    pub fn read_only() -> Self {
        Self::new(String::new(), String::new())
    }

    /// Check if this configuration carries material for signed requests
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && self.private_key_pem.is_some()
    }

    /// Set testnet mode
    #[must_use]
    pub const fn testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    /// Set custom base URL
    #[must_use]
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Route every request through this proxy
    #[must_use]
    pub fn proxy_url(mut self, proxy_url: String) -> Self {
        self.proxy_url = non_empty(Some(proxy_url));
        self
    }

    #[must_use]
    pub const fn recv_window_ms(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = recv_window_ms;
        self
    }

    #[must_use]
    pub const fn timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get private key PEM (use carefully - exposes secret)
    pub fn private_key_pem(&self) -> Option<&str> {
        self.private_key_pem
            .as_ref()
            .map(|pem| pem.expose_secret().as_str())
    }

    /// Venue REST base URL, honouring overrides and testnet
    pub fn venue_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            if self.testnet {
                "https://api-testnet.bybit.com".to_string()
            } else {
                "https://api.bybit.com".to_string()
            }
        })
    }
}

/// Market-data aggregation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDataConfig {
    /// Providers in priority order
    pub providers: Vec<ProviderKind>,
    pub cache_ttl_seconds: u64,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            providers: vec![ProviderKind::Bybit, ProviderKind::Binance, ProviderKind::Okx],
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
        }
    }
}

impl MarketDataConfig {
    /// Read `MARKET_PROVIDERS` (comma separated) and `MARKET_CACHE_TTL_SECONDS`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = non_empty(env::var("MARKET_PROVIDERS").ok()) {
            config.providers = Self::parse_providers(&raw)?;
        }
        if let Some(ttl) = parse_u64_var("MARKET_CACHE_TTL_SECONDS")? {
            config.cache_ttl_seconds = ttl;
        }

        Ok(config)
    }

    pub fn parse_providers(raw: &str) -> Result<Vec<ProviderKind>, ConfigError> {
        let providers = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<ProviderKind>()
                    .map_err(ConfigError::InvalidConfiguration)
            })
            .collect::<Result<Vec<_>, _>>()?;

        if providers.is_empty() {
            return Err(ConfigError::InvalidConfiguration(
                "at least one market data provider is required".to_string(),
            ));
        }
        Ok(providers)
    }

    #[must_use]
    pub fn providers(mut self, providers: Vec<ProviderKind>) -> Self {
        self.providers = providers;
        self
    }

    #[must_use]
    pub const fn cache_ttl_seconds(mut self, ttl: u64) -> Self {
        self.cache_ttl_seconds = ttl;
        self
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_seconds as i64)
    }
}

#[cfg(feature = "env-file")]
fn load_env_file(env_file_path: &str) -> Result<(), ConfigError> {
    match dotenv::from_path(env_file_path) {
        Ok(()) => Ok(()),
        Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
            // .env file doesn't exist, that's okay - continue with system env vars
            Ok(())
        }
        Err(e) => Err(ConfigError::InvalidConfiguration(format!(
            "Failed to load .env file '{}': {}",
            env_file_path, e
        ))),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
