use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{RequestParams, RsaKey, Signer};
use tracing::{error, info};

/// Bytes covered by a V5 signature:
/// `{timestamp}{api_key}{recv_window}{sorted k=v pairs joined by &}`
pub fn canonical_string(
    timestamp: u64,
    api_key: &str,
    recv_window_ms: u64,
    params: &RequestParams,
) -> String {
    format!(
        "{}{}{}{}",
        timestamp,
        api_key,
        recv_window_ms,
        params.canonical_string()
    )
}

/// Sign a V5 request with an already parsed RSA key
pub fn sign(
    key: &RsaKey,
    timestamp: u64,
    api_key: &str,
    recv_window_ms: u64,
    params: &RequestParams,
) -> Result<String, ExchangeError> {
    let payload = canonical_string(timestamp, api_key, recv_window_ms, params);
    key.sign_base64(payload.as_bytes())
}

/// Bybit RSA signer.
///
/// Always constructible: without a usable key it reports `can_sign() == false`
/// and every `sign` call fails with a configuration error naming the reason.
#[derive(Debug, Clone)]
pub struct BybitSigner {
    api_key: String,
    recv_window_ms: u64,
    key: Option<RsaKey>,
    unavailable_reason: String,
}

impl BybitSigner {
    pub fn new(api_key: String, key: RsaKey, recv_window_ms: u64) -> Self {
        Self {
            api_key,
            recv_window_ms,
            key: Some(key),
            unavailable_reason: String::new(),
        }
    }

    /// Signer with no private key; private requests are refused
    pub fn public_only(api_key: String, recv_window_ms: u64, reason: impl Into<String>) -> Self {
        Self {
            api_key,
            recv_window_ms,
            key: None,
            unavailable_reason: reason.into(),
        }
    }

    /// Load the key from configuration, degrading to public-only mode when
    /// the key is absent or malformed.
    pub fn from_config(config: &ExchangeConfig) -> Self {
        let api_key = config.api_key().to_string();
        let recv_window_ms = config.recv_window_ms;

        let Some(pem) = config.private_key_pem() else {
            info!("No private key configured; running in public-data-only mode");
            return Self::public_only(api_key, recv_window_ms, "no private key configured");
        };

        if api_key.is_empty() {
            error!("Private key configured without an API key; private requests disabled");
            return Self::public_only(api_key, recv_window_ms, "no API key configured");
        }

        match RsaKey::from_pem(pem) {
            Ok(key) => {
                info!("RSA private key loaded");
                Self::new(api_key, key, recv_window_ms)
            }
            Err(e) => {
                error!(error = %e, "Failed to load RSA private key; private requests disabled");
                Self::public_only(api_key, recv_window_ms, e.to_string())
            }
        }
    }
}

impl Signer for BybitSigner {
    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn recv_window_ms(&self) -> u64 {
        self.recv_window_ms
    }

    fn can_sign(&self) -> bool {
        self.key.is_some()
    }

    fn sign(&self, timestamp: u64, params: &RequestParams) -> Result<String, ExchangeError> {
        let key = self.key.as_ref().ok_or_else(|| {
            ExchangeError::ConfigurationError(format!(
                "private key not loaded: {}",
                self.unavailable_reason
            ))
        })?;
        sign(key, timestamp, &self.api_key, self.recv_window_ms, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PKCS8_PEM: &str = include_str!("../../../tests/fixtures/test_rsa_key.pem");
    const ORDER_SIGNATURE: &str = include_str!("../../../tests/fixtures/order_signature.b64");
    const EMPTY_SIGNATURE: &str =
        include_str!("../../../tests/fixtures/empty_params_signature.b64");

    fn order_params() -> RequestParams {
        RequestParams::new()
            .with("symbol", "BTCUSDT")
            .with("side", "Buy")
            .with("qty", "0.001")
    }

    #[test]
    fn test_canonical_string_matches_reference() {
        assert_eq!(
            canonical_string(1_700_000_000_000, "ABC123", 5000, &order_params()),
            "1700000000000ABC1235000qty=0.001&side=Buy&symbol=BTCUSDT"
        );
    }

    #[test]
    fn test_canonical_string_without_params_is_prefix_only() {
        assert_eq!(
            canonical_string(1_700_000_000_000, "ABC123", 5000, &RequestParams::new()),
            "1700000000000ABC1235000"
        );
    }

    #[test]
    fn test_known_answer_signature() {
        let key = RsaKey::from_pem(PKCS8_PEM).unwrap();
        let signature = sign(&key, 1_700_000_000_000, "ABC123", 5000, &order_params()).unwrap();
        assert_eq!(signature, ORDER_SIGNATURE.trim());

        let empty = sign(&key, 1_700_000_000_000, "ABC123", 5000, &RequestParams::new()).unwrap();
        assert_eq!(empty, EMPTY_SIGNATURE.trim());
    }

    #[test]
    fn test_signature_is_deterministic_and_order_independent() {
        let key = RsaKey::from_pem(PKCS8_PEM).unwrap();
        let forward: RequestParams = [("b", "2"), ("a", "1")].into_iter().collect();
        let reverse: RequestParams = [("a", "1"), ("b", "2")].into_iter().collect();

        let first = sign(&key, 42, "k", 5000, &forward).unwrap();
        let second = sign(&key, 42, "k", 5000, &forward).unwrap();
        let reordered = sign(&key, 42, "k", 5000, &reverse).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, reordered);
    }

    #[test]
    fn test_public_only_signer_refuses_with_configuration_error() {
        let config = ExchangeConfig::read_only();
        let signer = BybitSigner::from_config(&config);
        assert!(!signer.can_sign());

        let err = signer.sign(1, &RequestParams::new()).unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::ConfigurationError(ref m) if m.contains("no private key")
        ));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_malformed_key_degrades_and_reports_reason() {
        let config = ExchangeConfig::new("ABC123".to_string(), "not a pem".to_string());
        let signer = BybitSigner::from_config(&config);
        assert!(!signer.can_sign());

        let err = signer.sign(1, &RequestParams::new()).unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::ConfigurationError(ref m) if m.contains("Invalid RSA private key")
        ));
    }

    #[test]
    fn test_from_config_loads_escaped_key() {
        let escaped = PKCS8_PEM.trim().replace('\n', "\\n");
        let config = ExchangeConfig::new("ABC123".to_string(), escaped).recv_window_ms(10_000);
        let signer = BybitSigner::from_config(&config);
        assert!(signer.can_sign());
        assert_eq!(signer.recv_window_ms(), 10_000);
        assert_eq!(signer.api_key(), "ABC123");
    }
}
