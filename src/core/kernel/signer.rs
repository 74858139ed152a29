use crate::core::errors::ExchangeError;
use crate::core::kernel::request::RequestParams;
use base64::engine::general_purpose;
use base64::Engine;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer as _};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

/// Signer trait for request authentication
///
/// Implementations turn a stamped parameter set into the signature string the
/// venue expects. Signing is synchronous and side-effect free.
pub trait Signer: Send + Sync {
    /// Public API key identifying the account
    fn api_key(&self) -> &str;

    /// Tolerated clock skew in milliseconds
    fn recv_window_ms(&self) -> u64;

    /// Whether private key material is loaded
    fn can_sign(&self) -> bool;

    /// Sign `params` for a request stamped at `timestamp` (ms since epoch)
    fn sign(&self, timestamp: u64, params: &RequestParams) -> Result<String, ExchangeError>;
}

/// Parsed RSA private key producing PKCS#1 v1.5 / SHA-256 signatures
#[derive(Clone)]
pub struct RsaKey {
    signing_key: SigningKey<Sha256>,
    public_key: RsaPublicKey,
}

impl std::fmt::Debug for RsaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaKey").finish_non_exhaustive()
    }
}

impl RsaKey {
    /// Parse a PEM private key (PKCS#8 or PKCS#1).
    ///
    /// Literal `\n` sequences are turned into newlines first, so keys stored
    /// in single-line environment variables load unchanged.
    pub fn from_pem(pem: &str) -> Result<Self, ExchangeError> {
        let normalized = Zeroizing::new(normalize_pem(pem));

        let private_key = RsaPrivateKey::from_pkcs8_pem(&normalized)
            .or_else(|pkcs8_err| {
                RsaPrivateKey::from_pkcs1_pem(&normalized).map_err(|pkcs1_err| {
                    ExchangeError::ConfigurationError(format!(
                        "Invalid RSA private key (pkcs8: {}; pkcs1: {})",
                        pkcs8_err, pkcs1_err
                    ))
                })
            })?;

        let public_key = private_key.to_public_key();
        Ok(Self {
            signing_key: SigningKey::<Sha256>::new(private_key),
            public_key,
        })
    }

    pub const fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Sign `message` and return the base64 encoded signature
    pub fn sign_base64(&self, message: &[u8]) -> Result<String, ExchangeError> {
        let signature = self.signing_key.try_sign(message).map_err(|e| {
            ExchangeError::ConfigurationError(format!("RSA signing failed: {}", e))
        })?;
        Ok(general_purpose::STANDARD.encode(signature.to_bytes()))
    }
}

/// Replace escaped newlines and trim surrounding whitespace/quotes
pub fn normalize_pem(pem: &str) -> String {
    pem.trim()
        .trim_matches('"')
        .replace("\\r\\n", "\n")
        .replace("\\n", "\n")
}
