//! Session configuration

use crate::crypto::{CryptographyConfig, PassphraseKeyGenerator};
use crate::error::SessionError;

/// Salt used when none is configured
pub const DEFAULT_SALT: &[u8] = b"salvo-cookie-sessions";

/// Default PBKDF2 iteration count
pub const DEFAULT_ITERATIONS: u32 = 10_000;

/// Minimum accepted salt length in bytes
const MIN_SALT_LEN: usize = 8;

/// Key material for the session cookie cryptography.
///
/// Encryption and HMAC keys are derived from two separate passphrases so that
/// a leaked encryption key does not let a client forge tags.
#[derive(Clone)]
pub struct SessionConfig {
    /// Passphrase the AES-256 key is derived from
    pub encryption_passphrase: String,

    /// Passphrase the HMAC-SHA256 key is derived from
    pub hmac_passphrase: String,

    /// PBKDF2 salt, shared by both derivations (default: [`DEFAULT_SALT`])
    pub salt: Vec<u8>,

    /// PBKDF2 iteration count (default: [`DEFAULT_ITERATIONS`])
    pub iterations: u32,
}

impl SessionConfig {
    /// Create a new configuration from the encryption and HMAC passphrases
    pub fn new<E, H>(encryption_passphrase: E, hmac_passphrase: H) -> Self
    where
        E: Into<String>,
        H: Into<String>,
    {
        Self {
            encryption_passphrase: encryption_passphrase.into(),
            hmac_passphrase: hmac_passphrase.into(),
            salt: DEFAULT_SALT.to_vec(),
            iterations: DEFAULT_ITERATIONS,
        }
    }

    /// Set the PBKDF2 salt (at least 8 bytes)
    pub fn with_salt(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.salt = salt.into();
        self
    }

    /// Set the PBKDF2 iteration count
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Check the configuration without deriving any keys
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.encryption_passphrase.is_empty() || self.hmac_passphrase.is_empty() {
            return Err(SessionError::ConfigError(
                "passphrases must not be empty".to_string(),
            ));
        }
        if self.encryption_passphrase == self.hmac_passphrase {
            return Err(SessionError::ConfigError(
                "encryption and HMAC passphrases must differ".to_string(),
            ));
        }
        if self.salt.len() < MIN_SALT_LEN {
            return Err(SessionError::ConfigError(format!(
                "salt must be at least {} bytes, got {}",
                MIN_SALT_LEN,
                self.salt.len()
            )));
        }
        if self.iterations == 0 {
            return Err(SessionError::ConfigError(
                "iterations must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Derive the keys and build the default providers
    pub fn cryptography(&self) -> Result<CryptographyConfig, SessionError> {
        self.validate()?;

        let encryption_keys =
            PassphraseKeyGenerator::new(self.encryption_passphrase.as_str(), &self.salt, self.iterations);
        let hmac_keys =
            PassphraseKeyGenerator::new(self.hmac_passphrase.as_str(), &self.salt, self.iterations);

        tracing::debug!(iterations = self.iterations, "deriving session cookie keys");
        CryptographyConfig::from_key_generators(&encryption_keys, &hmac_keys)
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("encryption_passphrase", &"<redacted>")
            .field("hmac_passphrase", &"<redacted>")
            .field("salt_len", &self.salt.len())
            .field("iterations", &self.iterations)
            .finish()
    }
}
