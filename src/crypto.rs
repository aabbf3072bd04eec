//! Cryptography capabilities used to protect session cookies
//!
//! Session cookies are encrypted with an [`EncryptionProvider`] and tagged with
//! an [`HmacProvider`]. Both are pluggable; the defaults are AES-256-GCM and
//! HMAC-SHA256 with keys taken from a [`KeyGenerator`].

use std::fmt;
use std::sync::Arc;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::SessionError;

type HmacSha256 = Hmac<Sha256>;

/// AES-256 key size in bytes
const AES_KEY_LEN: usize = 32;

/// AES-GCM nonce size in bytes
const NONCE_LEN: usize = 12;

/// HMAC-SHA256 output size in bytes
const HMAC_SHA256_LEN: usize = 32;

/// Key size used for HMAC-SHA256 keys
const HMAC_KEY_LEN: usize = 64;

/// Encrypts and decrypts cookie payloads.
///
/// Ciphertext must be a string that survives a round trip through a cookie
/// value, e.g. base64.
pub trait EncryptionProvider: Send + Sync {
    /// Encrypt a plaintext string
    fn encrypt(&self, plaintext: &str) -> Result<String, SessionError>;

    /// Decrypt a string previously produced by [`EncryptionProvider::encrypt`]
    fn decrypt(&self, ciphertext: &str) -> Result<String, SessionError>;
}

/// Generates the tamper-detection tag placed in front of every cookie payload.
pub trait HmacProvider: Send + Sync {
    /// Compute the HMAC of `data`
    fn generate_hmac(&self, data: &str) -> Vec<u8>;

    /// Length in bytes of every tag returned by [`HmacProvider::generate_hmac`]
    fn hmac_length(&self) -> usize;
}

/// Source of key bytes for the default providers.
pub trait KeyGenerator {
    /// Produce `count` key bytes
    fn get_bytes(&self, count: usize) -> Vec<u8>;
}

/// Derives keys from a passphrase with PBKDF2-HMAC-SHA256.
///
/// The same passphrase, salt and iteration count always yield the same key,
/// so cookies stay valid across restarts and across nodes sharing the config.
#[derive(Clone)]
pub struct PassphraseKeyGenerator {
    passphrase: String,
    salt: Vec<u8>,
    iterations: u32,
}

impl PassphraseKeyGenerator {
    pub fn new<S: Into<String>>(passphrase: S, salt: &[u8], iterations: u32) -> Self {
        Self {
            passphrase: passphrase.into(),
            salt: salt.to_vec(),
            iterations,
        }
    }
}

impl KeyGenerator for PassphraseKeyGenerator {
    fn get_bytes(&self, count: usize) -> Vec<u8> {
        let mut key = vec![0u8; count];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            self.passphrase.as_bytes(),
            &self.salt,
            self.iterations,
            &mut key,
        );
        key
    }
}

impl fmt::Debug for PassphraseKeyGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassphraseKeyGenerator")
            .field("passphrase", &"<redacted>")
            .field("salt_len", &self.salt.len())
            .field("iterations", &self.iterations)
            .finish()
    }
}

/// Fresh OS-random keys. Cookies become unreadable once the process exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomKeyGenerator;

impl KeyGenerator for RandomKeyGenerator {
    fn get_bytes(&self, count: usize) -> Vec<u8> {
        let mut key = vec![0u8; count];
        OsRng.fill_bytes(&mut key);
        key
    }
}

/// AES-256-GCM encryption. Output is `base64(nonce ++ ciphertext)`.
#[derive(Clone)]
pub struct AesGcmEncryptionProvider {
    cipher: Aes256Gcm,
}

impl AesGcmEncryptionProvider {
    /// Create a provider from a raw 32-byte key
    pub fn new(key: &[u8]) -> Result<Self, SessionError> {
        let cipher = <Aes256Gcm as KeyInit>::new_from_slice(key)
            .map_err(|e| SessionError::ConfigError(format!("AES-256 key: {}", e)))?;
        Ok(Self { cipher })
    }

    /// Create a provider with a key drawn from `keys`
    pub fn from_key_generator(keys: &dyn KeyGenerator) -> Result<Self, SessionError> {
        Self::new(&keys.get_bytes(AES_KEY_LEN))
    }
}

impl EncryptionProvider for AesGcmEncryptionProvider {
    fn encrypt(&self, plaintext: &str) -> Result<String, SessionError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| SessionError::EncryptionError(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(out))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, SessionError> {
        let bytes = STANDARD
            .decode(ciphertext)
            .map_err(|e| SessionError::EncryptionError(format!("invalid ciphertext: {}", e)))?;
        if bytes.len() < NONCE_LEN {
            return Err(SessionError::EncryptionError(
                "ciphertext shorter than nonce".to_string(),
            ));
        }

        let (nonce, sealed) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|e| SessionError::EncryptionError(e.to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| SessionError::EncryptionError(format!("plaintext is not utf-8: {}", e)))
    }
}

impl fmt::Debug for AesGcmEncryptionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AesGcmEncryptionProvider")
    }
}

/// HMAC-SHA256 tags (32 bytes).
#[derive(Clone)]
pub struct HmacSha256Provider {
    mac: HmacSha256,
}

impl HmacSha256Provider {
    pub fn new(key: &[u8]) -> Result<Self, SessionError> {
        let mac = <HmacSha256 as Mac>::new_from_slice(key)
            .map_err(|e| SessionError::ConfigError(format!("HMAC key: {}", e)))?;
        Ok(Self { mac })
    }

    pub fn from_key_generator(keys: &dyn KeyGenerator) -> Result<Self, SessionError> {
        Self::new(&keys.get_bytes(HMAC_KEY_LEN))
    }
}

impl HmacProvider for HmacSha256Provider {
    fn generate_hmac(&self, data: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(data.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    fn hmac_length(&self) -> usize {
        HMAC_SHA256_LEN
    }
}

impl fmt::Debug for HmacSha256Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HmacSha256Provider")
    }
}

/// The encryption and HMAC providers shared by every session store.
#[derive(Clone)]
pub struct CryptographyConfig {
    encryption: Arc<dyn EncryptionProvider>,
    hmac: Arc<dyn HmacProvider>,
}

impl CryptographyConfig {
    pub fn new<E, H>(encryption: E, hmac: H) -> Self
    where
        E: EncryptionProvider + 'static,
        H: HmacProvider + 'static,
    {
        Self {
            encryption: Arc::new(encryption),
            hmac: Arc::new(hmac),
        }
    }

    /// Default providers keyed from the given generators
    pub fn from_key_generators(
        encryption_keys: &dyn KeyGenerator,
        hmac_keys: &dyn KeyGenerator,
    ) -> Result<Self, SessionError> {
        Ok(Self::new(
            AesGcmEncryptionProvider::from_key_generator(encryption_keys)?,
            HmacSha256Provider::from_key_generator(hmac_keys)?,
        ))
    }

    /// Default providers with random per-process keys
    pub fn random() -> Result<Self, SessionError> {
        Self::from_key_generators(&RandomKeyGenerator, &RandomKeyGenerator)
    }

    pub fn encryption_provider(&self) -> &dyn EncryptionProvider {
        self.encryption.as_ref()
    }

    pub fn hmac_provider(&self) -> &dyn HmacProvider {
        self.hmac.as_ref()
    }
}

impl fmt::Debug for CryptographyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptographyConfig")
            .field("hmac_length", &self.hmac.hmac_length())
            .finish_non_exhaustive()
    }
}

/// Number of characters needed to base64-encode `byte_len` bytes, padding included
pub fn base64_length(byte_len: usize) -> usize {
    byte_len.div_ceil(3) * 4
}

/// Compare the first `length` bytes of two HMACs without exiting early on a
/// mismatch. Tags shorter than `length` never match.
pub fn compare_hmac(a: &[u8], b: &[u8], length: usize) -> bool {
    if a.len() < length || b.len() < length {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a[..length].iter().zip(&b[..length]) {
        result |= x ^ y;
    }
    result == 0
}
