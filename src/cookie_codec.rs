//! Authenticated, encrypted cookie values
//!
//! A cookie value is `base64(hmac(ciphertext))` immediately followed by
//! `ciphertext`, with no separator: the tag length is fixed by the HMAC
//! provider. The tag covers the ciphertext only.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::crypto::{base64_length, compare_hmac, CryptographyConfig};
use crate::error::SessionError;

/// Encodes and decodes session cookie values with the configured providers.
#[derive(Clone, Debug)]
pub struct CookieCodec {
    crypto: CryptographyConfig,
}

impl CookieCodec {
    pub fn new(crypto: CryptographyConfig) -> Self {
        Self { crypto }
    }

    /// Encrypt `plaintext` and prefix the ciphertext with its base64 HMAC
    pub fn encode(&self, plaintext: &str) -> Result<String, SessionError> {
        let ciphertext = self.crypto.encryption_provider().encrypt(plaintext)?;
        let tag = self.crypto.hmac_provider().generate_hmac(&ciphertext);
        Ok(format!("{}{}", STANDARD.encode(tag), ciphertext))
    }

    /// Verify the tag of a cookie value and return its ciphertext segment.
    ///
    /// Returns None for values that are too short, carry invalid base64, or
    /// whose tag does not match.
    pub fn authenticate<'a>(&self, cookie_value: &'a str) -> Option<&'a str> {
        let hmac = self.crypto.hmac_provider();
        let hmac_length = hmac.hmac_length();
        let tag_len = base64_length(hmac_length);

        let encoded_tag = cookie_value.get(..tag_len)?;
        let ciphertext = cookie_value.get(tag_len..)?;
        let provided = STANDARD.decode(encoded_tag).ok()?;
        let expected = hmac.generate_hmac(ciphertext);

        if compare_hmac(&expected, &provided, hmac_length) {
            Some(ciphertext)
        } else {
            None
        }
    }

    /// Authenticate and decrypt a cookie value.
    ///
    /// Ok(None) means the value is not trustworthy; nothing is decrypted in
    /// that case. Errors come from the encryption provider failing on an
    /// authentic payload.
    pub fn decode(&self, cookie_value: &str) -> Result<Option<String>, SessionError> {
        match self.authenticate(cookie_value) {
            Some(ciphertext) => self
                .crypto
                .encryption_provider()
                .decrypt(ciphertext)
                .map(Some),
            None => Ok(None),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use std::sync::atomic::Ordering;

    /// Replace the character at `idx` with a different base64 character
    fn flip_char(value: &str, idx: usize) -> String {
        let mut chars: Vec<char> = value.chars().collect();
        chars[idx] = if chars[idx] == 'A' { 'B' } else { 'A' };
        chars.into_iter().collect()
    }

    #[test]
    fn test_encode_layout() {
        let (crypto, _) = fake_crypto();
        let codec = CookieCodec::new(crypto);

        let value = codec.encode("abc").unwrap();
        // "enc:abc" is 7 bytes long
        let tag = STANDARD.encode([7u8, b'A', b'S', b'H']);
        assert_eq!(value, format!("{}enc:abc", tag));
    }

    #[test]
    fn test_round_trip() {
        let codec = CookieCodec::new(real_crypto());
        let value = codec.encode("54321").unwrap();
        assert_eq!(codec.decode(&value).unwrap(), Some("54321".to_string()));
    }

    #[test]
    fn test_round_trip_empty_plaintext() {
        let codec = CookieCodec::new(real_crypto());
        let value = codec.encode("").unwrap();
        assert_eq!(codec.decode(&value).unwrap(), Some(String::new()));
    }

    #[test]
    fn test_modified_ciphertext_is_rejected() {
        let codec = CookieCodec::new(real_crypto());
        let value = codec.encode("session-id").unwrap();

        for idx in [44, 50, value.len() - 2] {
            let tampered = flip_char(&value, idx);
            assert_eq!(codec.decode(&tampered).unwrap(), None, "index {}", idx);
        }
    }

    #[test]
    fn test_modified_tag_is_rejected() {
        let codec = CookieCodec::new(real_crypto());
        let value = codec.encode("session-id").unwrap();

        for idx in [0, 10, 42] {
            let tampered = flip_char(&value, idx);
            assert_eq!(codec.decode(&tampered).unwrap(), None, "index {}", idx);
        }
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        let codec = CookieCodec::new(real_crypto());
        assert_eq!(codec.decode("").unwrap(), None);
        assert_eq!(codec.decode("short").unwrap(), None);
        assert_eq!(codec.decode(&"!".repeat(60)).unwrap(), None);
        // Multi-byte character straddling the tag boundary
        let straddling = format!("{}é{}", "A".repeat(43), "A".repeat(20));
        assert_eq!(codec.decode(&straddling).unwrap(), None);
    }

    #[test]
    fn test_foreign_key_is_rejected() {
        let value = CookieCodec::new(real_crypto()).encode("id").unwrap();
        let other = CookieCodec::new(CryptographyConfig::random().unwrap());
        assert_eq!(other.decode(&value).unwrap(), None);
    }

    #[test]
    fn test_no_decrypt_without_valid_tag() {
        let (crypto, encryption) = fake_crypto();
        let codec = CookieCodec::new(crypto);

        let forged = format!("{}enc:admin", STANDARD.encode(b"XXXX"));
        assert_eq!(codec.decode(&forged).unwrap(), None);
        assert_eq!(encryption.decrypts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_decrypt_failure_on_authentic_value_propagates() {
        let (crypto, _) = fake_crypto();
        let codec = CookieCodec::new(crypto);

        // Correctly tagged, but not something FakeEncryption produced
        let tag = STANDARD.encode([5u8, b'A', b'S', b'H']);
        let value = format!("{}xxxxx", tag);
        assert!(matches!(
            codec.decode(&value),
            Err(SessionError::EncryptionError(_))
        ));
    }
}
