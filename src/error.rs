//! Session error types

use std::fmt;

/// Errors that can occur during session operations.
///
/// Missing, malformed or tampered cookies are never reported through this
/// type: they collapse into an empty session. Only failing capabilities
/// (cipher, serializer, backing store) surface here.
#[derive(Debug)]
pub enum SessionError {
    /// Error from a backing store
    StoreError(String),
    /// Error during serialization/deserialization of session values
    SerializationError(String),
    /// Error from the encryption provider
    EncryptionError(String),
    /// Invalid cryptography or session configuration
    ConfigError(String),
    /// Redis error (when redis-store feature is enabled)
    #[cfg(feature = "redis-store")]
    RedisError(redis::RedisError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::StoreError(msg) => write!(f, "Session store error: {}", msg),
            SessionError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            SessionError::EncryptionError(msg) => write!(f, "Encryption error: {}", msg),
            SessionError::ConfigError(msg) => write!(f, "Invalid session configuration: {}", msg),
            #[cfg(feature = "redis-store")]
            SessionError::RedisError(e) => write!(f, "Redis error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "redis-store")]
            SessionError::RedisError(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "redis-store")]
impl From<redis::RedisError> for SessionError {
    fn from(err: redis::RedisError) -> Self {
        SessionError::RedisError(err)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::SerializationError(err.to_string())
    }
}
