//! Session value serialization for the self-contained cookie store

use serde_json::Value;

use crate::error::SessionError;

/// Converts session values to and from the strings embedded in a cookie payload.
pub trait ObjectSerializer: Send + Sync {
    fn serialize(&self, value: &Value) -> Result<String, SessionError>;

    fn deserialize(&self, data: &str) -> Result<Value, SessionError>;
}

/// JSON serializer, the default for [`CookieStore`](crate::store::CookieStore).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl ObjectSerializer for JsonSerializer {
    fn serialize(&self, value: &Value) -> Result<String, SessionError> {
        Ok(serde_json::to_string(value)?)
    }

    fn deserialize(&self, data: &str) -> Result<Value, SessionError> {
        Ok(serde_json::from_str(data)?)
    }
}
