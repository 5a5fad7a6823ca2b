//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::cache::{GetOptions, PeekOptions, Snapshot};

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
/// - `ttl`: Optional TTL in milliseconds (uses the cache default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Optional TTL in milliseconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Checks a key accepted over HTTP: non-empty and at most
/// [`MAX_KEY_LENGTH`] bytes.
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

/// Query string for GET /get/:key
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct GetParams {
    pub allow_stale: Option<bool>,
    pub update_age_on_get: Option<bool>,
}

impl From<GetParams> for GetOptions {
    fn from(params: GetParams) -> Self {
        GetOptions {
            allow_stale: params.allow_stale,
            update_age_on_get: params.update_age_on_get,
        }
    }
}

/// Query string for GET /peek/:key
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PeekParams {
    pub allow_stale: Option<bool>,
}

impl From<PeekParams> for PeekOptions {
    fn from(params: PeekParams) -> Self {
        PeekOptions {
            allow_stale: params.allow_stale,
        }
    }
}

/// Request body for POST /load, in the same shape GET /dump returns
pub type LoadRequest = Snapshot<String, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, "hello");
        assert!(req.ttl.is_none());
    }

    #[test]
    fn test_set_request_with_ttl() {
        let json = r#"{"key": "test", "value": "hello", "ttl": 60000}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl, Some(60_000));
    }

    #[test]
    fn test_set_request_negative_ttl_rejected() {
        let json = r#"{"key": "test", "value": "hello", "ttl": -10}"#;
        assert!(serde_json::from_str::<SetRequest>(json).is_err());
    }

    #[test]
    fn test_validate_empty_key() {
        let req = SetRequest {
            key: "".to_string(),
            value: "test".to_string(),
            ttl: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_long_key() {
        let req = SetRequest {
            key: "x".repeat(MAX_KEY_LENGTH + 1),
            value: "test".to_string(),
            ttl: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_valid_request() {
        let req = SetRequest {
            key: "valid_key".to_string(),
            value: "test".to_string(),
            ttl: Some(60),
        };
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_key_boundary() {
        assert!(validate_key(&"x".repeat(MAX_KEY_LENGTH)).is_none());
        assert!(validate_key(&"x".repeat(MAX_KEY_LENGTH + 1)).is_some());
        assert!(validate_key("").is_some());
    }

    #[test]
    fn test_get_params_into_options() {
        let params = GetParams {
            allow_stale: Some(true),
            update_age_on_get: None,
        };
        let options = GetOptions::from(params);
        assert_eq!(options.allow_stale, Some(true));
        assert_eq!(options.update_age_on_get, None);
    }
}
