use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt::Debug;
use std::sync::Arc;

/// Opaque authorization credential with an absolute expiration time.
///
/// Kept as a trait so the cache never depends on how a token was obtained
/// and test doubles can stand in for the JSON-backed production type.
pub trait AuthorizationToken: Debug + Send + Sync {
    /// Opaque credential text, e.g. the bearer token to put on the wire.
    fn body(&self) -> &str;

    /// Absolute UTC timestamp after which the token is invalid.
    fn expiration_time(&self) -> DateTime<Utc>;

    /// A token is expired once its expiration time is no longer in the future.
    fn is_expired(&self) -> bool {
        self.expiration_time() <= Utc::now()
    }
}

/// Shared handle to a token; tokens are immutable once created.
pub type TokenRef = Arc<dyn AuthorizationToken>;

/// Token as serialized by the token service:
/// `{"Token": "...", "Expires": "2021-06-01T12:00:00Z"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct BearerToken {
    #[serde(rename = "Token")]
    pub body: String,
    #[serde(rename = "Expires")]
    pub expiration_time: DateTime<Utc>,
}

impl BearerToken {
    pub fn new(body: String, expiration_time: DateTime<Utc>) -> Self {
        Self { body, expiration_time }
    }
}

impl AuthorizationToken for BearerToken {
    fn body(&self) -> &str {
        &self.body
    }

    fn expiration_time(&self) -> DateTime<Utc> {
        self.expiration_time
    }
}
