use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cache::token::TokenRef;

/// Expiring key -> token map backing [`AuthorizationTokenCache`].
///
/// Expiration is logical: entries are kept in the map past their expiration
/// time but no read ever returns one. An expired entry is only physically
/// replaced by a later insert for the same key.
///
/// [`AuthorizationTokenCache`]: crate::cache::token_cache::AuthorizationTokenCache
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<HashMap<String, TokenRef>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Get the token for `key` if it exists and is not expired.
    pub async fn get(&self, key: &str) -> Option<TokenRef> {
        let map = self.inner.read().await;
        map.get(key).filter(|token| !token.is_expired()).cloned()
    }

    /// True iff a live (non-expired) entry exists for `key`.
    pub async fn contains(&self, key: &str) -> bool {
        let map = self.inner.read().await;
        map.get(key).is_some_and(|token| !token.is_expired())
    }

    /// Atomic check-and-insert: stores `token` under `key` unless a live
    /// entry is already present. An expired entry is overwritten. Returns
    /// false iff a live entry blocked the insert.
    pub async fn try_insert(&self, key: &str, token: TokenRef) -> bool {
        let mut map = self.inner.write().await;
        match map.get(key) {
            Some(existing) if !existing.is_expired() => false,
            _ => {
                map.insert(key.to_string(), token);
                true
            }
        }
    }
}
