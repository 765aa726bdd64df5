use anyhow::{anyhow, bail, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::store::TokenStore;
use crate::cache::token::TokenRef;

/// Single-flight cache of expiring authorization tokens.
///
/// Concurrent `get_or_add` calls for the same uncached key result in exactly
/// one factory invocation; all callers converge on the inserted token. The
/// factory path is guarded by one coarse lock over the whole cache, not a
/// per-key lock: token acquisition is infrequent relative to request volume
/// and the lock only wraps the presence check, the factory call and the
/// insert. Callers that find a live entry never touch the lock at all.
///
/// Cloning is cheap and clones share the same underlying store and lock.
/// Instances are expected to live for the process lifetime, owned by whatever
/// composes the outbound request pipeline.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationTokenCache {
    store: TokenStore,
    fetch_lock: Arc<Mutex<()>>,
}

impl AuthorizationTokenCache {
    pub fn new() -> Self {
        Self { store: TokenStore::new(), fetch_lock: Arc::new(Mutex::new(())) }
    }

    /// Get the token for `key`, or insert one produced by `token_factory`.
    ///
    /// A live entry is returned as-is without invoking the factory. Otherwise
    /// the factory path runs under the cache-wide lock; if another caller
    /// inserted first while this one waited on the lock, the factory is not
    /// invoked and the entry now present is re-read and returned instead.
    /// That re-read may come back `None` when the winning insert stored an
    /// already-expired token; this is accepted, not retried.
    ///
    /// Factory errors propagate verbatim; the cache never retries.
    pub async fn get_or_add<F, Fut>(&self, key: &str, token_factory: F) -> Result<Option<TokenRef>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenRef>>,
    {
        ensure_key(key)?;
        if let Some(token) = self.store.get(key).await {
            debug!(key = %key, "authorization token cache hit");
            return Ok(Some(token));
        }
        match self.add_internal(key, token_factory).await? {
            Some(token) => Ok(Some(token)),
            // another caller inserted first; return whatever is now live
            None => Ok(self.store.get(key).await),
        }
    }

    /// Insert `token` under `key` unless a live entry already exists.
    ///
    /// Returns true iff the insert took place. Insertion never validates the
    /// token's expiration: an already-expired token is stored and true is
    /// returned, though no read will ever surface it.
    pub async fn add(&self, key: &str, token: TokenRef) -> Result<bool> {
        ensure_key(key)?;
        Ok(self.store.try_insert(key, token).await)
    }

    /// Get the live token for `key`, if any. Never returns an expired token.
    pub async fn get(&self, key: &str) -> Result<Option<TokenRef>> {
        ensure_key(key)?;
        Ok(self.store.get(key).await)
    }

    /// Lookup with an explicit found flag: `(Some(token), true)` for a live
    /// entry, `(None, false)` otherwise.
    pub async fn try_get(&self, key: &str) -> Result<(Option<TokenRef>, bool)> {
        ensure_key(key)?;
        let token = self.store.get(key).await;
        let found = token.is_some();
        Ok((token, found))
    }

    /// True iff a live (non-expired) entry exists for `key`.
    pub async fn contains(&self, key: &str) -> Result<bool> {
        ensure_key(key)?;
        Ok(self.store.contains(key).await)
    }

    /// Factory path: test-and-insert for `key` under the cache-wide lock.
    ///
    /// Returns `Ok(None)` without invoking the factory when the key is
    /// already present, i.e. a racer holding the lock before us inserted it.
    /// An insert failure after the factory ran means some write bypassed the
    /// lock and is reported as a concurrency error, never ignored.
    pub(crate) async fn add_internal<F, Fut>(
        &self,
        key: &str,
        token_factory: F,
    ) -> Result<Option<TokenRef>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenRef>>,
    {
        let _guard = self.fetch_lock.lock().await;
        if self.store.contains(key).await {
            debug!(key = %key, "authorization token already cached, factory skipped");
            return Ok(None);
        }
        let token = token_factory().await?;
        debug!(key = %key, expires = %token.expiration_time(), "caching authorization token");
        if !self.store.try_insert(key, Arc::clone(&token)).await {
            bail!(
                "authorization token cache has a concurrency issue because it should not contain an entry for key '{key}'"
            );
        }
        Ok(Some(token))
    }

    #[cfg(test)]
    pub(crate) fn store_handle(&self) -> TokenStore {
        self.store.clone()
    }

    #[cfg(test)]
    pub(crate) fn fetch_lock(&self) -> Arc<Mutex<()>> {
        Arc::clone(&self.fetch_lock)
    }
}

fn ensure_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(anyhow!("authorization token key must not be empty"));
    }
    Ok(())
}
