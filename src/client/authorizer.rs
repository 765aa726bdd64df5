use anyhow::{anyhow, Result};
use http::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use tracing::debug;

use crate::cache::token::TokenRef;
use crate::cache::token_cache::AuthorizationTokenCache;
use crate::client::token_service::TokenServiceClient;

/// Attaches bearer tokens to outbound requests.
///
/// The caller derives the `key` from its own request context (e.g. which
/// downstream identity the call authenticates as); this type only resolves
/// the key to a token through the cache, fetching from the token service when
/// no live token is cached. A failed fetch aborts the request attempt with
/// the underlying error; there is no fallback to a stale token.
#[derive(Debug, Clone)]
pub struct RequestAuthorizer {
    cache: AuthorizationTokenCache,
    client: TokenServiceClient,
}

impl RequestAuthorizer {
    pub fn new(cache: AuthorizationTokenCache, client: TokenServiceClient) -> Self {
        Self { cache, client }
    }

    /// Resolve `key` to a live token, fetching one if necessary.
    pub async fn token_for(&self, key: &str) -> Result<TokenRef> {
        let client = self.client.clone();
        self.cache
            .get_or_add(key, move || async move { client.fetch_token().await })
            .await?
            .ok_or_else(|| anyhow!("no live authorization token available for key '{key}'"))
    }

    /// Add an `Authorization: Bearer <token>` header to `request`.
    pub async fn authorize(&self, key: &str, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token_for(key).await?;
        debug!(key = %key, "authorizing outbound request");
        Ok(request.header(AUTHORIZATION, format!("Bearer {}", token.body())))
    }
}
