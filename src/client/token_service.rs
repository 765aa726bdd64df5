use anyhow::{anyhow, bail, Context, Result};
use http::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::token::{BearerToken, TokenRef};
use crate::config::settings::AuthorizationSettings;

// token issuance is a single round-trip; generous to cover slow issuers
const REQUEST_TIMEOUT: Duration = Duration::from_secs(100);

/// Client for the token-issuing endpoint.
///
/// Performs a GET against the configured URL with the static API key as
/// bearer credential and parses the JSON token payload. Meant to be used as
/// the token factory behind [`AuthorizationTokenCache::get_or_add`].
///
/// [`AuthorizationTokenCache::get_or_add`]: crate::cache::token_cache::AuthorizationTokenCache::get_or_add
#[derive(Debug, Clone)]
pub struct TokenServiceClient {
    client: Client,
    service_url: String,
    api_key: String,
}

impl TokenServiceClient {
    pub fn new(service_url: String, api_key: String, proxy_url: Option<&str>) -> Result<Self> {
        if service_url.is_empty() {
            bail!("token service url must not be empty");
        }
        if api_key.is_empty() {
            bail!("token service api key must not be empty");
        }
        let mut builder = Client::builder().timeout(REQUEST_TIMEOUT);
        if let Some(proxy_url) = proxy_url {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy_url)
                    .with_context(|| format!("invalid proxy url '{proxy_url}'"))?,
            );
        }
        let client = builder.build().context("failed to build HTTP client")?;
        Ok(Self { client, service_url, api_key })
    }

    pub fn from_settings(settings: &AuthorizationSettings) -> Result<Self> {
        let api_key = settings.api_key()?;
        Self::new(settings.token_service_url.clone(), api_key, settings.proxy_url.as_deref())
    }

    /// Fetch a fresh token from the token service.
    ///
    /// Non-2xx responses carry the service's error message when the body is
    /// the usual `{"Message": "..."}` shape, or the raw body text otherwise.
    pub async fn fetch_token(&self) -> Result<TokenRef> {
        debug!(url = %self.service_url, "fetching authorization token");
        let response = self
            .client
            .get(&self.service_url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("token request to '{}' failed", self.service_url))?;

        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await?;
        if !status.is_success() {
            let error = ServiceError::from_body(&body);
            warn!(url = %url, status = %status, "token service returned an error response");
            return Err(anyhow!("failed to get token from '{url}': {status}: {}", error.message));
        }

        let token: BearerToken = serde_json::from_str(&body)
            .with_context(|| format!("token service at '{url}' returned an unparseable token"))?;
        Ok(Arc::new(token))
    }
}

/// Error payload of the token service, `{"Message": "..."}`.
#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(rename = "Message")]
    message: String,
}

impl ServiceError {
    /// Falls back to the raw body when it is not the expected JSON shape.
    fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| Self { message: body.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_parses_message_payload() {
        let error = ServiceError::from_body(r#"{"Message":"invalid api key"}"#);
        assert_eq!(error.message, "invalid api key");
    }

    #[test]
    fn service_error_falls_back_to_raw_body() {
        let error = ServiceError::from_body("gateway timed out");
        assert_eq!(error.message, "gateway timed out");
    }

    #[test]
    fn new_rejects_empty_url_and_api_key() {
        assert!(TokenServiceClient::new("".into(), "key".into(), None).is_err());
        assert!(TokenServiceClient::new("http://localhost/token".into(), "".into(), None).is_err());
    }

    #[test]
    fn new_rejects_malformed_proxy_url() {
        let result =
            TokenServiceClient::new("http://localhost/token".into(), "key".into(), Some("::"));
        assert!(result.is_err());
    }
}
