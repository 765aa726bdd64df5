//! # Authorization Token Cache Library
//!
//! Provides a single-flight cache of expiring authorization tokens,
//! an HTTP client for fetching tokens from a token service,
//! and an authorizer that attaches bearer tokens to outbound requests.
//!
//! Modules:
//! - `cache` — token trait, expiring store and single-flight cache
//! - `client` — token service client and outbound request authorizer
//! - `config` — authorization settings and YAML loader
//! - `utils` — logging setup

pub mod cache;
pub mod client;
pub mod config;
pub mod utils;


pub use crate::cache::token::{AuthorizationToken, BearerToken, TokenRef};
pub use crate::cache::token_cache::AuthorizationTokenCache;
pub use crate::client::authorizer::RequestAuthorizer;
pub use crate::client::token_service::TokenServiceClient;
pub use crate::config::settings::AuthorizationSettings;
