pub mod store;
pub mod token;
pub mod token_cache;
