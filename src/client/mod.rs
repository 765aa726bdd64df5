pub mod authorizer;
pub mod token_service;
