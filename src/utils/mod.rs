pub mod http_client;
pub mod prompt_builder;
pub mod token_estimator;
