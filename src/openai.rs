//! OpenAI client configuration with sensible defaults.

use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client with a request timeout.
///
/// Without an explicit key the client reads `OPENAI_API_KEY` itself.
pub fn create_client_with_timeout(
    api_key: Option<&str>,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let config = match api_key {
        Some(key) => OpenAIConfig::default().with_api_key(key),
        None => OpenAIConfig::default(),
    };

    Ok(Client::with_config(config).with_http_client(http_client))
}
