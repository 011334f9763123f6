use crate::config::Config;
use anyhow::Context;
use domain::chatbot::{ChatbotApi, ChatbotError};
use domain::models::{ChatbotRequest, ChatbotResponse};
use reqwest::Client;
use shared::types::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct HttpChatbotClient {
    client: Arc<Client>,
    api_url: String,
    api_key: Option<String>,
}

impl HttpChatbotClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_url = config
            .api_url
            .clone()
            .context("no chatbot API URL configured (set CHATBOT_API_URL or pass --api-url)")?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client: Arc::new(client),
            api_url,
            api_key: config.api_key.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl ChatbotApi for HttpChatbotClient {
    async fn send(
        &self,
        request: &ChatbotRequest,
    ) -> std::result::Result<ChatbotResponse, ChatbotError> {
        let mut builder = self.client.post(&self.api_url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ChatbotError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ChatbotError::Transport(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = text.len(), "chatbot replied");

        if !status.is_success() {
            return Err(ChatbotError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|e| ChatbotError::Decode(e.to_string()))
    }
}
