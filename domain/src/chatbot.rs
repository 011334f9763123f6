use crate::models::{ChatbotRequest, ChatbotResponse};
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatbotError {
    #[error("chatbot request failed: {0}")]
    Transport(String),

    #[error("chatbot API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode chatbot response: {0}")]
    Decode(String),
}

/// The remote chatbot. One call per user message; no retries.
pub trait ChatbotApi {
    fn send(
        &self,
        request: &ChatbotRequest,
    ) -> impl Future<Output = Result<ChatbotResponse, ChatbotError>> + Send;
}
