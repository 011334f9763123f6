use crate::session::SessionId;
use serde::{Deserialize, Serialize};

/// Type tag of plain-text chatbot messages.
pub const UNSTRUCTURED: &str = "unstructured";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnstructuredText {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub unstructured: UnstructuredText,
}

impl RequestMessage {
    pub fn unstructured(text: impl Into<String>) -> Self {
        Self {
            kind: UNSTRUCTURED.to_string(),
            unstructured: UnstructuredText { text: text.into() },
        }
    }
}

/// Body POSTed to the chatbot API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotRequest {
    pub session_id: SessionId,
    pub messages: Vec<RequestMessage>,
}

impl ChatbotRequest {
    pub fn new(session_id: SessionId, text: impl Into<String>) -> Self {
        Self {
            session_id,
            messages: vec![RequestMessage::unstructured(text)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unstructured: Option<UnstructuredText>,
}

impl ResponseMessage {
    pub fn unstructured(text: impl Into<String>) -> Self {
        Self {
            kind: UNSTRUCTURED.to_string(),
            unstructured: Some(UnstructuredText { text: text.into() }),
        }
    }

    /// Text of an `unstructured` message; `None` for any other kind.
    pub fn text(&self) -> Option<&str> {
        if self.kind != UNSTRUCTURED {
            return None;
        }
        self.unstructured.as_ref().map(|u| u.text.as_str())
    }
}

/// Body returned by the chatbot API. `statusCode` is tolerated and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotResponse {
    #[serde(default)]
    pub messages: Vec<ResponseMessage>,
}

impl ChatbotResponse {
    pub fn with_texts<I, T>(texts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            messages: texts.into_iter().map(ResponseMessage::unstructured).collect(),
        }
    }

    /// Renderable texts in response order.
    pub fn texts(&self) -> Vec<&str> {
        self.messages.iter().filter_map(ResponseMessage::text).collect()
    }
}
