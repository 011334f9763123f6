//! Test doubles shared by the integration tests.

use application::view::ChatView;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use domain::chatbot::{ChatbotApi, ChatbotError};
use domain::models::{ChatbotRequest, ChatbotResponse};
use domain::session::{MemorySessionStore, SessionStore};
use domain::timestamp::Clock;
use domain::transcript::{Bubble, Role, Transcript};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Chatbot that replays queued results and records every request.
#[derive(Default)]
pub struct ScriptedChatbot {
    replies: Mutex<VecDeque<Result<ChatbotResponse, ChatbotError>>>,
    requests: Mutex<Vec<ChatbotRequest>>,
}

impl ScriptedChatbot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, result: Result<ChatbotResponse, ChatbotError>) -> Self {
        self.replies.lock().unwrap().push_back(result);
        self
    }

    pub fn reply_texts(self, texts: &[&str]) -> Self {
        self.reply(Ok(ChatbotResponse::with_texts(texts.iter().copied())))
    }

    pub fn requests(&self) -> Vec<ChatbotRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ChatbotApi for ScriptedChatbot {
    async fn send(&self, request: &ChatbotRequest) -> Result<ChatbotResponse, ChatbotError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatbotError::Transport("no scripted reply".into())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Appended(Role, String),
    Removed(Role),
    Timestamp(String),
    Changed(usize),
}

/// View that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
}

impl RecordingView {
    pub fn appended(&self) -> Vec<(Role, String)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Appended(role, text) => Some((*role, text.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn timestamps(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Timestamp(label) => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl ChatView for RecordingView {
    fn bubble_appended(&mut self, bubble: &Bubble) {
        self.events.push(ViewEvent::Appended(
            bubble.role,
            bubble.content.as_str().to_string(),
        ));
    }

    fn bubble_removed(&mut self, bubble: &Bubble) {
        self.events.push(ViewEvent::Removed(bubble.role));
    }

    fn timestamp_attached(&mut self, bubble: &Bubble) {
        if let Some(label) = &bubble.timestamp {
            self.events.push(ViewEvent::Timestamp(label.clone()));
        }
    }

    fn content_changed(&mut self, transcript: &Transcript) {
        self.events.push(ViewEvent::Changed(transcript.len()));
    }
}

/// Clock the test moves by hand. Clones share the same time.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    pub fn at(hour: u32, minute: u32, second: u32) -> Self {
        let start = NaiveDate::from_ymd_opt(2025, 2, 14)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .expect("valid time");
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}

/// Session store that starts failing once its switch is flipped.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemorySessionStore,
    failing: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.failing)
    }

    fn check(&self) -> shared::types::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("session storage unavailable");
        }
        Ok(())
    }
}

impl SessionStore for FlakyStore {
    fn get(&self, key: &str) -> shared::types::Result<Option<String>> {
        self.check()?;
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> shared::types::Result<()> {
        self.check()?;
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> shared::types::Result<()> {
        self.check()?;
        self.inner.remove(key)
    }
}
