use crate::view::ChatView;
use domain::chatbot::{ChatbotApi, ChatbotError};
use domain::models::{ChatbotRequest, ChatbotResponse};
use domain::session::{SessionId, SessionManager, SessionStore};
use domain::timestamp::{Clock, SystemClock, TimestampTracker};
use domain::transcript::{MessageContent, RequestId, Role, Transcript};
use shared::telemetry::Telemetry;
use shared::types::Result;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub const FALLBACK_TEXT: &str = "Oops, something went wrong. Please try again.";
pub const DEFAULT_GREETING: &str = "Hi there, I'm your personal Concierge. How can I help?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetOptions {
    /// Shown by `greet`. Blank disables the greeting.
    pub greeting: String,
    /// Requests allowed between send and render. Values below 1 count as 1.
    pub max_in_flight: usize,
    /// Treat replies as sanitized markup instead of plain text.
    pub rich_responses: bool,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            max_in_flight: 1,
            rich_responses: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: RequestId,
    pub request: ChatbotRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// Too many requests outstanding; nothing happened.
    Busy,
    /// Bubbles appended; the request must be sent and passed to `complete`.
    Sent(PendingRequest),
}

enum Slot {
    Waiting,
    /// Texts to render. Empty means the fallback bubble.
    Settled(Vec<String>),
}

/// A chat session's transcript plus the logic that feeds it.
///
/// Every request gets its own loading bubble. Replies are released in send
/// order even when calls complete out of order.
pub struct ChatWidget<A, S, V> {
    api: A,
    session: SessionManager<S>,
    view: V,
    clock: Box<dyn Clock>,
    transcript: Transcript,
    tracker: TimestampTracker,
    in_flight: BTreeMap<RequestId, Slot>,
    next_request: u64,
    options: WidgetOptions,
}

impl<A, S, V> ChatWidget<A, S, V>
where
    A: ChatbotApi,
    S: SessionStore,
    V: ChatView,
{
    pub fn new(api: A, session: SessionManager<S>, view: V) -> Self {
        Self::with_clock(api, session, view, Box::new(SystemClock))
    }

    pub fn with_clock(
        api: A,
        session: SessionManager<S>,
        view: V,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            api,
            session,
            view,
            clock,
            transcript: Transcript::new(),
            tracker: TimestampTracker::new(),
            in_flight: BTreeMap::new(),
            next_request: 0,
            options: WidgetOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WidgetOptions) -> Self {
        self.options = options;
        self
    }

    /// Render the greeting as a concierge bubble.
    pub fn greet(&mut self) {
        let greeting = self.options.greeting.trim().to_string();
        if greeting.is_empty() {
            return;
        }
        self.append_response(MessageContent::text(greeting));
        self.view.content_changed(&self.transcript);
    }

    /// Append the user's bubble and a loading bubble, and build the request.
    pub fn insert_message(&mut self, raw: &str) -> Result<SubmitOutcome> {
        let text = raw.trim();
        if text.is_empty() {
            debug!("ignoring blank input");
            return Ok(SubmitOutcome::Ignored);
        }
        if self.in_flight.len() >= self.options.max_in_flight.max(1) {
            debug!(in_flight = self.in_flight.len(), "submission refused while busy");
            return Ok(SubmitOutcome::Busy);
        }

        let session_id = self.session.session_id()?;
        self.next_request += 1;
        let id = RequestId(self.next_request);

        self.append(Role::Personal, MessageContent::text(text), None);
        self.stamp();
        self.append(Role::Loading, MessageContent::text(""), Some(id));
        self.view.content_changed(&self.transcript);
        self.in_flight.insert(id, Slot::Waiting);

        debug!(request_id = id.0, session_id = %session_id, "message queued");
        Ok(SubmitOutcome::Sent(PendingRequest {
            id,
            request: ChatbotRequest::new(session_id, text),
        }))
    }

    /// Apply the result of a finished call. Returns the number of bubbles
    /// rendered, which is zero while an earlier request is still waiting.
    ///
    /// Failures are logged only after the view has been updated.
    pub fn complete(
        &mut self,
        id: RequestId,
        result: std::result::Result<ChatbotResponse, ChatbotError>,
    ) -> usize {
        match self.in_flight.get_mut(&id) {
            Some(slot) if matches!(slot, Slot::Waiting) => {
                let texts = match &result {
                    Ok(response) => response.texts().into_iter().map(str::to_owned).collect(),
                    Err(_) => Vec::new(),
                };
                *slot = Slot::Settled(texts);
            }
            Some(_) => {
                warn!(request_id = id.0, "duplicate completion ignored");
                return 0;
            }
            None => {
                warn!(request_id = id.0, "completion for unknown request ignored");
                return 0;
            }
        }
        let released = self.release_settled();

        match &result {
            Ok(response) if response.texts().is_empty() => warn!(
                request_id = id.0,
                messages = response.messages.len(),
                "chatbot returned no usable messages"
            ),
            Err(err) => warn!(request_id = id.0, error = %err, "chatbot call failed"),
            Ok(_) => {}
        }
        released
    }

    /// `insert_message`, the API call, then `complete`. API failures end up
    /// as a fallback bubble and never surface here.
    pub async fn submit(&mut self, raw: &str) -> Result<SubmitOutcome> {
        let outcome = self.insert_message(raw)?;
        if let SubmitOutcome::Sent(pending) = &outcome {
            let telemetry = Telemetry::new();
            let result = self.api.send(&pending.request).await;
            let elapsed_ms = telemetry.elapsed_ms() as u64;
            let ok = result.is_ok();
            let rendered = self.complete(pending.id, result);
            info!(
                request_id = pending.id.0,
                elapsed_ms,
                ok,
                rendered,
                "chatbot round trip"
            );
        }
        Ok(outcome)
    }

    /// Switch to a new session id and drop the transcript. Outstanding
    /// requests are forgotten; their completions will be ignored. On a
    /// storage error nothing changes.
    pub fn start_new_session(&mut self) -> Result<()> {
        let session_id = self.session.reset()?;
        debug!(session_id = %session_id, "new session started");
        if !self.in_flight.is_empty() {
            warn!(dropped = self.in_flight.len(), "discarding outstanding requests");
        }
        self.in_flight.clear();
        self.transcript.clear();
        self.tracker.reset();
        self.view.content_changed(&self.transcript);
        Ok(())
    }

    pub fn session_id(&mut self) -> Result<SessionId> {
        self.session.session_id()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn options(&self) -> &WidgetOptions {
        &self.options
    }

    fn release_settled(&mut self) -> usize {
        let mut released = 0;
        while let Some(entry) = self.in_flight.first_entry() {
            if matches!(entry.get(), Slot::Waiting) {
                break;
            }
            let (id, slot) = entry.remove_entry();
            if let Slot::Settled(texts) = slot {
                released += self.render_settled(id, texts);
            }
        }
        if released > 0 {
            self.view.content_changed(&self.transcript);
        }
        released
    }

    fn render_settled(&mut self, id: RequestId, texts: Vec<String>) -> usize {
        if let Some(loading) = self.transcript.remove_loading(id) {
            self.view.bubble_removed(&loading);
        }
        if texts.is_empty() {
            self.append_response(MessageContent::text(FALLBACK_TEXT));
            return 1;
        }
        let count = texts.len();
        for text in texts {
            let content = if self.options.rich_responses {
                MessageContent::markup(text)
            } else {
                MessageContent::text(text)
            };
            self.append_response(content);
        }
        count
    }

    fn append_response(&mut self, content: MessageContent) {
        self.append(Role::Response, content, None);
        self.stamp();
    }

    fn append(&mut self, role: Role, content: MessageContent, request: Option<RequestId>) {
        let bubble = self.transcript.push(role, content, request);
        self.view.bubble_appended(bubble);
    }

    fn stamp(&mut self) {
        let now = self.clock.now();
        if let Some(label) = self.tracker.stamp(now) {
            if let Some(bubble) = self.transcript.attach_timestamp_to_last(label) {
                self.view.timestamp_attached(bubble);
            }
        }
    }
}
