use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BubbleId(pub u64);

/// Monotonic tag of an outbound chatbot request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Typed by the user.
    Personal,
    /// Written by the concierge.
    Response,
    /// Placeholder while a request is outstanding.
    Loading,
}

/// Bubble body. `Text` is always escaped when rendered; `Markup` is rich
/// content that a renderer must sanitize before emitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageContent {
    Text(String),
    Markup(String),
}

impl MessageContent {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn markup(value: impl Into<String>) -> Self {
        Self::Markup(value.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::Markup(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bubble {
    pub id: BubbleId,
    pub role: Role,
    pub content: MessageContent,
    pub timestamp: Option<String>,
    pub request: Option<RequestId>,
}

impl Bubble {
    pub fn is_loading(&self) -> bool {
        self.role == Role::Loading
    }
}

/// Ordered bubbles of one chat, oldest first.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    bubbles: Vec<Bubble>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        role: Role,
        content: MessageContent,
        request: Option<RequestId>,
    ) -> &Bubble {
        self.next_id += 1;
        self.bubbles.push(Bubble {
            id: BubbleId(self.next_id),
            role,
            content,
            timestamp: None,
            request,
        });
        &self.bubbles[self.bubbles.len() - 1]
    }

    /// Attach `label` to the most recent bubble. `None` when empty.
    pub fn attach_timestamp_to_last(&mut self, label: String) -> Option<&Bubble> {
        let last = self.bubbles.last_mut()?;
        last.timestamp = Some(label);
        Some(last)
    }

    /// Remove the loading bubble belonging to `request`, if still present.
    pub fn remove_loading(&mut self, request: RequestId) -> Option<Bubble> {
        let index = self
            .bubbles
            .iter()
            .position(|b| b.is_loading() && b.request == Some(request))?;
        Some(self.bubbles.remove(index))
    }

    pub fn loading_count(&self) -> usize {
        self.bubbles.iter().filter(|b| b.is_loading()).count()
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.bubbles.iter().filter(|b| b.role == role).count()
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bubble> {
        self.bubbles.iter()
    }

    pub fn last(&self) -> Option<&Bubble> {
        self.bubbles.last()
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    /// Drop every bubble. Ids keep increasing across clears.
    pub fn clear(&mut self) {
        self.bubbles.clear();
    }
}
