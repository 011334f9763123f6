use rand::Rng;
use serde::{Deserialize, Serialize};
use shared::types::Result;
use std::collections::HashMap;
use std::fmt;

/// Storage key holding the session token.
pub const SESSION_KEY: &str = "sessionId";
pub const SESSION_PREFIX: &str = "sess_";
pub const TOKEN_LEN: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for `sess_` followed by exactly nine lowercase base-36 characters.
    pub fn is_well_formed(&self) -> bool {
        match self.0.strip_prefix(SESSION_PREFIX) {
            Some(token) => {
                token.len() == TOKEN_LEN
                    && token
                        .chars()
                        .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
            }
            None => false,
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session-scoped key/value storage. One store corresponds to one chat session.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Process-lifetime store; the terminal equivalent of one browser tab.
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    entries: HashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Source of the random part of a session id.
pub trait TokenSource: Send {
    fn token(&mut self, len: usize) -> String;
}

/// Base-36 tokens from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokenSource;

impl TokenSource for RandomTokenSource {
    fn token(&mut self, len: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..len)
            .filter_map(|_| std::char::from_digit(rng.gen_range(0..36), 36))
            .collect()
    }
}

/// Hands out the session id, generating and storing it on first use.
///
/// The id is read from the store once and then cached, so storage is only
/// touched again by `reset`.
pub struct SessionManager<S> {
    store: S,
    tokens: Box<dyn TokenSource>,
    current: Option<SessionId>,
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        Self::with_tokens(store, Box::new(RandomTokenSource))
    }

    pub fn with_tokens(store: S, tokens: Box<dyn TokenSource>) -> Self {
        Self {
            store,
            tokens,
            current: None,
        }
    }

    pub fn session_id(&mut self) -> Result<SessionId> {
        if let Some(current) = &self.current {
            return Ok(current.clone());
        }
        let id = match self.store.get(SESSION_KEY)? {
            Some(existing) if !existing.is_empty() => SessionId::new(existing),
            _ => self.issue()?,
        };
        self.current = Some(id.clone());
        Ok(id)
    }

    /// Replace the current id with a freshly generated one. The cached id is
    /// kept if the store fails.
    pub fn reset(&mut self) -> Result<SessionId> {
        self.store.remove(SESSION_KEY)?;
        let id = self.issue()?;
        self.current = Some(id.clone());
        Ok(id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn issue(&mut self) -> Result<SessionId> {
        let fresh = format!("{}{}", SESSION_PREFIX, self.tokens.token(TOKEN_LEN));
        self.store.set(SESSION_KEY, &fresh)?;
        Ok(SessionId::new(fresh))
    }
}
