use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub session_file: Option<PathBuf>,
    pub greeting: Option<String>,
    pub rich_responses: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            session_file: None,
            greeting: None,
            rich_responses: false,
        }
    }
}

impl Config {
    /// Read `.env` (if any) and the process environment.
    pub fn load() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            api_url: non_empty("CHATBOT_API_URL"),
            api_key: non_empty("CHATBOT_API_KEY"),
            timeout_secs: parse_or(
                non_empty("CHATBOT_TIMEOUT_SECS"),
                "CHATBOT_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            ),
            session_file: non_empty("CHATBOT_SESSION_FILE").map(PathBuf::from),
            greeting: lookup("CHATBOT_GREETING"),
            rich_responses: parse_or(
                non_empty("CHATBOT_RICH_RESPONSES"),
                "CHATBOT_RICH_RESPONSES",
                false,
            ),
        }
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match raw {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %value, "ignoring unparsable setting");
            default
        }),
        None => default,
    }
}
