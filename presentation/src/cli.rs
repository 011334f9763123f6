use crate::html;
use crate::terminal_view::TerminalView;
use anyhow::Context;
use application::chat_widget::{ChatWidget, SubmitOutcome, WidgetOptions, DEFAULT_GREETING};
use application::view::ChatView;
use clap::{ArgAction, Parser};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input};
use domain::chatbot::ChatbotApi;
use domain::session::{MemorySessionStore, SessionManager, SessionStore};
use domain::transcript::Transcript;
use infrastructure::chatbot_client::HttpChatbotClient;
use infrastructure::config::Config;
use infrastructure::session_store::FileSessionStore;
use shared::confirmation::ask_confirmation;
use shared::status_line::StatusLine;
use shared::types::Result;
use std::io::Stdout;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const TRANSCRIPT_TITLE: &str = "Concierge chat";

/// Terminal client for the concierge chatbot.
#[derive(Parser, Debug)]
#[command(name = "concierge")]
#[command(about = "Chat with the concierge chatbot from your terminal", long_about = None)]
pub struct Cli {
    /// Chatbot API endpoint (overrides CHATBOT_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// API key sent as x-api-key (overrides CHATBOT_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Keep the session id in this JSON file across runs
    #[arg(long)]
    pub session_file: Option<PathBuf>,

    /// Forget any stored session id before starting
    #[arg(long, action = ArgAction::SetTrue)]
    pub new_session: bool,

    /// Write the transcript as HTML to this file on exit
    #[arg(long)]
    pub transcript: Option<PathBuf>,

    /// Treat replies as simple markup (<b>, <i>, <br>, ...)
    #[arg(long, action = ArgAction::SetTrue)]
    pub rich: bool,

    /// Disable colored output
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_color: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Send this message once and exit instead of starting a chat
    #[arg(trailing_var_arg = true)]
    pub message: Vec<String>,
}

impl Cli {
    /// Command-line values win over the environment.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api_url = Some(url.clone());
        }
        if let Some(key) = &self.api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        if let Some(path) = &self.session_file {
            config.session_file = Some(path.clone());
        }
        if self.rich {
            config.rich_responses = true;
        }
    }
}

/// Where the session id lives: process memory, or a file when requested.
pub enum SessionBackend {
    Memory(MemorySessionStore),
    File(FileSessionStore),
}

impl SessionBackend {
    pub fn from_config(config: &Config) -> Self {
        match &config.session_file {
            Some(path) => Self::File(FileSessionStore::new(path)),
            None => Self::Memory(MemorySessionStore::new()),
        }
    }
}

impl SessionStore for SessionBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            Self::Memory(store) => store.get(key),
            Self::File(store) => store.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match self {
            Self::Memory(store) => store.set(key, value),
            Self::File(store) => store.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match self {
            Self::Memory(store) => store.remove(key),
            Self::File(store) => store.remove(key),
        }
    }
}

/// Lines typed at the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Exit,
    NewSession,
    Save(PathBuf),
    Usage(&'static str),
    Message(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let (head, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (trimmed, ""),
        };
        match head {
            "/exit" | "/quit" => Self::Exit,
            "/new" => Self::NewSession,
            "/save" if rest.is_empty() => Self::Usage("usage: /save <file.html>"),
            "/save" => Self::Save(PathBuf::from(rest)),
            _ => Self::Message(line.to_string()),
        }
    }
}

type TerminalWidget = ChatWidget<HttpChatbotClient, SessionBackend, TerminalView<Stdout>>;

/// What a chat line led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Exit,
    Notice(String),
    Hint(&'static str),
    /// Reported to the user; the chat goes on.
    Failed(String),
}

fn failed(what: &str, err: anyhow::Error) -> CommandOutcome {
    warn!(error = %format!("{:#}", err), "{}", what);
    CommandOutcome::Failed(format!("{}: {:#}", what, err))
}

/// Apply one chat line to the widget. Session storage, export and send
/// errors come back as `CommandOutcome::Failed`.
pub async fn apply_command<A, S, V>(
    widget: &mut ChatWidget<A, S, V>,
    command: ChatCommand,
) -> CommandOutcome
where
    A: ChatbotApi,
    S: SessionStore,
    V: ChatView,
{
    match command {
        ChatCommand::Exit => CommandOutcome::Exit,
        ChatCommand::NewSession => match widget.start_new_session() {
            Ok(()) => {
                widget.greet();
                CommandOutcome::Continue
            }
            Err(err) => failed("Could not start a new session", err),
        },
        ChatCommand::Save(path) => match save_transcript(widget.transcript(), &path) {
            Ok(()) => CommandOutcome::Notice(format!("Saved to {}", path.display())),
            Err(err) => failed("Could not save", err),
        },
        ChatCommand::Usage(text) => CommandOutcome::Hint(text),
        ChatCommand::Message(text) => match widget.submit(&text).await {
            Ok(SubmitOutcome::Busy) => CommandOutcome::Hint("Still waiting for the previous reply."),
            Ok(_) => CommandOutcome::Continue,
            Err(err) => failed("Could not send", err),
        },
    }
}

pub fn save_transcript(transcript: &Transcript, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
    }
    std::fs::write(path, html::render_document(TRANSCRIPT_TITLE, transcript))
        .with_context(|| format!("Failed to write transcript to {:?}", path))?;
    info!(path = %path.display(), bubbles = transcript.len(), "transcript saved");
    Ok(())
}

pub struct CliApp {
    config: Config,
    status: StatusLine,
}

impl CliApp {
    /// `status` must be the status line the log writer was built with.
    pub fn new(config: Config, status: StatusLine) -> Self {
        Self { config, status }
    }

    pub fn widget_options(&self) -> WidgetOptions {
        WidgetOptions {
            greeting: self
                .config
                .greeting
                .clone()
                .unwrap_or_else(|| DEFAULT_GREETING.to_string()),
            rich_responses: self.config.rich_responses,
            ..WidgetOptions::default()
        }
    }

    pub async fn run(&mut self, cli: Cli) -> Result<()> {
        if cli.no_color {
            colored::control::set_override(false);
        }
        cli.apply_to(&mut self.config);

        let client = HttpChatbotClient::new(&self.config)?;
        let mut session = SessionManager::new(SessionBackend::from_config(&self.config));
        let session_id = if cli.new_session {
            session.reset()?
        } else {
            session.session_id()?
        };
        info!(session_id = %session_id, api_url = client.api_url(), "chat client ready");

        let view = TerminalView::stdout(self.status.clone());
        let mut widget = ChatWidget::new(client, session, view).with_options(self.widget_options());

        let message = cli.message.join(" ");
        if message.trim().is_empty() {
            self.handle_chat(&mut widget).await?;
        } else {
            widget.submit(&message).await?;
        }

        if let Some(path) = &cli.transcript {
            save_transcript(widget.transcript(), path)?;
        }
        Ok(())
    }

    async fn handle_chat(&self, widget: &mut TerminalWidget) -> Result<()> {
        println!(
            "{}",
            "Type /exit to quit, /new for a fresh session, /save <file> to export.".dimmed()
        );
        widget.greet();
        loop {
            let input: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Message")
                .allow_empty(true)
                .report(false)
                .interact_text()?;

            let command = ChatCommand::parse(&input);
            if command == ChatCommand::NewSession {
                let prompt = "Start a new session? The transcript will be cleared.";
                if !ask_confirmation(prompt, true)? {
                    continue;
                }
            }
            match apply_command(widget, command).await {
                CommandOutcome::Exit => break,
                CommandOutcome::Continue => {}
                CommandOutcome::Notice(text) => println!("{}", text.green()),
                CommandOutcome::Hint(text) => println!("{}", text.yellow()),
                CommandOutcome::Failed(text) => println!("{}", text.red()),
            }
        }
        Ok(())
    }
}
