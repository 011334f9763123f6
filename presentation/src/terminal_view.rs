use crate::html::markup_to_plain;
use application::view::ChatView;
use colored::Colorize;
use domain::transcript::{Bubble, MessageContent, Role, Transcript};
use shared::status_line::StatusLine;
use shared::utils::strip_control_chars;
use std::io::{self, IsTerminal, Stdout, Write};
use tracing::warn;

const PERSONAL_LABEL: &str = "you";
const RESPONSE_LABEL: &str = "concierge";
const INDENT: &str = "    ";

/// Line-oriented chat rendering.
///
/// On a real terminal the loading indicator is the shared `StatusLine`, so
/// log output routed through the same status line never displaces it.
pub struct TerminalView<W: Write> {
    out: W,
    interactive: bool,
    status: StatusLine,
    loading: usize,
}

impl TerminalView<Stdout> {
    pub fn stdout(status: StatusLine) -> Self {
        let out = io::stdout();
        let interactive = out.is_terminal();
        Self::new(out, interactive, status)
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, interactive: bool, status: StatusLine) -> Self {
        Self {
            out,
            interactive,
            status,
            loading: 0,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn body(content: &MessageContent) -> String {
        let plain = match content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Markup(markup) => markup_to_plain(markup),
        };
        strip_control_chars(&plain).replace('\n', &format!("\n{}", INDENT))
    }

    fn print_line(&mut self, line: String) -> io::Result<()> {
        self.status
            .suspend(&mut self.out, |out| writeln!(out, "{}", line))
    }

    fn write_bubble(&mut self, bubble: &Bubble) -> io::Result<()> {
        let label = match bubble.role {
            Role::Personal => format!("{} ›", PERSONAL_LABEL).cyan().bold(),
            Role::Response => format!("{} ›", RESPONSE_LABEL).green().bold(),
            Role::Loading => {
                if !self.interactive {
                    return Ok(());
                }
                self.loading += 1;
                let text = format!("{} › …", RESPONSE_LABEL).dimmed().to_string();
                return self.status.show(&mut self.out, &text);
            }
        };
        self.print_line(format!("{} {}", label, Self::body(&bubble.content)))
    }

    fn erase_loading(&mut self) -> io::Result<()> {
        self.loading = self.loading.saturating_sub(1);
        if self.loading == 0 {
            self.status.hide(&mut self.out)?;
        }
        Ok(())
    }

    fn write_timestamp(&mut self, bubble: &Bubble) -> io::Result<()> {
        let Some(label) = &bubble.timestamp else {
            return Ok(());
        };
        self.print_line(format!("{}{}", INDENT, label.dimmed()))
    }

    fn report(result: io::Result<()>) {
        if let Err(err) = result {
            warn!(error = %err, "failed to write to terminal");
        }
    }
}

impl<W: Write> ChatView for TerminalView<W> {
    fn bubble_appended(&mut self, bubble: &Bubble) {
        let result = self.write_bubble(bubble);
        Self::report(result);
    }

    fn bubble_removed(&mut self, bubble: &Bubble) {
        if bubble.is_loading() && self.interactive {
            let result = self.erase_loading();
            Self::report(result);
        }
    }

    fn timestamp_attached(&mut self, bubble: &Bubble) {
        let result = self.write_timestamp(bubble);
        Self::report(result);
    }

    fn content_changed(&mut self, transcript: &Transcript) {
        if transcript.is_empty() {
            self.loading = 0;
            let result = self
                .status
                .hide(&mut self.out)
                .and_then(|_| writeln!(self.out, "{}", "── new session ──".dimmed()));
            Self::report(result);
        }
        Self::report(self.out.flush());
    }
}
