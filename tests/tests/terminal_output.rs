use application::chat_widget::{ChatWidget, SubmitOutcome, FALLBACK_TEXT};
use domain::chatbot::ChatbotError;
use domain::models::ChatbotResponse;
use domain::session::{MemorySessionStore, SessionManager};
use presentation::terminal_view::TerminalView;
use shared::status_line::StatusLine;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tests::{ManualClock, ScriptedChatbot};

/// Byte sink shared by the view and the log writer, like stdout and stderr
/// on one terminal.
#[derive(Clone, Default)]
struct Screen(Arc<Mutex<Vec<u8>>>);

impl Write for Screen {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Screen {
    /// Replay the output through a minimal terminal and return the visible rows.
    fn rows(&self) -> Vec<String> {
        let raw = String::from_utf8(self.0.lock().unwrap().clone()).unwrap();
        let mut rows: Vec<Vec<char>> = vec![Vec::new()];
        let (mut row, mut col) = (0usize, 0usize);
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            match c {
                '\n' => {
                    row += 1;
                    col = 0;
                    if rows.len() <= row {
                        rows.push(Vec::new());
                    }
                }
                '\r' => col = 0,
                '\u{1b}' => {
                    chars.next();
                    let mut params = String::new();
                    let mut command = ' ';
                    for c in chars.by_ref() {
                        if c.is_ascii_alphabetic() {
                            command = c;
                            break;
                        }
                        params.push(c);
                    }
                    let n: usize = params.parse().unwrap_or(1);
                    match command {
                        'G' => col = n.saturating_sub(1),
                        'K' => rows[row].clear(),
                        'F' => {
                            row = row.saturating_sub(n);
                            col = 0;
                        }
                        _ => {}
                    }
                }
                c => {
                    let line = &mut rows[row];
                    if col < line.len() {
                        line[col] = c;
                    } else {
                        line.resize(col, ' ');
                        line.push(c);
                    }
                    col += 1;
                }
            }
        }
        rows.into_iter()
            .map(|r| r.into_iter().collect::<String>().trim_end().to_string())
            .collect()
    }
}

fn setup() -> (
    Screen,
    impl tracing::Subscriber + Send + Sync,
    ChatWidget<ScriptedChatbot, MemorySessionStore, TerminalView<Screen>>,
) {
    let screen = Screen::default();
    let status = StatusLine::new();
    let log_target = screen.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(status.writer(move || log_target.clone()))
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let widget = ChatWidget::with_clock(
        ScriptedChatbot::new(),
        SessionManager::new(MemorySessionStore::new()),
        TerminalView::new(screen.clone(), true, status),
        Box::new(ManualClock::at(8, 0, 0)),
    );
    (screen, subscriber, widget)
}

fn position(rows: &[String], needle: &str) -> usize {
    rows.iter()
        .position(|r| r.contains(needle))
        .unwrap_or_else(|| panic!("{:?} not on screen: {:#?}", needle, rows))
}

#[test]
fn logs_during_a_failed_call_leave_no_loading_line() {
    let (screen, subscriber, mut widget) = setup();

    tracing::subscriber::with_default(subscriber, || {
        let pending = match widget.insert_message("hi").unwrap() {
            SubmitOutcome::Sent(pending) => pending,
            other => panic!("unexpected {:?}", other),
        };
        tracing::warn!("connection slow, retrying");
        widget.complete(
            pending.id,
            Err(ChatbotError::Transport("connection reset".into())),
        );
    });

    let rows = screen.rows();
    assert!(rows.iter().all(|r| !r.contains('…')), "{:#?}", rows);
    let slow = position(&rows, "connection slow, retrying");
    let fallback = position(&rows, &format!("concierge › {}", FALLBACK_TEXT));
    let failed = position(&rows, "chatbot call failed");
    assert!(position(&rows, "you › hi") < slow);
    assert!(slow < fallback);
    assert!(fallback < failed);
}

#[test]
fn loading_line_stays_last_while_logs_arrive() {
    let (screen, subscriber, mut widget) = setup();

    let pending = tracing::subscriber::with_default(subscriber, || {
        let pending = match widget.insert_message("table for two").unwrap() {
            SubmitOutcome::Sent(pending) => pending,
            other => panic!("unexpected {:?}", other),
        };
        tracing::info!("waiting on the chatbot");
        pending
    });

    let rows = screen.rows();
    assert_eq!(rows.last().map(String::as_str), Some("concierge › …"));
    assert_eq!(rows.iter().filter(|r| r.contains('…')).count(), 1);
    position(&rows, "waiting on the chatbot");

    widget.complete(pending.id, Ok(ChatbotResponse::with_texts(["Booked."])));
    let rows = screen.rows();
    assert!(rows.iter().all(|r| !r.contains('…')), "{:#?}", rows);
    position(&rows, "concierge › Booked.");
}
