use application::chat_widget::{ChatWidget, FALLBACK_TEXT};
use domain::session::SessionManager;
use domain::transcript::Role;
use infrastructure::config::Config;
use presentation::cli::{apply_command, ChatCommand, CommandOutcome, SessionBackend};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tests::{FlakyStore, ManualClock, RecordingView, ScriptedChatbot};

fn message(text: &str) -> ChatCommand {
    ChatCommand::Message(text.to_string())
}

#[tokio::test]
async fn storage_failure_mid_chat_does_not_end_the_chat() {
    let store = FlakyStore::new();
    let switch = store.switch();
    let mut widget = ChatWidget::with_clock(
        ScriptedChatbot::new()
            .reply_texts(&["Which cuisine?"])
            .reply_texts(&["Noted."]),
        SessionManager::new(store),
        RecordingView::default(),
        Box::new(ManualClock::at(12, 0, 0)),
    );

    assert_eq!(apply_command(&mut widget, message("dinner")).await, CommandOutcome::Continue);
    switch.store(true, Ordering::SeqCst);
    assert_eq!(apply_command(&mut widget, message("italian")).await, CommandOutcome::Continue);

    let requests = widget.api().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].session_id, requests[1].session_id);

    match apply_command(&mut widget, ChatCommand::NewSession).await {
        CommandOutcome::Failed(text) => assert!(text.contains("session storage unavailable"), "{}", text),
        other => panic!("expected a reported failure, got {:?}", other),
    }
    assert_eq!(widget.transcript().count_role(Role::Response), 2);
    assert_eq!(widget.session_id().unwrap(), requests[0].session_id);
}

#[tokio::test]
async fn corrupted_session_file_mid_chat_keeps_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let config = Config {
        session_file: Some(path.clone()),
        ..Config::default()
    };
    let mut widget = ChatWidget::with_clock(
        ScriptedChatbot::new().reply_texts(&["one"]).reply_texts(&["two"]),
        SessionManager::new(SessionBackend::from_config(&config)),
        RecordingView::default(),
        Box::new(ManualClock::at(12, 0, 0)),
    );

    assert_eq!(apply_command(&mut widget, message("first")).await, CommandOutcome::Continue);
    std::fs::write(&path, "{1: ").unwrap();
    assert_eq!(apply_command(&mut widget, message("second")).await, CommandOutcome::Continue);

    let requests = widget.api().requests();
    assert_eq!(requests[0].session_id, requests[1].session_id);
    assert_eq!(widget.transcript().last().unwrap().content.as_str(), "two");
}

#[tokio::test]
async fn failed_reply_is_not_a_command_failure() {
    let mut widget = ChatWidget::with_clock(
        ScriptedChatbot::new(),
        SessionManager::new(FlakyStore::new()),
        RecordingView::default(),
        Box::new(ManualClock::at(12, 0, 0)),
    );
    assert_eq!(apply_command(&mut widget, message("hello")).await, CommandOutcome::Continue);
    assert_eq!(widget.transcript().last().unwrap().content.as_str(), FALLBACK_TEXT);
}

#[tokio::test]
async fn save_reports_success_and_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut widget = ChatWidget::with_clock(
        ScriptedChatbot::new(),
        SessionManager::new(FlakyStore::new()),
        RecordingView::default(),
        Box::new(ManualClock::at(12, 0, 0)),
    );
    widget.greet();

    let target = dir.path().join("chat.html");
    match apply_command(&mut widget, ChatCommand::Save(target.clone())).await {
        CommandOutcome::Notice(text) => assert!(text.starts_with("Saved to")),
        other => panic!("unexpected {:?}", other),
    }
    assert!(target.exists());

    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let nested: PathBuf = blocker.join("chat.html");
    match apply_command(&mut widget, ChatCommand::Save(nested)).await {
        CommandOutcome::Failed(text) => assert!(text.starts_with("Could not save")),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn exit_and_usage() {
    let mut widget = ChatWidget::with_clock(
        ScriptedChatbot::new(),
        SessionManager::new(FlakyStore::new()),
        RecordingView::default(),
        Box::new(ManualClock::at(12, 0, 0)),
    );
    assert_eq!(apply_command(&mut widget, ChatCommand::Exit).await, CommandOutcome::Exit);
    assert!(matches!(
        apply_command(&mut widget, ChatCommand::parse("/save")).await,
        CommandOutcome::Hint(_)
    ));
    assert!(widget.transcript().is_empty());
}
