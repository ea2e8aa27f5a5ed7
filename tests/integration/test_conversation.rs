//! End-to-end conversation tests for EduBot
//!
//! These tests drive whole lessons from the fixture files, persisting the
//! session between turns the way a host does.

use std::path::PathBuf;

use edubot_dialog::{
    answer_payload, Activity, Config, DialogState, InboundMessage, Lesson, LessonDialog,
    SessionContext,
};

/// Path to the capitals fixture directory.
fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/capitals")
}

fn load_fixture() -> (Config, Lesson) {
    let config =
        Config::load_from_dir(&fixture_path()).expect("Failed to load fixture config");
    let lesson =
        Lesson::load(fixture_path().join(&config.lesson)).expect("Failed to load fixture lesson");
    (config, lesson)
}

/// A session file path unique to one test.
fn session_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("edubot-it-{}-{name}", std::process::id()))
        .join("session.json")
}

fn texts(activities: &[Activity]) -> Vec<&str> {
    activities.iter().filter_map(Activity::as_text).collect()
}

fn question(activity: &Activity) -> Option<&str> {
    match activity {
        Activity::QuestionCard { question, .. } => Some(question),
        _ => None,
    }
}

// ============================================================================
// Fixtures
// ============================================================================

#[test]
fn test_fixture_config_loads() {
    let (config, lesson) = load_fixture();

    assert_eq!(config.continuation_attempts, 3);
    assert!((config.qna_threshold - 75.0).abs() < f64::EPSILON);
    assert_eq!(config.messages.fallback, "I can only help with this lesson.");
    assert_eq!(
        config.messages.lesson_complete,
        "This is the end of the current lesson. Thank you!"
    );
    assert_eq!(
        config.knowledge_bases["default"].knowledge_base_id,
        "capitals-faq"
    );

    assert_eq!(lesson.title, "European Capitals");
    assert_eq!(lesson.topic_count(), 2);
}

#[test]
fn test_missing_lesson_file_is_reported() {
    let err = Lesson::load(fixture_path().join("missing.json")).unwrap_err();
    assert!(err.to_string().contains("missing.json"));
}

// ============================================================================
// Conversations
// ============================================================================

#[test]
fn test_full_lesson_walkthrough() {
    let (config, lesson) = load_fixture();
    let dialog = LessonDialog::new(config.dialog_settings());
    let mut ctx = SessionContext::new(lesson);

    let out = dialog.start(&mut ctx);
    assert_eq!(question(&out[0]), Some("Which city is the capital of France?"));
    assert_eq!(ctx.state, DialogState::AwaitingChoiceAnswer);

    // Choice answers are matched case-insensitively.
    let out = dialog.resume(&mut ctx, &InboundMessage::value(answer_payload("paris")));
    assert_eq!(texts(&out), vec!["That's right, it's Paris!"]);
    assert_eq!(ctx.state, DialogState::AwaitingTypedAnswer);

    let out = dialog.resume(&mut ctx, &InboundMessage::text("Paris"));
    assert_eq!(out[0], Activity::text("Now say it with me: Paris"));
    assert_eq!(
        out[1],
        Activity::Speak {
            text: "Paris".to_string(),
            speak: "Paris".to_string()
        }
    );
    assert!(matches!(
        &out[2],
        Activity::ChoicePrompt { choices, .. } if choices == &["Next topic", "Stay here"]
    ));
    assert!(matches!(
        ctx.state,
        DialogState::AwaitingContinuationChoice { .. }
    ));

    let out = dialog.resume(&mut ctx, &InboundMessage::text("Next topic"));
    assert_eq!(ctx.current_topic_index, 1);
    assert_eq!(question(&out[0]), Some("Which city is the capital of Italy?"));

    dialog.resume(&mut ctx, &InboundMessage::choice("Rome"));
    dialog.resume(&mut ctx, &InboundMessage::text("rome"));
    let out = dialog.resume(&mut ctx, &InboundMessage::text("Next topic"));

    assert_eq!(
        texts(&out),
        vec!["This is the end of the current lesson. Thank you!"]
    );
    assert_eq!(ctx.state, DialogState::Completed);
    assert_eq!(ctx.current_topic_index, 1);

    // Nothing happens once the lesson is over.
    let out = dialog.resume(&mut ctx, &InboundMessage::text("Next topic"));
    assert!(out.is_empty());
}

#[test]
fn test_wrong_answers_restart_the_topic() {
    let (config, lesson) = load_fixture();
    let dialog = LessonDialog::new(config.dialog_settings());
    let mut ctx = SessionContext::new(lesson);
    dialog.start(&mut ctx);

    let out = dialog.resume(&mut ctx, &InboundMessage::choice("Berlin"));
    assert_eq!(texts(&out), vec!["Not quite. Let's try that again."]);
    assert_eq!(question(&out[1]), Some("Which city is the capital of France?"));
    assert_eq!(ctx.state, DialogState::AwaitingChoiceAnswer);

    dialog.resume(&mut ctx, &InboundMessage::choice("Paris"));
    let out = dialog.resume(&mut ctx, &InboundMessage::text("Lyon"));
    assert_eq!(texts(&out), vec!["Not quite. Let's try that again."]);
    assert_eq!(ctx.state, DialogState::AwaitingChoiceAnswer);
    assert_eq!(ctx.current_topic_index, 0);
}

#[test]
fn test_unrecognized_wrap_up_replies_use_configured_attempts() {
    let (config, lesson) = load_fixture();
    let dialog = LessonDialog::new(config.dialog_settings());
    let mut ctx = SessionContext::new(lesson);
    dialog.start(&mut ctx);
    dialog.resume(&mut ctx, &InboundMessage::choice("Paris"));
    dialog.resume(&mut ctx, &InboundMessage::text("Paris"));

    // The fixture allows three unrecognized replies; the third ends the prompt.
    for _ in 0..2 {
        let out = dialog.resume(&mut ctx, &InboundMessage::text("huh?"));
        assert!(matches!(
            &out[0],
            Activity::ChoicePrompt { prompt, .. } if prompt == &config.messages.retry_prompt
        ));
    }

    let out = dialog.resume(&mut ctx, &InboundMessage::text("huh?"));
    assert_eq!(question(&out[0]), Some("Which city is the capital of France?"));
    assert_eq!(ctx.state, DialogState::AwaitingChoiceAnswer);
    assert_eq!(ctx.current_topic_index, 0);
}

#[test]
fn test_stay_on_topic_repeats_pronunciation() {
    let (config, lesson) = load_fixture();
    let dialog = LessonDialog::new(config.dialog_settings());
    let mut ctx = SessionContext::new(lesson);
    dialog.start(&mut ctx);
    dialog.resume(&mut ctx, &InboundMessage::choice("Paris"));
    dialog.resume(&mut ctx, &InboundMessage::text("Paris"));

    let out = dialog.resume(&mut ctx, &InboundMessage::text("Stay here"));
    assert_eq!(out[0], Activity::text("Now say it with me: Paris"));
    assert_eq!(ctx.current_topic_index, 0);
    assert!(ctx.is_waiting());
}

#[test]
fn test_empty_lesson_is_exhausted() {
    let dialog = LessonDialog::default();
    let mut ctx = SessionContext::new(Lesson::new("Nothing yet", Vec::new()));

    let out = dialog.start(&mut ctx);
    assert_eq!(
        texts(&out),
        vec!["There are no more lessons for you right now. Come back later!"]
    );
    assert_eq!(ctx.state, DialogState::Exhausted);
    assert!(ctx.is_terminal());
}

// ============================================================================
// Persistence across turns
// ============================================================================

#[tokio::test]
async fn test_session_survives_save_and_load_between_turns() {
    let (config, lesson) = load_fixture();
    let dialog = LessonDialog::new(config.dialog_settings());
    let path = session_path("resume");

    let mut ctx = SessionContext::new(lesson);
    dialog.start(&mut ctx);
    dialog.resume(&mut ctx, &InboundMessage::choice("Paris"));
    dialog.resume(&mut ctx, &InboundMessage::text("Paris"));
    dialog.resume(&mut ctx, &InboundMessage::text("huh?"));
    ctx.save(&path).await.expect("Failed to save session");

    // A new dialog and a freshly loaded context pick up where we left off,
    // including the wrap-up prompt's used attempt.
    let dialog = LessonDialog::new(config.dialog_settings());
    let mut restored = SessionContext::load(&path)
        .await
        .expect("Failed to load session")
        .expect("Session file should exist");
    assert_eq!(restored, ctx);
    match &restored.state {
        DialogState::AwaitingContinuationChoice { prompt } => {
            assert_eq!(prompt.attempts_remaining, 2);
        }
        other => panic!("unexpected state {other}"),
    }

    let out = dialog.resume(&mut restored, &InboundMessage::text("Next topic"));
    assert_eq!(restored.current_topic_index, 1);
    assert_eq!(question(&out[0]), Some("Which city is the capital of Italy?"));

    let _ = std::fs::remove_dir_all(path.parent().expect("session dir"));
}

#[tokio::test]
async fn test_loading_missing_session_yields_none() {
    let path = session_path("missing");
    let loaded = SessionContext::load(&path).await.expect("load should succeed");
    assert!(loaded.is_none());
}

#[tokio::test]
async fn test_corrupted_session_is_reported() {
    let path = session_path("corrupt");
    std::fs::create_dir_all(path.parent().expect("session dir")).expect("create dir");
    std::fs::write(&path, "{ not json").expect("write file");

    let err = SessionContext::load(&path).await.unwrap_err();
    assert!(err.to_string().contains("session.json"));

    let _ = std::fs::remove_dir_all(path.parent().expect("session dir"));
}
