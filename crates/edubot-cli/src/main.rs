//! EduBot CLI
//!
//! Main entry point for taking an EduBot lesson in the terminal.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use edubot_dialog::{
    Activity, Config, ConfidenceRouter, DialogState, ExpectedInput, InboundMessage,
    KnowledgeSource, Lesson, LessonDialog, RouteOutcome, SessionContext,
};
use edubot_qna::QnaClient;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Input that ends the session.
const QUIT_COMMAND: &str = "/quit";

/// EduBot - Lesson Tutor
///
/// Walks a student through a lesson's topics, checking answers and
/// practising pronunciation. Free-text questions asked outside a lesson
/// turn are answered from the configured knowledge base.
#[derive(Parser, Debug)]
#[command(name = "edubot")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the lesson JSON file
    #[arg(value_name = "LESSON")]
    lesson: Option<String>,

    /// Path to configuration file (default: edubot.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Path of the session file
    #[arg(short, long, value_name = "FILE")]
    state_file: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,

    /// Resume the saved session instead of starting fresh
    #[arg(long)]
    resume: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Logs go to stderr so they never interleave with the conversation.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("EduBot starting");
    tracing::debug!(config = ?args.config, "Config file");

    match run_session(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Runs one interactive session until the student quits or input ends.
async fn run_session(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(ref lesson) = args.lesson {
        config.lesson.clone_from(lesson);
    }
    if let Some(ref state_file) = args.state_file {
        config.state_file.clone_from(state_file);
    }

    config.validate()?;

    tracing::info!(lesson = %config.lesson, "Loading lesson");
    let lesson = Lesson::load(&config.lesson)?;

    let state_path = PathBuf::from(&config.state_file);
    let mut ctx = load_or_create_session(&state_path, lesson, args.resume).await?;

    let dialog = LessonDialog::new(config.dialog_settings());
    let router = build_router(&config);

    println!("Lesson: {}", ctx.lesson.title);
    println!("Type {QUIT_COMMAND} to leave.");
    println!();

    if ctx.state == DialogState::Presenting {
        render(&dialog.start(&mut ctx));
    } else {
        render_pending(&ctx);
    }
    ctx.save(&state_path).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == QUIT_COMMAND {
            break;
        }
        if line.is_empty() {
            continue;
        }

        let activities = handle_line(&dialog, &router, &config, &mut ctx, line).await;
        render(&activities);

        if let Err(e) = ctx.save(&state_path).await {
            tracing::warn!(error = %e, "Failed to save session");
        }
    }

    ctx.save(&state_path).await?;
    println!("Session saved to {}", state_path.display());
    Ok(())
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Loads the saved session when resuming, otherwise starts a new one.
///
/// Refuses to start over an unfinished session unless `resume` is set.
async fn load_or_create_session(
    state_path: &Path,
    lesson: Lesson,
    resume: bool,
) -> anyhow::Result<SessionContext> {
    let existing = SessionContext::load(state_path).await?;

    match existing {
        Some(ctx) if resume => {
            if ctx.lesson != lesson {
                anyhow::bail!(
                    "Session file '{}' belongs to a different lesson\n\nSuggestion: Delete the session file or run without --resume",
                    state_path.display()
                );
            }
            tracing::info!(
                topic = ctx.current_topic_index,
                state = %ctx.state,
                "Resuming saved session"
            );
            Ok(ctx)
        }
        Some(ctx) if !ctx.is_terminal() => {
            anyhow::bail!(
                "Found an unfinished session at '{}' (topic {} of {})\n\nSuggestion: Use --resume to continue or delete the session file to start fresh",
                state_path.display(),
                ctx.current_topic_index + 1,
                ctx.lesson.topic_count()
            );
        }
        Some(_) | None => {
            if resume {
                println!("No saved session found, starting fresh");
            }
            tracing::info!("Creating new session");
            Ok(SessionContext::new(lesson))
        }
    }
}

/// Builds the router from the configured knowledge bases.
///
/// A knowledge base that cannot be set up is skipped; its context then
/// always falls back.
fn build_router(config: &Config) -> ConfidenceRouter {
    let mut sources: HashMap<String, Arc<dyn KnowledgeSource>> = HashMap::new();
    for (context, kb) in &config.knowledge_bases {
        match QnaClient::from_config(kb) {
            Ok(client) => {
                tracing::debug!(context = %context, kb = %kb.knowledge_base_id, "Knowledge base registered");
                sources.insert(context.clone(), Arc::new(client));
            }
            Err(e) => {
                tracing::warn!(context = %context, error = %e, "Skipping knowledge base");
            }
        }
    }
    ConfidenceRouter::new(sources, config.qna_threshold)
}

/// Runs one turn for a line of input.
///
/// A pending lesson turn takes the line; otherwise it is routed to the
/// knowledge base, then to the fallback message.
async fn handle_line(
    dialog: &LessonDialog,
    router: &ConfidenceRouter,
    config: &Config,
    ctx: &mut SessionContext,
    line: &str,
) -> Vec<Activity> {
    if ctx.is_waiting() {
        let message = inbound_message(ctx, line);
        return dialog.resume(ctx, &message);
    }

    match router.route(&config.router_context, line).await {
        RouteOutcome::Answered(activities) => activities,
        RouteOutcome::Unhandled => vec![Activity::text(&config.messages.fallback)],
    }
}

/// Turns a line of input into the message the waiting state expects.
///
/// A number picks the matching option or choice; anything else is passed
/// through as typed.
fn inbound_message(ctx: &SessionContext, line: &str) -> InboundMessage {
    let picked = |options: &[String]| {
        line.parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| options.get(i))
            .cloned()
    };

    match (&ctx.state, ctx.state.expected_input()) {
        (_, Some(ExpectedInput::AnswerChoice)) => {
            let options = ctx
                .current_topic()
                .map(|t| t.answer_options.as_slice())
                .unwrap_or_default();
            InboundMessage::choice(picked(options).unwrap_or_else(|| line.to_string()))
        }
        (DialogState::AwaitingContinuationChoice { prompt }, _) => {
            InboundMessage::text(picked(&prompt.choices).unwrap_or_else(|| line.to_string()))
        }
        _ => InboundMessage::text(line),
    }
}

/// Prints activities to stdout.
fn render(activities: &[Activity]) {
    for activity in activities {
        match activity {
            Activity::Text { text } => println!("{text}"),
            Activity::QuestionCard {
                question,
                image_url,
                choices,
            } => {
                println!("{question}");
                println!("  [image: {image_url}]");
                for (i, choice) in choices.iter().enumerate() {
                    println!("  {}. {}", i + 1, choice.title);
                }
            }
            Activity::ChoicePrompt { prompt, choices } => {
                println!("{prompt}");
                for (i, choice) in choices.iter().enumerate() {
                    println!("  {}. {choice}", i + 1);
                }
            }
            Activity::Speak { text, speak } => {
                println!("{text}");
                tracing::debug!(speak = %speak, "Speech");
            }
        }
    }
}

/// Reminds the student what a resumed session is waiting for.
fn render_pending(ctx: &SessionContext) {
    match &ctx.state {
        DialogState::AwaitingContinuationChoice { prompt } => render(&[prompt.activity()]),
        DialogState::AwaitingChoiceAnswer | DialogState::AwaitingTypedAnswer => {
            if let Some(topic) = ctx.current_topic() {
                println!("{}", topic.question);
                if ctx.state == DialogState::AwaitingChoiceAnswer {
                    for (i, option) in topic.answer_options.iter().enumerate() {
                        println!("  {}. {option}", i + 1);
                    }
                }
            }
        }
        DialogState::Completed | DialogState::Exhausted => {
            println!("This lesson is finished. Ask me anything, or type {QUIT_COMMAND}.");
        }
        DialogState::Presenting => {}
    }
}

// ============================================================================
// Tests
// ============================================================================
