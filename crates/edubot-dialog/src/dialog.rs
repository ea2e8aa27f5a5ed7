//! The lesson progression dialog.
//!
//! [`LessonDialog`] walks a [`SessionContext`] through each topic of its
//! lesson: present the question card, check the selected option, check the
//! typed answer, play the pronunciation, then ask whether to advance or stay.
//!
//! Every call runs one turn to completion and returns the activities the
//! host must deliver. The context is the only state; the dialog itself holds
//! configuration only, so one dialog can serve any number of conversations.

use tracing::{debug, info, instrument, warn};

use crate::activity::{answer_payload, Activity, CardChoice, InboundMessage};
use crate::answer::{is_correct, StudentResponse};
use crate::config::DialogSettings;
use crate::lesson::Topic;
use crate::prompt::{ChoicePrompt, PromptOutcome};
use crate::session::{DialogState, SessionContext};

/// Drives lesson conversations turn by turn.
#[derive(Debug, Clone, Default)]
pub struct LessonDialog {
    settings: DialogSettings,
}

impl LessonDialog {
    /// Creates a dialog using the given settings.
    #[must_use]
    pub const fn new(settings: DialogSettings) -> Self {
        Self { settings }
    }

    /// Starts (or restarts) the current topic.
    ///
    /// Presents the topic at `ctx.current_topic_index`. If there is none,
    /// sends the no-more-lessons notice and moves to `Exhausted`.
    #[instrument(skip_all, fields(topic = ctx.current_topic_index))]
    pub fn start(&self, ctx: &mut SessionContext) -> Vec<Activity> {
        let mut out = Vec::new();
        self.present(ctx, &mut out);
        ctx.touch();
        out
    }

    /// Handles one inbound message in the state the context is waiting in.
    ///
    /// A context still in `Presenting` is started instead. Terminal states
    /// ignore the message.
    #[instrument(skip_all, fields(topic = ctx.current_topic_index, state = %ctx.state))]
    pub fn resume(&self, ctx: &mut SessionContext, message: &InboundMessage) -> Vec<Activity> {
        let mut out = Vec::new();
        match ctx.state {
            DialogState::Presenting => self.present(ctx, &mut out),
            DialogState::AwaitingChoiceAnswer => self.check_answer_option(ctx, message, &mut out),
            DialogState::AwaitingTypedAnswer => self.check_typed_answer(ctx, message, &mut out),
            DialogState::AwaitingContinuationChoice { .. } => {
                self.after_wrap_up(ctx, message, &mut out);
            }
            DialogState::Completed | DialogState::Exhausted => {
                debug!("Lesson is over, ignoring message");
            }
        }
        ctx.touch();
        out
    }

    // ------------------------------------------------------------------------
    // Turn steps
    // ------------------------------------------------------------------------

    fn present(&self, ctx: &mut SessionContext, out: &mut Vec<Activity>) {
        match ctx.current_topic().map(question_card) {
            Some(card) => {
                info!(topic = ctx.current_topic_index, "Presenting topic");
                out.push(card);
                ctx.state = DialogState::AwaitingChoiceAnswer;
            }
            None => {
                info!(topic = ctx.current_topic_index, "No topic left to present");
                out.push(Activity::text(&self.settings.messages.no_more_lessons));
                ctx.state = DialogState::Exhausted;
            }
        }
    }

    fn check_answer_option(
        &self,
        ctx: &mut SessionContext,
        message: &InboundMessage,
        out: &mut Vec<Activity>,
    ) {
        let response = message
            .value
            .as_ref()
            .and_then(StudentResponse::from_choice_payload);
        if response.is_none() {
            debug!("No answer in choice payload");
        }

        let Some((correct, feedback)) = grade(ctx, response.as_ref()) else {
            return;
        };
        out.push(Activity::text(feedback));

        if correct {
            info!(topic = ctx.current_topic_index, "Correct choice, awaiting typed answer");
            ctx.state = DialogState::AwaitingTypedAnswer;
        } else {
            info!(topic = ctx.current_topic_index, "Wrong choice, restarting topic");
            self.present(ctx, out);
        }
    }

    fn check_typed_answer(
        &self,
        ctx: &mut SessionContext,
        message: &InboundMessage,
        out: &mut Vec<Activity>,
    ) {
        let response = StudentResponse::from_text(message.text.as_deref());
        let Some((correct, feedback)) = grade(ctx, response.as_ref()) else {
            return;
        };

        if correct {
            info!(topic = ctx.current_topic_index, "Correct typed answer");
            self.pronounce(ctx, out);
        } else {
            info!(topic = ctx.current_topic_index, "Wrong typed answer, restarting topic");
            out.push(Activity::text(feedback));
            self.present(ctx, out);
        }
    }

    /// Sends the pronunciation step and opens the topic wrap-up prompt.
    fn pronounce(&self, ctx: &mut SessionContext, out: &mut Vec<Activity>) {
        let Some(topic) = ctx.current_topic() else {
            warn_missing_topic(ctx);
            return;
        };

        out.push(Activity::text(&topic.pronunciation_phrase));
        out.push(Activity::Speak {
            text: topic.correct_answer.clone(),
            speak: topic.correct_answer.clone(),
        });

        let prompt = ChoicePrompt::new(
            vec![
                topic.next_topic_phrase.clone(),
                topic.stay_on_topic_phrase.clone(),
            ],
            &self.settings.messages.topic_wrap_up,
            &self.settings.messages.retry_prompt,
            self.settings.continuation_attempts,
        );
        out.push(prompt.activity());
        ctx.state = DialogState::AwaitingContinuationChoice { prompt };
    }

    fn after_wrap_up(
        &self,
        ctx: &mut SessionContext,
        message: &InboundMessage,
        out: &mut Vec<Activity>,
    ) {
        let Some((next_phrase, stay_phrase)) = ctx
            .current_topic()
            .map(|t| (t.next_topic_phrase.clone(), t.stay_on_topic_phrase.clone()))
        else {
            warn_missing_topic(ctx);
            return;
        };
        let DialogState::AwaitingContinuationChoice { prompt } = &mut ctx.state else {
            return;
        };

        let mut outcome = prompt.accept(message.text.as_deref());

        // A stored prompt can offer choices the topic no longer uses.
        let unknown = matches!(
            &outcome,
            PromptOutcome::Chosen(s) if *s != next_phrase && *s != stay_phrase
        );
        if unknown {
            warn!("Selection matches neither continuation phrase, counting it as unrecognized");
            outcome = prompt.reject();
        }

        match outcome {
            PromptOutcome::Chosen(selection) if selection == next_phrase => {
                self.advance(ctx, out);
            }
            PromptOutcome::Chosen(_) => {
                info!(topic = ctx.current_topic_index, "Staying on topic");
                self.pronounce(ctx, out);
            }
            PromptOutcome::Retry(activity) => {
                debug!("Unrecognized wrap-up reply, prompting again");
                out.push(activity);
            }
            PromptOutcome::AttemptsExhausted => {
                info!(
                    topic = ctx.current_topic_index,
                    "Wrap-up attempts exhausted, restarting topic"
                );
                self.present(ctx, out);
            }
        }
    }

    fn advance(&self, ctx: &mut SessionContext, out: &mut Vec<Activity>) {
        if ctx.lesson.is_last(ctx.current_topic_index) {
            info!(topic = ctx.current_topic_index, "Lesson completed");
            out.push(Activity::text(&self.settings.messages.lesson_complete));
            ctx.state = DialogState::Completed;
        } else {
            ctx.current_topic_index += 1;
            info!(topic = ctx.current_topic_index, "Advancing to next topic");
            self.present(ctx, out);
        }
    }
}

/// Checks a response against the current topic.
///
/// Returns whether it was correct and the matching feedback text, or `None`
/// if the current topic is missing.
fn grade(ctx: &SessionContext, response: Option<&StudentResponse>) -> Option<(bool, String)> {
    let Some(topic) = ctx.current_topic() else {
        warn_missing_topic(ctx);
        return None;
    };
    let correct = is_correct(response, topic);
    let feedback = if correct {
        &topic.correct_answer_response
    } else {
        &topic.wrong_answer_response
    };
    Some((correct, feedback.clone()))
}

fn warn_missing_topic(ctx: &SessionContext) {
    warn!(
        topic = ctx.current_topic_index,
        topic_count = ctx.lesson.topic_count(),
        "Current topic is missing, ignoring turn"
    );
}

fn question_card(topic: &Topic) -> Activity {
    Activity::QuestionCard {
        question: topic.question.clone(),
        image_url: topic.image_url.clone(),
        choices: topic
            .answer_options
            .iter()
            .map(|option| CardChoice {
                title: option.clone(),
                value: answer_payload(option),
            })
            .collect(),
    }
}

// ============================================================================
// Tests
// ============================================================================
