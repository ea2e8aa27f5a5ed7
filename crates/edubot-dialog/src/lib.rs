//! EduBot Dialog
//!
//! Turn-based lesson dialog and confidence-gated message routing.

pub mod activity;
pub mod answer;
pub mod config;
pub mod dialog;
pub mod error;
pub mod lesson;
pub mod prompt;
pub mod router;
pub mod session;

pub use activity::{answer_payload, Activity, CardChoice, InboundMessage};
pub use answer::{is_correct, StudentResponse};
pub use config::{Config, DialogSettings, KnowledgeBaseConfig, Messages};
pub use dialog::LessonDialog;
pub use error::{DialogError, Result};
pub use lesson::{Lesson, Topic};
pub use prompt::{ChoicePrompt, PromptOutcome};
pub use router::{
    ConfidenceRouter, KnowledgeSource, LookupError, QnaResult, RouteOutcome, DEFAULT_THRESHOLD,
};
pub use session::{DialogState, ExpectedInput, SessionContext};
