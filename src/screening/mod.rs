//! Candidate screening: the scripted conversation and everything it needs.
//!
//! A `Conversation` walks greeting → start → profile fields → tech stack →
//! five technical questions → closing. `dispatcher::handle_turn` is the only
//! thing that moves it; the `Interviewer` and `SentimentAnalyzer`
//! collaborators are the only calls that leave the process.

pub mod dispatcher;
pub mod fields;
pub mod interviewer;
pub mod parsing;
pub mod prompts;
pub mod report;
pub mod routes;
pub mod sentiment;
pub mod session;
pub mod state;
pub mod transcript;

pub use dispatcher::{Collaborators, handle_turn, initialize_conversation};
pub use fields::{ProfileField, SCALAR_FIELDS};
pub use interviewer::{Interviewer, LlmInterviewer, Relevance};
pub use report::{
    AssessmentReport, ExportFormat, ExportedDocument, MarkdownExporter, PandocPdfExporter,
    ReportExporter,
};
pub use routes::{ScreeningRouteState, screening_routes};
pub use sentiment::{
    LlmSentimentAnalyzer, SentimentAnalyzer, SentimentLabel, SentimentScore, SentimentSummary,
    Tone, summarize,
};
pub use session::{OpenedSession, ScreeningService, SessionStore, TurnOutcome};
pub use state::{CandidateProfile, Conversation, ConversationSnapshot, ConversationStage};
pub use transcript::{DialogueMemory, InteractionLog};
