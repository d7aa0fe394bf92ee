//! Turn dispatcher: the screening state machine.
//!
//! One call per candidate message. Each call runs the global exit check,
//! the per-turn preamble (user log line, sentiment, dialogue memory), the
//! in-band `query:` interrupt, and then exactly one stage handler.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::fields::ProfileField;
use super::interviewer::{Interviewer, Relevance, bounded};
use super::parsing::{
    QuestionSource, build_question_set, clean_response, format_tech_stack, question_text,
    renumber_question,
};
use super::sentiment::{SentimentAnalyzer, analyze_sentiment};
use super::state::{Conversation, ConversationStage};

/// Inputs that end the conversation from any stage.
pub const EXIT_COMMANDS: [&str; 4] = ["exit", "quit", "stop", "end"];

/// Prefix marking a clarification request during the interview.
pub const QUERY_PREFIX: &str = "query:";

/// Answers are truncated to this many characters in the interaction log.
const LOGGED_ANSWER_CHARS: usize = 200;

/// Turns of dialogue memory shown to the relevance checker and revisor.
const CONTEXT_TURNS: usize = 4;

pub const GREETING: &str = "Hello! I'm TalentBot from TalentScout. I'll guide you through our initial \
screening process. If you're ready to begin, please type 'Start'.\n\n\
You can type 'exit' at any time to end the conversation.\n\
During technical questions, you can request clarification by typing 'query: your question'.";

pub const START_REMINDER: &str =
    "Please type 'Start' when you're ready to begin the screening process.";

pub const EXIT_ACK: &str = "Thank you for your time. We'll be in touch soon!";

pub const INSUFFICIENT_PROFILE: &str =
    "We don't have enough information to generate questions. Thank you for your time.";

pub const NO_QUESTIONS: &str = "We've completed the initial screening. Thank you for your time!";

pub const ASSESSMENT_COMPLETE: &str = "Thank you for completing the assessment! Our team will \
review your answers and contact you soon.";

pub const CLOSING_THANKS: &str = "Thank you again! Our team will review your application shortly.";

pub const NOT_RELEVANT: &str = "Your query doesn't appear relevant to the current question. \
Please answer the original question.";

pub const REDIRECT: &str =
    "I'm here to assist with your job application. Could you please rephrase that?";

/// External capabilities a turn may call.
#[derive(Clone)]
pub struct Collaborators {
    pub interviewer: Arc<dyn Interviewer>,
    pub sentiment: Arc<dyn SentimentAnalyzer>,
    /// Upper bound on each collaborator call.
    pub timeout: Duration,
}

impl Collaborators {
    pub fn new(
        interviewer: Arc<dyn Interviewer>,
        sentiment: Arc<dyn SentimentAnalyzer>,
        timeout: Duration,
    ) -> Self {
        Self {
            interviewer,
            sentiment,
            timeout,
        }
    }
}

fn is_exit_command(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    EXIT_COMMANDS.contains(&normalized.as_str())
}

/// Remainder of a `query:` message, if `input` is one.
fn query_text(input: &str) -> Option<&str> {
    let input = input.trim_start();
    let prefix = input.get(..QUERY_PREFIX.len())?;
    if prefix.eq_ignore_ascii_case(QUERY_PREFIX) {
        Some(input[QUERY_PREFIX.len()..].trim())
    } else {
        None
    }
}

/// Create a conversation and produce its opening greeting.
pub async fn initialize_conversation(collaborators: &Collaborators) -> (String, Conversation) {
    let mut conversation = Conversation::new();
    let greeting = handle_turn("", &mut conversation, collaborators).await;
    (greeting, conversation)
}

/// Process one candidate message and return the reply.
///
/// Never fails: collaborator errors degrade to fallbacks and leave the
/// conversation in a valid state.
pub async fn handle_turn(
    input: &str,
    conversation: &mut Conversation,
    collaborators: &Collaborators,
) -> String {
    if is_exit_command(input) {
        info!(session_id = %conversation.id, stage = %conversation.stage, "Candidate ended the conversation");
        conversation.memory.record(input, EXIT_ACK);
        conversation.log_interaction(format!("Assistant: {EXIT_ACK}"));
        return EXIT_ACK.to_string();
    }

    if !input.is_empty() {
        conversation.log_interaction(format!("User: {input}"));
        if conversation.stage.tracks_sentiment() {
            let score =
                analyze_sentiment(collaborators.sentiment.as_ref(), input, collaborators.timeout)
                    .await;
            debug!(
                session_id = %conversation.id,
                label = %score.label,
                score = score.score,
                "Scored candidate message"
            );
            conversation.log_interaction(score.log_line());
        }
    }

    conversation.memory.begin_turn(input);

    let reply = match (conversation.stage, query_text(input)) {
        (ConversationStage::TechnicalInterview, Some(query)) => {
            handle_query(conversation, query, collaborators).await
        }
        (ConversationStage::Greeting, _) => handle_greeting(conversation),
        (ConversationStage::AwaitingStart, _) => handle_awaiting_start(conversation, input),
        (ConversationStage::InfoGathering, _) => handle_info_gathering(conversation, input),
        (ConversationStage::TechStackCollection, _) => {
            handle_tech_stack(conversation, input, collaborators).await
        }
        (ConversationStage::TechnicalInterview, None) => handle_answer(conversation, input),
        (ConversationStage::Closing, _) => CLOSING_THANKS.to_string(),
    };

    conversation.memory.complete_turn(reply.as_str());
    conversation.log_interaction(format!("Assistant: {reply}"));
    reply
}

fn handle_greeting(conversation: &mut Conversation) -> String {
    conversation.transition(ConversationStage::AwaitingStart);
    conversation.log_interaction("System: Initial greeting");
    GREETING.to_string()
}

fn handle_awaiting_start(conversation: &mut Conversation, input: &str) -> String {
    if !input.trim().eq_ignore_ascii_case("start") {
        return START_REMINDER.to_string();
    }
    conversation.transition(ConversationStage::InfoGathering);
    conversation.log_interaction("System: User started the process");
    info!(session_id = %conversation.id, "Screening started");
    match conversation.current_field() {
        Some(field) => field.prompt().to_string(),
        None => REDIRECT.to_string(),
    }
}

fn handle_info_gathering(conversation: &mut Conversation, input: &str) -> String {
    let Some(field) = conversation.current_field() else {
        return begin_tech_stack(conversation);
    };

    if !field.validate(input) {
        debug!(session_id = %conversation.id, %field, "Field validation failed");
        return field.error_message().to_string();
    }

    conversation.record_response(field, input.trim());
    if conversation.advance_field() {
        match conversation.current_field() {
            Some(next) => next.prompt().to_string(),
            None => begin_tech_stack(conversation),
        }
    } else {
        begin_tech_stack(conversation)
    }
}

fn begin_tech_stack(conversation: &mut Conversation) -> String {
    conversation.transition(ConversationStage::TechStackCollection);
    conversation.log_interaction("System: Collecting tech stack");
    ProfileField::TechStack.prompt().to_string()
}

async fn handle_tech_stack(
    conversation: &mut Conversation,
    input: &str,
    collaborators: &Collaborators,
) -> String {
    conversation.set_tech_stack(format_tech_stack(input));

    let profile = &conversation.profile;
    let (Some(tech_stack), Some(years), Some(position)) = (
        profile.tech_stack.clone(),
        profile.years_experience.clone(),
        profile.desired_position.clone(),
    ) else {
        warn!(session_id = %conversation.id, "Profile incomplete, skipping question generation");
        conversation.transition(ConversationStage::Closing);
        return INSUFFICIENT_PROFILE.to_string();
    };

    let raw = bounded(
        "question_generator",
        collaborators.timeout,
        collaborators
            .interviewer
            .generate_questions(&tech_stack, &years, &position),
    )
    .await
    .unwrap_or_else(|e| {
        warn!(session_id = %conversation.id, error = %e, "Question generation failed");
        String::new()
    });

    let (questions, source) =
        build_question_set(&clean_response(&raw), &tech_stack, Some(position.as_str()));
    if source == QuestionSource::Template {
        info!(session_id = %conversation.id, "Using template questions");
    }
    conversation.tech_questions = questions;
    conversation.current_question_idx = 0;
    conversation.log_interaction(format!(
        "System: Generated {} technical questions",
        conversation.tech_questions.len()
    ));

    let Some(first) = conversation.tech_questions.first() else {
        conversation.transition(ConversationStage::Closing);
        return NO_QUESTIONS.to_string();
    };
    let reply = format!(
        "Thank you! Let's begin the technical assessment. You'll be asked {} questions.\n\n\
         Question 1: {}\n\n\
         If you need clarification on any question, type 'query: your question'.",
        conversation.tech_questions.len(),
        question_text(first)
    );
    conversation.transition(ConversationStage::TechnicalInterview);
    reply
}

fn handle_answer(conversation: &mut Conversation, input: &str) -> String {
    let idx = conversation.current_question_idx;
    let Some(question) = conversation.tech_questions.get(idx).cloned() else {
        return REDIRECT.to_string();
    };

    conversation.log_interaction(format!("Question {}: {}", idx + 1, question));
    let logged: String = input.chars().take(LOGGED_ANSWER_CHARS).collect();
    conversation.log_interaction(format!("Answer: {logged}..."));
    conversation.answers.push(input.to_string());
    conversation.current_question_idx += 1;

    let next_idx = conversation.current_question_idx;
    match conversation.tech_questions.get(next_idx) {
        Some(next) => format!("Question {}: {}", next_idx + 1, question_text(next)),
        None => {
            conversation.transition(ConversationStage::Closing);
            conversation.log_interaction("System: Completed technical assessment");
            info!(
                session_id = %conversation.id,
                answers = conversation.answers.len(),
                "Technical assessment completed"
            );
            ASSESSMENT_COMPLETE.to_string()
        }
    }
}

async fn handle_query(
    conversation: &mut Conversation,
    query: &str,
    collaborators: &Collaborators,
) -> String {
    let idx = conversation.current_question_idx;
    let Some(question) = conversation.tech_questions.get(idx).cloned() else {
        return REDIRECT.to_string();
    };
    let recent_dialogue = conversation.memory.render_recent(CONTEXT_TURNS);

    let relevance = bounded(
        "relevance_checker",
        collaborators.timeout,
        collaborators
            .interviewer
            .check_relevance(&question, query, &recent_dialogue),
    )
    .await
    .unwrap_or_else(|e| {
        warn!(session_id = %conversation.id, error = %e, "Relevance check failed");
        Relevance::Irrelevant
    });
    debug!(session_id = %conversation.id, question_idx = idx, %relevance, "Query classified");

    if !relevance.is_relevant() {
        return NOT_RELEVANT.to_string();
    }

    let revised = bounded(
        "question_revisor",
        collaborators.timeout,
        collaborators
            .interviewer
            .revise_question(&question, query, &recent_dialogue),
    )
    .await
    .map(|raw| clean_response(&raw));

    match revised {
        Ok(text) if !text.is_empty() => {
            conversation.tech_questions[idx] = renumber_question(&question, &text, idx + 1);
            conversation.log_interaction(format!("Revised Question: {text}"));
            info!(session_id = %conversation.id, question_idx = idx, "Question revised");
            format!("Thank you for your query. Here's the revised question:\n\n{text}")
        }
        Ok(_) => {
            warn!(session_id = %conversation.id, "Revision came back empty");
            revision_unavailable(&question)
        }
        Err(e) => {
            warn!(session_id = %conversation.id, error = %e, "Question revision failed");
            revision_unavailable(&question)
        }
    }
}

fn revision_unavailable(question: &str) -> String {
    format!(
        "I couldn't revise the question right now. Please answer the original question:\n\n{}",
        question_text(question)
    )
}
