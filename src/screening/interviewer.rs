//! Interview collaborators: question generation, relevance checks and
//! question revision, behind a trait so tests can script them.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::InterviewerConfig;
use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

use super::prompts;

/// How a candidate query relates to the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relevance {
    /// On topic; the question itself is fine.
    RelevantCorrect,
    /// On topic; the question is flawed as written.
    RelevantIncorrect,
    Irrelevant,
}

impl Relevance {
    /// Parse a classifier reply. Any "yes" counts as relevant.
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim().to_lowercase();
        if !text.contains("yes") {
            Self::Irrelevant
        } else if text.contains("incorrect") {
            Self::RelevantIncorrect
        } else {
            Self::RelevantCorrect
        }
    }

    pub fn is_relevant(&self) -> bool {
        !matches!(self, Self::Irrelevant)
    }
}

impl std::fmt::Display for Relevance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RelevantCorrect => "relevant_correct",
            Self::RelevantIncorrect => "relevant_incorrect",
            Self::Irrelevant => "irrelevant",
        };
        write!(f, "{s}")
    }
}

/// The language-model side of the technical interview.
#[async_trait]
pub trait Interviewer: Send + Sync {
    /// Raw model text expected to hold up to five numbered questions.
    async fn generate_questions(
        &self,
        tech_stack: &[String],
        years_experience: &str,
        desired_position: &str,
    ) -> Result<String, LlmError>;

    /// Classify a candidate query against the current question.
    ///
    /// `recent_dialogue` is a `Human:`/`AI:` rendering of the latest turns.
    async fn check_relevance(
        &self,
        current_question: &str,
        query_text: &str,
        recent_dialogue: &str,
    ) -> Result<Relevance, LlmError>;

    /// Raw text of a replacement question.
    async fn revise_question(
        &self,
        current_question: &str,
        query_text: &str,
        recent_dialogue: &str,
    ) -> Result<String, LlmError>;
}

/// Run a collaborator call with an upper time bound.
pub async fn bounded<T, F>(label: &str, limit: Duration, fut: F) -> Result<T, LlmError>
where
    F: Future<Output = Result<T, LlmError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout {
            provider: label.to_string(),
            after: limit,
        }),
    }
}

/// `Interviewer` backed by an `LlmProvider`.
pub struct LlmInterviewer {
    llm: Arc<dyn LlmProvider>,
    config: InterviewerConfig,
}

impl LlmInterviewer {
    pub fn new(llm: Arc<dyn LlmProvider>, config: InterviewerConfig) -> Self {
        Self { llm, config }
    }
}

#[async_trait]
impl Interviewer for LlmInterviewer {
    async fn generate_questions(
        &self,
        tech_stack: &[String],
        years_experience: &str,
        desired_position: &str,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(prompts::question_generation_prompt(
                tech_stack,
                years_experience,
                desired_position,
            )),
            ChatMessage::user(prompts::question_generation_request()),
        ])
        .with_temperature(self.config.question_temperature)
        .with_max_tokens(self.config.question_max_tokens);

        let response = self.llm.complete(request).await?;
        Ok(response.content)
    }

    async fn check_relevance(
        &self,
        current_question: &str,
        query_text: &str,
        recent_dialogue: &str,
    ) -> Result<Relevance, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(prompts::relevance_prompt()),
            ChatMessage::user(prompts::relevance_request(current_question, query_text, recent_dialogue)),
        ])
        .with_temperature(self.config.review_temperature)
        .with_max_tokens(self.config.review_max_tokens);

        let response = self.llm.complete(request).await?;
        let relevance = Relevance::parse(&response.content);
        tracing::debug!(raw = %response.content.trim(), %relevance, "Relevance classified");
        Ok(relevance)
    }

    async fn revise_question(
        &self,
        current_question: &str,
        query_text: &str,
        recent_dialogue: &str,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(prompts::revision_prompt()),
            ChatMessage::user(prompts::revision_request(current_question, query_text, recent_dialogue)),
        ])
        .with_temperature(self.config.review_temperature)
        .with_max_tokens(self.config.review_max_tokens);

        let response = self.llm.complete(request).await?;
        Ok(response.content.trim().to_string())
    }
}
