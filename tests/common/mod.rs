//! Shared stubs for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use talentbot::error::LlmError;
use talentbot::llm::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};
use talentbot::screening::{
    Collaborators, LlmInterviewer, LlmSentimentAnalyzer, MarkdownExporter, ScreeningService,
};

/// Maximum time any test is allowed to run before we consider it hung.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

pub const GENERATED_QUESTIONS: &str = "\
<think>the candidate knows Rust and Postgres</think>
1. How does Rust's borrow checker prevent use-after-free bugs?
2. When would you reach for Arc<Mutex<T>> over message passing in tokio?
3. How would you diagnose a slow PostgreSQL query plan in production?
4. How do you design idempotent database migrations for zero-downtime deploys?
5. How would you structure error types across crates in a Rust workspace?";

pub const REVISED_QUESTION: &str =
    "1. When would you choose Arc<Mutex<T>> over an mpsc channel for shared state in a tokio service?";

/// LLM stub that answers each collaborator by looking at the system prompt.
pub struct ScriptedLlm {
    pub relevant: bool,
    pub calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(relevant: bool) -> Arc<Self> {
        Arc::new(Self {
            relevant,
            calls: AtomicUsize::new(0),
        })
    }

    fn reply_for(&self, request: &CompletionRequest) -> String {
        let system = request.system_text().unwrap_or_default();
        if system.contains("sentiment classifier") {
            let text = request.prompt_text().to_lowercase();
            let (label, score) = if text.contains("love") {
                ("POSITIVE", 0.91)
            } else if text.contains("hate") {
                ("NEGATIVE", 0.20)
            } else {
                ("NEUTRAL", 0.50)
            };
            format!(r#"{{"label": "{label}", "score": {score}}}"#)
        } else if system.contains("Write exactly five") {
            GENERATED_QUESTIONS.to_string()
        } else if system.contains("Decide two things") {
            if self.relevant {
                "Yes and question is correct".to_string()
            } else {
                "No".to_string()
            }
        } else if system.contains("Rewrite the question") {
            REVISED_QUESTION.to_string()
        } else {
            String::new()
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CompletionResponse {
            content: self.reply_for(&request),
            finish_reason: FinishReason::Stop,
        })
    }
}

/// A service wired to the real LLM-backed collaborators over `llm`.
pub fn service_with(llm: Arc<dyn LlmProvider>) -> Arc<ScreeningService> {
    let config = talentbot::config::InterviewerConfig::default();
    let collaborators = Collaborators::new(
        Arc::new(LlmInterviewer::new(Arc::clone(&llm), config.clone())),
        Arc::new(LlmSentimentAnalyzer::new(llm, &config)),
        Duration::from_secs(1),
    );
    Arc::new(ScreeningService::new(collaborators, Arc::new(MarkdownExporter)))
}

/// Inputs that take a fresh session from the greeting to question 1.
pub const PROFILE_SCRIPT: [&str; 8] = [
    "Start",
    "Jordan Rivera",
    "jordan.rivera@example.com",
    "(555) 010-4477",
    "6",
    "Senior Backend Engineer",
    "Toronto",
    "Rust, PostgreSQL, Kubernetes",
];
