//! Bridges rig's `CompletionModel` to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::agent::AgentBuilder;
use rig::completion::{CompletionModel, Prompt};

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};

const DEFAULT_TEMPERATURE: f32 = 0.3;
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// `LlmProvider` backed by any rig completion model.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
    provider: &'static str,
}

impl<M> RigAdapter<M>
where
    M: CompletionModel,
{
    pub fn new(model: M, model_name: &str, provider: &'static str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            provider,
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let preamble = request.system_text().unwrap_or_default();
        let prompt = request.prompt_text();

        let agent = AgentBuilder::new(self.model.clone())
            .preamble(&preamble)
            .temperature(f64::from(request.temperature.unwrap_or(DEFAULT_TEMPERATURE)))
            .max_tokens(u64::from(request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)))
            .build();

        let content = agent
            .prompt(prompt)
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: self.provider.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            provider = self.provider,
            model = %self.model_name,
            chars = content.len(),
            "Completion received"
        );

        Ok(CompletionResponse {
            content,
            finish_reason: FinishReason::Stop,
        })
    }
}
