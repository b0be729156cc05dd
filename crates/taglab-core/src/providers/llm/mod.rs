use async_trait::async_trait;

/// One chat-completion call: a system message, a user message, a temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the completion text, trimmed.
    async fn complete(&self, request: &ChatRequest) -> anyhow::Result<String>;
    fn provider_name(&self) -> &'static str;
}

pub mod fake;
pub mod openai;
