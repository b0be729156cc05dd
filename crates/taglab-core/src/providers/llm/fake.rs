use super::{ChatRequest, LlmClient};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays queued responses in order and records every request it receives.
/// An `Err` entry makes the matching call fail with that message.
#[derive(Default)]
pub struct ScriptedClient {
    queue: Mutex<VecDeque<Result<String, String>>>,
    fallback: Option<String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    pub fn new<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<String, String>>,
    {
        Self {
            queue: Mutex::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Response used once the queue is drained.
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: &ChatRequest) -> anyhow::Result<String> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(request.clone());
        }

        let next = self
            .queue
            .lock()
            .map_err(|_| anyhow::anyhow!("scripted client poisoned"))?
            .pop_front();

        match next {
            Some(Ok(text)) => Ok(text.trim().to_string()),
            Some(Err(msg)) => Err(anyhow::anyhow!(msg)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| anyhow::anyhow!("scripted client exhausted")),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
