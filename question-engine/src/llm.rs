//! Completion client seam.
//!
//! [`CompletionProvider`] is what the pipeline calls; [`LlmCompletionClient`]
//! backs it with the configured generation profile (OpenAI, Gemini,
//! Anthropic or Ollama). [`CompletionAdapter`] adds the per-call timeout.
//! Nothing here retries: retries are the reconciler's decision.

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use ai_llm_service::service_profiles::LlmServiceProfiles;
use tokio::time::{Instant, timeout};
use tracing::{debug, warn};

use crate::error::CompletionError;
use crate::prompt::SYSTEM_PROMPT;

/// Anything that turns a prompt into raw model text.
pub trait CompletionProvider: Send + Sync {
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>>;
}

/// Provider backed by [`LlmServiceProfiles::generate`].
#[derive(Clone)]
pub struct LlmCompletionClient {
    svc: Arc<LlmServiceProfiles>,
}

impl LlmCompletionClient {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        Self { svc }
    }
}

impl CompletionProvider for LlmCompletionClient {
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>> {
        Box::pin(async move {
            let text = self.svc.generate(prompt, Some(SYSTEM_PROMPT)).await?;
            Ok(text)
        })
    }
}

/// Wraps a provider with a timeout and latency logging.
#[derive(Clone)]
pub(crate) struct CompletionAdapter {
    provider: Arc<dyn CompletionProvider>,
    timeout: Duration,
}

impl CompletionAdapter {
    pub(crate) fn new(provider: Arc<dyn CompletionProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub(crate) async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let started = Instant::now();
        let res = match timeout(self.timeout, self.provider.complete(prompt)).await {
            Ok(r) => r,
            Err(_) => Err(CompletionError::Timeout(self.timeout)),
        };
        let latency_ms = started.elapsed().as_millis() as u64;
        match &res {
            Ok(text) => debug!(
                latency_ms,
                prompt_chars = prompt.len(),
                reply_chars = text.len(),
                "completion ok"
            ),
            Err(e) => warn!(latency_ms, error = %e, "completion failed"),
        }
        res
    }
}
