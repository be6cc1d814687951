//! Health probes for the configured LLM backends.
//!
//! - Ollama:    `GET {endpoint}/api/tags` (best-effort model existence check)
//! - OpenAI:    `GET {endpoint}/v1/models` with Bearer auth
//! - Gemini:    `GET {endpoint}/v1beta/models/{model}` with `x-goog-api-key`
//! - Anthropic: `GET {endpoint}/v1/models` with `x-api-key`
//!
//! The returned [`HealthStatus`] is JSON-serializable and suitable for a `/health` endpoint.
//! [`HealthService::check`] is resilient and never fails (errors mapped to `ok=false`).

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, make_snippet};

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub provider: LlmProvider,
    /// Target endpoint base URL.
    pub endpoint: String,
    pub model: Option<String>,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the main probe.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Which shape the probe response has, and how to find the model in it.
enum Listing {
    /// `{ "models": [ { "name": .. } ] }`
    OllamaTags,
    /// `{ "data": [ { "id": .. } ] }`
    DataIds,
    /// A 2xx on the model's own resource means it exists.
    ModelResource,
}

#[derive(Deserialize)]
struct Named {
    #[serde(alias = "id")]
    name: String,
}

#[derive(Deserialize)]
struct OllamaTags {
    models: Option<Vec<Named>>,
}

#[derive(Deserialize)]
struct DataIds {
    data: Vec<Named>,
}

/// A universal health checker that reuses a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        info!(
            default_timeout_secs = timeout.as_secs(),
            "HealthService initialized"
        );

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Checks health for a single config. Never returns an error.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            warn!(
                provider = %cfg.provider,
                endpoint = %cfg.endpoint,
                "invalid endpoint (empty or missing http/https)"
            );
            return HealthStatus::new(cfg, false, 0, "endpoint is empty or missing http/https");
        }

        let start = Instant::now();
        match self.try_probe(cfg).await {
            Ok(status) => {
                info!(
                    provider = %status.provider,
                    endpoint = %status.endpoint,
                    model = %cfg.model,
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health probe completed"
                );
                status
            }
            Err(err) => {
                let status =
                    HealthStatus::new(cfg, false, start.elapsed().as_millis(), err.to_string());
                warn!(
                    provider = %status.provider,
                    endpoint = %status.endpoint,
                    model = %cfg.model,
                    latency_ms = status.latency_ms,
                    message = %status.message,
                    "health probe failed"
                );
                status
            }
        }
    }

    /// Checks several configs sequentially.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        debug!(count = configs.len(), "running batch health probes");
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    /// Strict probe. Returns an error on transport failures and non-2xx.
    async fn try_probe(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let base = cfg.base_url();
        let (url, listing) = match cfg.provider {
            LlmProvider::Ollama => (format!("{base}/api/tags"), Listing::OllamaTags),
            LlmProvider::OpenAI | LlmProvider::Anthropic => {
                (format!("{base}/v1/models"), Listing::DataIds)
            }
            LlmProvider::Gemini => (
                format!("{base}/v1beta/models/{}", cfg.model),
                Listing::ModelResource,
            ),
        };
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);

        let mut req = self.client.get(&url).timeout(timeout);
        if let Some(var) = cfg.provider.api_key_var() {
            let key = cfg
                .api_key
                .as_deref()
                .ok_or_else(|| HealthError::Decode(format!("missing {var}")))?;
            req = match cfg.provider {
                LlmProvider::OpenAI => req.header(header::AUTHORIZATION, format!("Bearer {key}")),
                LlmProvider::Gemini => req.header("x-goog-api-key", key),
                _ => req
                    .header("x-api-key", key)
                    .header("anthropic-version", "2023-06-01"),
            };
        }

        let start = Instant::now();
        debug!(provider = %cfg.provider, model = %cfg.model, "GET {}", url);
        let resp = req.send().await?;
        let latency = start.elapsed().as_millis();

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(
                provider = %cfg.provider,
                %url,
                %status,
                %snippet,
                latency_ms = latency,
                "health probe returned non-success status"
            );
            return Err(HealthError::HttpStatus(HttpError {
                status,
                url,
                snippet,
            })
            .into());
        }

        let found = match listing {
            Listing::ModelResource => Some(Some(true)),
            Listing::OllamaTags => resp
                .json::<OllamaTags>()
                .await
                .ok()
                .map(|t| t.models.map(|m| has_model(&m, &cfg.model))),
            Listing::DataIds => resp
                .json::<DataIds>()
                .await
                .ok()
                .map(|d| Some(has_model(&d.data, &cfg.model))),
        }
        .flatten();

        Ok(match found {
            Some(true) => HealthStatus::new(cfg, true, latency, "healthy; model is available"),
            Some(false) => HealthStatus::new(cfg, false, latency, "up, but model is not listed"),
            None => HealthStatus::new(cfg, true, latency, "reachable; model listing not decoded"),
        })
    }
}

fn has_model(list: &[Named], model: &str) -> bool {
    list.iter().any(|m| m.name == model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_endpoint_reports_not_ok_without_network() {
        let svc = HealthService::new(Some(1)).unwrap();
        let cfg = LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "llama3.1:8b".into(),
            endpoint: "localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
            dimensions: None,
        };
        let st = svc.check(&cfg).await;
        assert!(!st.ok);
        assert_eq!(st.latency_ms, 0);
    }

    #[test]
    fn listings_decode_both_shapes() {
        let tags: OllamaTags =
            serde_json::from_str(r#"{"models":[{"name":"llama3.1:8b"}]}"#).unwrap();
        assert!(has_model(&tags.models.unwrap(), "llama3.1:8b"));
        let ids: DataIds = serde_json::from_str(r#"{"data":[{"id":"gpt-4o-mini"}]}"#).unwrap();
        assert!(has_model(&ids.data, "gpt-4o-mini"));
    }
}
