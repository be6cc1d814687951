//! Generation knobs, read from the environment once at startup.
//!
//! Provider, model and temperature belong to the completion client
//! (`ai_llm_service::config::LlmModelConfig`); this struct holds what the
//! pipeline itself decides.

use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

/// Immutable pipeline configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationConfig {
    /// Chunks requested from the store per query.
    pub top_k: u64,
    /// Extra model calls allowed after a count mismatch.
    pub retry_limit: u32,
    /// Per-call completion timeout, distinct from any request timeout.
    pub completion_timeout: Duration,
    /// Subject tags that match every subject (documents with mixed content).
    pub shared_subject_tags: Vec<String>,
    /// Optional minimum top score; `None` accepts any non-empty retrieval.
    pub relevance_floor: Option<f32>,
    /// Upper bound on `count` per request.
    pub max_questions: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            top_k: 15,
            retry_limit: 1,
            completion_timeout: Duration::from_secs(45),
            shared_subject_tags: vec!["mixed".to_string()],
            relevance_floor: None,
            max_questions: 100,
        }
    }
}

impl GenerationConfig {
    /// Build from environment variables, falling back to [`Default`] per field.
    ///
    /// - `RAG_TOP_K`, `GEN_RETRY_LIMIT`, `GEN_TIMEOUT_SECS`, `GEN_MAX_QUESTIONS`
    /// - `RAG_SHARED_SUBJECTS`: comma-separated, empty string disables sharing
    /// - `RAG_RELEVANCE_FLOOR`: float in `[0, 1]`, unset means permissive
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the resulting values fail [`Self::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let d = Self::default();
        let cfg = Self {
            top_k: parse("RAG_TOP_K", d.top_k),
            retry_limit: parse("GEN_RETRY_LIMIT", d.retry_limit),
            completion_timeout: Duration::from_secs(parse(
                "GEN_TIMEOUT_SECS",
                d.completion_timeout.as_secs(),
            )),
            shared_subject_tags: match std::env::var("RAG_SHARED_SUBJECTS") {
                Ok(v) => split_list(&v),
                Err(_) => d.shared_subject_tags,
            },
            relevance_floor: std::env::var("RAG_RELEVANCE_FLOOR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|_| parse("RAG_RELEVANCE_FLOOR", 0.0f32)),
            max_questions: parse("GEN_MAX_QUESTIONS", d.max_questions),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks ranges that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(invalid("top_k", "must be > 0"));
        }
        let secs = self.completion_timeout.as_secs();
        if !(1..=300).contains(&secs) {
            return Err(invalid("completion_timeout", "expected 1..=300 seconds"));
        }
        if self.max_questions == 0 {
            return Err(invalid("max_questions", "must be > 0"));
        }
        if let Some(f) = self.relevance_floor {
            if !(0.0..=1.0).contains(&f) {
                return Err(invalid("relevance_floor", "expected 0.0..=1.0"));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError {
        field,
        reason: reason.to_string(),
    }
}

fn split_list(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse<T: std::str::FromStr + std::fmt::Debug>(k: &str, dflt: T) -> T {
    match std::env::var(k) {
        Ok(v) if !v.trim().is_empty() => match v.trim().parse() {
            Ok(x) => x,
            Err(_) => {
                warn!(var = k, value = %v, default = ?dflt, "unparsable value, using default");
                dflt
            }
        },
        _ => dflt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let d = GenerationConfig::default();
        assert!(d.validate().is_ok());
        assert_eq!(d.top_k, 15);
        assert_eq!(d.retry_limit, 1);
        assert_eq!(d.relevance_floor, None);
    }

    #[test]
    fn validation_catches_out_of_range_values() {
        let mut c = GenerationConfig::default();
        c.completion_timeout = Duration::from_secs(0);
        assert_eq!(c.validate().unwrap_err().field, "completion_timeout");

        let mut c = GenerationConfig::default();
        c.relevance_floor = Some(1.5);
        assert_eq!(c.validate().unwrap_err().field, "relevance_floor");

        let mut c = GenerationConfig::default();
        c.top_k = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn shared_subjects_list_is_normalized() {
        assert_eq!(split_list(" Mixed, ,General "), vec!["mixed", "general"]);
        assert!(split_list("").is_empty());
    }
}
