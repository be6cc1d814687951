//! Runtime configuration for the chunk store.

use crate::errors::RagError;

/// Default collection populated by the document ingestion pipeline.
pub const DEFAULT_COLLECTION: &str = "exam_documents";

/// Configuration for retrieval over an existing Qdrant collection.
#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
}

impl RagConfig {
    /// Creates a sane default config for a given collection name and Qdrant endpoint.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            qdrant_url: url.into(),
            qdrant_api_key: None,
            collection: collection.into(),
            exact_search: false,
        }
    }

    /// Reads `QDRANT_URL`, `QDRANT_API_KEY`, `QDRANT_COLLECTION`, `RAG_EXACT_SEARCH`.
    ///
    /// # Errors
    /// `RagError::Config` if `QDRANT_URL` is missing or a value is malformed.
    pub fn from_env() -> Result<Self, RagError> {
        let url = env("QDRANT_URL")
            .ok_or_else(|| RagError::Config("QDRANT_URL is not set".into()))?;
        let mut cfg = Self::new_default(
            url,
            env("QDRANT_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        );
        cfg.qdrant_api_key = env("QDRANT_API_KEY");
        cfg.exact_search = match env("RAG_EXACT_SEARCH") {
            None => false,
            Some(v) => parse_bool(&v).ok_or_else(|| {
                RagError::Config(format!("RAG_EXACT_SEARCH: expected bool, got {v:?}"))
            })?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.qdrant_url.trim().is_empty() {
            return Err(RagError::Config("qdrant_url is empty".into()));
        }
        if !(self.qdrant_url.starts_with("http://") || self.qdrant_url.starts_with("https://")) {
            return Err(RagError::Config(
                "qdrant_url must start with http:// or https://".into(),
            ));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection is empty".into()));
        }
        Ok(())
    }
}

fn env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rejects_bad_urls_and_empty_collection() {
        assert!(RagConfig::new_default("http://localhost:6334", "c").validate().is_ok());
        assert!(RagConfig::new_default("localhost:6334", "c").validate().is_err());
        assert!(RagConfig::new_default("http://localhost:6334", " ").validate().is_err());
    }

    #[test]
    fn bools_accept_common_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
