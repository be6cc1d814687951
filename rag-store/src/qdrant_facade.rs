//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! All Qdrant interactions live behind this facade so the rest of the crate
//! stays decoupled from the verbose builder API.

use std::collections::HashMap;

use crate::config::RagConfig;
use crate::errors::RagError;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{Filter, SearchParamsBuilder, SearchPointsBuilder, Value as QValue};
use tracing::{debug, info};

/// A facade over the Qdrant client bound to one collection.
pub struct QdrantFacade {
    client: Qdrant,
    collection: String,
}

impl QdrantFacade {
    /// Creates a new facade from the given configuration.
    ///
    /// Supports optional API key authentication.
    pub fn new(cfg: &RagConfig) -> Result<Self, RagError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
        })
    }

    /// Performs a similarity search in Qdrant.
    ///
    /// Returns `(score, payload)` tuples in the order Qdrant ranked them.
    pub async fn search(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: Option<Filter>,
        exact: bool,
    ) -> Result<Vec<(f32, serde_json::Value)>, RagError> {
        info!(
            collection = %self.collection,
            top_k,
            filtered = filter.is_some(),
            exact,
            "qdrant search"
        );

        let mut builder =
            SearchPointsBuilder::new(&self.collection, vector, top_k).with_payload(true);
        if let Some(f) = filter {
            builder = builder.filter(f);
        }
        if exact {
            builder = builder.params(SearchParamsBuilder::default().exact(true));
        }

        let res = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        let out: Vec<_> = res
            .result
            .into_iter()
            .map(|r| (r.score, qpayload_to_json(r.payload)))
            .collect();

        debug!(hits = out.len(), "qdrant search completed");
        Ok(out)
    }

    /// Returns the server version when Qdrant answers its health check.
    pub async fn health(&self) -> Result<String, RagError> {
        let reply = self
            .client
            .health_check()
            .await
            .map_err(|e| RagError::Qdrant(e.to_string()))?;
        Ok(reply.version)
    }
}

/// Converts a Qdrant payload into a JSON object.
fn qpayload_to_json(p: HashMap<String, QValue>) -> serde_json::Value {
    serde_json::Value::Object(p.into_iter().map(|(k, v)| (k, qvalue_to_json(v))).collect())
}

fn qvalue_to_json(v: QValue) -> serde_json::Value {
    use qdrant_client::qdrant::value::Kind as K;
    match v.kind {
        Some(K::StringValue(s)) => serde_json::Value::String(s),
        Some(K::IntegerValue(i)) => serde_json::Value::Number(i.into()),
        Some(K::DoubleValue(f)) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(K::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(K::StructValue(s)) => qpayload_to_json(s.fields),
        Some(K::ListValue(l)) => {
            serde_json::Value::Array(l.values.into_iter().map(qvalue_to_json).collect())
        }
        Some(K::NullValue(_)) | None => serde_json::Value::Null,
    }
}
