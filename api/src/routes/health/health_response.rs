use ai_llm_service::health_service::HealthStatus;
use serde::Serialize;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// True when every probe below succeeded.
    pub ok: bool,
    /// Generation and embedding profile probes.
    pub llm: Vec<HealthStatus>,
    pub vector_store: VectorStoreHealth,
}

#[derive(Debug, Serialize)]
pub struct VectorStoreHealth {
    pub ok: bool,
    pub collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
