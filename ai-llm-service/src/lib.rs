//! Shared LLM access for the exam-prep backend.
//!
//! Exposes provider clients (OpenAI, Gemini, Anthropic, Ollama) behind
//! [`service_profiles::LlmServiceProfiles`], environment-driven configs,
//! a static model catalog, health probes and the console telemetry layer.

pub mod catalog;
pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;
