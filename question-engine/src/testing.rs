//! Test doubles for the embedding service, the vector index and the
//! completion model.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::{future::Future, pin::Pin, time::Duration};

use rag_store::{EmbeddingsProvider, RagError, RagFilter, RagHit, VectorIndex};
use serde_json::{Value, json};

use crate::error::CompletionError;
use crate::llm::CompletionProvider;

/// Replays scripted answers in order and records every prompt.
/// Once the script runs out it answers `[]`.
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<Result<String, CompletionError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    /// `(first delayed call index, delay)`
    delay: Option<(usize, Duration)>,
}

impl ScriptedCompletion {
    pub fn new(script: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(self, d: Duration) -> Self {
        self.with_delay_from(0, d)
    }

    /// Delay only calls number `from` (0-based) and later.
    pub fn with_delay_from(mut self, from: usize, d: Duration) -> Self {
        self.delay = Some((from, d));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl CompletionProvider for ScriptedCompletion {
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>> {
        Box::pin(async move {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            let next = self.script.lock().unwrap().pop_front();
            if let Some((from, d)) = self.delay {
                if call >= from {
                    tokio::time::sleep(d).await;
                }
            }
            next.unwrap_or_else(|| Ok("[]".to_string()))
        })
    }
}

#[derive(Default)]
pub struct FixedEmbedder {
    fail: bool,
}

impl FixedEmbedder {
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl EmbeddingsProvider for FixedEmbedder {
    fn embed<'a>(
        &'a self,
        _text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>> {
        Box::pin(async move {
            if self.fail {
                Err(RagError::Embedding("embedding service unavailable".into()))
            } else {
                Ok(vec![0.1; 8])
            }
        })
    }
}

/// Brute-force index over fixed hits; scores are taken as given.
pub struct InMemoryIndex {
    hits: Vec<RagHit>,
    reject_filtered: bool,
    ordered: bool,
    seen: Mutex<Vec<Option<RagFilter>>>,
}

impl InMemoryIndex {
    pub fn new(hits: Vec<RagHit>) -> Self {
        Self {
            hits,
            reject_filtered: false,
            ordered: true,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Fail every query that carries a filter, like a store without payload indexes.
    pub fn reject_filtered(mut self) -> Self {
        self.reject_filtered = true;
        self
    }

    /// Return hits in insertion order instead of by score.
    pub fn unordered(mut self) -> Self {
        self.ordered = false;
        self
    }

    pub fn seen_filters(&self) -> Vec<Option<RagFilter>> {
        self.seen.lock().unwrap().clone()
    }
}

impl VectorIndex for InMemoryIndex {
    fn search<'a>(
        &'a self,
        _vector: Vec<f32>,
        top_k: u64,
        filter: Option<&'a RagFilter>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RagHit>, RagError>> + Send + 'a>> {
        Box::pin(async move {
            self.seen.lock().unwrap().push(filter.cloned());
            if self.reject_filtered && filter.is_some() {
                return Err(RagError::Qdrant("Bad request: index required for subject".into()));
            }
            let mut out: Vec<RagHit> = self
                .hits
                .iter()
                .filter(|h| filter.is_none_or(|f| f.matches(&h.payload)))
                .cloned()
                .collect();
            if self.ordered {
                out.sort_by(|a, b| b.score.total_cmp(&a.score));
            }
            out.truncate(top_k as usize);
            Ok(out)
        })
    }
}

pub fn chunk_hit(text: &str, source: &str, subject: Option<&str>, score: f32) -> RagHit {
    let mut payload = json!({ "text": text, "source": source, "page": 1 });
    if let (Some(s), Value::Object(map)) = (subject, &mut payload) {
        map.insert("subject".into(), Value::String(s.into()));
    }
    RagHit::from_payload(score, payload)
}

/// A well-formed JSON array of `n` questions; texts are `"{tag} {i}"`.
pub fn questions_json(tag: &str, n: usize) -> String {
    let items: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "id": "1",
                "text": format!("{tag} {i}"),
                "options": [format!("{tag} a{i}"), "b", "c", "d"],
                "correctAnswer": i % 4,
                "explanation": format!("from the material ({tag})"),
            })
        })
        .collect();
    Value::Array(items).to_string()
}
