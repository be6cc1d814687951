//! Grounding gate: the single place that decides whether generation may run.
//!
//! When it declines, the completion model is never called.

use crate::api_types::{GateReason, RetrievalContext};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    pub proceed: bool,
    pub reason: Option<GateReason>,
}

impl GateDecision {
    const PROCEED: Self = Self {
        proceed: true,
        reason: None,
    };

    fn decline(reason: GateReason) -> Self {
        Self {
            proceed: false,
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GroundingGate {
    relevance_floor: Option<f32>,
}

impl GroundingGate {
    /// `relevance_floor = None` accepts any non-empty, subject-relevant retrieval.
    pub fn new(relevance_floor: Option<f32>) -> Self {
        Self { relevance_floor }
    }

    pub fn decide(&self, ctx: &RetrievalContext) -> GateDecision {
        if ctx.chunks().is_empty() || !ctx.using_rag() {
            return GateDecision::decline(GateReason::NoContentForSubject);
        }
        match (self.relevance_floor, ctx.top_score()) {
            (Some(floor), Some(top)) if top < floor => {
                GateDecision::decline(GateReason::NoContentForSubject)
            }
            _ => GateDecision::PROCEED,
        }
    }
}
