//! Prompt builders for question generation (initial + corrective retry).
//!
//! Prompts carry the retrieved chunks verbatim and nothing else that looks
//! like subject matter: no sample questions, so nothing can be echoed back
//! as if it had been retrieved.

use crate::api_types::{Difficulty, RetrievalContext};

/// System message sent with every generation call.
pub const SYSTEM_PROMPT: &str = "You are an exam question writer. You write multiple-choice \
questions strictly from the study material supplied in the prompt and reply with a JSON array only.";

/// Which variant to compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Initial,
    /// Previous answer parsed to `actual` questions instead of the requested count.
    Retry { actual: usize },
}

/// Build the generation prompt for `ctx`.
pub fn compose(
    ctx: &RetrievalContext,
    difficulty: Difficulty,
    requested: usize,
    attempt: Attempt,
) -> String {
    let subject = ctx.subject();
    let mut s = String::new();

    if let Attempt::Retry { actual } = attempt {
        s.push_str("# Correction\n");
        s.push_str(&format!(
            "IMPORTANT: your previous answer contained {actual} questions. \
             You returned {actual}, you must return exactly {requested}.\n"
        ));
        s.push_str(&format!(
            "Every question must be about {subject} and nothing else. \
             Do not include any question on another subject, even if the material mentions one.\n\n"
        ));
    }

    s.push_str(&format!(
        "Generate EXACTLY {requested} {difficulty} multiple-choice questions about {subject}.\n"
    ));
    s.push_str(&format!(
        "Only {subject} questions are allowed. Skip material that belongs to other subjects.\n"
    ));

    s.push_str("\n# Study material\n");
    s.push_str(
        "The excerpts below are the only permitted source of facts. \
         Do not use outside or general knowledge. \
         If a fact is not in these excerpts, do not ask about it.\n",
    );
    for (i, c) in ctx.chunks().iter().enumerate() {
        s.push_str(&format!("\n## Excerpt {} (source: {}", i + 1, c.source_file));
        if let Some(p) = c.page {
            s.push_str(&format!(", page {p}"));
        }
        s.push_str(")\n");
        s.push_str(&c.text);
        s.push('\n');
    }

    s.push_str(&format!("\n# Difficulty: {difficulty}\n"));
    for g in difficulty.guidelines() {
        s.push_str("- ");
        s.push_str(g);
        s.push('\n');
    }

    s.push_str("\n# Cleaning\n");
    s.push_str(
        "- Remove source numbering and labels such as \"Q.44\", \"12.\", \"Q1\" or \"(a)\" \
         from question text and options.\n\
         - Write complete, self-contained questions.\n",
    );

    s.push_str("\n# Output format\n");
    s.push_str(&format!(
        "Return ONLY a JSON array of exactly {requested} objects (no markdown, no comments). \
         Each object has these fields:\n"
    ));
    s.push_str(
        "- \"id\": string\n\
         - \"text\": string, the question\n\
         - \"options\": array of exactly 4 strings\n\
         - \"correctAnswer\": integer index of the correct option, 0 to 3\n\
         - \"explanation\": string, why the answer is correct according to the material\n",
    );

    if let Attempt::Retry { .. } = attempt {
        s.push_str(&format!(
            "\nCount your objects before answering: the array length must be {requested}.\n"
        ));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_types::{ContentChunk, RetrievalMode};

    fn ctx() -> RetrievalContext {
        let chunks = vec![
            ContentChunk {
                text: "A body at rest stays at rest unless acted on by a net force.".into(),
                source_file: "mechanics.pdf".into(),
                subject: Some("physics".into()),
                page: Some(3),
                relevance_score: 0.9,
            },
            ContentChunk {
                text: "Power is the rate of doing work.".into(),
                source_file: "energy.pdf".into(),
                subject: Some("physics".into()),
                page: None,
                relevance_score: 0.8,
            },
        ];
        RetrievalContext::new(
            "Physics",
            "physics",
            "q".into(),
            chunks,
            RetrievalMode::Filtered,
            &[],
        )
    }

    #[test]
    fn initial_prompt_embeds_chunks_and_contract() {
        let p = compose(&ctx(), Difficulty::Medium, 5, Attempt::Initial);
        assert!(p.contains("EXACTLY 5 medium"));
        assert!(p.contains("about Physics"));
        assert!(p.contains("only permitted source of facts"));
        assert!(p.contains("Do not use outside or general knowledge"));
        assert!(p.contains("A body at rest stays at rest unless acted on by a net force."));
        assert!(p.contains("(source: mechanics.pdf, page 3)"));
        assert!(p.contains("(source: energy.pdf)"));
        assert!(p.contains("\"correctAnswer\""));
        assert!(p.contains("exactly 4 strings"));
        assert!(!p.contains("# Correction"));
    }

    #[test]
    fn retry_prompt_adds_count_emphasis() {
        let p = compose(&ctx(), Difficulty::Hard, 10, Attempt::Retry { actual: 4 });
        assert!(p.contains("You returned 4, you must return exactly 10."));
        assert!(p.contains("must be about Physics and nothing else"));
        assert!(p.contains("only permitted source of facts"));
        assert!(p.contains("the array length must be 10"));
        for g in Difficulty::Hard.guidelines() {
            assert!(p.contains(g));
        }
    }
}
