use serde::Deserialize;

/// Request body for `POST /generate_questions`.
#[derive(Debug, Deserialize)]
pub struct GenerateQuestionsRequest {
    /// Subject name as shown to users, e.g. "Physics".
    pub subject: String,
    /// `easy`, `medium` or `hard` (case-insensitive).
    pub difficulty: String,
    /// Exact number of questions wanted.
    pub count: usize,
}
