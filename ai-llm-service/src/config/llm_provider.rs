use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error_handler::ConfigError;

/// Represents the provider (backend) used for large language model (LLM) inference.
///
/// This enum distinguishes between hosted APIs (OpenAI, Google Gemini,
/// Anthropic Claude) and a local Ollama runtime. Selection is a configuration
/// value: parse it with [`FromStr`] from `LLM_PROVIDER` / `EMBEDDING_PROVIDER`.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_provider::LlmProvider;
///
/// let p: LlmProvider = "claude".parse().unwrap();
/// assert_eq!(p, LlmProvider::Anthropic);
/// assert_eq!(p.api_key_var(), Some("ANTHROPIC_API_KEY"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI chat completions / embeddings API.
    OpenAI,
    /// Google Gemini (`generativelanguage.googleapis.com`).
    #[serde(rename = "google")]
    Gemini,
    /// Anthropic Messages API.
    Anthropic,
    /// Local Ollama runtime for on-device inference.
    Ollama,
}

impl LlmProvider {
    /// All providers, in display order.
    pub const ALL: [LlmProvider; 4] = [
        LlmProvider::OpenAI,
        LlmProvider::Gemini,
        LlmProvider::Anthropic,
        LlmProvider::Ollama,
    ];

    /// Stable lowercase identifier (matches the accepted env values).
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "openai",
            LlmProvider::Gemini => "google",
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::Ollama => "ollama",
        }
    }

    /// Environment variable holding the API key, if the provider needs one.
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            LlmProvider::OpenAI => Some("OPENAI_API_KEY"),
            LlmProvider::Gemini => Some("GOOGLE_API_KEY"),
            LlmProvider::Anthropic => Some("ANTHROPIC_API_KEY"),
            LlmProvider::Ollama => None,
        }
    }

    /// Default public endpoint (base URL without path).
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "https://api.openai.com",
            LlmProvider::Gemini => "https://generativelanguage.googleapis.com",
            LlmProvider::Anthropic => "https://api.anthropic.com",
            LlmProvider::Ollama => "http://localhost:11434",
        }
    }

    /// Environment variable that overrides [`Self::default_endpoint`].
    pub fn endpoint_var(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "OPENAI_BASE_URL",
            LlmProvider::Gemini => "GOOGLE_BASE_URL",
            LlmProvider::Anthropic => "ANTHROPIC_BASE_URL",
            LlmProvider::Ollama => "OLLAMA_URL",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "chatgpt" => Ok(LlmProvider::OpenAI),
            "google" | "gemini" => Ok(LlmProvider::Gemini),
            "anthropic" | "claude" => Ok(LlmProvider::Anthropic),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases_case_insensitively() {
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!(" gemini ".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert_eq!("google".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert_eq!("Claude".parse::<LlmProvider>().unwrap(), LlmProvider::Anthropic);
        assert!("mistral".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for p in LlmProvider::ALL {
            assert_eq!(p.to_string().parse::<LlmProvider>().unwrap(), p);
        }
    }
}
