//! The pluggable text-generation capability and its three provider backends.
//!
//! Selection is by configuration enum, resolved once per call — never by
//! runtime type inspection. Providers are expected to return plain text, but
//! the composer's sanitizer does not assume they do.

use serde::Deserialize;
use serde_json::{json, Value};

const MAX_COMPLETION_TOKENS: u32 = 80;
const TEMPERATURE: f64 = 0.9;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Provider failures never leave the composer; they are counted and replaced
/// by the fallback status.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(String),

    #[error("provider returned an empty response")]
    Empty,

    #[error("provider response was malformed: {0}")]
    Malformed(String),
}

/// Render text from a prompt. Implemented once per provider.
pub trait TextProvider {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenAi,
    Groq,
}

impl ProviderKind {
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-2.0-flash",
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Groq => "llama-3.3-70b-versatile",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Groq => "groq",
        }
    }
}

/// Resolve the configured provider into a concrete backend.
pub fn resolve(kind: ProviderKind, api_key: &str, model: &str) -> Box<dyn TextProvider> {
    let model = if model.is_empty() {
        kind.default_model().to_string()
    } else {
        model.to_string()
    };
    let api_key = api_key.to_string();
    match kind {
        ProviderKind::Gemini => Box::new(GeminiProvider { api_key, model }),
        ProviderKind::OpenAi => Box::new(OpenAiProvider { api_key, model }),
        ProviderKind::Groq => Box::new(GroqProvider { api_key, model }),
    }
}

pub struct GeminiProvider {
    api_key: String,
    model: String,
}

impl TextProvider for GeminiProvider {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_ENDPOINT, self.model, self.api_key
        );
        let response = ureq::post(&url)
            .send_json(json!({
                "system_instruction": {"parts": [{"text": system}]},
                "contents": [{"parts": [{"text": prompt}]}],
            }))
            .map_err(|err| ProviderError::Request(err.to_string()))?;
        let body: Value = response
            .into_json()
            .map_err(|err| ProviderError::Malformed(err.to_string()))?;
        let text = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| ProviderError::Malformed("missing candidate text".to_string()))?;
        non_empty(text)
    }
}

pub struct OpenAiProvider {
    api_key: String,
    model: String,
}

impl TextProvider for OpenAiProvider {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        chat_completion(OPENAI_ENDPOINT, &self.api_key, &self.model, system, prompt)
    }
}

pub struct GroqProvider {
    api_key: String,
    model: String,
}

impl TextProvider for GroqProvider {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        chat_completion(GROQ_ENDPOINT, &self.api_key, &self.model, system, prompt)
    }
}

/// Groq serves an OpenAI-compatible API, so both backends share this call.
fn chat_completion(
    url: &str,
    api_key: &str,
    model: &str,
    system: &str,
    prompt: &str,
) -> Result<String, ProviderError> {
    let response = ureq::post(url)
        .set("Authorization", &format!("Bearer {}", api_key))
        .send_json(json!({
            "model": model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt},
            ],
            "max_tokens": MAX_COMPLETION_TOKENS,
            "temperature": TEMPERATURE,
        }))
        .map_err(|err| ProviderError::Request(err.to_string()))?;
    let body: Value = response
        .into_json()
        .map_err(|err| ProviderError::Malformed(err.to_string()))?;
    let text = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| ProviderError::Malformed("missing completion text".to_string()))?;
    non_empty(text)
}

fn non_empty(text: &str) -> Result<String, ProviderError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ProviderError::Empty)
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_deserializes_from_config_strings() {
        assert_eq!(
            serde_json::from_str::<ProviderKind>("\"gemini\"").unwrap(),
            ProviderKind::Gemini
        );
        assert_eq!(
            serde_json::from_str::<ProviderKind>("\"openai\"").unwrap(),
            ProviderKind::OpenAi
        );
        assert_eq!(
            serde_json::from_str::<ProviderKind>("\"groq\"").unwrap(),
            ProviderKind::Groq
        );
        assert!(serde_json::from_str::<ProviderKind>("\"other\"").is_err());
    }

    #[test]
    fn each_kind_has_a_default_model() {
        assert_eq!(ProviderKind::Gemini.default_model(), "gemini-2.0-flash");
        assert_eq!(ProviderKind::OpenAi.default_model(), "gpt-4o-mini");
        assert_eq!(
            ProviderKind::Groq.default_model(),
            "llama-3.3-70b-versatile"
        );
    }

    #[test]
    fn blank_responses_are_rejected() {
        assert!(matches!(non_empty("   \n"), Err(ProviderError::Empty)));
        assert_eq!(non_empty(" text ").unwrap(), "text");
    }
}
