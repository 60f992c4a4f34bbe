use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::{build_instruction, SnippetGenerator};
use crate::config::ClientSettings;
use crate::error::GenerateError;
use crate::language::Language;

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

// Every level is optional so a surprising envelope degrades to EmptyResponse
// instead of a decode error.
#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    parts: Option<Vec<GeminiResponsePart>>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiErrorEnvelope {
    error: Option<GeminiErrorBody>,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    message: Option<String>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    settings: ClientSettings,
}

impl GeminiClient {
    pub fn new(settings: ClientSettings) -> Result<Self, GenerateError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        Ok(Self { client, settings })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.settings.api_base, self.settings.model)
    }

    #[instrument(
        skip(self, language, prompt),
        fields(language = language.as_str(), model = %self.settings.model)
    )]
    pub async fn query(&self, language: Language, prompt: &str) -> Result<String, GenerateError> {
        if prompt.trim().is_empty() {
            return Err(GenerateError::PromptRequired);
        }
        if !self.settings.has_api_key() {
            warn!("no API key configured, the provider will reject this request");
        }

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: build_instruction(language, prompt),
                }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.settings.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerateError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerateError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            let message = provider_error_message(&body)
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            warn!(status = status.as_u16(), %message, "generation request failed");
            return Err(GenerateError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let text = extract_snippet(&body).ok_or(GenerateError::EmptyResponse)?;
        let text = if self.settings.strip_code_fences {
            strip_code_fence(&text)
        } else {
            text
        };

        info!(chars = text.chars().count(), "snippet generated");
        Ok(text)
    }
}

#[async_trait]
impl SnippetGenerator for GeminiClient {
    async fn generate(&self, language: Language, prompt: &str) -> Result<String, GenerateError> {
        self.query(language, prompt).await
    }
}

fn provider_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<GeminiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message)
        .filter(|message| !message.trim().is_empty())
}

/// First candidate's first part text, if the envelope has one and it isn't blank.
fn extract_snippet(body: &str) -> Option<String> {
    let response: GeminiResponse = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => {
            debug!(error = %e, "unparseable generation response");
            return None;
        }
    };

    response
        .candidates?
        .into_iter()
        .next()?
        .content?
        .parts?
        .into_iter()
        .next()?
        .text
        .filter(|text| !text.trim().is_empty())
}

fn fence_regex() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)^\s*```[\w+#.-]*[ \t]*\r?\n(.*?)\r?\n?```\s*$").ok())
        .as_ref()
}

/// Unwrap a reply that is exactly one fenced Markdown block. Anything else is
/// returned untouched.
pub fn strip_code_fence(text: &str) -> String {
    let body = fence_regex()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1));
    match body {
        Some(body) if !body.as_str().contains("```") => body.as_str().to_string(),
        _ => text.to_string(),
    }
}
