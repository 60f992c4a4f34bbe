pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::error::GenerateError;
use crate::language::Language;

/// Anything that can turn a language and a prompt into a snippet.
#[async_trait]
pub trait SnippetGenerator: Send + Sync {
    async fn generate(&self, language: Language, prompt: &str) -> Result<String, GenerateError>;
}

/// The single instruction string sent to the provider.
pub fn build_instruction(language: Language, prompt: &str) -> String {
    format!("Write a {} code snippet for: {}", language.as_str(), prompt)
}
