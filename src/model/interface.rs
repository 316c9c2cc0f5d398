use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Parameters for a single completion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stop: Vec<String>,
    /// Include the prompt in the returned text
    pub echo: bool,
}

/// Interface for the single loaded language model.
///
/// Implementations are not required to tolerate concurrent `generate` calls;
/// callers must serialize access (see `TranslationGateway`).
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Identifier reported to clients, e.g. the GGUF file stem
    fn model_id(&self) -> &str;

    /// Run one completion and return the generated text
    async fn generate(&self, request: &GenerationRequest) -> Result<String, anyhow::Error>;

    /// Release backend resources. Called once, after the server stops
    /// accepting requests.
    async fn shutdown(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}
