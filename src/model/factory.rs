use anyhow::Result;
use tracing::info;

use super::interface::LanguageModel;
use super::llama_server::LlamaServerModel;
use crate::config::ModelConfig;

/// Factory for the process-wide model instance
pub struct ModelFactory;

impl ModelFactory {
    /// Load the backend named by `config.backend`.
    ///
    /// Returns only once the model is ready to serve; any error here is
    /// fatal to the process.
    pub async fn create_model(config: &ModelConfig) -> Result<Box<dyn LanguageModel>> {
        info!("Initializing model backend: {}", config.backend);

        match config.backend.as_str() {
            "llama_server" | "llama_cpp" => Ok(Box::new(LlamaServerModel::load(config).await?)),
            other => Err(anyhow::anyhow!("Unsupported model backend: {}", other)),
        }
    }
}
