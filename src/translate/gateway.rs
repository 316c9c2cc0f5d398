use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use super::interface::{TranslateRequest, TranslateResponse};
use super::prompt::{build_prompt, STOP_SEQUENCES};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::model::{GenerationRequest, LanguageModel};

/// Greedy decoding keeps translations deterministic
pub const MAX_TOKENS: u32 = 512;
pub const TEMPERATURE: f32 = 0.0;

/// Result of an accepted translation request
#[derive(Debug, Clone, PartialEq)]
pub enum Translation {
    /// Source and target language matched; the model was not called
    Unchanged(String),
    Translated { text: String, elapsed: Duration },
}

impl From<Translation> for TranslateResponse {
    fn from(translation: Translation) -> Self {
        match translation {
            Translation::Unchanged(text) => Self {
                translated_text: text,
                elapsed: None,
            },
            Translation::Translated { text, elapsed } => Self {
                translated_text: text,
                elapsed: Some((elapsed.as_secs_f64() * 1000.0).round() / 1000.0),
            },
        }
    }
}

/// Sole owner of the loaded model.
///
/// At most one `generate` call is in flight at any time. Waiters are queued
/// by the tokio mutex, which wakes them in the order they started waiting.
pub struct TranslationGateway {
    model_id: String,
    model: Mutex<Box<dyn LanguageModel>>,
    queue_timeout: Option<Duration>,
}

impl TranslationGateway {
    pub fn new(model: Box<dyn LanguageModel>, config: &GatewayConfig) -> Self {
        let model_id = model.model_id().to_string();
        info!(
            "Translation gateway ready: model={}, max_tokens={}, temperature={}",
            model_id, MAX_TOKENS, TEMPERATURE
        );
        Self {
            model_id,
            model: Mutex::new(model),
            queue_timeout: config.queue_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn with_queue_timeout(mut self, timeout: Duration) -> Self {
        self.queue_timeout = Some(timeout);
        self
    }

    /// Model identifier; never waits for the lock
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Translate one request.
    ///
    /// The returned elapsed time covers only the model call, not the time
    /// spent queued behind other requests. Failures release the model.
    pub async fn translate(&self, request: &TranslateRequest) -> Result<Translation, GatewayError> {
        request.validate()?;

        let source_lang = request.source_lang.trim();
        let target_lang = request.target_lang.trim();
        if source_lang == target_lang {
            debug!("Same source and target language ({}), skipping model", source_lang);
            return Ok(Translation::Unchanged(request.text.clone()));
        }

        let generation = GenerationRequest {
            prompt: build_prompt(source_lang, target_lang, request.text.trim()),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            stop: STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
            echo: false,
        };

        let queued_at = Instant::now();
        let model = self.acquire().await?;
        debug!("Acquired model after {:?} in queue", queued_at.elapsed());

        let start = Instant::now();
        let result = model.generate(&generation).await;
        let elapsed = start.elapsed();
        drop(model);

        match result {
            Ok(text) => {
                info!("Translated {} -> {} in {:.3}s", source_lang, target_lang, elapsed.as_secs_f64());
                Ok(Translation::Translated {
                    text: text.trim().to_string(),
                    elapsed,
                })
            }
            Err(e) => {
                error!("Generation failed after {:.3}s: {:#}", elapsed.as_secs_f64(), e);
                Err(GatewayError::Generation(format!("{:#}", e)))
            }
        }
    }

    /// Run `translate` on its own task.
    ///
    /// Dropping the returned future (client disconnect) does not cancel the
    /// work: a generation that has started always finishes before the model
    /// is released.
    pub async fn translate_detached(
        self: Arc<Self>,
        request: TranslateRequest,
    ) -> Result<Translation, GatewayError> {
        let span = info_span!("translate", request_id = %Uuid::new_v4());
        let task = tokio::spawn(async move { self.translate(&request).await }.instrument(span));
        task.await
            .map_err(|e| GatewayError::Worker(e.to_string()))?
    }

    /// Wait for any in-flight generation, then shut the model down
    pub async fn shutdown(&self) -> Result<(), anyhow::Error> {
        let model = self.model.lock().await;
        model.shutdown().await
    }

    async fn acquire(&self) -> Result<MutexGuard<'_, Box<dyn LanguageModel>>, GatewayError> {
        match self.queue_timeout {
            None => Ok(self.model.lock().await),
            Some(timeout) => tokio::time::timeout(timeout, self.model.lock())
                .await
                .map_err(|_| GatewayError::QueueTimeout(timeout)),
        }
    }
}
