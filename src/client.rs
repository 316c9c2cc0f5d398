use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;

use crate::translate::{HealthResponse, TranslateRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for a running translation service
#[derive(Debug, Clone)]
pub struct TranslationClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TranslateReply {
    translated_text: Option<String>,
    error: Option<String>,
}

impl TranslationClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Translate `text`. Equal languages return the text without a request.
    pub async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        if source_lang == target_lang {
            return Ok(text.to_string());
        }

        let url = format!("{}/translate", self.base_url);
        let request = TranslateRequest::new(text, source_lang, target_lang);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Translation API error: {}", e))?;
        let body = response.text().await?;

        let reply: TranslateReply = serde_json::from_str(&body)
            .map_err(|_| anyhow::anyhow!("Translation API parse error: {}", body))?;
        match reply {
            TranslateReply { error: Some(error), .. } => Err(anyhow::anyhow!(error)),
            TranslateReply { translated_text: Some(text), .. } => Ok(text),
            _ => Err(anyhow::anyhow!("Translation API parse error: {}", body)),
        }
    }

    pub async fn health_check(&self) -> Result<HealthResponse> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        let health: HealthResponse = response.json().await?;
        Ok(health)
    }
}
