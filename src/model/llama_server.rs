// llama.cpp server backend.
// The model weights live in a `llama-server` process, either spawned here or
// started by the operator; we only speak its HTTP API.

use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::interface::{GenerationRequest, LanguageModel};
use crate::config::ModelConfig;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

pub struct LlamaServerModel {
    model_id: String,
    base_url: String,
    client: Client,
    /// Spawned server, killed on shutdown or when the model is dropped
    server: Mutex<Option<Child>>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    temperature: f32,
    stop: &'a [String],
    cache_prompt: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ServerErrorBody {
    error: ServerErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ServerErrorDetail {
    message: String,
}

impl LlamaServerModel {
    /// Attach to a llama.cpp server without waiting for it to be ready.
    ///
    /// Completions carry no client-side timeout: giving up on a call while
    /// the server keeps decoding would let the next request overlap it.
    pub fn new(model_id: String, base_url: String) -> Result<Self> {
        let client = Client::builder().build()?;

        Ok(Self {
            model_id,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            server: Mutex::new(None),
        })
    }

    /// Load the model: spawn the server if configured, then block until it
    /// reports healthy.
    pub async fn load(config: &ModelConfig) -> Result<Self> {
        info!("Loading model {} via {}...", config.model_id, config.base_url);
        let start = Instant::now();

        let mut model = Self::new(config.model_id.clone(), config.base_url.clone())?;

        if let (Some(binary), Some(model_path)) = (&config.server_binary, &config.model_path) {
            *model.server.get_mut() = Some(spawn_server(binary, model_path, config)?);
        }

        model
            .wait_until_ready(Duration::from_secs(config.startup_timeout_secs))
            .await?;

        info!("Model loaded in {:.1}s", start.elapsed().as_secs_f64());
        Ok(model)
    }

    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await?;
        Ok(response.status().is_success())
    }

    async fn wait_until_ready(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(child) = self.server.get_mut() {
                if let Some(status) = child.try_wait()? {
                    anyhow::bail!("llama.cpp server exited during startup ({})", status);
                }
            }

            match self.health_check().await {
                Ok(true) => return Ok(()),
                Ok(false) => debug!("llama.cpp server at {} still loading", self.base_url),
                Err(e) => debug!("llama.cpp server at {} not reachable yet: {}", self.base_url, e),
            }

            if Instant::now() >= deadline {
                anyhow::bail!(
                    "Model {} was not ready within {}s",
                    self.model_id,
                    timeout.as_secs()
                );
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

/// Command line for `llama-server`. A single slot (`-np 1`) keeps the
/// server itself from decoding two prompts at once.
fn server_args(model_path: &str, config: &ModelConfig) -> Result<Vec<String>> {
    let url = Url::parse(&config.base_url)
        .with_context(|| format!("Invalid model.base_url: {}", config.base_url))?;
    let host = url.host_str().unwrap_or("127.0.0.1").to_string();
    let port = url
        .port_or_known_default()
        .ok_or_else(|| anyhow::anyhow!("model.base_url has no port: {}", config.base_url))?;

    // llama.cpp treats any count above the layer total as "all layers"
    let gpu_layers = if config.gpu_layers < 0 {
        999
    } else {
        config.gpu_layers
    };

    Ok(vec![
        "-m".to_string(),
        model_path.to_string(),
        "-c".to_string(),
        config.context_size.to_string(),
        "-ngl".to_string(),
        gpu_layers.to_string(),
        "-np".to_string(),
        "1".to_string(),
        "--host".to_string(),
        host,
        "--port".to_string(),
        port.to_string(),
    ])
}

fn spawn_server(binary: &str, model_path: &str, config: &ModelConfig) -> Result<Child> {
    let args = server_args(model_path, config)?;
    info!("Spawning {} {}", binary, args.join(" "));

    let child = Command::new(binary)
        .args(&args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Failed to spawn {}", binary))?;

    Ok(child)
}

#[async_trait]
impl LanguageModel for LlamaServerModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, anyhow::Error> {
        let url = format!("{}/completion", self.base_url);
        let body = CompletionRequest {
            prompt: &request.prompt,
            n_predict: request.max_tokens,
            temperature: request.temperature,
            stop: &request.stop,
            cache_prompt: true,
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ServerErrorBody>(&text) {
                Ok(body) => body.error.message,
                Err(_) => format!("llama.cpp server returned {}: {}", status, text),
            };
            warn!("Completion failed: {}", message);
            return Err(anyhow::anyhow!(message));
        }

        let completion: CompletionResponse = response.json().await?;
        if request.echo {
            Ok(format!("{}{}", request.prompt, completion.content))
        } else {
            Ok(completion.content)
        }
    }

    async fn shutdown(&self) -> Result<()> {
        if let Some(mut child) = self.server.lock().await.take() {
            info!("Stopping llama.cpp server for {}", self.model_id);
            child.kill().await.context("Failed to stop llama.cpp server")?;
        }
        Ok(())
    }
}

impl Drop for LlamaServerModel {
    fn drop(&mut self) {
        if self.server.get_mut().is_some() {
            info!("Stopping llama.cpp server for {}", self.model_id);
        }
    }
}
