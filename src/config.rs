use std::fs;
use std::path::Path;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5050
}

/// Model backend settings. The model is loaded once at startup and never
/// replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Identifier reported by `/health`
    #[serde(default = "default_model_id")]
    pub model_id: String,

    #[serde(default = "default_backend")]
    pub backend: String,

    /// Address of the llama.cpp server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// GGUF weights; only used when the server is spawned by us
    #[serde(default)]
    pub model_path: Option<String>,

    #[serde(default)]
    pub server_binary: Option<String>,

    #[serde(default = "default_context_size")]
    pub context_size: u32,

    /// -1 offloads every layer
    #[serde(default = "default_gpu_layers")]
    pub gpu_layers: i32,

    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,
}

fn default_model_id() -> String {
    "translategemma-12b-it-q4_k_m".to_string()
}

fn default_backend() -> String {
    "llama_server".to_string()
}

fn default_base_url() -> String {
    "http://127.0.0.1:8081".to_string()
}

fn default_context_size() -> u32 {
    2048
}

fn default_gpu_layers() -> i32 {
    -1
}

fn default_startup_timeout_secs() -> u64 {
    300
}

/// Decoding parameters are fixed by the gateway; unknown keys such as
/// `temperature` are rejected rather than silently ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Upper bound on the wait for the model lock. Unbounded when unset.
    #[serde(default)]
    pub queue_timeout_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            backend: default_backend(),
            base_url: default_base_url(),
            model_path: None,
            server_binary: None,
            context_size: default_context_size(),
            gpu_layers: default_gpu_layers(),
            startup_timeout_secs: default_startup_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML or JSON file.
    ///
    /// `${VAR}` placeholders are replaced with environment values before
    /// parsing; unknown variables are left as-is.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }

        let content = read_text_file(path)?;
        let content = substitute_env_vars(&content);

        let path_lower = path.to_lowercase();
        let config: Config = if path_lower.ends_with(".json") || path_lower.ends_with(".jsonld") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Apply `TRANSLATE_API_HOST`, `TRANSLATE_API_PORT` and
    /// `TRANSLATE_MODEL_URL` on top of the loaded values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("TRANSLATE_API_HOST") {
            self.server.host = host;
        }
        if let Some(raw) = lookup("TRANSLATE_API_PORT") {
            match raw.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(
                    "Invalid TRANSLATE_API_PORT='{}', keeping {}",
                    raw, self.server.port
                ),
            }
        }
        if let Some(url) = lookup("TRANSLATE_MODEL_URL") {
            self.model.base_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("server.port must be non-zero");
        }
        if self.model.context_size == 0 {
            anyhow::bail!("model.context_size must be positive");
        }
        if self.model.model_path.is_some() != self.model.server_binary.is_some() {
            anyhow::bail!("model.model_path and model.server_binary must be set together");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Read a config file as UTF-8, dropping a leading BOM if present
fn read_text_file(path: &str) -> Result<String> {
    let bytes = fs::read(path)?;
    let (content, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(&bytes);
    if had_errors {
        warn!("Config file {} contains invalid UTF-8; replaced bad sequences", path);
    }
    Ok(content.into_owned())
}

fn substitute_env_vars(content: &str) -> String {
    let pattern = Regex::new(r"\$\{(\w+)\}").expect("static regex");
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
