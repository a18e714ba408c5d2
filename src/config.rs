use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub llm: LlmConfig,
    pub synthesis: SynthesisConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Text-generation provider settings (primary stream + classifier calls).
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,
}

/// Render-queue settings for the speech synthesis gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    /// Base URL of the render queue (e.g. a ComfyUI instance).
    pub endpoint: String,
    /// Optional Cloudflare Access service-token credentials.
    pub access_client_id: Option<String>,
    pub access_client_secret: Option<String>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl SynthesisConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_poll_timeout_secs() -> u64 {
    120
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("AVATAR_CHAT").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
