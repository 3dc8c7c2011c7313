use serde::{Deserialize, Serialize};

use crate::error::{CraigslistError, Result};

/// Environment variable consulted when no model id is configured.
pub const MODEL_ENV_VAR: &str = "MODEL";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Replaces `https://<city>.craigslist.org` when set.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_timeout(),
            base_url: None,
        }
    }
}

/// Settings for the OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_model_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: Option<f32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: None,
            base_url: default_model_base_url(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_model_timeout(),
            temperature: default_temperature(),
        }
    }
}

impl ModelConfig {
    /// Model id from the config file, else from the process environment.
    pub fn resolve_model(&self) -> Result<String> {
        self.resolve_model_with(|key| std::env::var(key).ok())
    }

    pub fn resolve_model_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
        self.model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| lookup(MODEL_ENV_VAR).filter(|m| !m.trim().is_empty()))
            .ok_or_else(|| {
                CraigslistError::Config(format!(
                    "no model configured: set model.model in the config file or the {MODEL_ENV_VAR} environment variable"
                ))
            })
    }

    /// API key read from the configured environment variable. Local model
    /// servers often run without one.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into()
}

fn default_timeout() -> u64 {
    30
}

fn default_model_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}

fn default_model_timeout() -> u64 {
    60
}

#[allow(clippy::unnecessary_wraps)]
fn default_temperature() -> Option<f32> {
    Some(0.0)
}
