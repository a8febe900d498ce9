// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::env;

pub const ENV_BRIEFING_ENABLED: &str = "BRIEFING_ENABLED";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BRIEFING_MODEL: &str = "BRIEFING_MODEL";

fn default_model() -> String {
    "gpt-4o".to_string()
}

/// Settings for the LLM daily briefing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefingConfig {
    pub enabled: bool,
    /// Never serialized back out.
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for BriefingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            model: default_model(),
        }
    }
}

impl BriefingConfig {
    /// Enabled only when `BRIEFING_ENABLED` is truthy and a key is present.
    pub fn from_env() -> Self {
        let flag = env::var(ENV_BRIEFING_ENABLED)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);
        let api_key = env::var(ENV_OPENAI_API_KEY)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let model = env::var(ENV_BRIEFING_MODEL)
            .ok()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(default_model);

        if flag && api_key.is_none() {
            tracing::warn!("BRIEFING_ENABLED is set but OPENAI_API_KEY is missing; briefing disabled");
        }

        Self {
            enabled: flag && api_key.is_some(),
            api_key,
            model,
        }
    }
}
