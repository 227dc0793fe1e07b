use anyhow::{Context, Result};

const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct Config {
    // Translation oracle (OpenAI-compatible chat completions)
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_api_url: String,
    pub openai_temperature: f32,

    // Content
    pub content_config_path: String,
    pub database_url: Option<String>,

    // Server
    pub api_key: Option<String>,
    pub port: u16,
    pub translate_disabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // A missing key is reported per request, not at startup
            openai_api_key: optional_var("TRANSLATE_API_KEY")
                .or_else(|| optional_var("OPENAI_API_KEY")),
            openai_model: optional_var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            openai_api_url: optional_var("OPENAI_API_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_API_URL.to_string()),
            openai_temperature: match optional_var("OPENAI_TEMPERATURE") {
                Some(v) => v
                    .parse()
                    .with_context(|| format!("OPENAI_TEMPERATURE is not a number: {}", v))?,
                None => 0.2,
            },

            content_config_path: optional_var("CONTENT_CONFIG")
                .unwrap_or_else(|| "content.json".to_string()),
            database_url: optional_var("DATABASE_URL"),

            api_key: optional_var("API_KEY"),
            port: match optional_var("PORT") {
                Some(v) => v.parse().with_context(|| format!("PORT is not a valid port: {}", v))?,
                None => 8080,
            },
            translate_disabled: optional_var("TRANSLATE_DISABLED")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }
}

/// Read an environment variable, treating blank values as unset
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
