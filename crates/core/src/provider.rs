use crate::error::{CourtsideError, Result};

/// AI services that can be asked to analyze a tennis video.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    Gemini,
    Openai,
    Grok,
}

/// Wire protocol spoken by a provider's endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderApi {
    /// Gemini `generateContent`. The video travels as a `file_data` part and the
    /// reply is constrained to a JSON schema.
    GenerateContent,
    /// OpenAI-compatible chat completions in JSON mode.
    ChatCompletions,
}

pub struct ProviderConfig {
    pub api: ProviderApi,
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Gemini => ProviderConfig {
                api: ProviderApi::GenerateContent,
                api_url: "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent",
                model: "gemini-2.5-flash",
                env_var: "GEMINI_API_KEY",
            },
            Provider::Openai => ProviderConfig {
                api: ProviderApi::ChatCompletions,
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-5.1",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Grok => ProviderConfig {
                api: ProviderApi::ChatCompletions,
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Openai => "OpenAI",
            Provider::Grok => "Grok",
        }
    }

    /// Short lowercase id, used in cache file names.
    pub fn id(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::Openai => "openai",
            Provider::Grok => "grok",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "gemini" => Some(Provider::Gemini),
            "openai" => Some(Provider::Openai),
            "grok" => Some(Provider::Grok),
            _ => None,
        }
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String> {
        let config = self.config();
        match std::env::var(config.env_var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(CourtsideError::MissingApiKey {
                env_var: config.env_var.to_string(),
            }),
        }
    }
}
