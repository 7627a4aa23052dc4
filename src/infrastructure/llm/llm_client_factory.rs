use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::LlmClient;
use crate::presentation::config::{LlmProvider, LlmSettings};

use super::{GeminiClient, OpenAiClient};

pub struct LlmClientFactory;

/// Clients for the two model roles. Both may point at the same model.
pub struct LlmClients {
    pub chat: Arc<dyn LlmClient>,
    pub vision: Arc<dyn LlmClient>,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmClientFactoryError {
    #[error("missing API key: {0} provider requires {1}")]
    MissingApiKey(&'static str, &'static str),
    #[error("base_url is required for the LM Studio provider")]
    MissingBaseUrl,
    #[error("client initialization failed: {0}")]
    InitializationFailed(String),
}

impl LlmClientFactory {
    pub fn create(settings: &LlmSettings) -> Result<LlmClients, LlmClientFactoryError> {
        let chat = Self::create_for_model(settings, &settings.chat_model)?;
        let vision = if settings.vision_model == settings.chat_model {
            Arc::clone(&chat)
        } else {
            Self::create_for_model(settings, &settings.vision_model)?
        };

        Ok(LlmClients { chat, vision })
    }

    fn create_for_model(
        settings: &LlmSettings,
        model: &str,
    ) -> Result<Arc<dyn LlmClient>, LlmClientFactoryError> {
        let timeout = Duration::from_secs(settings.timeout_seconds);
        let api_key = settings.api_key.clone().filter(|k| !k.trim().is_empty());

        match settings.provider {
            LlmProvider::Gemini => {
                let key =
                    api_key.ok_or(LlmClientFactoryError::MissingApiKey("gemini", "GOOGLE_API_KEY"))?;
                tracing::info!(model, "Using Gemini model");
                let client = GeminiClient::new(
                    settings.base_url.as_deref(),
                    key,
                    model,
                    settings.max_output_tokens,
                    timeout,
                )
                .map_err(|e| LlmClientFactoryError::InitializationFailed(e.to_string()))?;
                Ok(Arc::new(client))
            }
            LlmProvider::OpenAi => {
                let key =
                    api_key.ok_or(LlmClientFactoryError::MissingApiKey("openai", "OPENAI_API_KEY"))?;
                tracing::info!(model, "Using OpenAI model");
                let client = OpenAiClient::new(
                    settings.base_url.as_deref(),
                    key,
                    model,
                    settings.max_output_tokens,
                    timeout,
                )
                .map_err(|e| LlmClientFactoryError::InitializationFailed(e.to_string()))?;
                Ok(Arc::new(client))
            }
            LlmProvider::LmStudio => {
                let base_url = settings
                    .base_url
                    .as_deref()
                    .ok_or(LlmClientFactoryError::MissingBaseUrl)?;
                tracing::info!(model, base_url, "Using LM Studio model");
                let client = OpenAiClient::new(
                    Some(base_url),
                    api_key.unwrap_or_else(|| "lm-studio".to_string()),
                    model,
                    settings.max_output_tokens,
                    timeout,
                )
                .map_err(|e| LlmClientFactoryError::InitializationFailed(e.to_string()))?;
                Ok(Arc::new(client))
            }
        }
    }
}
