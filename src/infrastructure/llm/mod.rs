mod embedder;
mod gemini_client;
mod llm_client_factory;
mod mock_llm_client;
mod openai_client;

pub use embedder::{
    DEFAULT_LOCAL_MODEL, EmbedderFactory, EmbedderFactoryError, LocalCandleEmbedder,
    MockEmbedder, OpenAiEmbedder, mean_pool_normalized,
};
pub use gemini_client::{GEMINI_BASE_URL, GeminiClient, to_gemini_schema};
pub use llm_client_factory::{LlmClientFactory, LlmClientFactoryError, LlmClients};
pub use mock_llm_client::MockLlmClient;
pub use openai_client::{OPENAI_BASE_URL, OpenAiClient};
