mod environment;
mod settings;

pub use environment::{ENVIRONMENT_VAR, Environment};
pub use settings::{
    AnswerSettings, ChunkingSettings, CorpusSettings, DEFAULT_CONFIG_DIR, ENV_PREFIX,
    ENV_SEPARATOR, EmbeddingProvider, EmbeddingsSettings, IndexSettings, LabReportSettings,
    LlmProvider, LlmSettings, LoggingSettings, ServerSettings, Settings,
};
