use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::application::services::{
    AnswerMode, AnswerOptions, IngestionOptions, LabReportOptions,
};
use crate::infrastructure::llm::DEFAULT_LOCAL_MODEL;

use super::Environment;

pub const ENV_PREFIX: &str = "CAREGRAPH";
pub const ENV_SEPARATOR: &str = "__";
pub const DEFAULT_CONFIG_DIR: &str = "config";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub index: IndexSettings,
    pub corpus: CorpusSettings,
    pub embeddings: EmbeddingsSettings,
    pub chunking: ChunkingSettings,
    pub llm: LlmSettings,
    pub answer: AnswerSettings,
    pub lab_report: LabReportSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexSettings {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorpusSettings {
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsSettings {
    pub provider: EmbeddingProvider,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    Local,
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    pub chat_model: String,
    pub vision_model: String,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "lmstudio")]
    LmStudio,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerSettings {
    pub mode: AnswerMode,
    pub top_k: usize,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabReportSettings {
    pub top_k: usize,
    pub vision_temperature: f32,
    pub reasoning_temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Settings {
    /// Layers defaults, `config/{environment}.toml`, `CAREGRAPH__SECTION__KEY`
    /// variables and the well-known overrides from the process environment.
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(environment, Path::new(DEFAULT_CONFIG_DIR), &vars)
    }

    pub fn load_from(
        environment: Environment,
        config_dir: &Path,
        vars: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let file_name = format!("{}.toml", environment.as_str().to_lowercase());

        let configuration = Self::with_defaults(Config::builder())?
            .add_source(File::from(config_dir.join(file_name)).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            )
            .set_override_option(
                "index.dir",
                INDEX_DIR_VARS.iter().find_map(|key| non_empty(vars, key)),
            )?
            .build()?;

        let mut settings: Settings = configuration.try_deserialize()?;
        settings.apply_api_key_fallbacks(vars);
        Ok(settings)
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.max_upload_bytes", 25 * 1024 * 1024)?
            .set_default("index.dir", "medical_db")?
            .set_default("corpus.data_dir", "data")?
            .set_default("corpus.uploads_dir", "uploads")?
            .set_default("embeddings.provider", "local")?
            .set_default("embeddings.model", DEFAULT_LOCAL_MODEL)?
            .set_default("embeddings.batch_size", 32)?
            .set_default("chunking.chunk_size", 800)?
            .set_default("chunking.chunk_overlap", 100)?
            .set_default("llm.provider", "gemini")?
            .set_default("llm.chat_model", "gemini-2.5-flash")?
            .set_default("llm.vision_model", "gemini-2.5-flash")?
            .set_default("llm.timeout_seconds", 120)?
            .set_default("answer.mode", "structured")?
            .set_default("answer.top_k", 3)?
            .set_default("answer.temperature", 0.1)?
            .set_default("lab_report.top_k", 4)?
            .set_default("lab_report.vision_temperature", 0.1)?
            .set_default("lab_report.reasoning_temperature", 0.2)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)
    }

    /// Provider keys come from the variables each vendor documents unless set explicitly.
    fn apply_api_key_fallbacks(&mut self, vars: &HashMap<String, String>) {
        if self.llm.api_key.as_deref().is_none_or(str::is_empty) {
            self.llm.api_key = match self.llm.provider {
                LlmProvider::Gemini => non_empty(vars, "GOOGLE_API_KEY"),
                LlmProvider::OpenAi | LlmProvider::LmStudio => non_empty(vars, "OPENAI_API_KEY"),
            };
        }

        if self.embeddings.provider == EmbeddingProvider::OpenAi
            && self.embeddings.api_key.as_deref().is_none_or(str::is_empty)
        {
            self.embeddings.api_key = non_empty(vars, "OPENAI_API_KEY");
        }
    }

    pub fn answer_options(&self) -> AnswerOptions {
        AnswerOptions {
            mode: self.answer.mode,
            top_k: self.answer.top_k,
            temperature: self.answer.temperature,
        }
    }

    pub fn lab_report_options(&self) -> LabReportOptions {
        LabReportOptions {
            top_k: self.lab_report.top_k,
            vision_temperature: self.lab_report.vision_temperature,
            reasoning_temperature: self.lab_report.reasoning_temperature,
        }
    }

    pub fn ingestion_options(&self) -> IngestionOptions {
        IngestionOptions {
            embedding_batch_size: self.embeddings.batch_size,
            ..IngestionOptions::default()
        }
    }
}

/// Index directory overrides, highest precedence first. `FAISS_DIR` is the legacy name.
const INDEX_DIR_VARS: [&str; 2] = ["VECTOR_INDEX_DIR", "FAISS_DIR"];

fn non_empty(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
