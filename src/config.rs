use crate::error::{Result, SqlChatError};
use crate::executor::{Database, PgDatabase};
use crate::llm::{GeminiProvider, LlmProvider, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::pipeline::{ChatPipeline, ReadOnlyGuard};
use crate::schema::IdentifierStyle;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            temperature: 0.0,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub relevance_check: bool,
    pub read_only: bool,
    pub identifier_style: IdentifierStyle,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            relevance_check: true,
            read_only: false,
            identifier_style: IdentifierStyle::default(),
        }
    }
}

/// Values from the command line or environment. `None`/`false` leaves the
/// file value in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub no_relevance_check: bool,
    pub read_only: bool,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Loads `path` when given, otherwise defaults, then applies overrides.
    pub fn load(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply(overrides);
        Ok(config)
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.database_url {
            self.database.url = Some(url);
        }
        if let Some(key) = overrides.api_key {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = overrides.model {
            self.llm.model = model;
        }
        if overrides.no_relevance_check {
            self.pipeline.relevance_check = false;
        }
        if overrides.read_only {
            self.pipeline.read_only = true;
        }
    }

    pub fn database_url(&self) -> Result<&str> {
        self.database
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                SqlChatError::Config(
                    "database url not set (use --database-url, DB_URL, or database.url)".to_string(),
                )
            })
    }

    pub fn api_key(&self) -> Result<&str> {
        self.llm
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                SqlChatError::Config(
                    "LLM api key not set (use --api-key, GOOGLE_API_KEY, or llm.api_key)".to_string(),
                )
            })
    }

    pub fn build_database(&self) -> Result<Arc<dyn Database>> {
        Ok(Arc::new(PgDatabase::from_url(self.database_url()?)?))
    }

    pub fn build_llm(&self) -> Result<Arc<dyn LlmProvider>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.llm.timeout_secs))
            .build()
            .map_err(|e| SqlChatError::Config(format!("http client: {}", e)))?;

        let provider = GeminiProvider::new(self.api_key()?, &self.llm.model)
            .with_base_url(&self.llm.base_url)
            .with_temperature(self.llm.temperature)
            .with_client(client);
        Ok(Arc::new(provider))
    }

    pub fn build_pipeline(&self) -> Result<ChatPipeline> {
        let mut pipeline = ChatPipeline::new(self.build_database()?, self.build_llm()?)
            .with_relevance_check(self.pipeline.relevance_check)
            .with_identifier_style(self.pipeline.identifier_style);
        if self.pipeline.read_only {
            pipeline = pipeline.with_guard(Arc::new(ReadOnlyGuard));
        }
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.database.url.is_none());
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.llm.timeout_secs, 60);
        assert!(config.pipeline.relevance_check);
        assert!(!config.pipeline.read_only);
        assert_eq!(config.pipeline.identifier_style, IdentifierStyle::Quoted);
    }

    #[test]
    fn test_from_file_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "database:\n  url: postgresql://app@localhost/shop\nllm:\n  model: gemini-2.0-flash\npipeline:\n  identifier_style: plain"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(
            config.database_url().unwrap(),
            "postgresql://app@localhost/shop"
        );
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.pipeline.identifier_style, IdentifierStyle::Plain);
        assert!(config.pipeline.relevance_check);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = Config::from_yaml_str("llm:\n  modle: typo\n").unwrap_err();
        assert!(matches!(err, SqlChatError::Yaml(_)));
    }

    #[test]
    fn test_empty_file_is_default() {
        assert!(Config::from_yaml_str("  \n").unwrap().pipeline.relevance_check);
    }

    #[test]
    fn test_overrides_win() {
        let mut config =
            Config::from_yaml_str("database:\n  url: postgresql://file/db\n").unwrap();
        config.apply(ConfigOverrides {
            database_url: Some("postgresql://flag/db".to_string()),
            api_key: Some("k".to_string()),
            model: None,
            no_relevance_check: true,
            read_only: true,
        });
        assert_eq!(config.database_url().unwrap(), "postgresql://flag/db");
        assert_eq!(config.api_key().unwrap(), "k");
        assert_eq!(config.llm.model, DEFAULT_GEMINI_MODEL);
        assert!(!config.pipeline.relevance_check);
        assert!(config.pipeline.read_only);
    }

    #[test]
    fn test_missing_credentials_are_config_errors() {
        let config = Config::default();
        assert!(matches!(config.database_url(), Err(SqlChatError::Config(_))));
        assert!(matches!(config.api_key(), Err(SqlChatError::Config(_))));
        assert!(config.build_pipeline().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = Config::default();
        config.apply(ConfigOverrides {
            database_url: Some("postgresql://u:hunter2@h/db".to_string()),
            api_key: Some("AIza-secret".to_string()),
            ..Default::default()
        });
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("AIza-secret"));
    }
}
