pub mod config;
pub mod error;
pub mod executor;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod repl;
pub mod schema;
pub mod testing;

pub use config::{Config, ConfigOverrides, DatabaseConfig, LlmConfig, PipelineConfig};
pub use error::{Result, SqlChatError};
pub use executor::{Cell, Database, PgDatabase, ResultSet, ResultSetBuilder, EMPTY_RESULT_MARKER};
pub use llm::{GeminiProvider, LlmError, LlmProvider};
pub use pipeline::{
    build_answer_prompt, build_sql_prompt, strip_code_fences, AllowAll, AnswerSynthesizer,
    ChatPipeline, ChatTurn, ReadOnlyGuard, RelevanceFilter, SqlGenerator, SqlGuard, Stage,
    StageFailure, NO_DATA_ANSWER, NOT_RELEVANT_MESSAGE,
};
pub use repl::{InteractiveRepl, OutputFormat, ReplCommand, ReplResult};
pub use schema::{
    CatalogColumn, IdentifierStyle, SchemaCache, SchemaDescription, SchemaIntrospector,
    SchemaLoad, TableColumns,
};
