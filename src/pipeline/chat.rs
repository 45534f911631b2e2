use super::answer::AnswerSynthesizer;
use super::guard::{AllowAll, SqlGuard};
use super::relevance::{RelevanceFilter, NOT_RELEVANT_MESSAGE};
use super::sql_generator::SqlGenerator;
use crate::executor::{Database, ResultSet};
use crate::llm::LlmProvider;
use crate::schema::{IdentifierStyle, SchemaCache, SchemaIntrospector, SchemaLoad};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a question";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Input,
    Schema,
    Relevance,
    SqlGeneration,
    Validation,
    Execution,
    Answer,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Input => "input",
            Stage::Schema => "reading schema",
            Stage::Relevance => "relevance check",
            Stage::SqlGeneration => "generating SQL",
            Stage::Validation => "validating SQL",
            Stage::Execution => "executing SQL",
            Stage::Answer => "generating answer",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
}

impl StageFailure {
    fn new(stage: Stage, message: impl fmt::Display) -> Self {
        Self {
            stage,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ERROR {}: {}", self.stage, self.message)
    }
}

/// Everything one question produced. Fields after the failing stage stay
/// `None`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub id: Uuid,
    pub asked_at: DateTime<Utc>,
    pub question: String,
    pub sql: Option<String>,
    pub result: Option<ResultSet>,
    pub answer: Option<String>,
    /// Problems that did not stop the request (a degraded schema read).
    pub notices: Vec<StageFailure>,
    pub failure: Option<StageFailure>,
    pub elapsed_ms: u64,
}

impl ChatTurn {
    fn start(question: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            asked_at: Utc::now(),
            question: question.to_string(),
            sql: None,
            result: None,
            answer: None,
            notices: Vec::new(),
            failure: None,
            elapsed_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

pub struct ChatPipeline {
    database: Arc<dyn Database>,
    schema_cache: SchemaCache,
    generator: SqlGenerator,
    synthesizer: AnswerSynthesizer,
    guard: Arc<dyn SqlGuard>,
    relevance_check: bool,
}

impl ChatPipeline {
    pub fn new(database: Arc<dyn Database>, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            database,
            schema_cache: SchemaCache::new(SchemaIntrospector::default()),
            generator: SqlGenerator::new(Arc::clone(&llm)),
            synthesizer: AnswerSynthesizer::new(llm),
            guard: Arc::new(AllowAll),
            relevance_check: true,
        }
    }

    pub fn with_guard(mut self, guard: Arc<dyn SqlGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_relevance_check(mut self, enabled: bool) -> Self {
        self.relevance_check = enabled;
        self
    }

    pub fn with_identifier_style(mut self, style: IdentifierStyle) -> Self {
        self.schema_cache = SchemaCache::new(SchemaIntrospector::new(style));
        self
    }

    pub fn database(&self) -> &dyn Database {
        self.database.as_ref()
    }

    pub async fn schema(&self) -> SchemaLoad {
        self.schema_cache.get(self.database.as_ref()).await
    }

    pub async fn refresh_schema(&self) {
        self.schema_cache.refresh().await;
    }

    /// Runs one question through the pipeline. Failures are recorded on the
    /// returned turn; this never errors.
    pub async fn ask(&self, question: &str) -> ChatTurn {
        let mut turn = ChatTurn::start(question);
        let span = info_span!("ask", request_id = %turn.id);
        let started = Instant::now();

        self.run(&mut turn).instrument(span).await;

        turn.elapsed_ms = started.elapsed().as_millis() as u64;
        turn
    }

    async fn run(&self, turn: &mut ChatTurn) {
        let question = turn.question.trim().to_string();
        if question.is_empty() {
            turn.failure = Some(StageFailure::new(Stage::Input, EMPTY_QUESTION_MESSAGE));
            return;
        }

        let load = self.schema().await;
        if let Some(e) = load.error {
            turn.notices.push(StageFailure::new(Stage::Schema, e));
        }
        let schema = load.schema;

        if self.relevance_check {
            let filter = RelevanceFilter::from_schema(&schema);
            match filter.matching_token(&question) {
                Some(token) => info!(token, "question passed relevance check"),
                None => {
                    info!("question rejected by relevance check");
                    turn.failure = Some(StageFailure::new(Stage::Relevance, NOT_RELEVANT_MESSAGE));
                    return;
                }
            }
        }

        let sql = match self.generator.generate(&question, &schema).await {
            Ok(sql) => sql,
            Err(e) => {
                warn!("sql generation failed: {}", e);
                turn.failure = Some(StageFailure::new(Stage::SqlGeneration, e));
                return;
            }
        };
        turn.sql = Some(sql.clone());

        if let Err(e) = self.guard.check(&sql) {
            warn!(guard = self.guard.name(), "generated sql rejected: {}", e);
            turn.failure = Some(StageFailure::new(Stage::Validation, e));
            return;
        }

        let result = match self.database.execute(&sql).await {
            Ok(result) => result,
            Err(e) => {
                warn!("sql execution failed: {}", e);
                turn.failure = Some(StageFailure::new(Stage::Execution, e));
                return;
            }
        };
        info!(rows = result.row_count(), "query executed");

        let answer = self.synthesizer.synthesize(&question, &sql, &result).await;
        turn.result = Some(result);
        match answer {
            Ok(answer) => turn.answer = Some(answer),
            Err(e) => {
                warn!("answer generation failed: {}", e);
                turn.failure = Some(StageFailure::new(Stage::Answer, e));
            }
        }
    }
}
