//! In-process stand-ins for the database and the LLM, used by the test
//! suites and by anyone embedding the pipeline without a live backend.

use crate::error::{Result, SqlChatError};
use crate::executor::{Database, ResultSet};
use crate::llm::{LlmError, LlmProvider};
use crate::schema::CatalogColumn;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type Outcome<T> = std::result::Result<T, String>;

/// Database double keyed on exact SQL text. Unknown SQL behaves like a
/// statement without a row set.
pub struct FakeDatabase {
    catalog: Outcome<Vec<CatalogColumn>>,
    results: HashMap<String, Outcome<ResultSet>>,
    catalog_calls: AtomicUsize,
    executed: Mutex<Vec<String>>,
}

impl FakeDatabase {
    pub fn new(catalog: Vec<CatalogColumn>) -> Self {
        Self {
            catalog: Ok(catalog),
            results: HashMap::new(),
            catalog_calls: AtomicUsize::new(0),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_catalog(message: impl Into<String>) -> Self {
        let mut db = Self::new(Vec::new());
        db.catalog = Err(message.into());
        db
    }

    pub fn with_result(mut self, sql: impl Into<String>, result: ResultSet) -> Self {
        self.results.insert(sql.into(), Ok(result));
        self
    }

    pub fn with_error(mut self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        self.results.insert(sql.into(), Err(message.into()));
        self
    }

    pub fn catalog_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Database for FakeDatabase {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogColumn>> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        self.catalog.clone().map_err(SqlChatError::Schema)
    }

    async fn execute(&self, sql: &str) -> Result<ResultSet> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }
        match self.results.get(sql) {
            Some(Ok(rs)) => Ok(rs.clone()),
            Some(Err(message)) => Err(SqlChatError::Execution(message.clone())),
            None => Ok(ResultSet::empty()),
        }
    }

    fn describe(&self) -> String {
        "fake://in-memory".to_string()
    }
}

/// LLM double that replays canned replies in order and records prompts.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Outcome<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        let llm = Self::new(Vec::<String>::new());
        if let Ok(mut replies) = llm.replies.lock() {
            replies.push_back(Err(message.into()));
        }
        llm
    }

    pub fn then_fail(self, message: impl Into<String>) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Err(message.into()));
        }
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.prompts().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> std::result::Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let next = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front());
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(LlmError::Http(message)),
            None => Err(LlmError::Parse("no scripted reply left".to_string())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
