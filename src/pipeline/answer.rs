use crate::error::Result;
use crate::executor::ResultSet;
use crate::llm::LlmProvider;
use std::sync::Arc;
use tracing::debug;

/// Reply the model is told to give for an empty result. Not enforced here.
pub const NO_DATA_ANSWER: &str = "No data found for the given query.";

pub fn build_answer_prompt(question: &str, sql: &str, result: &ResultSet) -> String {
    format!(
        "You are an expert data analyst.\n\
         \n\
         User question:\n\
         {question}\n\
         \n\
         SQL query:\n\
         {sql}\n\
         \n\
         Query result:\n\
         {data}\n\
         \n\
         Rules:\n\
         - Answer the question in natural language using only the query result\n\
         - Be concise and clear; do not include SQL or technical jargon\n\
         - If the query result is EMPTY, reply exactly: \"{no_data}\"\n\
         \n\
         Final Answer:\n",
        question = question,
        sql = sql,
        data = result.to_prompt_text(),
        no_data = NO_DATA_ANSWER,
    )
}

pub struct AnswerSynthesizer {
    provider: Arc<dyn LlmProvider>,
}

impl AnswerSynthesizer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub async fn synthesize(
        &self,
        question: &str,
        sql: &str,
        result: &ResultSet,
    ) -> Result<String> {
        let prompt = build_answer_prompt(question, sql, result);
        debug!(
            prompt_len = prompt.len(),
            rows = result.row_count(),
            "requesting answer"
        );
        let reply = self.provider.complete(&prompt).await?;
        Ok(reply.trim().to_string())
    }
}
