use crate::error::Result;
use crate::llm::LlmProvider;
use crate::schema::SchemaDescription;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info};

static FENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:sql)?").expect("fence pattern regex is valid"));

/// Removes every "```sql" and "```" marker, then surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    FENCE_PATTERN.replace_all(raw, "").trim().to_string()
}

pub fn build_sql_prompt(schema: &SchemaDescription, question: &str) -> String {
    format!(
        "You are an expert SQL generator.\n\
         \n\
         Database schema:\n\
         {schema}\n\
         \n\
         User request:\n\
         {question}\n\
         \n\
         Rules:\n\
         - Generate a valid PostgreSQL query that answers the request\n\
         - Table and column names are CASE-SENSITIVE\n\
         - Always use double quotes for table and column names\n\
         - Output ONLY the SQL query\n\
         - Do NOT return anything except SQL\n\
         \n\
         SQL Query:\n",
        schema = schema.render(),
        question = question,
    )
}

pub struct SqlGenerator {
    provider: Arc<dyn LlmProvider>,
}

impl SqlGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Asks the model for SQL. The reply is not parsed or checked.
    pub async fn generate(&self, question: &str, schema: &SchemaDescription) -> Result<String> {
        let prompt = build_sql_prompt(schema, question);
        debug!(prompt_len = prompt.len(), provider = self.provider.name(), "requesting sql");
        let raw = self.provider.complete(&prompt).await?;
        let sql = strip_code_fences(&raw);
        info!(sql = %sql, "sql generated");
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CatalogColumn;
    use crate::testing::ScriptedLlm;

    fn schema() -> SchemaDescription {
        SchemaDescription::from_catalog(vec![
            CatalogColumn::new("orders", "id"),
            CatalogColumn::new("orders", "Amount"),
        ])
    }

    #[test]
    fn test_strip_sql_fence() {
        assert_eq!(strip_code_fences("```sql\nSELECT 1;\n```"), "SELECT 1;");
    }

    #[test]
    fn test_strip_bare_fence_and_whitespace() {
        assert_eq!(
            strip_code_fences("  ```\nSELECT * FROM \"orders\";\n```  \n"),
            "SELECT * FROM \"orders\";"
        );
        assert_eq!(strip_code_fences("SELECT 2"), "SELECT 2");
    }

    #[test]
    fn test_strip_removes_inner_markers_too() {
        assert_eq!(
            strip_code_fences("```sql\nSELECT 1;\n```\n```sql\nSELECT 2;\n```"),
            "SELECT 1;\n\n\nSELECT 2;"
        );
    }

    #[test]
    fn test_prompt_embeds_schema_and_question_verbatim() {
        let schema = schema();
        let prompt = build_sql_prompt(&schema, "Total Amount per order?");
        assert!(prompt.contains(&schema.render()));
        assert!(prompt.contains("Total Amount per order?"));
        assert!(prompt.contains("double quotes"));
        assert!(prompt.contains("Output ONLY the SQL query"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let schema = schema();
        assert_eq!(
            build_sql_prompt(&schema, "count orders"),
            build_sql_prompt(&schema, "count orders")
        );
    }

    #[tokio::test]
    async fn test_generate_strips_reply() {
        let llm = Arc::new(ScriptedLlm::new(["```sql\nSELECT COUNT(*) FROM \"orders\";\n```"]));
        let generator = SqlGenerator::new(llm.clone());

        let sql = generator.generate("how many orders", &schema()).await.unwrap();

        assert_eq!(sql, "SELECT COUNT(*) FROM \"orders\";");
        assert_eq!(llm.calls(), 1);
        assert!(llm.prompts()[0].contains("how many orders"));
    }

    #[tokio::test]
    async fn test_generate_propagates_llm_failure() {
        let generator = SqlGenerator::new(Arc::new(ScriptedLlm::failing("timeout")));
        let err = generator.generate("q", &schema()).await.unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }
}
