//! Lexical gate in front of SQL generation.
//!
//! A question passes when any table or column name of the schema occurs as
//! a substring of the lowercased question. This is a coarse heuristic:
//! paraphrased questions that never name a table or column are rejected,
//! and short names such as `id` match inside unrelated words ("video").
//!
//! Tokens come from the table and column names themselves, not from the
//! rendered schema text, so labels like `table:` and trailing commas such as
//! `amount,` never become tokens. A question that names a column only at the
//! end of the column list is accepted here where a text-based tokenizer would
//! have missed it.

use crate::schema::SchemaDescription;
use std::collections::BTreeSet;

pub const NOT_RELEVANT_MESSAGE: &str =
    "This question is not relevant to your database. Cannot generate SQL.";

pub struct RelevanceFilter {
    tokens: BTreeSet<String>,
}

impl RelevanceFilter {
    pub fn from_schema(schema: &SchemaDescription) -> Self {
        let tokens = schema
            .identifiers()
            .flat_map(|ident| {
                ident
                    .replace('"', "")
                    .split_whitespace()
                    .map(|t| t.to_lowercase())
                    .collect::<Vec<_>>()
            })
            .collect();
        Self { tokens }
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|t| t.as_str())
    }

    /// The first schema token found in the question, if any.
    pub fn matching_token(&self, question: &str) -> Option<&str> {
        let question = question.to_lowercase();
        self.tokens().find(|token| question.contains(*token))
    }

    pub fn is_relevant(&self, question: &str) -> bool {
        self.matching_token(question).is_some()
    }
}
