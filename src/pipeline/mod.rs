mod answer;
mod chat;
mod guard;
mod relevance;
mod sql_generator;

pub use answer::{build_answer_prompt, AnswerSynthesizer, NO_DATA_ANSWER};
pub use chat::{ChatPipeline, ChatTurn, Stage, StageFailure, EMPTY_QUESTION_MESSAGE};
pub use guard::{AllowAll, ReadOnlyGuard, SqlGuard};
pub use relevance::{RelevanceFilter, NOT_RELEVANT_MESSAGE};
pub use sql_generator::{build_sql_prompt, strip_code_fences, SqlGenerator};
