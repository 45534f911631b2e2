mod gemini;
mod provider;

pub use gemini::{GeminiProvider, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
pub use provider::{LlmError, LlmProvider};
