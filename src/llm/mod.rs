pub mod openrouter;

pub use openrouter::{LlmClient, LlmConfig, LlmError, LlmMessage};
