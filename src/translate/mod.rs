pub mod openai;
pub mod prompt;

pub use openai::*;
pub use prompt::{build_messages, extract_sql, ChatMessage, ChatRole};
