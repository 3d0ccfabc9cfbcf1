//! The answer-generation loop.
//!
//! Follows the "tools in a loop" pattern with a hard round bound:
//! 1. Send the question with the retrieval tools attached
//! 2. If the model requests tool use, execute each request and feed the
//!    results back
//! 3. After two tool rounds, call once more without tools to force a final
//!    text answer

mod generator;
mod prompt;

pub use generator::{AnswerGenerator, GenerateError};
pub use prompt::{build_system_content, SYSTEM_PROMPT};
