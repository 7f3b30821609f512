// Resume content generation: interview questions and labelled resume records.
// All LLM calls go through llm_client; nothing here talks HTTP directly.

pub mod handlers;
pub mod labels;
pub mod prompts;
pub mod questions;
