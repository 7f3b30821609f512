//! Resume label extraction and section regeneration.
//!
//! Both ask the LLM for a flat JSON object of `section → text` and turn it into
//! ordered records. Key order is the model's order (`preserve_order`).

use serde_json::Value;
use tracing::info;

use crate::generation::prompts::{
    with_json_rules, LABELS_INSTRUCTION, LABELS_SYSTEM_TEMPLATE, REGENERATE_PROMPT_TEMPLATE,
};
use crate::llm_client::prompts::format_answers;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::resume::{value_to_text, ResumeRecord};

/// Extracts resume sections from questionnaire answers.
pub async fn extract_labels(
    answers: &[(String, String)],
    llm: &LlmClient,
) -> Result<Vec<ResumeRecord>, LlmError> {
    let prompt = format!("{}{LABELS_INSTRUCTION}", format_answers(answers));
    let system = with_json_rules(LABELS_SYSTEM_TEMPLATE);

    let raw: Value = llm.call_json(&prompt, &system).await?;
    let records = records_from_json_object(raw)?;
    info!(answers = answers.len(), labels = records.len(), "Labels extracted");
    Ok(records)
}

/// Rewrites an existing section with additional information from the user.
pub async fn regenerate_section(
    current_text: &str,
    new_info: &str,
    llm: &LlmClient,
) -> Result<Vec<ResumeRecord>, LlmError> {
    let prompt = REGENERATE_PROMPT_TEMPLATE
        .replace("{current_text}", current_text)
        .replace("{new_info}", new_info);
    let system = with_json_rules(LABELS_SYSTEM_TEMPLATE);

    let raw: Value = llm.call_json(&prompt, &system).await?;
    let records = records_from_json_object(raw)?;
    info!(labels = records.len(), "Section regenerated");
    Ok(records)
}

/// Flattens a `label → value` object into records, coercing non-string values.
pub fn records_from_json_object(raw: Value) -> Result<Vec<ResumeRecord>, LlmError> {
    match raw {
        Value::Object(object) => Ok(object
            .into_iter()
            .map(|(label, value)| ResumeRecord::new(label, value_to_text(&value)))
            .collect()),
        other => Err(LlmError::UnexpectedShape(format!(
            "expected a JSON object of sections, got {other}"
        ))),
    }
}
