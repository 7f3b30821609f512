//! The fixed questionnaire and LLM-generated follow-up questions.

use serde_json::Value;
use tracing::info;

use crate::generation::prompts::{
    with_json_rules, FOLLOW_UP_HEADER, FOLLOW_UP_INSTRUCTION, FOLLOW_UP_SYSTEM_TEMPLATE,
};
use crate::llm_client::{LlmClient, LlmError};

/// First-stage questionnaire shown to every user.
pub const BASE_QUESTIONS: [&str; 10] = [
    "Сколько лет вы занимаетесь программированием?",
    "С какими языками программирования работали?",
    "Какие используете фреймворки/библиотеки?",
    "Есть ли у вас опыт разработки бэкенда? Если да, то с какими технологиями?",
    "Есть ли у вас опыт фронтенда? Если да, то с какими технологиями?",
    "Занимались ли вы DevOps-задачами? (CI/CD, Docker, Kubernetes и т.д.)",
    "Работали ли с системами контроля версий (Git и т.д.)?",
    "Приходилось ли взаимодействовать с базами данных? Какими именно?",
    "У вас есть опыт работы с микросервисной архитектурой?",
    "Есть ли у вас опыт в сфере Machine Learning, Data Science или других специализированных областях?",
];

pub fn base_questions() -> Vec<String> {
    BASE_QUESTIONS.iter().map(|q| q.to_string()).collect()
}

/// Asks the LLM for clarifying questions about the given answers.
pub async fn follow_up_questions(
    answers: &[(String, String)],
    llm: &LlmClient,
) -> Result<Vec<String>, LlmError> {
    let listed: Vec<String> = answers.iter().map(|(q, a)| format!("- {q}: {a}")).collect();
    let prompt = format!("{FOLLOW_UP_HEADER}{}{FOLLOW_UP_INSTRUCTION}", listed.join("\n"));
    let system = with_json_rules(FOLLOW_UP_SYSTEM_TEMPLATE);

    let raw: Value = llm.call_json(&prompt, &system).await?;
    let questions = questions_from_json(raw)?;
    info!(count = questions.len(), "Follow-up questions generated");
    Ok(questions)
}

/// Accepts either `{"questions": [..]}` or a bare array; every item must be a string.
pub fn questions_from_json(raw: Value) -> Result<Vec<String>, LlmError> {
    let items = match raw {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("questions") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(LlmError::UnexpectedShape(
                    "object without a \"questions\" array".to_string(),
                ))
            }
        },
        other => {
            return Err(LlmError::UnexpectedShape(format!(
                "expected an object or array, got {other}"
            )))
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(LlmError::UnexpectedShape(format!(
                "question is not a string: {other}"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::test_support::spawn_stub;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_base_questionnaire_has_ten_unique_questions() {
        let questions = base_questions();
        assert_eq!(questions.len(), 10);
        let mut unique = questions.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 10);
    }

    #[test]
    fn test_questions_from_object() {
        let questions = questions_from_json(json!({"questions": ["a?", "b?"]})).unwrap();
        assert_eq!(questions, vec!["a?", "b?"]);
    }

    #[test]
    fn test_questions_from_bare_array() {
        let questions = questions_from_json(json!(["a?"])).unwrap();
        assert_eq!(questions, vec!["a?"]);
    }

    #[test]
    fn test_non_string_question_is_rejected() {
        let err = questions_from_json(json!({"questions": ["a?", 3]})).unwrap_err();
        assert!(matches!(err, LlmError::UnexpectedShape(_)));
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        assert!(questions_from_json(json!({"items": ["a?"]})).is_err());
        assert!(questions_from_json(json!("a?")).is_err());
    }

    #[tokio::test]
    async fn test_follow_up_questions_through_client() {
        let llm = spawn_stub(
            StatusCode::OK,
            "\\boxed{\"questions\": [\"Как вы использовали Docker?\"]}",
        )
        .await;
        let answers = vec![("Инструменты?".to_string(), "Docker".to_string())];
        let questions = follow_up_questions(&answers, &llm).await.unwrap();
        assert_eq!(questions, vec!["Как вы использовали Docker?"]);
    }
}
