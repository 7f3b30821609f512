use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One (label, value) fact about the candidate.
///
/// Order matters: records are rendered in the order they were produced, and
/// duplicate labels are kept as separate entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub label: String,
    pub value: String,
}

impl ResumeRecord {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Builds a record from an untrusted JSON object, coercing non-string fields.
    /// Returns `None` when `raw` is not an object.
    pub fn from_loose_json(raw: &Value) -> Option<Self> {
        let object = raw.as_object()?;
        Some(Self {
            label: object.get("label").map(value_to_text).unwrap_or_default(),
            value: object.get("value").map(value_to_text).unwrap_or_default(),
        })
    }

    /// A record is renderable only if both sides carry visible text.
    pub fn is_blank(&self) -> bool {
        self.label.trim().is_empty() || self.value.trim().is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Questionnaire answers keyed by question text, in submission order.
#[derive(Debug, Deserialize)]
pub struct AnswersRequest {
    pub answers: Map<String, Value>,
}

impl AnswersRequest {
    /// Question/answer pairs with answers flattened to text.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.answers
            .iter()
            .map(|(question, answer)| (question.clone(), value_to_text(answer)))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct RegenerateRequest {
    pub current_text: String,
    pub new_info: String,
}

/// `resume_data` is deliberately untyped; the layout engine validates it.
#[derive(Debug, Deserialize)]
pub struct PdfRequest {
    #[serde(default)]
    pub resume_data: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionsResponse {
    pub questions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LabelsResponse {
    pub labels: Vec<ResumeRecord>,
}

/// Flattens a loosely-typed JSON value into display text.
///
/// Strings pass through, scalars are stringified, arrays are joined with `", "`,
/// `null` becomes empty. Nested objects fall back to their compact JSON form.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_to_text_scalars() {
        assert_eq!(value_to_text(&json!("Rust")), "Rust");
        assert_eq!(value_to_text(&json!(5)), "5");
        assert_eq!(value_to_text(&json!(true)), "true");
        assert_eq!(value_to_text(&Value::Null), "");
    }

    #[test]
    fn test_value_to_text_joins_arrays() {
        let skills = json!(["Python", "Docker", "", 3]);
        assert_eq!(value_to_text(&skills), "Python, Docker, 3");
    }

    #[test]
    fn test_from_loose_json_coerces_fields() {
        let raw = json!({"label": "Опыт", "value": 7});
        let record = ResumeRecord::from_loose_json(&raw).unwrap();
        assert_eq!(record, ResumeRecord::new("Опыт", "7"));
    }

    #[test]
    fn test_from_loose_json_missing_fields_are_empty() {
        let record = ResumeRecord::from_loose_json(&json!({"label": "Skills"})).unwrap();
        assert_eq!(record.value, "");
        assert!(record.is_blank());
    }

    #[test]
    fn test_from_loose_json_rejects_non_objects() {
        assert!(ResumeRecord::from_loose_json(&json!("label")).is_none());
        assert!(ResumeRecord::from_loose_json(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_answers_pairs_keep_submission_order() {
        let request: AnswersRequest = serde_json::from_value(json!({
            "answers": {"Языки?": "Rust", "Опыт?": 5, "Базы?": ["Postgres", "Redis"]}
        }))
        .unwrap();
        assert_eq!(
            request.pairs(),
            vec![
                ("Языки?".to_string(), "Rust".to_string()),
                ("Опыт?".to_string(), "5".to_string()),
                ("Базы?".to_string(), "Postgres, Redis".to_string()),
            ]
        );
    }

    #[test]
    fn test_pdf_request_without_resume_data_is_null() {
        let request: PdfRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.resume_data.is_null());
    }

    #[test]
    fn test_whitespace_only_record_is_blank() {
        assert!(ResumeRecord::new("   ", "x").is_blank());
        assert!(ResumeRecord::new("Skills", " \n ").is_blank());
        assert!(!ResumeRecord::new("Skills", "Rust").is_blank());
    }
}
