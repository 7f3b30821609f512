// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Output rules appended to every system prompt. The client requests
/// `json_object` mode, but not every model behind the endpoint honours it.
pub const JSON_ONLY_RULES: &str = "\
- Отвечай только JSON, без пояснений до или после.
- Обязательно используй ДВОЙНЫЕ кавычки для строк и ключей.
- Никаких markdown-блоков (```json ```), только чистый JSON.";

/// Renders questionnaire answers as `Q:`/`A:` pairs, one block per answer, in order.
pub fn format_answers(answers: &[(String, String)]) -> String {
    answers
        .iter()
        .map(|(question, answer)| format!("Q: {question}\nA: {answer}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_answers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(q, a)| (q.to_string(), a.to_string()))
            .collect()
    }

    #[test]
    fn test_format_answers_keeps_order() {
        let answers = make_answers(&[("Опыт?", "5 лет"), ("Языки?", "Rust, Go")]);
        assert_eq!(
            format_answers(&answers),
            "Q: Опыт?\nA: 5 лет\nQ: Языки?\nA: Rust, Go"
        );
    }

    #[test]
    fn test_format_answers_empty() {
        assert_eq!(format_answers(&[]), "");
    }
}
