//! Document layout engine: turns resume records into a paginated PDF.
//!
//! Pure in-memory computation; callers on the async runtime must run it
//! inside `tokio::task::spawn_blocking`.

pub mod canvas;
pub mod engine;
pub mod font_metrics;
pub mod fonts;
pub mod geometry;
pub mod header;
pub mod output;
pub mod pdf;
pub mod subset;
pub mod wrap;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::models::resume::ResumeRecord;

// Re-export the public API consumed by the handlers.
pub use engine::LayoutEngine;
pub use fonts::FontSet;
pub use geometry::PageGeometry;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("malformed resume data: {0}")]
    MalformedInput(String),

    #[error("invalid page geometry: {0}")]
    InvalidGeometry(String),

    #[error("output encoding failed: {0}")]
    OutputEncoding(String),

    #[error("PDF serialization failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error while rendering: {0}")]
    Io(#[from] std::io::Error),
}

/// Coerces loosely-typed `resume_data` into records.
///
/// The top level must be an array; anything else is rejected before any
/// layout work. Elements that are not objects are skipped with a warning.
pub fn parse_resume_data(resume_data: &Value) -> Result<Vec<ResumeRecord>, LayoutError> {
    let Value::Array(items) = resume_data else {
        return Err(LayoutError::MalformedInput(format!(
            "resume_data must be a list, got {}",
            json_type_name(resume_data)
        )));
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match ResumeRecord::from_loose_json(item) {
            Some(record) => records.push(record),
            None => warn!(
                index,
                kind = json_type_name(item),
                "Skipping resume_data element that is not an object"
            ),
        }
    }
    Ok(records)
}

/// Lays out `resume_data` on A4 with the given fonts and returns PDF bytes.
pub fn generate(resume_data: &Value, fonts: &FontSet) -> Result<Vec<u8>, LayoutError> {
    let records = parse_resume_data(resume_data)?;
    generate_records(&records, fonts)
}

/// Typed entry point for callers that already hold records.
pub fn generate_records(records: &[ResumeRecord], fonts: &FontSet) -> Result<Vec<u8>, LayoutError> {
    LayoutEngine::new(PageGeometry::a4(), fonts.clone())?.generate(records)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_list_input_is_rejected() {
        let fonts = FontSet::fallback();
        for input in [json!({"label": "a"}), json!("text"), json!(null), json!(3)] {
            let err = generate(&input, &fonts).unwrap_err();
            assert!(matches!(err, LayoutError::MalformedInput(_)), "{input}");
        }
    }

    #[test]
    fn test_non_object_elements_are_skipped() {
        let records = parse_resume_data(&json!([
            {"label": "Skills", "value": "Rust"},
            "stray",
            42,
            {"label": "Years", "value": 7}
        ]))
        .unwrap();
        assert_eq!(
            records,
            vec![
                ResumeRecord::new("Skills", "Rust"),
                ResumeRecord::new("Years", "7")
            ]
        );
    }

    #[test]
    fn test_generate_empty_list_returns_pdf_bytes() {
        let bytes = generate(&json!([]), &FontSet::fallback()).unwrap();
        assert!(!bytes.is_empty());
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(lopdf::Document::load_mem(&bytes).is_ok());
    }

    #[test]
    fn test_generate_long_token_survives() {
        let input = json!([{"label": "Skills", "value": "a".repeat(500)}]);
        let bytes = generate(&input, &FontSet::fallback()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_embedded_fonts_are_subset_when_installed() {
        let dir = std::path::Path::new("/usr/share/fonts/truetype/dejavu");
        let fonts = FontSet::load(dir);
        if fonts.family() != font_metrics::FontFamily::DejaVuSans {
            return;
        }
        let input = json!([
            {"label": "Имя", "value": "Иван Иванов"},
            {"label": "email", "value": "i@example.com"},
            {"label": "Hard skills", "value": "Python, Docker"}
        ]);
        let bytes = generate(&input, &fonts).unwrap();
        assert!(bytes.len() < 100_000, "document is {} bytes", bytes.len());

        let text = pdf_extract::extract_text_from_mem(&bytes).unwrap();
        assert!(text.contains("Иван Иванов"), "got: {text}");
        assert!(text.contains("Python, Docker"), "got: {text}");
    }

    #[test]
    fn test_generate_example_with_cyrillic_under_fallback() {
        let input = json!([
            {"label": "Имя", "value": "Иван Иванов"},
            {"label": "email", "value": "i@example.com"},
            {"label": "Hard skills", "value": "Python, Docker"}
        ]);
        let bytes = generate(&input, &FontSet::fallback()).unwrap();
        let text = pdf_extract::extract_text_from_mem(&bytes).unwrap();
        assert!(text.contains("i@example.com"));
        assert!(text.contains("Hard skills:"));
        assert!(!text.contains("email:"));
    }
}
