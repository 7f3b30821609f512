//! Axum route handlers for the Resume API.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, info_span};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::labels::{extract_labels, regenerate_section};
use crate::generation::questions::{base_questions, follow_up_questions};
use crate::layout;
use crate::models::resume::{
    AnswersRequest, LabelsResponse, PdfRequest, QuestionsResponse, RegenerateRequest,
};
use crate::state::AppState;

pub const PDF_FILENAME: &str = "resume_summary.pdf";

fn require_answers(request: &AnswersRequest) -> Result<Vec<(String, String)>, AppError> {
    if request.answers.is_empty() {
        return Err(AppError::Validation("answers cannot be empty".to_string()));
    }
    Ok(request.pairs())
}

/// GET /api/v001/resume/basic/question
///
/// Returns the fixed first-stage questionnaire.
pub async fn handle_base_questions() -> Json<QuestionsResponse> {
    Json(QuestionsResponse {
        questions: base_questions(),
    })
}

/// POST /api/v001/resume/question/get
///
/// Generates clarifying questions from the first-stage answers.
pub async fn handle_follow_up_questions(
    State(state): State<AppState>,
    Json(request): Json<AnswersRequest>,
) -> Result<Json<QuestionsResponse>, AppError> {
    let answers = require_answers(&request)?;
    let questions = follow_up_questions(&answers, &state.llm).await?;
    Ok(Json(QuestionsResponse { questions }))
}

/// POST /api/v001/resume/label/generate
///
/// Turns all answers into ordered resume records.
pub async fn handle_generate_labels(
    State(state): State<AppState>,
    Json(request): Json<AnswersRequest>,
) -> Result<Json<LabelsResponse>, AppError> {
    let answers = require_answers(&request)?;
    let labels = extract_labels(&answers, &state.llm).await?;
    Ok(Json(LabelsResponse { labels }))
}

/// POST /api/v001/resume/label/regenerate
///
/// Rewrites a section with extra information from the user.
pub async fn handle_regenerate_labels(
    State(state): State<AppState>,
    Json(request): Json<RegenerateRequest>,
) -> Result<Json<LabelsResponse>, AppError> {
    if request.new_info.trim().is_empty() {
        return Err(AppError::Validation("new_info cannot be empty".to_string()));
    }
    let labels = regenerate_section(&request.current_text, &request.new_info, &state.llm).await?;
    Ok(Json(LabelsResponse { labels }))
}

/// POST /api/v001/resume/pdf/generate
///
/// Lays out `resume_data` and returns the PDF as a download. A fresh engine is
/// built per request on the blocking pool; engines are never shared.
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    Json(request): Json<PdfRequest>,
) -> Result<Response, AppError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("generate_pdf", %request_id);
    let fonts = state.fonts.clone();

    let bytes = tokio::task::spawn_blocking(move || {
        let _enter = span.enter();
        layout::generate(&request.resume_data, &fonts)
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))??;

    info!(%request_id, bytes = bytes.len(), "PDF generated");

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{PDF_FILENAME}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}
