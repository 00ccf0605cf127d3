use axum::Json;

use crate::email::draft_email;
use crate::models::{AnalysisResult, EmailDraft};

pub async fn email_draft_handler(Json(analysis): Json<AnalysisResult>) -> Json<EmailDraft> {
    Json(draft_email(&analysis))
}
