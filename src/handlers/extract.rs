use axum::{Json, extract::Multipart};
use tracing::info;

use crate::documents::{DocumentError, DocumentKind, extract_text};
use crate::error::AppError;
use crate::models::ExtractResponse;

// Multipart upload with a `file` field, answered with the document's plain text
pub async fn extract_handler(mut multipart: Multipart) -> Result<Json<ExtractResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let kind = DocumentKind::detect(field.content_type(), file_name.as_deref())?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file: {}", e)))?;
        info!(?file_name, kind = kind.mime(), bytes = bytes.len(), "extracting document text");

        // PDF parsing is CPU-bound
        let text = tokio::task::spawn_blocking(move || extract_text(kind, &bytes))
            .await
            .map_err(|e| DocumentError::Unreadable(e.to_string()))??;

        return Ok(Json(ExtractResponse {
            file_name,
            content_type: kind.mime().to_string(),
            characters: text.chars().count(),
            text,
        }));
    }

    Err(AppError::Validation("No file provided".to_string()))
}
