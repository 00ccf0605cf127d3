use lopdf::Document as PdfDocument;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("failed to parse PDF file: {0}")]
    Unreadable(String),

    #[error("document contains no text")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Accepts PDF and plain text, by declared content type first and file name second.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Result<Self, DocumentError> {
        let mime = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

        if let Some(mime) = mime {
            return match mime.as_str() {
                "application/pdf" => Ok(DocumentKind::Pdf),
                "text/plain" => Ok(DocumentKind::PlainText),
                other => Err(DocumentError::Unsupported(other.to_string())),
            };
        }

        let extension = file_name
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdf") => Ok(DocumentKind::Pdf),
            Some("txt") => Ok(DocumentKind::PlainText),
            _ => Err(DocumentError::Unsupported(
                file_name.unwrap_or("unnamed file").to_string(),
            )),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::PlainText => "text/plain",
        }
    }
}

/// Plain text of a document. PDF pages are joined with newlines.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, DocumentError> {
    let text = match kind {
        DocumentKind::Pdf => pdf_text(bytes)?,
        DocumentKind::PlainText => String::from_utf8_lossy(bytes).into_owned(),
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(DocumentError::Empty);
    }
    Ok(text.to_string())
}

fn pdf_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let doc = PdfDocument::load_mem(bytes).map_err(|e| DocumentError::Unreadable(e.to_string()))?;
    let pages = doc.get_pages();
    debug!(pages = pages.len(), "extracting PDF text");

    let mut content = String::new();
    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(text) => {
                content.push_str(&text);
                content.push('\n');
            }
            Err(e) => {
                warn!("Failed to extract text from page {}: {}", page_num, e);
            }
        }
    }
    Ok(content)
}
