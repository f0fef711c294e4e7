//! Text extraction — turns uploaded resume bytes into plain text.
//!
//! `TextExtractor` is the seam the pipeline depends on; `FileTextExtractor`
//! is the default implementation for PDF, DOCX and TXT.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

mod docx;

/// The formats the pipeline can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
}

impl DocumentFormat {
    /// Maps an upload's MIME type to a format.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type.split(';').next().unwrap_or("").trim();
        match mime {
            "application/pdf" => Some(DocumentFormat::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(DocumentFormat::Docx)
            }
            "text/plain" => Some(DocumentFormat::Txt),
            _ => None,
        }
    }

    /// Maps a filename's extension to a format.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        ext.parse().ok()
    }

    /// Resolves an upload's format: content type first, extension as fallback.
    pub fn detect(filename: &str, content_type: Option<&str>) -> Result<Self, AppError> {
        content_type
            .and_then(Self::from_content_type)
            .or_else(|| Self::from_filename(filename))
            .ok_or_else(|| {
                AppError::UnsupportedFormat(content_type.unwrap_or(filename).to_string())
            })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Txt => "txt",
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "txt" => Ok(DocumentFormat::Txt),
            other => Err(AppError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts raw file bytes of a declared format into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: Bytes, format: DocumentFormat) -> Result<String, AppError>;
}

/// Default extractor. PDF and DOCX parsing are CPU-bound and run on the
/// blocking pool; a panic inside a parser surfaces as an extraction error.
pub struct FileTextExtractor;

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract(&self, bytes: Bytes, format: DocumentFormat) -> Result<String, AppError> {
        match format {
            DocumentFormat::Txt => extract_txt(&bytes),
            DocumentFormat::Pdf => run_blocking(move || extract_pdf(&bytes)).await,
            DocumentFormat::Docx => run_blocking(move || docx::extract_docx(&bytes)).await,
        }
    }
}

async fn run_blocking<F>(f: F) -> Result<String, AppError>
where
    F: FnOnce() -> Result<String, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Extraction(format!("Parser aborted: {e}")))?
}

fn extract_txt(bytes: &[u8]) -> Result<String, AppError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| AppError::Extraction(format!("Text file is not valid UTF-8: {e}")))
}

fn extract_pdf(bytes: &[u8]) -> Result<String, AppError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::Extraction(format!("Failed to extract text from PDF: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_content_type() {
        assert_eq!(
            DocumentFormat::from_content_type("application/pdf"),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_content_type("text/plain; charset=utf-8"),
            Some(DocumentFormat::Txt)
        );
        assert_eq!(DocumentFormat::from_content_type("image/png"), None);
    }

    #[test]
    fn test_format_from_filename_is_case_insensitive() {
        assert_eq!(
            DocumentFormat::from_filename("Jane_Doe.DOCX"),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(DocumentFormat::from_filename("resume"), None);
        assert_eq!(DocumentFormat::from_filename("resume.odt"), None);
    }

    #[test]
    fn test_detect_falls_back_to_extension() {
        let format = DocumentFormat::detect("cv.txt", Some("application/octet-stream")).unwrap();
        assert_eq!(format, DocumentFormat::Txt);
    }

    #[test]
    fn test_detect_rejects_unknown() {
        let err = DocumentFormat::detect("photo.png", Some("image/png")).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFormat(ref t) if t == "image/png"));
    }

    #[test]
    fn test_from_str_rejects_other_formats() {
        assert!(matches!(
            "rtf".parse::<DocumentFormat>(),
            Err(AppError::UnsupportedFormat(_))
        ));
        assert_eq!("PDF".parse::<DocumentFormat>().unwrap(), DocumentFormat::Pdf);
    }

    #[tokio::test]
    async fn test_extract_txt() {
        let text = FileTextExtractor
            .extract(Bytes::from_static(b"Senior Rust engineer"), DocumentFormat::Txt)
            .await
            .unwrap();
        assert_eq!(text, "Senior Rust engineer");
    }

    #[tokio::test]
    async fn test_extract_txt_invalid_utf8_is_extraction_error() {
        let err = FileTextExtractor
            .extract(Bytes::from_static(&[0xff, 0xfe, 0xfd]), DocumentFormat::Txt)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_extract_garbage_pdf_is_extraction_error() {
        let err = FileTextExtractor
            .extract(Bytes::from_static(b"definitely not a pdf"), DocumentFormat::Pdf)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }
}
