//! Uploaded document → plain text. PDF and plain text only.

use thiserror::Error;
use tracing::warn;

/// Uploads above this size are rejected before extraction.
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// Characters of extracted text kept alongside a parsed record.
const RAW_TEXT_PREVIEW_CHARS: usize = 500;

const PDF_MIME: &str = "application/pdf";
const TEXT_MIME: &str = "text/plain";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unsupported document type '{0}'; upload a PDF or plain text file")]
    Unsupported(String),

    #[error("document is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("unable to extract text from the PDF document: {0}")]
    Pdf(String),

    #[error("document contains no extractable text")]
    Empty,
}

/// Extracts plain text from `bytes` according to `mime`. Parameters such as
/// `; charset=utf-8` are ignored. `application/octet-stream` is sniffed.
pub fn extract_plain_text(bytes: &[u8], mime: &str) -> Result<String, DocumentError> {
    if bytes.len() > MAX_DOCUMENT_BYTES {
        return Err(DocumentError::TooLarge {
            size: bytes.len(),
            limit: MAX_DOCUMENT_BYTES,
        });
    }

    let essence = mime
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let text = match essence.as_str() {
        PDF_MIME => extract_pdf_text(bytes)?,
        TEXT_MIME => decode_text(bytes),
        "application/octet-stream" | "" if looks_like_pdf(bytes) => extract_pdf_text(bytes)?,
        _ => return Err(DocumentError::Unsupported(essence)),
    };

    if text.trim().is_empty() {
        return Err(DocumentError::Empty);
    }
    Ok(text)
}

/// Best-effort MIME type from a file extension, for clients that send
/// multipart parts without a content type.
pub fn mime_from_filename(filename: &str) -> Option<&'static str> {
    let (_, extension) = filename.rsplit_once('.')?;
    match extension.to_ascii_lowercase().as_str() {
        "pdf" => Some(PDF_MIME),
        "txt" | "text" => Some(TEXT_MIME),
        _ => None,
    }
}

/// First 500 characters of `text`, with "..." appended when truncated.
pub fn text_preview(text: &str) -> String {
    let mut preview: String = text.chars().take(RAW_TEXT_PREVIEW_CHARS).collect();
    if text.chars().count() > RAW_TEXT_PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, DocumentError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map(|text| text.trim().to_string())
        .map_err(|err| DocumentError::Pdf(err.to_string()))
}

fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            warn!("document contained invalid UTF-8; replacing invalid sequences");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_with_charset() {
        let text = extract_plain_text("张三\n技能: Rust".as_bytes(), "text/plain; charset=utf-8").unwrap();
        assert!(text.contains("Rust"));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let text = extract_plain_text(&[b'o', b'k', 0xff, b'!'], "text/plain").unwrap();
        assert_eq!(text, "ok\u{fffd}!");
    }

    #[test]
    fn test_unsupported_mime_rejected() {
        let err = extract_plain_text(b"\x89PNG", "image/png").unwrap_err();
        assert!(matches!(err, DocumentError::Unsupported(ref m) if m == "image/png"));
    }

    #[test]
    fn test_octet_stream_without_pdf_magic_rejected() {
        let err = extract_plain_text(b"hello", "application/octet-stream").unwrap_err();
        assert!(matches!(err, DocumentError::Unsupported(_)));
    }

    #[test]
    fn test_oversized_rejected_before_extraction() {
        let bytes = vec![b'a'; MAX_DOCUMENT_BYTES + 1];
        let err = extract_plain_text(&bytes, "text/plain").unwrap_err();
        assert!(matches!(err, DocumentError::TooLarge { limit, .. } if limit == MAX_DOCUMENT_BYTES));
    }

    #[test]
    fn test_blank_text_is_empty() {
        assert!(matches!(
            extract_plain_text(b"  \n\t", "text/plain"),
            Err(DocumentError::Empty)
        ));
    }

    #[test]
    fn test_mime_from_filename() {
        assert_eq!(mime_from_filename("Resume.PDF"), Some("application/pdf"));
        assert_eq!(mime_from_filename("notes.txt"), Some("text/plain"));
        assert_eq!(mime_from_filename("photo.png"), None);
        assert_eq!(mime_from_filename("README"), None);
    }
}
