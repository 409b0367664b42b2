//! Document ingest — PDF text extraction.
//!
//! Pure and stateless: bytes in, text out. An unreadable or empty PDF is a
//! user-facing validation problem, never a system fault.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("could not read the PDF: {0}")]
    Unreadable(String),

    #[error("the PDF contains no extractable text")]
    Empty,
}

/// Extracts the full text of a PDF from its raw bytes.
pub fn extract_text(bytes: &[u8]) -> Result<String, IngestError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| IngestError::Unreadable(e.to_string()))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(IngestError::Empty);
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_are_unreadable() {
        let err = extract_text(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, IngestError::Unreadable(_)));
    }

    #[test]
    fn test_empty_input_is_unreadable() {
        assert!(extract_text(&[]).is_err());
    }
}
