use std::path::Path;

use lopdf::Document;
use tracing::{debug, warn};

use crate::error::ExtractError;

/// Source of per-page text. Mockable for testing.
pub trait PageReader: Send + Sync {
    /// Text of every page in document order. A page without text yields an empty string.
    fn read_pages(&self, path: &Path) -> Result<Vec<String>, ExtractError>;

    fn page_count(&self, path: &Path) -> Result<usize, ExtractError> {
        Ok(self.read_pages(path)?.len())
    }
}

/// Reads pages with lopdf.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfReader;

impl LopdfReader {
    fn load(path: &Path) -> Result<Document, ExtractError> {
        let mut doc = Document::load(path).map_err(|e| ExtractError::ParseFailure {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })?;

        // Files restricted only by an owner password open with an empty user password.
        if doc.is_encrypted() {
            doc.decrypt("").map_err(|e| ExtractError::ParseFailure {
                path: path.to_path_buf(),
                cause: format!("document is encrypted: {e}"),
            })?;
            debug!(path = %path.display(), "Decrypted PDF with empty user password");
        }

        Ok(doc)
    }
}

impl PageReader for LopdfReader {
    fn read_pages(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        let doc = Self::load(path)?;
        let pages = doc.get_pages();
        debug!(path = %path.display(), pages = pages.len(), "Loaded PDF");

        let mut texts = Vec::with_capacity(pages.len());
        for page_num in pages.keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(text) => texts.push(text),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        page = page_num,
                        error = %e,
                        "Page text extraction failed"
                    );
                    texts.push(String::new());
                }
            }
        }

        Ok(texts)
    }

    fn page_count(&self, path: &Path) -> Result<usize, ExtractError> {
        Ok(Self::load(path)?.get_pages().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{build_encrypted_pdf, build_pdf};

    #[test]
    fn reads_pages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, build_pdf(&["First page", "Second page"])).unwrap();

        let pages = LopdfReader.read_pages(&path).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("First page"));
        assert!(pages[1].contains("Second page"));
        assert_eq!(LopdfReader.page_count(&path).unwrap(), 2);
    }

    #[test]
    fn reads_pdf_encrypted_with_empty_user_password() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.pdf");
        let bytes = build_encrypted_pdf(&["Balance Sheet", "Total assets 120,000"], "").unwrap();
        std::fs::write(&path, bytes).unwrap();

        let pages = LopdfReader.read_pages(&path).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("Balance Sheet"));
        assert!(pages[1].contains("Total assets 120,000"));
    }

    #[test]
    fn user_password_protected_pdf_is_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("protected.pdf");
        std::fs::write(&path, build_encrypted_pdf(&["Balance Sheet"], "hunter2").unwrap()).unwrap();

        let err = LopdfReader.read_pages(&path).unwrap_err();
        match err {
            ExtractError::ParseFailure { cause, .. } => {
                assert!(cause.starts_with("document is encrypted:"), "{cause}")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn garbage_is_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf at all").unwrap();

        let err = LopdfReader.read_pages(&path).unwrap_err();
        assert!(matches!(err, ExtractError::ParseFailure { .. }));
    }
}
