use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

/// A private copy of an input document inside the documents directory.
///
/// The copy is named `financial_document_<uuid>.pdf` and is deleted when the
/// value is dropped, so it never outlives the run that needed it.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
}

impl StagedUpload {
    pub fn stage(source: &Path, documents_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(documents_dir)?;
        let path = documents_dir.join(format!("financial_document_{}.pdf", Uuid::new_v4()));
        fs::copy(source, &path)?;

        if !path.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("File was not saved correctly. Expected at: {}", path.display()),
            ));
        }

        debug!(source = %source.display(), staged = %path.display(), "Staged input document");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed staged document"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove staged document")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_lands_in_documents_dir_and_is_removed_on_drop() {
        let src_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("report.pdf");
        fs::write(&source, b"%PDF-1.5 stub").unwrap();
        let docs = tempfile::tempdir().unwrap();
        let documents_dir = docs.path().join("data");

        let staged = StagedUpload::stage(&source, &documents_dir).unwrap();
        let path = staged.path().to_path_buf();
        assert_eq!(path.parent(), Some(documents_dir.as_path()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("financial_document_"));
        assert!(name.ends_with(".pdf"));
        assert_eq!(fs::read(&path).unwrap(), b"%PDF-1.5 stub");

        drop(staged);
        assert!(!path.exists());
        assert!(source.exists());
    }

    #[test]
    fn each_upload_gets_a_distinct_name() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.pdf");
        fs::write(&source, b"x").unwrap();

        let a = StagedUpload::stage(&source, dir.path()).unwrap();
        let b = StagedUpload::stage(&source, dir.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn missing_source_fails_without_leaving_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = StagedUpload::stage(&dir.path().join("absent.pdf"), dir.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn drop_tolerates_already_removed_copy() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.pdf");
        fs::write(&source, b"x").unwrap();

        let staged = StagedUpload::stage(&source, dir.path()).unwrap();
        fs::remove_file(staged.path()).unwrap();
        drop(staged);
    }
}
