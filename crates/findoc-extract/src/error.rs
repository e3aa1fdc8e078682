use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(
        "File not found at path: {}. {}",
        .path.display(),
        describe_available(.documents_dir, .available)
    )]
    NotFound {
        path: PathBuf,
        documents_dir: PathBuf,
        /// PDFs present in `documents_dir`, or `None` when the directory is missing.
        available: Option<Vec<String>>,
    },

    #[error("Failed to read PDF {}: {cause}", .path.display())]
    ParseFailure { path: PathBuf, cause: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_available(documents_dir: &std::path::Path, available: &Option<Vec<String>>) -> String {
    match available {
        Some(files) => format!(
            "Available PDFs in {}: [{}]",
            documents_dir.display(),
            files.join(", ")
        ),
        None => format!("Documents directory {} not found", documents_dir.display()),
    }
}
