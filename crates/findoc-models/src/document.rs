use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A resolved PDF on disk. Immutable once resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentRef {
    pub path: PathBuf,
    pub total_pages: usize,
}

impl DocumentRef {
    pub fn new(path: impl Into<PathBuf>, total_pages: usize) -> Self {
        Self {
            path: path.into(),
            total_pages,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One page as seen during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// 0-based page index.
    pub index: usize,
    pub text: String,
    /// True when the page matched at least one financial keyword.
    pub prioritized: bool,
}

impl PageRecord {
    /// 1-based page number as printed in `[Page N]` markers.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Bounded text produced from a document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionResult {
    pub path: PathBuf,
    pub total_pages: usize,
    /// 1-based page numbers, in the order they were emitted.
    pub selected_pages: Vec<usize>,
    /// Final text: optional truncation notice, then page blocks. For the
    /// empty-content case this is the warning message.
    pub text: String,
    /// Set when the document parsed but yielded no extractable text.
    pub warning: bool,
}

impl ExtractionResult {
    pub fn is_truncated(&self) -> bool {
        self.selected_pages.len() < self.total_pages
    }
}

impl fmt::Display for ExtractionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
