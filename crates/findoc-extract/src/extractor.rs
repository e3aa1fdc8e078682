use std::path::Path;
use std::sync::Arc;

use findoc_models::config::ExtractorConfig;
use findoc_models::document::{DocumentRef, ExtractionResult};
use tracing::{debug, info};

use crate::error::ExtractError;
use crate::reader::{LopdfReader, PageReader};
use crate::resolve::resolve_path;
use crate::select::{
    classify, empty_content_warning, render_pages, select_pages, truncation_notice,
};

/// Produces bounded plain text from PDFs, prioritizing financially relevant pages.
pub struct Extractor {
    config: ExtractorConfig,
    keywords: Vec<String>,
    reader: Arc<dyn PageReader>,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self::with_reader(config, Arc::new(LopdfReader))
    }

    pub fn with_reader(config: ExtractorConfig, reader: Arc<dyn PageReader>) -> Self {
        let keywords = config.keywords.iter().map(|k| k.to_lowercase()).collect();
        Self {
            config,
            keywords,
            reader,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Resolve a path (with fallback) and count its pages.
    pub fn resolve(&self, path: &Path) -> Result<DocumentRef, ExtractError> {
        let resolved = resolve_path(path, &self.config)?;
        let total_pages = self.reader.page_count(&resolved)?;
        Ok(DocumentRef::new(resolved, total_pages))
    }

    /// Extract using the configured page budget with section focus on.
    pub fn extract_default(&self, path: &Path) -> Result<ExtractionResult, ExtractError> {
        self.extract(path, self.config.default_max_pages, true)
    }

    pub fn extract(
        &self,
        path: &Path,
        max_pages: usize,
        focus_sections: bool,
    ) -> Result<ExtractionResult, ExtractError> {
        let resolved = resolve_path(path, &self.config)?;
        let texts = self.reader.read_pages(&resolved)?;
        let total_pages = texts.len();

        let records = classify(texts, &self.keywords);
        let selected = select_pages(
            &records,
            max_pages,
            focus_sections,
            self.config.focus_threshold,
        );
        let selected_pages: Vec<usize> = selected.iter().map(|p| p.number()).collect();

        debug!(
            path = %resolved.display(),
            total_pages,
            prioritized = records.iter().filter(|p| p.prioritized).count(),
            selected = selected_pages.len(),
            "Selected pages"
        );

        let body = render_pages(&selected);
        if body.trim().is_empty() {
            info!(path = %resolved.display(), total_pages, "Document has no extractable text");
            return Ok(ExtractionResult {
                text: empty_content_warning(&resolved),
                path: resolved,
                total_pages,
                selected_pages,
                warning: true,
            });
        }

        let text = if selected_pages.len() < total_pages {
            truncation_notice(total_pages, selected_pages.len()) + &body
        } else {
            body
        };

        info!(
            path = %resolved.display(),
            total_pages,
            extracted = selected_pages.len(),
            chars = text.len(),
            "Extraction complete"
        );

        Ok(ExtractionResult {
            path: resolved,
            total_pages,
            selected_pages,
            text,
            warning: false,
        })
    }
}
