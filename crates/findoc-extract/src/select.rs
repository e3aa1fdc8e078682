//! Page classification, selection and formatting.
//!
//! All functions here are pure so the selection policy can be tested without PDFs.

use findoc_models::document::PageRecord;

/// True when the lower-cased text contains any keyword. Keywords must already be lower-case.
pub fn is_financially_relevant(text: &str, keywords: &[String]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_str()))
}

/// Turn raw page texts into records, flagging financially relevant pages.
pub fn classify(texts: Vec<String>, keywords: &[String]) -> Vec<PageRecord> {
    texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| {
            let prioritized = is_financially_relevant(&text, keywords);
            PageRecord {
                index,
                text,
                prioritized,
            }
        })
        .collect()
}

/// Choose which pages to emit, in emission order.
///
/// Large documents (more than `focus_threshold` pages) with `focus_sections`
/// get every prioritized page first, then non-prioritized pages up to the
/// remaining budget. Pages without text are never selected in that mode.
/// Otherwise the first `max_pages` pages are taken. `max_pages == 0` is no cap.
pub fn select_pages(
    pages: &[PageRecord],
    max_pages: usize,
    focus_sections: bool,
    focus_threshold: usize,
) -> Vec<&PageRecord> {
    let total = pages.len();

    if focus_sections && total > focus_threshold {
        let (prioritized, others): (Vec<&PageRecord>, Vec<&PageRecord>) = pages
            .iter()
            .filter(|p| p.has_text())
            .partition(|p| p.prioritized);

        let filler = if max_pages == 0 {
            others.len()
        } else {
            max_pages.saturating_sub(prioritized.len())
        };

        prioritized
            .into_iter()
            .chain(others.into_iter().take(filler))
            .collect()
    } else {
        let limit = if max_pages == 0 {
            total
        } else {
            max_pages.min(total)
        };
        pages.iter().take(limit).collect()
    }
}

/// Collapse every run of consecutive newlines into a single newline.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_newline = false;
    for ch in text.chars() {
        if ch == '\n' {
            if prev_newline {
                continue;
            }
            prev_newline = true;
        } else {
            prev_newline = false;
        }
        out.push(ch);
    }
    out
}

/// Concatenate `[Page N]` blocks for the selected pages that carry text.
pub fn render_pages(selected: &[&PageRecord]) -> String {
    let mut report = String::new();
    for page in selected.iter().filter(|p| p.has_text()) {
        report.push_str(&format!(
            "[Page {}]\n{}\n\n",
            page.number(),
            collapse_blank_lines(&page.text)
        ));
    }
    report
}

pub fn truncation_notice(total_pages: usize, extracted: usize) -> String {
    format!(
        "NOTE: Document has {total_pages} pages. Extracted {extracted} key pages \
         focusing on financial statements and metrics.\n\n"
    )
}

pub fn empty_content_warning(path: &std::path::Path) -> String {
    format!(
        "WARNING: File {} was read but contains no extractable text. \
         The PDF might be image-based or corrupted.",
        path.display()
    )
}
