//! End-to-end extraction against PDFs generated with lopdf.

use std::path::{Path, PathBuf};

use findoc_extract::test_support::write_pdf;
use findoc_extract::{ExtractError, Extractor};
use findoc_models::config::ExtractorConfig;

fn data_dir(root: &Path) -> PathBuf {
    let dir = root.join("data");
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn extractor_for(dir: &Path) -> Extractor {
    Extractor::new(ExtractorConfig {
        documents_dir: dir.display().to_string(),
        ..ExtractorConfig::default()
    })
}

/// 40 pages, five of which carry financial statement headings.
fn write_quarterly_update(path: &Path) {
    let texts: Vec<String> = (1..=40)
        .map(|n| match n {
            4 => "Income Statement\nTotal revenues 22,496".to_string(),
            9 => "Balance Sheet\nTotal liabilities 50,535".to_string(),
            17 => "Cash Flow\nCapital expenditures 2,394".to_string(),
            25 => "Net income attributable 1,172".to_string(),
            33 => "Adjusted EBITDA 3,401".to_string(),
            _ => format!("Vehicle deliveries photo spread {n}"),
        })
        .collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    write_pdf(path, &refs).unwrap();
}

#[test]
fn missing_sample_resolves_to_tsla_update() {
    let root = tempfile::tempdir().unwrap();
    let dir = data_dir(root.path());
    write_pdf(
        &dir.join("TSLA-Q2-2025-Update.pdf"),
        &["Q2 2025 Update", "Revenue 22,496"],
    )
    .unwrap();

    let extractor = extractor_for(&dir);
    let result = extractor
        .extract(&dir.join("sample.pdf"), 50, true)
        .unwrap();

    assert_eq!(result.path, dir.join("TSLA-Q2-2025-Update.pdf"));
    assert_eq!(result.total_pages, 2);
    assert!(result.text.contains("[Page 1]"));
    assert!(result.text.contains("Revenue 22,496"));
}

#[test]
fn large_report_prioritizes_statement_pages() {
    let root = tempfile::tempdir().unwrap();
    let dir = data_dir(root.path());
    let path = dir.join("update.pdf");
    write_quarterly_update(&path);

    let result = extractor_for(&dir).extract(&path, 10, true).unwrap();

    assert!(result
        .text
        .starts_with("NOTE: Document has 40 pages. Extracted 10 key pages"));
    assert_eq!(result.selected_pages, vec![4, 9, 17, 25, 33, 1, 2, 3, 5, 6]);

    let markers: Vec<usize> = result
        .text
        .match_indices("[Page ")
        .map(|(i, _)| i)
        .collect();
    assert_eq!(markers.len(), 10);
    let page_33 = result.text.find("[Page 33]").unwrap();
    let page_1 = result.text.find("[Page 1]\n").unwrap();
    assert!(page_33 < page_1);
}

#[test]
fn small_document_returns_every_page() {
    let root = tempfile::tempdir().unwrap();
    let dir = data_dir(root.path());
    let path = dir.join("small.pdf");
    let texts: Vec<String> = (1..=12).map(|n| format!("Section {n}")).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    write_pdf(&path, &refs).unwrap();

    let extractor = extractor_for(&dir);
    for focus in [true, false] {
        let result = extractor.extract(&path, 50, focus).unwrap();
        assert_eq!(result.selected_pages, (1..=12).collect::<Vec<_>>());
        assert!(!result.text.starts_with("NOTE:"));
    }
}

#[test]
fn zero_budget_returns_whole_document() {
    let root = tempfile::tempdir().unwrap();
    let dir = data_dir(root.path());
    let path = dir.join("update.pdf");
    write_quarterly_update(&path);

    let result = extractor_for(&dir).extract(&path, 0, true).unwrap();
    assert_eq!(result.selected_pages.len(), 40);
    assert_eq!(&result.selected_pages[..5], &[4, 9, 17, 25, 33]);
    assert!(!result.is_truncated());
}

#[test]
fn extraction_is_idempotent() {
    let root = tempfile::tempdir().unwrap();
    let dir = data_dir(root.path());
    let path = dir.join("update.pdf");
    write_quarterly_update(&path);

    let extractor = extractor_for(&dir);
    let first = extractor.extract(&path, 10, true).unwrap();
    let second = extractor.extract(&path, 10, true).unwrap();
    assert_eq!(first.text.as_bytes(), second.text.as_bytes());
}

#[test]
fn image_only_pdf_yields_warning() {
    let root = tempfile::tempdir().unwrap();
    let dir = data_dir(root.path());
    let path = dir.join("scan.pdf");
    write_pdf(&path, &["", ""]).unwrap();

    let result = extractor_for(&dir).extract_default(&path).unwrap();
    assert!(result.warning);
    assert!(result.text.starts_with("WARNING:"));
    assert_eq!(result.total_pages, 2);
}

#[test]
fn corrupt_pdf_is_parse_failure() {
    let root = tempfile::tempdir().unwrap();
    let dir = data_dir(root.path());
    let path = dir.join("corrupt.pdf");
    std::fs::write(&path, b"%PDF-1.5\n garbage without xref").unwrap();

    let err = extractor_for(&dir).extract_default(&path).unwrap_err();
    match err {
        ExtractError::ParseFailure { path: failed, .. } => assert_eq!(failed, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unresolvable_path_lists_available_pdfs() {
    let root = tempfile::tempdir().unwrap();
    let dir = data_dir(root.path());
    let extractor = Extractor::new(ExtractorConfig {
        documents_dir: dir.display().to_string(),
        fallback_enabled: false,
        ..ExtractorConfig::default()
    });
    write_pdf(&dir.join("10-K.pdf"), &["Annual report"]).unwrap();

    let err = extractor.extract_default(&dir.join("gone.pdf")).unwrap_err();
    assert!(err.to_string().contains("Available PDFs"));
    assert!(err.to_string().contains("10-K.pdf"));
}
