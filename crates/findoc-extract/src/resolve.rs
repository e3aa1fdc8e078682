use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use findoc_models::config::ExtractorConfig;
use tracing::warn;

use crate::error::ExtractError;

/// Resolve `requested` to an existing file.
///
/// When it does not exist and fallback is enabled, the documents directory is
/// searched for the preferred fallback file, then for the most recently
/// modified PDF (ties broken by name).
pub fn resolve_path(requested: &Path, config: &ExtractorConfig) -> Result<PathBuf, ExtractError> {
    if requested.is_file() {
        return Ok(requested.to_path_buf());
    }

    let documents_dir = PathBuf::from(&config.documents_dir);
    let candidates = list_pdfs(&documents_dir)?;

    if config.fallback_enabled {
        if let Some(files) = &candidates {
            if let Some(found) = pick_fallback(&documents_dir, files, &config.fallback_file) {
                warn!(
                    requested = %requested.display(),
                    resolved = %found.display(),
                    "Requested document missing, using fallback"
                );
                return Ok(found);
            }
        }
    }

    Err(ExtractError::NotFound {
        path: requested.to_path_buf(),
        documents_dir,
        available: candidates,
    })
}

/// Sorted `*.pdf` file names in `dir`, or `None` when the directory does not exist.
pub fn list_pdfs(dir: &Path) -> Result<Option<Vec<String>>, ExtractError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file() && is_pdf(&entry.path()))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(Some(names))
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn pick_fallback(dir: &Path, files: &[String], preferred: &str) -> Option<PathBuf> {
    if files.is_empty() {
        return None;
    }

    let preferred_path = dir.join(preferred);
    if !preferred.is_empty() && preferred_path.is_file() {
        return Some(preferred_path);
    }

    files
        .iter()
        .map(|name| {
            let path = dir.join(name);
            let modified = fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, name, path)
        })
        // Latest mtime wins; on equal mtimes the lexically smallest name wins.
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(a.1)))
        .map(|(_, _, path)| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn config_for(dir: &Path) -> ExtractorConfig {
        ExtractorConfig {
            documents_dir: dir.display().to_string(),
            ..ExtractorConfig::default()
        }
    }

    fn touch(path: &Path, age: Duration) {
        let file = File::create(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn existing_path_is_returned_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q1.pdf");
        touch(&path, Duration::ZERO);

        let resolved = resolve_path(&path, &config_for(dir.path())).unwrap();
        assert_eq!(resolved, path);
    }

    #[test]
    fn prefers_named_fallback_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("TSLA-Q2-2025-Update.pdf"), Duration::from_secs(3600));
        touch(&dir.path().join("newer.pdf"), Duration::ZERO);

        let missing = dir.path().join("sample.pdf");
        let resolved = resolve_path(&missing, &config_for(dir.path())).unwrap();
        assert_eq!(resolved, dir.path().join("TSLA-Q2-2025-Update.pdf"));
    }

    #[test]
    fn falls_back_to_most_recent_pdf() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("old.pdf"), Duration::from_secs(7200));
        touch(&dir.path().join("recent.pdf"), Duration::from_secs(60));
        touch(&dir.path().join("notes.txt"), Duration::ZERO);

        let missing = dir.path().join("sample.pdf");
        let resolved = resolve_path(&missing, &config_for(dir.path())).unwrap();
        assert_eq!(resolved, dir.path().join("recent.pdf"));
    }

    #[test]
    fn not_found_enumerates_candidates_when_fallback_disabled() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.pdf"), Duration::ZERO);
        touch(&dir.path().join("a.pdf"), Duration::ZERO);

        let config = ExtractorConfig {
            fallback_enabled: false,
            ..config_for(dir.path())
        };
        let err = resolve_path(&dir.path().join("sample.pdf"), &config).unwrap_err();
        match err {
            ExtractError::NotFound { available, .. } => {
                assert_eq!(available, Some(vec!["a.pdf".to_string(), "b.pdf".to_string()]));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn not_found_when_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("sample.pdf");
        let err = resolve_path(&missing, &config_for(dir.path())).unwrap_err();
        match err {
            ExtractError::NotFound { available, .. } => assert_eq!(available, Some(vec![])),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn not_found_when_directory_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("nope"));
        let err = resolve_path(Path::new("missing.pdf"), &config).unwrap_err();
        assert!(matches!(err, ExtractError::NotFound { available: None, .. }));
        assert!(err.to_string().contains("not found"));
    }
}
