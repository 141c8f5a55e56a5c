//! Input folder discovery.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern, glob_with};
use tracing::{debug, warn};

use crate::error::ScanError;

/// PDF files directly inside `folder`, sorted by path.
///
/// The extension matches case-insensitively. Subfolders are not searched.
pub fn scan_pdf_folder(folder: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !folder.exists() {
        return Err(ScanError::FolderNotFound(folder.to_path_buf()));
    }
    if !folder.is_dir() {
        return Err(ScanError::NotADirectory(folder.to_path_buf()));
    }

    let pattern = format!("{}/*.pdf", Pattern::escape(&folder.to_string_lossy()));
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let mut files: Vec<PathBuf> = glob_with(&pattern, options)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(ScanError::NoPdfFiles(folder.to_path_buf()));
    }

    debug!("Found {} PDF file(s) in {}", files.len(), folder.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_scan_matches_extension_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "A.PDF", "c.Pdf", "notes.txt", "pdf"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("folder.pdf")).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("d.pdf"), b"x").unwrap();

        let files = scan_pdf_folder(dir.path()).unwrap();
        assert_eq!(names(&files), ["A.PDF", "b.pdf", "c.Pdf"]);
    }

    #[test]
    fn test_scan_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            scan_pdf_folder(dir.path()),
            Err(ScanError::NoPdfFiles(_))
        ));
        assert!(matches!(
            scan_pdf_folder(&dir.path().join("missing")),
            Err(ScanError::FolderNotFound(_))
        ));

        let file = dir.path().join("file.pdf");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            scan_pdf_folder(&file),
            Err(ScanError::NotADirectory(_))
        ));
    }
}
