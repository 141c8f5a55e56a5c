//! Batch conversion: scan a folder, extract each PDF, append to a workbook.
//!
//! [`collect_records`] does the per-file work and reports progress through a
//! callback so a caller can drive a progress bar from another thread. Writing
//! is a separate step ([`BatchJob::write`]) so a caller can retry it under
//! another name when the workbook is locked, without extracting again.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::extract::{FieldExtractor, default_amount_from_file};
use crate::models::{ERROR, FieldMapping, NOT_FOUND, PdfRecord};
use crate::pdf::read_pages;
use crate::scan::scan_pdf_folder;
use crate::sheet::{AppendOutcome, SheetAppender, SheetTarget};

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Folder scanned.
    Scanned { total: usize },
    /// Extraction of one file started. `index` is zero-based.
    FileStarted { index: usize, total: usize, name: String },
    /// Values extracted for one file.
    FileExtracted { name: String, values: Vec<String> },
    /// The file could not be read; its values are "Error".
    FileFailed { name: String },
    /// All files extracted.
    Finished { records: usize },
}

/// One folder-to-workbook conversion.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub folder: PathBuf,
    pub mapping: FieldMapping,
    pub max_pages: usize,
}

impl BatchJob {
    pub fn new(folder: impl Into<PathBuf>, mapping: FieldMapping) -> Self {
        Self {
            folder: folder.into(),
            mapping,
            max_pages: 3,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Extract a record for every PDF in the folder.
    pub fn collect(&self, progress: impl Fn(ProgressEvent)) -> Result<Vec<PdfRecord>> {
        collect_records(self, progress)
    }

    /// Append records to the workbook.
    pub fn write(
        &self,
        records: &[PdfRecord],
        workbook: &Path,
        target: &SheetTarget,
        appender: &SheetAppender,
    ) -> Result<AppendOutcome> {
        Ok(appender.append(records, workbook, target, &self.mapping)?)
    }
}

/// Extract a record for every PDF in the job folder, in path order.
///
/// Without a mapping each record holds the total amount. With one, it holds
/// one value per mapped field, "N/A" where a field was not found. A file that
/// cannot be read yields "Error" values and the batch continues.
pub fn collect_records(job: &BatchJob, progress: impl Fn(ProgressEvent)) -> Result<Vec<PdfRecord>> {
    let files = scan_pdf_folder(&job.folder)?;
    let total = files.len();
    progress(ProgressEvent::Scanned { total });
    info!("Processing {} PDF file(s) from {}", total, job.folder.display());

    let extractor = FieldExtractor::new().with_max_pages(job.max_pages);
    let mut records = Vec::with_capacity(total);

    for (index, path) in files.iter().enumerate() {
        let name = file_name(path);
        progress(ProgressEvent::FileStarted {
            index,
            total,
            name: name.clone(),
        });

        let values = extract_values(&extractor, &job.mapping, path);
        if values.iter().all(|v| v == ERROR) {
            progress(ProgressEvent::FileFailed { name: name.clone() });
        } else {
            progress(ProgressEvent::FileExtracted {
                name: name.clone(),
                values: values.clone(),
            });
        }
        records.push(PdfRecord::new(name, values, path.clone()));
    }

    progress(ProgressEvent::Finished {
        records: records.len(),
    });
    Ok(records)
}

fn extract_values(extractor: &FieldExtractor, mapping: &FieldMapping, path: &Path) -> Vec<String> {
    if mapping.is_empty() {
        return vec![default_amount_from_file(path)];
    }

    let pages = match read_pages(path, Some(extractor.max_pages())) {
        Ok(pages) => pages,
        Err(e) => {
            warn!("Error reading {}: {}", path.display(), e);
            return vec![ERROR.to_string(); mapping.len()];
        }
    };
    let found = extractor.extract_named_fields(&pages, mapping.fields());
    mapping
        .fields()
        .iter()
        .map(|field| {
            found
                .get(field)
                .cloned()
                .unwrap_or_else(|| NOT_FOUND.to_string())
        })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::write_text_pdf;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn invoice_folder() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_text_pdf(
            &dir.path().join("a.pdf"),
            &[&["Invoice Number: INV-1", "Total Amount Due USD 239.40"]],
        );
        std::fs::write(dir.path().join("b.pdf"), b"%PDF-1.4 garbage").unwrap();
        write_text_pdf(&dir.path().join("c.pdf"), &[&["Nothing here"]]);
        dir
    }

    #[test]
    fn test_collect_default_amounts() {
        let dir = invoice_folder();
        let events = Mutex::new(Vec::new());
        let job = BatchJob::new(dir.path(), FieldMapping::default());
        let records = job.collect(|e| events.lock().unwrap().push(e)).unwrap();

        let rows: Vec<(&str, Vec<String>)> = records
            .iter()
            .map(|r| (r.filename(), r.values().to_vec()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("a.pdf", vec!["239.40".to_string()]),
                ("b.pdf", vec!["Error".to_string()]),
                ("c.pdf", vec!["N/A".to_string()]),
            ]
        );

        let events = events.into_inner().unwrap();
        assert_eq!(events.first(), Some(&ProgressEvent::Scanned { total: 3 }));
        assert!(events.contains(&ProgressEvent::FileFailed {
            name: "b.pdf".into()
        }));
        assert_eq!(events.last(), Some(&ProgressEvent::Finished { records: 3 }));
    }

    #[test]
    fn test_collect_mapped_fields() {
        let dir = invoice_folder();
        let mapping = FieldMapping::new(["Invoice Number", "Due Date"]).unwrap();
        let records = BatchJob::new(dir.path(), mapping).collect(|_| {}).unwrap();

        assert_eq!(records[0].values(), ["INV-1", "N/A"]);
        assert_eq!(records[1].values(), ["Error", "Error"]);
        assert_eq!(records[2].values(), ["N/A", "N/A"]);
    }

    #[test]
    fn test_collect_then_write() {
        let dir = invoice_folder();
        let job = BatchJob::new(dir.path(), FieldMapping::default());
        let records = job.collect(|_| {}).unwrap();

        let missing_dir = dir.path().join("missing").join("ledger.xlsx");
        let err = job
            .write(&records, &missing_dir, &SheetTarget::CreateNew, &SheetAppender::new())
            .unwrap_err();
        assert!(err.to_string().contains("cannot write"));

        let xlsx = dir.path().join("ledger.xlsx");
        let outcome = job
            .write(&records, &xlsx, &SheetTarget::CreateNew, &SheetAppender::new())
            .unwrap();
        assert_eq!(outcome.appended, 3);
        assert_eq!(outcome.sheet, "PDF Files");
    }

    #[test]
    fn test_collect_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        let job = BatchJob::new(dir.path(), FieldMapping::default());
        assert!(job.collect(|_| {}).is_err());
    }
}
