//! Error types for the invsheet-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the invsheet library.
#[derive(Error, Debug)]
pub enum InvsheetError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Spreadsheet read/write error.
    #[error("spreadsheet error: {0}")]
    Sheet(#[from] SheetError),

    /// Input folder scanning error.
    #[error("input error: {0}")]
    Scan(#[from] ScanError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to read the file from disk.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors related to the destination workbook.
#[derive(Error, Debug)]
pub enum SheetError {
    /// The workbook cannot be replaced, usually because another program
    /// holds it open or it is read-only.
    #[error("'{}' cannot be written; it may be open in another program or read-only", path.display())]
    Locked { path: PathBuf },

    /// The workbook could not be opened or parsed.
    #[error("could not open workbook {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    /// The workbook does not exist.
    #[error("workbook {} does not exist", .0.display())]
    Missing(PathBuf),

    /// The requested sheet is not in the workbook.
    #[error("sheet '{0}' not found")]
    SheetNotFound(String),

    /// Serializing the workbook failed.
    #[error("could not build workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Applying cell edits to an existing workbook failed.
    #[error("could not update workbook {}: {reason}", path.display())]
    Save { path: PathBuf, reason: String },

    /// Writing the workbook to disk failed.
    #[error("cannot write to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while collecting input files.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The folder does not exist.
    #[error("folder '{}' does not exist", .0.display())]
    FolderNotFound(PathBuf),

    /// The path exists but is not a directory.
    #[error("'{}' is not a folder", .0.display())]
    NotADirectory(PathBuf),

    /// The folder contains no PDF files.
    #[error("no PDF files found in '{}'", .0.display())]
    NoPdfFiles(PathBuf),

    /// The folder path could not be turned into a search pattern.
    #[error("invalid folder pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Errors related to loading or changing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read or written.
    #[error("config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for this schema.
    #[error("invalid config file {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A field name is already part of the mapping.
    #[error("field '{0}' is already mapped")]
    DuplicateField(String),

    /// A field name is empty after trimming.
    #[error("field names must not be empty")]
    EmptyField,
}

impl SheetError {
    /// Whether the user can recover by closing the file or choosing another name.
    pub fn is_locked(&self) -> bool {
        matches!(self, SheetError::Locked { .. })
    }
}

/// Result type for the invsheet library.
pub type Result<T> = std::result::Result<T, InvsheetError>;
