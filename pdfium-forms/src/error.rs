//! Error types for pdfium-forms

use std::fmt;
use thiserror::Error;

/// Result type for pdfium-forms operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Why the engine refused to open a document.
///
/// Derived from the engine's last-error code right after a failed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFailure {
    /// The file could not be found or read
    Io,
    /// The data is not a PDF, or is too damaged to parse
    BadFormat,
    /// The document is encrypted and no password was supplied
    PasswordRequired,
    /// The supplied password was rejected
    PasswordIncorrect,
    /// The security handler is not supported
    UnsupportedSecurity,
    /// The engine reported no specific cause
    Unknown,
}

impl OpenFailure {
    /// Map an engine error code (1 unknown, 2 file, 3 format, 4 password,
    /// 5 security, 6 page) to a failure reason.
    pub fn from_error_code(code: u32, password_supplied: bool) -> Self {
        match code {
            2 => Self::Io,
            3 | 6 => Self::BadFormat,
            4 if password_supplied => Self::PasswordIncorrect,
            4 => Self::PasswordRequired,
            5 => Self::UnsupportedSecurity,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for OpenFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Io => "file could not be read",
            Self::BadFormat => "not a PDF or corrupted",
            Self::PasswordRequired => "password required",
            Self::PasswordIncorrect => "incorrect password",
            Self::UnsupportedSecurity => "unsupported security scheme",
            Self::Unknown => "unknown error",
        };
        f.write_str(text)
    }
}

/// Error types for PDF operations
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open PDF document
    #[error("Failed to open PDF document: {reason}")]
    Open { reason: OpenFailure },

    /// Page index out of bounds
    #[error("Page index {index} out of bounds (document has {count} pages)")]
    PageIndexOutOfBounds { index: usize, count: usize },

    /// A session or handle was used after it was closed
    #[error("{resource} used after close")]
    ClosedResource { resource: &'static str },

    /// Failed to load page
    #[error("Failed to load page {index}")]
    PageLoadFailed { index: usize },

    /// Failed to create the text page for a page
    #[error("Failed to load text for page {index}")]
    TextInitFailed { index: usize },

    /// Failed to initialize the form-fill environment
    #[error("Failed to initialize form-fill environment")]
    FormOpenFailed,

    /// A page-scoped form call was made on a page that is not attached
    #[error("Page {index} is not attached to the form environment")]
    PageNotAttached { index: usize },

    /// The engine refused to start a text search
    #[error("Failed to start text search on page {index}")]
    SearchStartFailed { index: usize },

    /// Failed to save document
    #[error("Failed to save document: {reason}")]
    SaveFailed { reason: String },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
