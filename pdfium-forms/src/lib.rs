//! # pdfium-forms
//!
//! Safe handle lifetimes and form-data capture over PDFium.
//!
//! PDFium hands out raw handles for documents, pages, text pages, search
//! cursors, annotations and form environments, each of which must be released
//! exactly once and in the right order. This crate wraps them in session
//! types whose borrows encode that order:
//!
//! - [`Library`] owns process-wide engine initialization
//! - [`DocumentSession`] owns a document (and the bytes it was loaded from)
//! - [`PageSession`] borrows its document; [`TextSession`] and
//!   [`Annotation`] borrow their page
//! - [`FormEnvironment`] binds a document to the form-fill subsystem, and
//!   [`PageAttachment`] keeps a page attached while its widgets are in use
//!
//! On top of that sit form snapshots: [`FormSnapshot::capture`] reads every
//! field of a document, [`validate`] checks required and length rules,
//! [`codec`] converts snapshots to and from JSON, and
//! [`FormSnapshot::restore`] writes them back into another document.
//!
//! ## Quick Start
//!
//! ```no_run
//! # #[cfg(feature = "pdfium")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use pdfium_forms::{codec, FormEnvironment, FormSnapshot, Library, OpenOptions};
//!
//! let library = Library::pdfium();
//! let doc = library.open_path("application.pdf", &OpenOptions::new())?;
//! let form = FormEnvironment::open(&doc)?;
//!
//! let snapshot = FormSnapshot::capture(&form)?;
//! println!("{}", codec::encode_pretty(&snapshot));
//!
//! let report = pdfium_forms::validate(&snapshot);
//! for field in &report.field_errors {
//!     println!("{}: {:?}", field.name, field.errors);
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "pdfium"))]
//! # fn main() {}
//! ```
//!
//! ## Engines
//!
//! Sessions talk to the document engine through the [`Engine`] trait. The
//! `pdfium` feature provides the PDFium implementation. The `memory-engine`
//! feature adds `MemoryEngine`, which models documents in memory and counts
//! every handle acquisition and release, for testing code built on this
//! crate.

mod annotation;
pub mod codec;
mod document;
mod engine;
mod error;
mod field;
mod form;
mod handle;
mod library;
#[cfg(any(test, feature = "memory-engine"))]
mod memory;
mod page;
#[cfg(feature = "pdfium")]
mod pdfium;
mod search;
mod snapshot;
pub mod strings;
mod text;
mod validate;

pub use annotation::{Annotation, AnnotationKind};
pub use codec::DecodeError;
pub use document::{DocumentSession, OpenOptions, SignatureInfo};
pub use engine::{Engine, Rect, Viewport};
pub use error::{OpenFailure, PdfError, Result};
pub use field::{Classified, FieldFlags, FieldType, FieldView};
pub use form::{FormEnvironment, FormKind, PageAttachment};
pub use handle::{
    AnnotationHandle, DocumentHandle, FormHandle, Handle, LinkHandle, PageHandle, Resource,
    SearchHandle, SignatureHandle, TextPageHandle,
};
pub use library::Library;
#[cfg(any(test, feature = "memory-engine"))]
pub use memory::{
    MemoryAnnotation, MemoryDocument, MemoryEngine, MemoryField, MemoryLink, MemoryOption,
    MemoryPage, MemorySignature, PageEvent,
};
pub use page::{PageLink, PageSession};
#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumEngine;
pub use search::{SearchOptions, TextMatch, TextSearch};
pub use snapshot::{FieldOption, FieldRecord, FormSnapshot};
pub use text::TextSession;
pub use validate::{validate, FieldErrors, ValidationError, ValidationReport};
