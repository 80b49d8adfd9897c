//! Document sessions.
//!
//! A [`DocumentSession`] owns one document handle and, for in-memory opens,
//! the source buffer the engine reads from. The buffer is kept until the
//! handle is released. Pages borrow the session, so a document cannot be
//! closed while any of its pages is open.

use crate::engine::Engine;
use crate::error::{OpenFailure, PdfError, Result};
use crate::form::FormKind;
use crate::handle::{DocumentHandle, Handle, Resource};
use crate::library::Library;
use crate::page::PageSession;
use crate::strings::{read_byte_string, read_utf16_string};
use log::debug;
use std::cell::OnceCell;
use std::io::Read;
use std::path::Path;

/// Options for opening a document.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    password: Option<String>,
}

impl OpenOptions {
    /// Options with no password.
    pub fn new() -> Self {
        Self::default()
    }

    /// Password for encrypted documents.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// The configured password, if any.
    pub fn password_ref(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

/// Metadata of one signature dictionary. Not verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    /// Reason for signing, as written by the signer.
    pub reason: Option<String>,
    /// Signing time as a PDF date string (`D:YYYYMMDDHHmmSS...`).
    pub signed_at: Option<String>,
}

/// An open document.
///
/// `DocumentSession` is `Send` but not `Sync`: it may move to another thread,
/// but one session is never used from two threads at once.
///
/// # Example
///
/// ```
/// use pdfium_forms::{Library, MemoryDocument, MemoryEngine, MemoryPage, OpenOptions};
/// use std::sync::Arc;
///
/// let engine = Arc::new(MemoryEngine::new());
/// let bytes = engine.add_document(
///     MemoryDocument::new()
///         .with_metadata("Title", "Application")
///         .with_page(MemoryPage::letter()),
/// );
/// let library = Library::new(engine);
///
/// let mut doc = library.open_bytes(bytes, &OpenOptions::new())?;
/// assert_eq!(doc.page_count()?, 1);
/// assert_eq!(doc.metadata("Title")?.as_deref(), Some("Application"));
/// doc.close();
/// assert!(doc.page_count().is_err());
/// # Ok::<(), pdfium_forms::PdfError>(())
/// ```
pub struct DocumentSession {
    library: Library,
    handle: Resource<DocumentHandle>,
    page_count: OnceCell<usize>,
    // Engine reads from this buffer until the handle is released.
    source: Option<Box<[u8]>>,
}

impl DocumentSession {
    /// Open a document from bytes. The session keeps the bytes until close.
    pub fn open_bytes(
        library: &Library,
        data: impl Into<Vec<u8>>,
        options: &OpenOptions,
    ) -> Result<Self> {
        let source: Box<[u8]> = data.into().into_boxed_slice();
        let password = options.password_ref();
        let engine = library.engine();
        let handle = engine.load_document(&source, password);
        let Some(handle) = Resource::acquire(handle) else {
            let reason = OpenFailure::from_error_code(engine.last_error(), password.is_some());
            debug!("document open failed: {}", reason);
            return Err(PdfError::Open { reason });
        };
        debug!("opened document ({} bytes)", source.len());
        Ok(Self {
            library: library.clone(),
            handle,
            page_count: OnceCell::new(),
            source: Some(source),
        })
    }

    /// Open a document from a file path.
    pub fn open_path<P: AsRef<Path>>(library: &Library, path: P, options: &OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|err| {
            debug!("cannot read {}: {}", path.display(), err);
            PdfError::Open {
                reason: OpenFailure::Io,
            }
        })?;
        Self::open_bytes(library, data, options)
    }

    /// Open a document from a reader. The stream is read to the end first.
    pub fn open_reader<R: Read>(library: &Library, mut reader: R, options: &OpenOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::open_bytes(library, data, options)
    }

    /// Create a new, empty document.
    pub fn create(library: &Library) -> Result<Self> {
        let handle = library.engine().create_document();
        let handle = Resource::acquire(handle).ok_or(PdfError::Open {
            reason: OpenFailure::Unknown,
        })?;
        debug!("created empty document");
        Ok(Self {
            library: library.clone(),
            handle,
            page_count: OnceCell::new(),
            source: None,
        })
    }

    pub(crate) fn engine(&self) -> &dyn Engine {
        self.library.engine()
    }

    pub(crate) fn handle(&self) -> Result<DocumentHandle> {
        self.handle.get()
    }

    /// The library this session was opened with.
    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Whether the document is still open.
    pub fn is_open(&self) -> bool {
        self.handle.is_live()
    }

    /// Number of pages. Queried once and cached.
    pub fn page_count(&self) -> Result<usize> {
        let handle = self.handle()?;
        Ok(*self
            .page_count
            .get_or_init(|| self.engine().page_count(handle).max(0) as usize))
    }

    fn check_index(&self, index: usize) -> Result<i32> {
        let count = self.page_count()?;
        if index >= count {
            return Err(PdfError::PageIndexOutOfBounds { index, count });
        }
        i32::try_from(index).map_err(|_| PdfError::PageIndexOutOfBounds { index, count })
    }

    /// A document information entry (`Title`, `Author`, `Subject`,
    /// `Keywords`, `Creator`, `Producer`, `CreationDate`, `ModDate`).
    ///
    /// Returns `None` when the engine reports nothing for the tag.
    pub fn metadata(&self, tag: &str) -> Result<Option<String>> {
        let handle = self.handle()?;
        if tag.contains('\0') {
            return Err(PdfError::InvalidParameter(format!(
                "metadata tag contains NUL: {:?}",
                tag
            )));
        }
        let engine = self.engine();
        Ok(read_utf16_string(|buf| engine.metadata(handle, tag, buf)))
    }

    /// Page label of a page (e.g. "iii" or "A-1"), if the document defines one.
    pub fn page_label(&self, index: usize) -> Result<Option<String>> {
        let handle = self.handle()?;
        let raw = self.check_index(index)?;
        let engine = self.engine();
        Ok(read_utf16_string(|buf| engine.page_label(handle, raw, buf)).filter(|l| !l.is_empty()))
    }

    /// Page size in points without loading the page.
    pub fn page_size(&self, index: usize) -> Result<Option<(f64, f64)>> {
        let handle = self.handle()?;
        let raw = self.check_index(index)?;
        Ok(self.engine().page_size(handle, raw))
    }

    /// Open a page.
    ///
    /// # Errors
    ///
    /// [`PdfError::PageIndexOutOfBounds`] when `index >= page_count()`, and
    /// [`PdfError::PageLoadFailed`] when the engine cannot load the page.
    pub fn open_page(&self, index: usize) -> Result<PageSession<'_>> {
        let handle = self.handle()?;
        let raw = self.check_index(index)?;
        let page = self.engine().load_page(handle, raw);
        let page = Resource::acquire(page).ok_or(PdfError::PageLoadFailed { index })?;
        debug!("opened page {}", index);
        Ok(PageSession::new(self, page, index))
    }

    /// The kind of interactive form the document carries.
    pub fn form_kind(&self) -> Result<FormKind> {
        let handle = self.handle()?;
        Ok(FormKind::from_raw(self.engine().form_type(handle)))
    }

    /// Signature dictionaries, as plain strings.
    pub fn signatures(&self) -> Result<Vec<SignatureInfo>> {
        let handle = self.handle()?;
        let engine = self.engine();
        let count = engine.signature_count(handle).max(0);
        let mut signatures = Vec::with_capacity(count as usize);
        for index in 0..count {
            let sig = engine.signature(handle, index);
            if sig.is_null() {
                continue;
            }
            signatures.push(SignatureInfo {
                reason: read_utf16_string(|buf| engine.signature_reason(sig, buf)),
                signed_at: read_byte_string(|buf| engine.signature_time(sig, buf)),
            });
        }
        Ok(signatures)
    }

    /// Serialize the current document, including any form edits.
    pub fn save_to_bytes(&self) -> Result<Vec<u8>> {
        let handle = self.handle()?;
        self.engine()
            .save_document(handle)
            .ok_or_else(|| PdfError::SaveFailed {
                reason: "engine refused to write the document".to_string(),
            })
    }

    /// Serialize the current document to a file.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.save_to_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        debug!("saved document to {}", path.as_ref().display());
        Ok(())
    }

    /// Release the document handle, then the source buffer. Idempotent.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("closing document");
            self.engine().close_document(handle);
        }
        self.source = None;
    }
}

impl Drop for DocumentSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSession")
            .field("open", &self.is_open())
            .field("page_count", &self.page_count.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDocument, MemoryEngine, MemoryPage};
    use std::sync::Arc;

    fn setup(document: MemoryDocument) -> (Arc<MemoryEngine>, Library, Vec<u8>) {
        let engine = Arc::new(MemoryEngine::new());
        let bytes = engine.add_document(document);
        let library = Library::new(engine.clone());
        (engine, library, bytes)
    }

    fn two_pages() -> MemoryDocument {
        MemoryDocument::new()
            .with_metadata("Title", "Two pages")
            .with_page(MemoryPage::letter().with_label("i"))
            .with_page(MemoryPage::new(595.0, 842.0))
    }

    #[test]
    fn test_open_page_index_matches() {
        let (_engine, library, bytes) = setup(two_pages());
        let doc = library.open_bytes(bytes, &OpenOptions::new()).unwrap();
        for i in 0..doc.page_count().unwrap() {
            assert_eq!(doc.open_page(i).unwrap().index(), i);
        }
    }

    #[test]
    fn test_open_page_out_of_range() {
        let (_engine, library, bytes) = setup(two_pages());
        let doc = library.open_bytes(bytes, &OpenOptions::new()).unwrap();
        match doc.open_page(2) {
            Err(PdfError::PageIndexOutOfBounds { index, count }) => {
                assert_eq!(index, 2);
                assert_eq!(count, 2);
            }
            other => panic!("expected PageIndexOutOfBounds, got {:?}", other.map(|p| p.index())),
        };
    }

    #[test]
    fn test_close_is_idempotent() {
        let (engine, library, bytes) = setup(two_pages());
        let mut doc = library.open_bytes(bytes, &OpenOptions::new()).unwrap();
        doc.close();
        doc.close();
        drop(doc);
        assert_eq!(engine.released(DocumentHandle::KIND), 1);
        assert_eq!(engine.double_releases(), 0);
    }

    #[test]
    fn test_calls_after_close_fail_fast() {
        let (_engine, library, bytes) = setup(two_pages());
        let mut doc = library.open_bytes(bytes, &OpenOptions::new()).unwrap();
        doc.close();
        assert!(matches!(doc.page_count(), Err(PdfError::ClosedResource { .. })));
        assert!(matches!(doc.open_page(0), Err(PdfError::ClosedResource { .. })));
        assert!(matches!(doc.metadata("Title"), Err(PdfError::ClosedResource { .. })));
    }

    #[test]
    fn test_read_only_queries() {
        let (_engine, library, bytes) = setup(two_pages());
        let doc = library.open_bytes(bytes, &OpenOptions::new()).unwrap();
        assert_eq!(doc.metadata("Title").unwrap().as_deref(), Some("Two pages"));
        assert_eq!(doc.metadata("Author").unwrap().as_deref(), Some(""));
        assert_eq!(doc.page_label(0).unwrap().as_deref(), Some("i"));
        assert_eq!(doc.page_label(1).unwrap(), None);
        assert_eq!(doc.page_size(1).unwrap(), Some((595.0, 842.0)));
        assert!(doc.metadata("Ti\0tle").is_err());
    }

    #[test]
    fn test_open_failures() {
        let (_engine, library, _bytes) = setup(two_pages());
        match library.open_bytes(b"garbage".to_vec(), &OpenOptions::new()) {
            Err(PdfError::Open { reason }) => assert_eq!(reason, OpenFailure::BadFormat),
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
        match library.open_path("/nonexistent/form.pdf", &OpenOptions::new()) {
            Err(PdfError::Open { reason }) => assert_eq!(reason, OpenFailure::Io),
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_password_reasons() {
        let (_engine, library, bytes) = setup(two_pages().with_password("pw"));
        let err = library.open_bytes(bytes.clone(), &OpenOptions::new()).unwrap_err();
        assert!(matches!(
            err,
            PdfError::Open {
                reason: OpenFailure::PasswordRequired
            }
        ));
        let err = library
            .open_bytes(bytes.clone(), &OpenOptions::new().password("nope"))
            .unwrap_err();
        assert!(matches!(
            err,
            PdfError::Open {
                reason: OpenFailure::PasswordIncorrect
            }
        ));
        assert!(library.open_bytes(bytes, &OpenOptions::new().password("pw")).is_ok());
    }

    #[test]
    fn test_open_reader_and_path() {
        let (_engine, library, bytes) = setup(two_pages());
        let doc = library
            .open_reader(std::io::Cursor::new(bytes.clone()), &OpenOptions::new())
            .unwrap();
        assert_eq!(doc.page_count().unwrap(), 2);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, &bytes).unwrap();
        let doc = library.open_path(&path, &OpenOptions::new()).unwrap();
        assert_eq!(doc.page_count().unwrap(), 2);
    }

    #[test]
    fn test_signatures_as_strings() {
        let (_engine, library, bytes) = setup(
            two_pages()
                .with_signature(Some("Approved"), Some("D:20240102030405Z"))
                .with_signature(None, None),
        );
        let doc = library.open_bytes(bytes, &OpenOptions::new()).unwrap();
        let signatures = doc.signatures().unwrap();
        assert_eq!(signatures.len(), 2);
        assert_eq!(signatures[0].reason.as_deref(), Some("Approved"));
        assert_eq!(signatures[0].signed_at.as_deref(), Some("D:20240102030405Z"));
        assert_eq!(signatures[1].reason, None);
    }

    #[test]
    fn test_save_to_path() {
        let (engine, library, bytes) = setup(two_pages());
        let doc = library.open_bytes(bytes, &OpenOptions::new()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.pdf");
        doc.save_to_path(&path).unwrap();
        let saved = std::fs::read(&path).unwrap();
        assert_eq!(engine.registered(&saved).unwrap().pages.len(), 2);
    }

    #[test]
    fn test_create_empty_document() {
        let (_engine, library, _bytes) = setup(two_pages());
        let doc = DocumentSession::create(&library).unwrap();
        assert_eq!(doc.page_count().unwrap(), 0);
        assert_eq!(doc.form_kind().unwrap(), FormKind::None);
        assert!(matches!(
            doc.open_page(0),
            Err(PdfError::PageIndexOutOfBounds { index: 0, count: 0 })
        ));
    }
}
