//! Page sessions.

use crate::annotation::Annotation;
use crate::document::DocumentSession;
use crate::engine::{Engine, Rect, Viewport};
use crate::error::{PdfError, Result};
use crate::handle::{Handle, PageHandle, Resource};
use crate::strings::read_byte_string;
use crate::text::TextSession;
use log::debug;
use std::cell::OnceCell;

/// A link found on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLink {
    /// Destination page inside the document, if the link has one.
    pub target_page: Option<usize>,
    /// External URI, if the link's action is a URI action.
    pub uri: Option<String>,
    /// Link area in page coordinates.
    pub rect: Option<Rect>,
}

/// An open page of a [`DocumentSession`].
///
/// The page borrows its document, so the document stays open for as long as
/// the page does. Text sessions and annotations borrow the page in turn.
pub struct PageSession<'doc> {
    document: &'doc DocumentSession,
    handle: Resource<PageHandle>,
    index: usize,
    width: OnceCell<f64>,
    height: OnceCell<f64>,
}

impl<'doc> PageSession<'doc> {
    pub(crate) fn new(document: &'doc DocumentSession, handle: Resource<PageHandle>, index: usize) -> Self {
        Self {
            document,
            handle,
            index,
            width: OnceCell::new(),
            height: OnceCell::new(),
        }
    }

    pub(crate) fn engine(&self) -> &'doc dyn Engine {
        self.document.engine()
    }

    pub(crate) fn handle(&self) -> Result<PageHandle> {
        self.handle.get()
    }

    /// The document this page belongs to.
    pub fn document(&self) -> &'doc DocumentSession {
        self.document
    }

    /// 0-based page index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the page is still open.
    pub fn is_open(&self) -> bool {
        self.handle.is_live()
    }

    /// Page width in points.
    pub fn width(&self) -> Result<f64> {
        let handle = self.handle()?;
        Ok(*self.width.get_or_init(|| self.engine().page_width(handle)))
    }

    /// Page height in points.
    pub fn height(&self) -> Result<f64> {
        let handle = self.handle()?;
        Ok(*self.height.get_or_init(|| self.engine().page_height(handle)))
    }

    /// Page size `(width, height)` in points.
    pub fn size(&self) -> Result<(f64, f64)> {
        Ok((self.width()?, self.height()?))
    }

    /// Map a device position inside `viewport` to page coordinates.
    pub fn device_to_page(&self, viewport: &Viewport, x: i32, y: i32) -> Result<Option<(f64, f64)>> {
        let handle = self.handle()?;
        Ok(self.engine().device_to_page(handle, viewport, x, y))
    }

    /// Map a page position to device coordinates inside `viewport`.
    pub fn page_to_device(&self, viewport: &Viewport, x: f64, y: f64) -> Result<Option<(i32, i32)>> {
        let handle = self.handle()?;
        Ok(self.engine().page_to_device(handle, viewport, x, y))
    }

    /// The link under a page position, if any.
    ///
    /// Link handles belong to the page and need no release.
    pub fn link_at_point(&self, x: f64, y: f64) -> Result<Option<PageLink>> {
        let handle = self.handle()?;
        let doc = self.document.handle()?;
        let engine = self.engine();
        let link = engine.link_at_point(handle, x, y);
        if link.is_null() {
            return Ok(None);
        }
        let target = engine.link_target_page(doc, link);
        Ok(Some(PageLink {
            target_page: usize::try_from(target).ok(),
            uri: read_byte_string(|buf| engine.link_uri(doc, link, buf)).filter(|u| !u.is_empty()),
            rect: engine.link_rect(link),
        }))
    }

    /// Load the text layer of this page.
    pub fn open_text_session(&self) -> Result<TextSession<'_>> {
        let handle = self.handle()?;
        let text = self.engine().load_text_page(handle);
        let text = Resource::acquire(text).ok_or(PdfError::TextInitFailed { index: self.index })?;
        Ok(TextSession::new(self, text))
    }

    /// Number of annotations on the page.
    pub fn annotation_count(&self) -> Result<usize> {
        let handle = self.handle()?;
        Ok(self.engine().annotation_count(handle).max(0) as usize)
    }

    /// Acquire the annotation at `index`. `None` when the engine has none there.
    pub fn annotation_at(&self, index: usize) -> Result<Option<Annotation<'_>>> {
        let handle = self.handle()?;
        let Ok(raw) = i32::try_from(index) else {
            return Ok(None);
        };
        let annot = self.engine().annotation(handle, raw);
        Ok(Resource::acquire(annot).map(|annot| Annotation::new(self, annot, index)))
    }

    /// Release the page handle. Idempotent; later calls fail with
    /// [`PdfError::ClosedResource`].
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("closing page {}", self.index);
            self.engine().close_page(handle);
        }
    }
}

impl Drop for PageSession<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for PageSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageSession")
            .field("index", &self.index)
            .field("open", &self.handle.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::OpenOptions;
    use crate::library::Library;
    use crate::memory::{MemoryDocument, MemoryEngine, MemoryLink, MemoryPage};
    use std::sync::Arc;

    fn open(document: MemoryDocument) -> (Arc<MemoryEngine>, DocumentSession) {
        let engine = Arc::new(MemoryEngine::new());
        let bytes = engine.add_document(document);
        let library = Library::new(engine.clone());
        let doc = library.open_bytes(bytes, &OpenOptions::new()).unwrap();
        (engine, doc)
    }

    #[test]
    fn test_page_size_is_lazy_and_cached() {
        let (_engine, doc) = open(MemoryDocument::new().with_page(MemoryPage::new(300.0, 400.0)));
        let page = doc.open_page(0).unwrap();
        assert_eq!(page.size().unwrap(), (300.0, 400.0));
        assert_eq!(page.width().unwrap(), 300.0);
    }

    #[test]
    fn test_close_is_idempotent_and_fails_fast() {
        let (engine, doc) = open(MemoryDocument::new().with_page(MemoryPage::letter()));
        let mut page = doc.open_page(0).unwrap();
        page.close();
        page.close();
        assert!(matches!(page.width(), Err(PdfError::ClosedResource { .. })));
        assert!(matches!(page.annotation_count(), Err(PdfError::ClosedResource { .. })));
        assert!(page.open_text_session().is_err());
        drop(page);
        assert_eq!(engine.released(PageHandle::KIND), 1);
        assert_eq!(engine.double_releases(), 0);
    }

    #[test]
    fn test_page_reopen() {
        let (engine, doc) = open(MemoryDocument::new().with_page(MemoryPage::letter()));
        for _ in 0..3 {
            let page = doc.open_page(0).unwrap();
            assert_eq!(page.index(), 0);
        }
        assert_eq!(engine.acquired(PageHandle::KIND), 3);
        assert_eq!(engine.released(PageHandle::KIND), 3);
    }

    #[test]
    fn test_page_load_failure() {
        let (engine, doc) = open(MemoryDocument::new().with_page(MemoryPage::letter()));
        engine.fail_page_load(0);
        assert!(matches!(doc.open_page(0), Err(PdfError::PageLoadFailed { index: 0 })));
    }

    #[test]
    fn test_coordinate_mapping_round_trip() {
        let (_engine, doc) = open(MemoryDocument::new().with_page(MemoryPage::letter()));
        let page = doc.open_page(0).unwrap();
        let viewport = Viewport::new(1224, 1584);

        let (x, y) = page.page_to_device(&viewport, 306.0, 792.0).unwrap().unwrap();
        assert_eq!((x, y), (612, 0));
        let (px, py) = page.device_to_page(&viewport, 612, 0).unwrap().unwrap();
        assert!((px - 306.0).abs() < 1e-9);
        assert!((py - 792.0).abs() < 1e-9);
    }

    #[test]
    fn test_link_at_point() {
        let (_engine, doc) = open(
            MemoryDocument::new()
                .with_page(
                    MemoryPage::letter()
                        .with_link(MemoryLink {
                            rect: Rect::new(10.0, 50.0, 100.0, 30.0),
                            target_page: Some(1),
                            uri: None,
                        })
                        .with_link(MemoryLink {
                            rect: Rect::new(10.0, 150.0, 100.0, 130.0),
                            target_page: None,
                            uri: Some("https://example.com/help".into()),
                        }),
                )
                .with_page(MemoryPage::letter()),
        );
        let page = doc.open_page(0).unwrap();

        let internal = page.link_at_point(50.0, 40.0).unwrap().unwrap();
        assert_eq!(internal.target_page, Some(1));
        assert_eq!(internal.uri, None);

        let external = page.link_at_point(50.0, 140.0).unwrap().unwrap();
        assert_eq!(external.target_page, None);
        assert_eq!(external.uri.as_deref(), Some("https://example.com/help"));

        assert!(page.link_at_point(500.0, 500.0).unwrap().is_none());
    }
}
