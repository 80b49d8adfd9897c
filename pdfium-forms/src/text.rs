//! Text sessions: the text layer of an open page.

use crate::engine::{Engine, Rect};
use crate::error::{PdfError, Result};
use crate::handle::{Resource, TextPageHandle};
use crate::page::PageSession;
use crate::search::{SearchOptions, TextSearch};
use log::debug;

/// The text layer of a page.
///
/// Released on [`close`](Self::close) or drop. Search cursors borrow the
/// session and are released before it.
///
/// # Example
///
/// ```
/// use pdfium_forms::{Library, MemoryDocument, MemoryEngine, MemoryPage, OpenOptions, SearchOptions};
/// use std::sync::Arc;
///
/// let engine = Arc::new(MemoryEngine::new());
/// let bytes = engine.add_document(
///     MemoryDocument::new().with_page(MemoryPage::letter().with_text("Name: Date of birth:")),
/// );
/// let library = Library::new(engine);
/// let doc = library.open_bytes(bytes, &OpenOptions::new())?;
/// let page = doc.open_page(0)?;
/// let text = page.open_text_session()?;
///
/// assert_eq!(text.char_count()?, 20);
/// let mut search = text.search("date", &SearchOptions::new())?;
/// let found = search.find_next()?.unwrap();
/// assert_eq!(found.start, 6);
/// # Ok::<(), pdfium_forms::PdfError>(())
/// ```
pub struct TextSession<'page> {
    page: &'page PageSession<'page>,
    handle: Resource<TextPageHandle>,
}

impl<'page> TextSession<'page> {
    pub(crate) fn new(page: &'page PageSession<'page>, handle: Resource<TextPageHandle>) -> Self {
        Self { page, handle }
    }

    pub(crate) fn engine(&self) -> &'page dyn Engine {
        self.page.engine()
    }

    pub(crate) fn handle(&self) -> Result<TextPageHandle> {
        self.handle.get()
    }

    /// Index of the page this text belongs to.
    pub fn page_index(&self) -> usize {
        self.page.index()
    }

    /// Number of characters on the page.
    pub fn char_count(&self) -> Result<usize> {
        let handle = self.handle()?;
        Ok(self.engine().char_count(handle).max(0) as usize)
    }

    /// All text on the page.
    pub fn text(&self) -> Result<String> {
        let count = self.char_count()?;
        self.text_range(0, count)
    }

    /// `count` characters starting at `start`, clamped to the end of the
    /// page.
    pub fn text_range(&self, start: usize, count: usize) -> Result<String> {
        let handle = self.handle()?;
        let count = count.min(self.char_count()?.saturating_sub(start));
        if count == 0 {
            return Ok(String::new());
        }
        let (Ok(raw_start), Ok(raw_count)) = (i32::try_from(start), i32::try_from(count)) else {
            return Err(PdfError::InvalidParameter(format!(
                "text range {}+{} out of range",
                start, count
            )));
        };
        let mut buffer = vec![0u16; count + 1];
        let written = self.engine().text_range(handle, raw_start, raw_count, &mut buffer);
        if written <= 0 {
            return Ok(String::new());
        }
        // The engine counts the terminator.
        let units = (written as usize - 1).min(count);
        Ok(String::from_utf16_lossy(&buffer[..units]))
    }

    /// Bounding box of one character.
    pub fn char_box(&self, index: usize) -> Result<Option<Rect>> {
        let handle = self.handle()?;
        let Ok(raw) = i32::try_from(index) else {
            return Ok(None);
        };
        Ok(self.engine().char_box(handle, raw))
    }

    /// Index of the character at a page position, within `tolerance` points.
    pub fn char_index_at(&self, x: f64, y: f64, tolerance: f64) -> Result<Option<usize>> {
        let handle = self.handle()?;
        let index = self.engine().char_index_at(handle, x, y, tolerance);
        Ok(usize::try_from(index).ok())
    }

    /// Rectangles covering `count` characters starting at `start`.
    pub fn rects(&self, start: usize, count: usize) -> Result<Vec<Rect>> {
        let handle = self.handle()?;
        let engine = self.engine();
        let (Ok(raw_start), Ok(raw_count)) = (i32::try_from(start), i32::try_from(count)) else {
            return Ok(Vec::new());
        };
        let n = engine.count_rects(handle, raw_start, raw_count).max(0);
        Ok((0..n).filter_map(|i| engine.rect(handle, i)).collect())
    }

    /// Start a search cursor over this page's text.
    pub fn search(&self, pattern: &str, options: &SearchOptions) -> Result<TextSearch<'_>> {
        TextSearch::start(self, pattern, options)
    }

    /// Release the text page. Idempotent.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("closing text page {}", self.page.index());
            self.engine().close_text_page(handle);
        }
    }
}

impl Drop for TextSession<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
