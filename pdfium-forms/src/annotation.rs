//! Raw page annotations.
//!
//! An [`Annotation`] is one acquisition of an annotation handle from a page.
//! It is released exactly once: explicitly with [`Annotation::release`] or
//! implicitly on drop. Form fields are annotations too; see
//! [`crate::field`] for the classified view.

use crate::engine::{Engine, Rect};
use crate::error::Result;
use crate::handle::{AnnotationHandle, Resource};
use crate::page::PageSession;
use crate::strings::read_utf16_string;
use log::trace;

/// Annotation subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    /// Unknown or unsupported subtype
    Unknown,
    /// Sticky note
    Text,
    /// Hyperlink
    Link,
    /// Text highlight
    Highlight,
    /// Interactive form widget
    Widget,
    /// Any other subtype, by its raw value
    Other(i32),
}

impl AnnotationKind {
    /// Create annotation kind from the raw engine subtype.
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => Self::Unknown,
            1 => Self::Text,
            2 => Self::Link,
            9 => Self::Highlight,
            20 => Self::Widget,
            other => Self::Other(other),
        }
    }
}

/// An annotation acquired from a page.
pub struct Annotation<'page> {
    page: &'page PageSession<'page>,
    handle: Resource<AnnotationHandle>,
    index: usize,
}

impl<'page> Annotation<'page> {
    pub(crate) fn new(
        page: &'page PageSession<'page>,
        handle: Resource<AnnotationHandle>,
        index: usize,
    ) -> Self {
        Self {
            page,
            handle,
            index,
        }
    }

    fn engine(&self) -> &dyn Engine {
        self.page.engine()
    }

    /// Position of this annotation in the page's annotation list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The page this annotation was taken from.
    pub fn page(&self) -> &'page PageSession<'page> {
        self.page
    }

    pub(crate) fn handle(&self) -> Result<AnnotationHandle> {
        self.handle.get()
    }

    /// Annotation subtype.
    pub fn kind(&self) -> Result<AnnotationKind> {
        let handle = self.handle()?;
        Ok(AnnotationKind::from_raw(self.engine().annotation_subtype(handle)))
    }

    /// Bounding rectangle, if the annotation has one.
    pub fn rect(&self) -> Result<Option<Rect>> {
        let handle = self.handle()?;
        Ok(self.engine().annotation_rect(handle))
    }

    /// A string entry of the annotation dictionary (`Contents`, `T`, ...).
    ///
    /// Absent entries read as an empty string.
    pub fn string_value(&self, key: &str) -> Result<String> {
        let handle = self.handle()?;
        let engine = self.engine();
        Ok(read_utf16_string(|buf| engine.annotation_string(handle, key, buf)).unwrap_or_default())
    }

    /// Whether the handle is still held.
    pub fn is_live(&self) -> bool {
        self.handle.is_live()
    }

    /// Release the annotation handle now.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(handle) = self.handle.take() {
            trace!(
                "releasing annotation {} on page {}",
                self.index,
                self.page.index()
            );
            self.page.engine().close_annotation(handle);
        }
    }
}

impl Drop for Annotation<'_> {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl std::fmt::Debug for Annotation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotation")
            .field("page", &self.page.index())
            .field("index", &self.index)
            .field("live", &self.handle.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::OpenOptions;
    use crate::handle::Handle;
    use crate::library::Library;
    use crate::memory::{MemoryAnnotation, MemoryDocument, MemoryEngine, MemoryPage};
    use std::sync::Arc;

    #[test]
    fn test_annotation_kind_from_raw() {
        assert_eq!(AnnotationKind::from_raw(20), AnnotationKind::Widget);
        assert_eq!(AnnotationKind::from_raw(2), AnnotationKind::Link);
        assert_eq!(AnnotationKind::from_raw(14), AnnotationKind::Other(14));
    }

    #[test]
    fn test_release_once_on_drop_and_explicit() {
        let engine = Arc::new(MemoryEngine::new());
        let bytes = engine.add_document(
            MemoryDocument::new().with_page(
                MemoryPage::letter()
                    .with_annotation(
                        MemoryAnnotation::other(1, Rect::new(0.0, 10.0, 10.0, 0.0))
                            .with_entry("Contents", "note"),
                    )
                    .with_annotation(MemoryAnnotation::other(9, Rect::default())),
            ),
        );
        let library = Library::new(engine.clone());
        let doc = library.open_bytes(bytes, &OpenOptions::new()).unwrap();
        let page = doc.open_page(0).unwrap();

        let first = page.annotation_at(0).unwrap().unwrap();
        assert_eq!(first.kind().unwrap(), AnnotationKind::Text);
        assert_eq!(first.string_value("Contents").unwrap(), "note");
        assert_eq!(first.string_value("Missing").unwrap(), "");
        first.release();

        {
            let second = page.annotation_at(1).unwrap().unwrap();
            assert_eq!(second.kind().unwrap(), AnnotationKind::Highlight);
        }

        let kind = AnnotationHandle::KIND;
        assert_eq!(engine.acquired(kind), 2);
        assert_eq!(engine.released(kind), 2);
        assert_eq!(engine.double_releases(), 0);
    }
}
