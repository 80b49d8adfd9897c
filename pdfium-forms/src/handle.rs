//! Opaque engine handles and the liveness wrapper around them.
//!
//! Handles are plain tokens: the engine owns the memory behind them and this
//! crate never dereferences one. A zero value is the null sentinel and means
//! "not present".

use crate::error::{PdfError, Result};

/// Common behaviour of every engine handle type.
pub trait Handle: Copy + Eq + std::fmt::Debug {
    /// Human-readable name used in error messages and logs.
    const KIND: &'static str;

    /// Wrap a raw handle value.
    fn from_raw(raw: usize) -> Self;

    /// The raw handle value.
    fn as_raw(self) -> usize;

    /// Whether this is the null sentinel.
    fn is_null(self) -> bool {
        self.as_raw() == 0
    }
}

macro_rules! define_handle {
    ($($(#[$meta:meta])* $name:ident => $kind:literal),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
            pub struct $name(usize);

            impl $name {
                /// The null sentinel.
                pub const NULL: Self = Self(0);
            }

            impl Handle for $name {
                const KIND: &'static str = $kind;

                fn from_raw(raw: usize) -> Self {
                    Self(raw)
                }

                fn as_raw(self) -> usize {
                    self.0
                }
            }
        )*
    };
}

define_handle! {
    /// A loaded document.
    DocumentHandle => "document",
    /// A loaded page.
    PageHandle => "page",
    /// The text layer of a page.
    TextPageHandle => "text page",
    /// A running text search.
    SearchHandle => "search",
    /// A form-fill environment.
    FormHandle => "form environment",
    /// An annotation taken from a page.
    AnnotationHandle => "annotation",
    /// A link on a page. Borrowed from the page, never released.
    LinkHandle => "link",
    /// A signature dictionary. Borrowed from the document, never released.
    SignatureHandle => "signature",
}

/// An owned handle plus its liveness flag.
///
/// Created from a successful acquisition; [`take`](Self::take) hands the
/// handle back exactly once so the caller can release it. Every later access
/// fails with [`PdfError::ClosedResource`].
#[derive(Debug)]
pub struct Resource<H: Handle> {
    handle: H,
    live: bool,
}

impl<H: Handle> Resource<H> {
    /// Take ownership of a freshly acquired handle. Returns `None` for null.
    pub fn acquire(handle: H) -> Option<Self> {
        if handle.is_null() {
            None
        } else {
            Some(Self { handle, live: true })
        }
    }

    /// The handle, if it has not been released yet.
    pub fn get(&self) -> Result<H> {
        if self.live {
            Ok(self.handle)
        } else {
            Err(PdfError::ClosedResource { resource: H::KIND })
        }
    }

    /// Mark the resource released and return the handle to release.
    ///
    /// Returns `Some` only on the first call.
    pub fn take(&mut self) -> Option<H> {
        if self.live {
            self.live = false;
            Some(self.handle)
        } else {
            None
        }
    }

    /// Whether the handle is still owned.
    pub fn is_live(&self) -> bool {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handle_is_not_acquired() {
        assert!(PageHandle::NULL.is_null());
        assert!(Resource::acquire(PageHandle::NULL).is_none());
    }

    #[test]
    fn test_take_only_once() {
        let mut res = Resource::acquire(DocumentHandle::from_raw(7)).unwrap();
        assert!(res.is_live());
        assert_eq!(res.get().unwrap(), DocumentHandle::from_raw(7));
        assert_eq!(res.take(), Some(DocumentHandle::from_raw(7)));
        assert_eq!(res.take(), None);
        assert!(!res.is_live());
    }

    #[test]
    fn test_get_after_take_fails_fast() {
        let mut res = Resource::acquire(AnnotationHandle::from_raw(3)).unwrap();
        res.take();
        match res.get() {
            Err(PdfError::ClosedResource { resource }) => assert_eq!(resource, "annotation"),
            other => panic!("expected ClosedResource, got {:?}", other),
        }
    }
}
