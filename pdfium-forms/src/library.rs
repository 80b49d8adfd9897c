//! Process-wide engine lifecycle.
//!
//! The engine must be initialized once before any document is opened and torn
//! down once after the last one is closed. [`Library`] is a reference-counted
//! acquisition of an engine: the first live acquisition initializes it, the
//! last one to drop tears it down. Every session holds its own acquisition, so
//! the engine outlives every handle taken from it.
//!
//! # Example
//!
//! ```
//! use pdfium_forms::{Library, MemoryEngine};
//! use std::sync::Arc;
//!
//! let engine = Arc::new(MemoryEngine::new());
//! let library = Library::new(engine.clone());
//! assert_eq!(engine.init_calls(), 1);
//!
//! let second = library.clone();
//! drop(library);
//! assert_eq!(engine.destroy_calls(), 0);
//! drop(second);
//! assert_eq!(engine.destroy_calls(), 1);
//! ```

use crate::document::{DocumentSession, OpenOptions};
use crate::engine::Engine;
use crate::error::Result;
use log::debug;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct Shared {
    engine: Arc<dyn Engine>,
    refs: AtomicUsize,
    // Serializes the 0 -> 1 and 1 -> 0 transitions with the engine calls
    // they trigger.
    transition: Mutex<()>,
}

impl Shared {
    fn new(engine: Arc<dyn Engine>) -> Arc<Self> {
        Arc::new(Self {
            engine,
            refs: AtomicUsize::new(0),
            transition: Mutex::new(()),
        })
    }

    fn acquire(self: &Arc<Self>) -> Library {
        let _guard = self.transition.lock().unwrap_or_else(|e| e.into_inner());
        if self.refs.fetch_add(1, Ordering::AcqRel) == 0 {
            debug!("initializing document engine");
            self.engine.init_library();
        }
        Library {
            shared: Arc::clone(self),
        }
    }

    fn release(&self) {
        let _guard = self.transition.lock().unwrap_or_else(|e| e.into_inner());
        if self.refs.fetch_sub(1, Ordering::AcqRel) == 1 {
            debug!("destroying document engine");
            self.engine.destroy_library();
        }
    }
}

/// A live acquisition of a document engine.
///
/// Cloning acquires again; dropping releases.
pub struct Library {
    shared: Arc<Shared>,
}

impl Library {
    /// Wrap an engine and take the first acquisition of it.
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Shared::new(engine).acquire()
    }

    /// Acquire the process-wide PDFium engine.
    ///
    /// All calls share one engine instance. It is initialized on the first
    /// acquisition and destroyed when the last acquisition is dropped; a
    /// later call initializes it again.
    #[cfg(feature = "pdfium")]
    pub fn pdfium() -> Self {
        use std::sync::OnceLock;

        static PDFIUM: OnceLock<Arc<Shared>> = OnceLock::new();
        PDFIUM
            .get_or_init(|| Shared::new(Arc::new(crate::pdfium::PdfiumEngine::new())))
            .acquire()
    }

    /// The engine behind this acquisition.
    pub fn engine(&self) -> &dyn Engine {
        self.shared.engine.as_ref()
    }

    /// Number of live acquisitions of this engine.
    pub fn reference_count(&self) -> usize {
        self.shared.refs.load(Ordering::Acquire)
    }

    /// Open a document from bytes. See [`DocumentSession::open_bytes`].
    pub fn open_bytes(&self, data: impl Into<Vec<u8>>, options: &OpenOptions) -> Result<DocumentSession> {
        DocumentSession::open_bytes(self, data, options)
    }

    /// Open a document from a file. See [`DocumentSession::open_path`].
    pub fn open_path<P: AsRef<Path>>(&self, path: P, options: &OpenOptions) -> Result<DocumentSession> {
        DocumentSession::open_path(self, path, options)
    }

    /// Open a document from a reader. See [`DocumentSession::open_reader`].
    pub fn open_reader<R: Read>(&self, reader: R, options: &OpenOptions) -> Result<DocumentSession> {
        DocumentSession::open_reader(self, reader, options)
    }

    /// Create an empty document. See [`DocumentSession::create`].
    pub fn create_document(&self) -> Result<DocumentSession> {
        DocumentSession::create(self)
    }
}

impl Clone for Library {
    fn clone(&self) -> Self {
        self.shared.acquire()
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        self.shared.release();
    }
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("references", &self.reference_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEngine;
    use std::thread;

    #[test]
    fn test_first_acquire_initializes() {
        let engine = Arc::new(MemoryEngine::new());
        let library = Library::new(engine.clone());
        assert_eq!(engine.init_calls(), 1);
        assert_eq!(library.reference_count(), 1);
    }

    #[test]
    fn test_last_release_tears_down() {
        let engine = Arc::new(MemoryEngine::new());
        let library = Library::new(engine.clone());
        let clones: Vec<Library> = (0..4).map(|_| library.clone()).collect();
        assert_eq!(library.reference_count(), 5);
        assert_eq!(engine.init_calls(), 1);

        drop(library);
        drop(clones);
        assert_eq!(engine.init_calls(), 1);
        assert_eq!(engine.destroy_calls(), 1);
    }

    #[test]
    fn test_concurrent_acquire_release() {
        let engine = Arc::new(MemoryEngine::new());
        let library = Library::new(engine.clone());

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let lib = library.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        let extra = lib.clone();
                        drop(extra);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(library.reference_count(), 1);
        assert_eq!(engine.init_calls(), 1);
        assert_eq!(engine.destroy_calls(), 0);
        drop(library);
        assert_eq!(engine.destroy_calls(), 1);
    }

    #[test]
    fn test_session_keeps_library_alive() {
        let engine = Arc::new(MemoryEngine::new());
        let library = Library::new(engine.clone());
        let doc = library.create_document().unwrap();
        drop(library);
        assert_eq!(engine.destroy_calls(), 0);
        drop(doc);
        assert_eq!(engine.destroy_calls(), 1);
    }
}
