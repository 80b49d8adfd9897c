//! Text search cursors.
//!
//! A [`TextSearch`] is a sub-resource of a [`TextSession`]: each started
//! search is one release obligation, discharged by
//! [`close`](TextSearch::close) or drop.

use crate::error::{PdfError, Result};
use crate::handle::{Resource, SearchHandle};
use crate::text::TextSession;

/// Search option flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    /// Case-sensitive matching.
    pub match_case: bool,
    /// Match whole words only.
    pub match_whole_word: bool,
    /// Find consecutive matches (no gap between matches).
    pub consecutive: bool,
    /// Character index to start from.
    pub start_index: usize,
}

impl SearchOptions {
    /// Create new search options with all flags disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable case-sensitive matching.
    pub fn match_case(mut self) -> Self {
        self.match_case = true;
        self
    }

    /// Enable whole word matching.
    pub fn match_whole_word(mut self) -> Self {
        self.match_whole_word = true;
        self
    }

    /// Enable consecutive matching.
    pub fn consecutive(mut self) -> Self {
        self.consecutive = true;
        self
    }

    /// Start searching at character `index`.
    pub fn starting_at(mut self, index: usize) -> Self {
        self.start_index = index;
        self
    }

    /// Convert to engine flags.
    pub(crate) fn to_flags(self) -> u32 {
        let mut flags = 0u32;
        if self.match_case {
            flags |= 0x0001;
        }
        if self.match_whole_word {
            flags |= 0x0002;
        }
        if self.consecutive {
            flags |= 0x0004;
        }
        flags
    }
}

/// One match: `count` characters starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMatch {
    pub start: usize,
    pub count: usize,
}

/// A running search over a page's text.
pub struct TextSearch<'text> {
    text: &'text TextSession<'text>,
    handle: Resource<SearchHandle>,
    current: Option<TextMatch>,
}

impl<'text> TextSearch<'text> {
    pub(crate) fn start(
        text: &'text TextSession<'text>,
        pattern: &str,
        options: &SearchOptions,
    ) -> Result<Self> {
        let text_handle = text.handle()?;
        if pattern.is_empty() {
            return Err(PdfError::InvalidParameter("empty search pattern".to_string()));
        }
        let start = i32::try_from(options.start_index).unwrap_or(i32::MAX);
        let handle = text
            .engine()
            .find_start(text_handle, pattern, options.to_flags(), start);
        let handle = Resource::acquire(handle).ok_or(PdfError::SearchStartFailed {
            index: text.page_index(),
        })?;
        Ok(Self {
            text,
            handle,
            current: None,
        })
    }

    fn step(&mut self, forward: bool) -> Result<Option<TextMatch>> {
        let handle = self.handle.get()?;
        let engine = self.text.engine();
        let found = if forward {
            engine.find_next(handle)
        } else {
            engine.find_prev(handle)
        };
        self.current = if found {
            let start = engine.search_result_index(handle);
            let count = engine.search_result_count(handle);
            match (usize::try_from(start), usize::try_from(count)) {
                (Ok(start), Ok(count)) => Some(TextMatch { start, count }),
                _ => None,
            }
        } else {
            None
        };
        Ok(self.current)
    }

    /// Advance to the next match.
    pub fn find_next(&mut self) -> Result<Option<TextMatch>> {
        self.step(true)
    }

    /// Step back to the previous match.
    pub fn find_prev(&mut self) -> Result<Option<TextMatch>> {
        self.step(false)
    }

    /// The match the cursor is on, if any.
    pub fn current_match(&self) -> Option<TextMatch> {
        self.current
    }

    /// Collect every remaining match, then release the cursor.
    pub fn find_all(mut self) -> Result<Vec<TextMatch>> {
        let mut matches = Vec::new();
        while let Some(found) = self.find_next()? {
            matches.push(found);
        }
        Ok(matches)
    }

    /// Release the search cursor. Idempotent.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.text.engine().find_close(handle);
        }
        self.current = None;
    }
}

impl Drop for TextSearch<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
