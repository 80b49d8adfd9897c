//! Interactive form support.
//!
//! A [`FormEnvironment`] binds a document to the engine's form-fill
//! subsystem. Pages must be attached to it before their widgets are used and
//! detached before they are closed:
//!
//! ```text
//! open page -> attach -> use fields -> detach -> close page
//! ```
//!
//! [`PageAttachment`] borrows the page, so closing an attached page does not
//! compile. Attachment is reentrant: nested attaches of the same page are
//! counted and only the outermost pair reaches the engine. Every high-level
//! operation here attaches the page it needs for its own duration.
//!
//! # Example
//!
//! ```
//! use pdfium_forms::{FormEnvironment, Library, MemoryDocument, MemoryEngine, MemoryField, MemoryPage, OpenOptions};
//! use std::sync::Arc;
//!
//! let engine = Arc::new(MemoryEngine::new());
//! let bytes = engine.add_document(
//!     MemoryDocument::new().with_page(MemoryPage::letter().with_field(MemoryField::text("firstName"))),
//! );
//! let library = Library::new(engine);
//! let doc = library.open_bytes(bytes, &OpenOptions::new())?;
//! let form = FormEnvironment::open(&doc)?;
//! let page = doc.open_page(0)?;
//!
//! if let Some(field) = form.field_by_name(&page, "firstName")? {
//!     assert!(form.set_value(&field, "Ada")?);
//!     assert_eq!(form.value(&field)?, "Ada");
//! }
//! # Ok::<(), pdfium_forms::PdfError>(())
//! ```

use crate::document::DocumentSession;
use crate::engine::Engine;
use crate::error::{PdfError, Result};
use crate::field::{Classified, FieldFlags, FieldType, FieldView};
use crate::handle::{FormHandle, PageHandle, Resource};
use crate::page::PageSession;
use crate::snapshot::FieldOption;
use crate::strings::read_utf16_string;
use log::{debug, trace, warn};
use std::cell::RefCell;
use std::collections::HashMap;

/// Type of PDF form (AcroForm vs XFA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum FormKind {
    /// No form or unknown type
    None = 0,
    /// Standard AcroForm
    AcroForm = 1,
    /// XFA form (full XFA)
    XfaFull = 2,
    /// XFA foreground form
    XfaForeground = 3,
}

impl FormKind {
    /// Create form kind from the raw engine value. Unknown values map to `None`.
    pub fn from_raw(value: i32) -> Self {
        Self::try_from(value).unwrap_or(Self::None)
    }
}

impl From<FormKind> for i32 {
    fn from(value: FormKind) -> Self {
        value as i32
    }
}

impl TryFrom<i32> for FormKind {
    type Error = i32;

    fn try_from(value: i32) -> std::result::Result<Self, i32> {
        Ok(match value {
            0 => Self::None,
            1 => Self::AcroForm,
            2 => Self::XfaFull,
            3 => Self::XfaForeground,
            other => return Err(other),
        })
    }
}

/// A form-fill session over one document.
pub struct FormEnvironment<'doc> {
    document: &'doc DocumentSession,
    handle: Resource<FormHandle>,
    // Attach depth per page handle.
    attached: RefCell<HashMap<PageHandle, usize>>,
}

impl<'doc> FormEnvironment<'doc> {
    /// Initialize the form-fill environment for `document`.
    pub fn open(document: &'doc DocumentSession) -> Result<Self> {
        let doc = document.handle()?;
        let handle = document.engine().init_form(doc);
        let handle = Resource::acquire(handle).ok_or(PdfError::FormOpenFailed)?;
        debug!("opened form environment");
        Ok(Self {
            document,
            handle,
            attached: RefCell::new(HashMap::new()),
        })
    }

    fn engine(&self) -> &'doc dyn Engine {
        self.document.engine()
    }

    pub(crate) fn handle(&self) -> Result<FormHandle> {
        self.handle.get()
    }

    /// The document this environment is bound to.
    pub fn document(&self) -> &'doc DocumentSession {
        self.document
    }

    /// Whether the environment is still open.
    pub fn is_open(&self) -> bool {
        self.handle.is_live()
    }

    /// Attach `page` to the form environment until the returned guard is
    /// dropped or detached.
    pub fn attach_page<'a>(&'a self, page: &'a PageSession<'_>) -> Result<PageAttachment<'a>> {
        let form = self.handle()?;
        let page_handle = page.handle()?;
        if !std::ptr::eq(page.document(), self.document) {
            return Err(PdfError::InvalidParameter(format!(
                "page {} belongs to another document",
                page.index()
            )));
        }

        let mut attached = self.attached.borrow_mut();
        let depth = attached.entry(page_handle).or_insert(0);
        if *depth == 0 {
            debug!("attaching page {}", page.index());
            self.engine().on_after_load_page(form, page_handle);
        }
        *depth += 1;

        Ok(PageAttachment {
            form: self,
            page: page_handle,
            index: page.index(),
            detached: false,
        })
    }

    fn detach(&self, page: PageHandle, index: usize) {
        let mut attached = self.attached.borrow_mut();
        let Some(depth) = attached.get_mut(&page) else {
            warn!("detach of page {} that is not attached", index);
            return;
        };
        *depth -= 1;
        if *depth == 0 {
            attached.remove(&page);
            if let Ok(form) = self.handle() {
                debug!("detaching page {}", index);
                self.engine().on_before_close_page(form, page);
            }
        }
    }

    /// Whether `page` is currently attached.
    pub fn is_attached(&self, page: &PageSession<'_>) -> bool {
        page.handle()
            .map(|h| self.attached.borrow().contains_key(&h))
            .unwrap_or(false)
    }

    fn require_attached(&self, page: &PageSession<'_>) -> Result<PageHandle> {
        let handle = page.handle()?;
        if self.attached.borrow().contains_key(&handle) {
            Ok(handle)
        } else {
            Err(PdfError::PageNotAttached { index: page.index() })
        }
    }

    /// Classify the annotation at `index` on an attached page.
    ///
    /// Returns `None` when the engine has no annotation at that index. Both
    /// [`Classified`] arms own the annotation; callers release the skipped
    /// arm explicitly or by dropping it.
    pub fn classify_annotation<'p>(
        &self,
        page: &'p PageSession<'_>,
        index: usize,
    ) -> Result<Option<Classified<'p>>> {
        let form = self.handle()?;
        self.require_attached(page)?;
        let Some(annotation) = page.annotation_at(index)? else {
            return Ok(None);
        };
        let annot = annotation.handle()?;
        let engine = self.engine();

        let field_type = FieldType::from_raw(engine.field_type(form, annot));
        if field_type == FieldType::Unknown {
            trace!("page {} annotation {}: not a form field", page.index(), index);
            return Ok(Some(Classified::Skipped(annotation)));
        }

        let name = read_utf16_string(|buf| engine.field_name(form, annot, buf)).unwrap_or_default();
        let value = read_utf16_string(|buf| engine.field_value(form, annot, buf)).unwrap_or_default();
        let rect = engine.annotation_rect(annot);
        trace!(
            "page {} annotation {}: {:?} field {:?}",
            page.index(),
            index,
            field_type,
            name
        );
        Ok(Some(Classified::Field(FieldView::new(
            annotation, name, field_type, value, rect,
        ))))
    }

    /// All form fields on `page`, in annotation order.
    ///
    /// Annotations that are not fields are released as they are found.
    pub fn fields_on_page<'p>(&self, page: &'p PageSession<'_>) -> Result<Vec<FieldView<'p>>> {
        let _attachment = self.attach_page(page)?;
        let count = page.annotation_count()?;
        let mut fields = Vec::new();
        for index in 0..count {
            match self.classify_annotation(page, index)? {
                Some(Classified::Field(field)) => fields.push(field),
                Some(Classified::Skipped(annotation)) => annotation.release(),
                None => {}
            }
        }
        Ok(fields)
    }

    /// The first field on `page` named `name`.
    ///
    /// Every rejected annotation is released the moment it is rejected.
    pub fn field_by_name<'p>(
        &self,
        page: &'p PageSession<'_>,
        name: &str,
    ) -> Result<Option<FieldView<'p>>> {
        let _attachment = self.attach_page(page)?;
        let count = page.annotation_count()?;
        for index in 0..count {
            match self.classify_annotation(page, index)? {
                Some(Classified::Field(field)) if field.name() == name => return Ok(Some(field)),
                Some(Classified::Field(field)) => field.release(),
                Some(Classified::Skipped(annotation)) => annotation.release(),
                None => {}
            }
        }
        Ok(None)
    }

    /// Current value of a field.
    pub fn value(&self, field: &FieldView<'_>) -> Result<String> {
        let form = self.handle()?;
        let _attachment = self.attach_page(field.page())?;
        let annot = field.handle()?;
        let engine = self.engine();
        Ok(read_utf16_string(|buf| engine.field_value(form, annot, buf)).unwrap_or_default())
    }

    /// Default value (the field's `DV` entry). Empty when absent.
    pub fn default_value(&self, field: &FieldView<'_>) -> Result<String> {
        self.handle()?;
        field.annotation().string_value("DV")
    }

    /// Field flags.
    pub fn flags(&self, field: &FieldView<'_>) -> Result<FieldFlags> {
        let form = self.handle()?;
        let _attachment = self.attach_page(field.page())?;
        let annot = field.handle()?;
        Ok(FieldFlags(self.engine().field_flags(form, annot)))
    }

    /// Maximum text length (`MaxLen`), or -1 when the field has none.
    pub fn max_length(&self, field: &FieldView<'_>) -> Result<i32> {
        self.handle()?;
        let annot = field.handle()?;
        Ok(match self.engine().annotation_number(annot, "MaxLen") {
            Some(n) if n >= 1.0 => n as i32,
            _ => -1,
        })
    }

    /// Whether a checkbox or radio button is on.
    pub fn is_checked(&self, field: &FieldView<'_>) -> Result<bool> {
        let form = self.handle()?;
        let _attachment = self.attach_page(field.page())?;
        let annot = field.handle()?;
        Ok(self.engine().is_checked(form, annot))
    }

    /// Options of a combo or list box, in order. Empty for other types.
    ///
    /// The engine exposes no separate export value, so `value` repeats the
    /// label.
    pub fn options(&self, field: &FieldView<'_>) -> Result<Vec<FieldOption>> {
        let form = self.handle()?;
        if !field.field_type().is_choice() {
            return Ok(Vec::new());
        }
        let _attachment = self.attach_page(field.page())?;
        let annot = field.handle()?;
        let engine = self.engine();
        let count = engine.option_count(form, annot).max(0);
        let options = (0..count)
            .map(|i| {
                let label = read_utf16_string(|buf| engine.option_label(form, annot, i, buf))
                    .unwrap_or_default();
                FieldOption {
                    value: label.clone(),
                    label,
                    is_selected: engine.is_option_selected(form, annot, i),
                    index: i as usize,
                }
            })
            .collect();
        Ok(options)
    }

    /// Write a field value.
    ///
    /// Text fields and combo boxes go through the form engine (focus, select
    /// all, replace) so appearance streams are regenerated, falling back to
    /// the `V` entry when the widget cannot take focus or its text cannot be
    /// selected. Other types write `V` directly. Returns `Ok(false)` for read-only fields and when the engine
    /// rejects the write.
    pub fn set_value(&self, field: &FieldView<'_>, value: &str) -> Result<bool> {
        let form = self.handle()?;
        let attachment = self.attach_page(field.page())?;
        let page = attachment.page;
        let annot = field.handle()?;
        let engine = self.engine();

        if FieldFlags(engine.field_flags(form, annot)).is_read_only() {
            debug!("not writing read-only field {:?}", field.name());
            return Ok(false);
        }

        match field.field_type() {
            FieldType::TextField | FieldType::ComboBox => {
                if !engine.set_focused_annotation(form, annot) {
                    trace!("focus refused for {:?}, writing V", field.name());
                    return Ok(engine.set_annotation_string(annot, "V", value));
                }
                // Replacing without a full selection would insert at the caret.
                if !engine.select_all_text(form, page) {
                    engine.kill_focus(form);
                    trace!("select all refused for {:?}, writing V", field.name());
                    return Ok(engine.set_annotation_string(annot, "V", value));
                }
                engine.replace_selection(form, page, value);
                engine.kill_focus(form);
                Ok(true)
            }
            _ => Ok(engine.set_annotation_string(annot, "V", value)),
        }
    }

    /// Select or deselect one option of a combo or list box.
    pub fn set_option_selected(
        &self,
        field: &FieldView<'_>,
        index: usize,
        selected: bool,
    ) -> Result<bool> {
        let form = self.handle()?;
        if !field.field_type().is_choice() {
            return Err(PdfError::InvalidParameter(format!(
                "field {:?} has no options",
                field.name()
            )));
        }
        let attachment = self.attach_page(field.page())?;
        let page = attachment.page;
        let annot = field.handle()?;
        let engine = self.engine();

        if FieldFlags(engine.field_flags(form, annot)).is_read_only() {
            return Ok(false);
        }
        let Ok(raw) = i32::try_from(index) else {
            return Ok(false);
        };
        if !engine.set_focused_annotation(form, annot) {
            return Ok(false);
        }
        let changed = engine.set_index_selected(form, page, raw, selected);
        engine.kill_focus(form);
        Ok(changed)
    }

    /// Exit the form-fill environment. Idempotent.
    pub fn close(&mut self) {
        let attached = self.attached.get_mut();
        if !attached.is_empty() {
            warn!("closing form environment with {} pages attached", attached.len());
        }
        if let Some(handle) = self.handle.take() {
            debug!("closing form environment");
            self.engine().exit_form(handle);
        }
    }
}

impl Drop for FormEnvironment<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for FormEnvironment<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormEnvironment")
            .field("open", &self.handle.is_live())
            .field("attached_pages", &self.attached.borrow().len())
            .finish()
    }
}

/// A page attached to a [`FormEnvironment`].
///
/// Detaches on [`detach`](Self::detach) or drop.
pub struct PageAttachment<'a> {
    form: &'a FormEnvironment<'a>,
    page: PageHandle,
    index: usize,
    detached: bool,
}

impl PageAttachment<'_> {
    /// Index of the attached page.
    pub fn page_index(&self) -> usize {
        self.index
    }

    /// Detach now.
    pub fn detach(mut self) {
        self.detach_inner();
    }

    fn detach_inner(&mut self) {
        if !self.detached {
            self.detached = true;
            self.form.detach(self.page, self.index);
        }
    }
}

impl Drop for PageAttachment<'_> {
    fn drop(&mut self) {
        self.detach_inner();
    }
}

impl std::fmt::Debug for PageAttachment<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageAttachment")
            .field("page_index", &self.index)
            .finish()
    }
}
