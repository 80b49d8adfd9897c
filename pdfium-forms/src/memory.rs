//! An in-memory [`Engine`] for tests and host-side simulation.
//!
//! [`MemoryEngine`] keeps documents as plain Rust values registered under
//! byte keys. Loading those bytes gives a fresh copy of the registered model,
//! so a document can be "opened twice" the same way a real PDF can. Saving
//! registers the current state under new bytes.
//!
//! Every acquisition and release is counted per handle kind, double releases
//! are counted, and ordering mistakes (form calls on an unattached page,
//! closing a page that is still attached) are recorded as contract
//! violations. This makes release discipline observable in tests.
//!
//! # Example
//!
//! ```
//! use pdfium_forms::{Library, MemoryDocument, MemoryEngine, MemoryField, MemoryPage, OpenOptions};
//! use std::sync::Arc;
//!
//! let engine = Arc::new(MemoryEngine::new());
//! let bytes = engine.add_document(
//!     MemoryDocument::new()
//!         .with_page(MemoryPage::letter().with_field(MemoryField::text("name"))),
//! );
//!
//! let library = Library::new(engine.clone());
//! let doc = library.open_bytes(bytes, &OpenOptions::new())?;
//! assert_eq!(doc.page_count()?, 1);
//! drop(doc);
//! assert_eq!(engine.outstanding(), 0);
//! # Ok::<(), pdfium_forms::PdfError>(())
//! ```

use crate::engine::{Engine, Rect, Viewport};
use crate::field::FieldType;
use crate::form::FormKind;
use crate::handle::{
    AnnotationHandle, DocumentHandle, FormHandle, Handle, LinkHandle, PageHandle, SearchHandle,
    SignatureHandle, TextPageHandle,
};
use crate::strings::{write_byte_string, write_utf16_string};
use log::{trace, warn};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

const ERR_SUCCESS: u32 = 0;
const ERR_FORMAT: u32 = 3;
const ERR_PASSWORD: u32 = 4;
const ERR_PAGE: u32 = 6;

const SUBTYPE_WIDGET: i32 = 20;
const FLAG_READ_ONLY: u32 = 1 << 0;
const FLAG_REQUIRED: u32 = 1 << 1;
const FLAG_CHOICE_COMBO: u32 = 1 << 17;
const FLAG_CHOICE_MULTI_SELECT: u32 = 1 << 21;

const MATCH_CASE: u32 = 0x1;
const MATCH_WHOLE_WORD: u32 = 0x2;

const CHAR_WIDTH: f32 = 6.0;
const LINE_HEIGHT: f32 = 12.0;
const TOP_MARGIN: f32 = 8.0;

/// One option of a choice field.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryOption {
    pub label: String,
    pub selected: bool,
}

/// A form field backing a widget annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryField {
    pub name: String,
    pub field_type: FieldType,
    pub value: String,
    pub default_value: Option<String>,
    pub flags: u32,
    pub max_length: Option<u32>,
    pub options: Vec<MemoryOption>,
}

impl MemoryField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            value: String::new(),
            default_value: None,
            flags: 0,
            max_length: None,
            options: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::TextField)
    }

    pub fn checkbox(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::CheckBox).with_value("Off")
    }

    pub fn radio(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::RadioButton).with_value("Off")
    }

    pub fn push_button(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::PushButton)
    }

    pub fn signature(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Signature)
    }

    /// Combo box with the given option labels, none selected.
    pub fn combo<S: Into<String>>(name: impl Into<String>, labels: impl IntoIterator<Item = S>) -> Self {
        let mut field = Self::new(name, FieldType::ComboBox).with_options(labels);
        field.flags |= FLAG_CHOICE_COMBO;
        field
    }

    /// List box with the given option labels, none selected.
    pub fn list<S: Into<String>>(name: impl Into<String>, labels: impl IntoIterator<Item = S>) -> Self {
        Self::new(name, FieldType::ListBox).with_options(labels)
    }

    fn with_options<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.options = labels
            .into_iter()
            .map(|label| MemoryOption {
                label: label.into(),
                selected: false,
            })
            .collect();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags |= flags;
        self
    }

    pub fn required(self) -> Self {
        self.with_flags(FLAG_REQUIRED)
    }

    pub fn read_only(self) -> Self {
        self.with_flags(FLAG_READ_ONLY)
    }

    pub fn multi_select(self) -> Self {
        self.with_flags(FLAG_CHOICE_MULTI_SELECT)
    }

    /// Select an option, updating the value to its label.
    pub fn select(mut self, index: usize) -> Self {
        apply_selection(&mut self, index, true);
        self
    }
}

/// An annotation on a memory page.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryAnnotation {
    pub subtype: i32,
    pub rect: Rect,
    pub field: Option<MemoryField>,
    pub entries: BTreeMap<String, String>,
}

impl MemoryAnnotation {
    /// Widget annotation backed by a form field.
    pub fn widget(field: MemoryField, rect: Rect) -> Self {
        Self {
            subtype: SUBTYPE_WIDGET,
            rect,
            field: Some(field),
            entries: BTreeMap::new(),
        }
    }

    /// Annotation that is not a form field (text note, highlight, ...).
    pub fn other(subtype: i32, rect: Rect) -> Self {
        Self {
            subtype,
            rect,
            field: None,
            entries: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

/// A link area on a memory page.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryLink {
    pub rect: Rect,
    pub target_page: Option<usize>,
    pub uri: Option<String>,
}

/// A signature dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySignature {
    pub reason: Option<String>,
    pub time: Option<String>,
}

/// A page of a memory document.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryPage {
    pub width: f64,
    pub height: f64,
    pub label: Option<String>,
    pub text: String,
    pub annotations: Vec<MemoryAnnotation>,
    pub links: Vec<MemoryLink>,
}

impl MemoryPage {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            label: None,
            text: String::new(),
            annotations: Vec::new(),
            links: Vec::new(),
        }
    }

    /// US Letter (612 x 792 points).
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add a widget for `field`, stacked below the previous annotations.
    pub fn with_field(self, field: MemoryField) -> Self {
        let slot = self.annotations.len() as f32;
        let top = self.height as f32 - 100.0 - slot * 30.0;
        self.with_annotation(MemoryAnnotation::widget(
            field,
            Rect::new(72.0, top, 272.0, top - 20.0),
        ))
    }

    pub fn with_annotation(mut self, annotation: MemoryAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_link(mut self, link: MemoryLink) -> Self {
        self.links.push(link);
        self
    }
}

/// A document model registered with a [`MemoryEngine`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDocument {
    pub pages: Vec<MemoryPage>,
    pub metadata: BTreeMap<String, String>,
    pub password: Option<String>,
    pub form_kind: Option<FormKind>,
    pub signatures: Vec<MemorySignature>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: MemoryPage) -> Self {
        self.pages.push(page);
        self
    }

    pub fn with_metadata(mut self, tag: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(tag.into(), value.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_form_kind(mut self, kind: FormKind) -> Self {
        self.form_kind = Some(kind);
        self
    }

    pub fn with_signature(mut self, reason: Option<&str>, time: Option<&str>) -> Self {
        self.signatures.push(MemorySignature {
            reason: reason.map(str::to_string),
            time: time.map(str::to_string),
        });
        self
    }

    /// All fields in page-major, annotation order.
    pub fn fields(&self) -> impl Iterator<Item = &MemoryField> {
        self.pages
            .iter()
            .flat_map(|page| page.annotations.iter())
            .filter_map(|annot| annot.field.as_ref())
    }

    /// First field with the given name.
    pub fn field(&self, name: &str) -> Option<&MemoryField> {
        self.fields().find(|field| field.name == name)
    }

    fn effective_form_kind(&self) -> FormKind {
        self.form_kind.unwrap_or_else(|| {
            if self.fields().next().is_some() {
                FormKind::AcroForm
            } else {
                FormKind::None
            }
        })
    }
}

/// Page lifecycle events as the engine observed them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    Loaded,
    Attached,
    Detached,
    Closed,
}

struct OpenDocument {
    model: MemoryDocument,
}

struct OpenPage {
    doc: usize,
    index: usize,
}

struct OpenText {
    page: usize,
}

struct OpenSearch {
    text: usize,
    pattern: Vec<u16>,
    flags: u32,
    start: usize,
    current: Option<(usize, usize)>,
}

struct OpenForm {
    doc: usize,
    attached: HashSet<usize>,
    focused: Option<usize>,
    selected_all: bool,
}

struct OpenAnnotation {
    page: usize,
    index: usize,
}

struct BorrowedLink {
    doc: usize,
    page_index: usize,
    index: usize,
}

#[derive(Default)]
struct State {
    next_handle: usize,
    registry: HashMap<Vec<u8>, MemoryDocument>,
    saved: usize,
    last_error: u32,
    failing_pages: HashSet<usize>,
    refuse_select_all: bool,

    documents: HashMap<usize, OpenDocument>,
    pages: HashMap<usize, OpenPage>,
    texts: HashMap<usize, OpenText>,
    searches: HashMap<usize, OpenSearch>,
    forms: HashMap<usize, OpenForm>,
    annotations: HashMap<usize, OpenAnnotation>,
    links: HashMap<usize, BorrowedLink>,
    signatures: HashMap<usize, (usize, usize)>,

    acquired: HashMap<&'static str, usize>,
    released: HashMap<&'static str, usize>,
    double_releases: usize,
    violations: Vec<String>,
    page_events: Vec<(usize, PageEvent)>,
}

impl State {
    fn issue<H: Handle>(&mut self) -> usize {
        self.next_handle += 1;
        *self.acquired.entry(H::KIND).or_default() += 1;
        trace!("memory engine: acquired {} #{}", H::KIND, self.next_handle);
        self.next_handle
    }

    fn issue_borrowed(&mut self) -> usize {
        self.next_handle += 1;
        self.next_handle
    }

    fn record_release<H: Handle>(&mut self, found: bool) {
        if found {
            *self.released.entry(H::KIND).or_default() += 1;
        } else {
            self.double_releases += 1;
            warn!("memory engine: release of unknown or released {}", H::KIND);
        }
    }

    fn violation(&mut self, message: String) {
        warn!("memory engine: contract violation: {}", message);
        self.violations.push(message);
    }

    fn page_model(&self, page: usize) -> Option<&MemoryPage> {
        let open = self.pages.get(&page)?;
        self.documents.get(&open.doc)?.model.pages.get(open.index)
    }

    fn annotation_model(&self, annot: usize) -> Option<&MemoryAnnotation> {
        let open = self.annotations.get(&annot)?;
        self.page_model(open.page)?.annotations.get(open.index)
    }

    fn annotation_model_mut(&mut self, annot: usize) -> Option<&mut MemoryAnnotation> {
        let open = self.annotations.get(&annot)?;
        let page = self.pages.get(&open.page)?;
        self.documents
            .get_mut(&page.doc)?
            .model
            .pages
            .get_mut(page.index)?
            .annotations
            .get_mut(open.index)
    }

    fn page_index(&self, page: usize) -> usize {
        self.pages.get(&page).map(|p| p.index).unwrap_or(usize::MAX)
    }

    fn attached_to_any_form(&self, page: usize) -> bool {
        self.forms.values().any(|form| form.attached.contains(&page))
    }

    /// Field behind `annot` for a form-scoped call, checking attachment.
    fn form_field(&mut self, form: usize, annot: usize, call: &str) -> Option<&MemoryField> {
        let page = self.annotations.get(&annot)?.page;
        let attached = self.forms.get(&form)?.attached.contains(&page);
        if !attached {
            let index = self.page_index(page);
            self.violation(format!("{} on unattached page {}", call, index));
        }
        self.annotation_model(annot)?.field.as_ref()
    }

    fn check_attached(&mut self, form: usize, page: usize, call: &str) -> bool {
        let attached = self
            .forms
            .get(&form)
            .is_some_and(|f| f.attached.contains(&page));
        if !attached {
            let index = self.page_index(page);
            self.violation(format!("{} on unattached page {}", call, index));
        }
        attached
    }

    fn focused_field_mut(&mut self, form: usize, page: usize) -> Option<&mut MemoryField> {
        let focused = self.forms.get(&form)?.focused?;
        if self.annotations.get(&focused)?.page != page {
            return None;
        }
        self.annotation_model_mut(focused)?.field.as_mut()
    }

    fn text_units(&self, text: usize) -> Option<Vec<u16>> {
        let page = self.texts.get(&text)?.page;
        Some(self.page_model(page)?.text.encode_utf16().collect())
    }

    fn text_page_height(&self, text: usize) -> f32 {
        self.texts
            .get(&text)
            .and_then(|t| self.page_model(t.page))
            .map(|p| p.height as f32)
            .unwrap_or(0.0)
    }
}

fn apply_selection(field: &mut MemoryField, index: usize, selected: bool) -> bool {
    if index >= field.options.len() {
        return false;
    }
    let single = field.flags & FLAG_CHOICE_MULTI_SELECT == 0;
    if selected && single {
        for option in &mut field.options {
            option.selected = false;
        }
    }
    field.options[index].selected = selected;
    field.value = field
        .options
        .iter()
        .filter(|o| o.selected)
        .map(|o| o.label.as_str())
        .collect::<Vec<_>>()
        .join(",");
    true
}

fn matches_at(haystack: &[u16], at: usize, pattern: &[u16], flags: u32) -> bool {
    if at + pattern.len() > haystack.len() {
        return false;
    }
    let fold = |c: u16| {
        if flags & MATCH_CASE == 0 && c < 0x80 {
            (c as u8).to_ascii_lowercase() as u16
        } else {
            c
        }
    };
    let equal = haystack[at..at + pattern.len()]
        .iter()
        .zip(pattern)
        .all(|(&a, &b)| fold(a) == fold(b));
    if !equal || flags & MATCH_WHOLE_WORD == 0 {
        return equal;
    }
    let is_word = |c: u16| char::from_u32(c as u32).is_some_and(char::is_alphanumeric);
    let before_ok = at == 0 || !is_word(haystack[at - 1]);
    let end = at + pattern.len();
    let after_ok = end == haystack.len() || !is_word(haystack[end]);
    before_ok && after_ok
}

/// In-memory engine with handle accounting. See the module docs.
pub struct MemoryEngine {
    state: Mutex<State>,
    init_calls: AtomicUsize,
    destroy_calls: AtomicUsize,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            init_calls: AtomicUsize::new(0),
            destroy_calls: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `document` under `bytes`. Loading those bytes opens a copy.
    pub fn register(&self, bytes: impl Into<Vec<u8>>, document: MemoryDocument) {
        self.state().registry.insert(bytes.into(), document);
    }

    /// Register `document` under freshly generated bytes and return them.
    pub fn add_document(&self, document: MemoryDocument) -> Vec<u8> {
        let mut state = self.state();
        state.saved += 1;
        let bytes = format!("%PDF-1.7\n%memory-document-{}\n", state.saved).into_bytes();
        state.registry.insert(bytes.clone(), document);
        bytes
    }

    /// The model registered under `bytes`, if any.
    pub fn registered(&self, bytes: &[u8]) -> Option<MemoryDocument> {
        self.state().registry.get(bytes).cloned()
    }

    /// Make every later load of page `index` fail, in any document.
    pub fn fail_page_load(&self, index: usize) {
        self.state().failing_pages.insert(index);
    }

    /// Make every later `select_all_text` call fail.
    pub fn refuse_select_all(&self) {
        self.state().refuse_select_all = true;
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn destroy_calls(&self) -> usize {
        self.destroy_calls.load(Ordering::SeqCst)
    }

    /// Number of handles of `kind` (see [`Handle::KIND`]) ever acquired.
    pub fn acquired(&self, kind: &str) -> usize {
        self.state().acquired.get(kind).copied().unwrap_or(0)
    }

    /// Number of handles of `kind` released.
    pub fn released(&self, kind: &str) -> usize {
        self.state().released.get(kind).copied().unwrap_or(0)
    }

    /// Handles acquired and not yet released, over all kinds.
    pub fn outstanding(&self) -> usize {
        let state = self.state();
        let acquired: usize = state.acquired.values().sum();
        let released: usize = state.released.values().sum();
        acquired.saturating_sub(released)
    }

    /// Releases of handles that were unknown or already released.
    pub fn double_releases(&self) -> usize {
        self.state().double_releases
    }

    /// Descriptions of ordering contract violations seen so far.
    pub fn contract_violations(&self) -> Vec<String> {
        self.state().violations.clone()
    }

    /// Page lifecycle events in the order the engine saw them.
    pub fn page_events(&self) -> Vec<(usize, PageEvent)> {
        self.state().page_events.clone()
    }

    pub fn clear_page_events(&self) {
        self.state().page_events.clear();
    }
}

impl Engine for MemoryEngine {
    fn init_library(&self) {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn destroy_library(&self) {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn last_error(&self) -> u32 {
        self.state().last_error
    }

    fn load_document(&self, data: &[u8], password: Option<&str>) -> DocumentHandle {
        let mut state = self.state();
        let model = match state.registry.get(data) {
            Some(model) => model.clone(),
            None => {
                state.last_error = ERR_FORMAT;
                return DocumentHandle::NULL;
            }
        };
        if let Some(expected) = &model.password {
            if password != Some(expected.as_str()) {
                state.last_error = ERR_PASSWORD;
                return DocumentHandle::NULL;
            }
        }
        state.last_error = ERR_SUCCESS;
        let id = state.issue::<DocumentHandle>();
        state.documents.insert(id, OpenDocument { model });
        DocumentHandle::from_raw(id)
    }

    fn create_document(&self) -> DocumentHandle {
        let mut state = self.state();
        let id = state.issue::<DocumentHandle>();
        state.documents.insert(
            id,
            OpenDocument {
                model: MemoryDocument::new(),
            },
        );
        DocumentHandle::from_raw(id)
    }

    fn close_document(&self, doc: DocumentHandle) {
        if doc.is_null() {
            return;
        }
        let mut state = self.state();
        let id = doc.as_raw();
        let found = state.documents.remove(&id).is_some();
        state.record_release::<DocumentHandle>(found);
        let open_pages = state.pages.values().filter(|p| p.doc == id).count();
        if found && open_pages > 0 {
            state.violation(format!("document closed with {} pages open", open_pages));
        }
    }

    fn page_count(&self, doc: DocumentHandle) -> i32 {
        self.state()
            .documents
            .get(&doc.as_raw())
            .map(|d| d.model.pages.len() as i32)
            .unwrap_or(0)
    }

    fn metadata(&self, doc: DocumentHandle, tag: &str, buffer: &mut [u16]) -> usize {
        let state = self.state();
        let Some(document) = state.documents.get(&doc.as_raw()) else {
            return 0;
        };
        // Missing entries read as an empty string, like the real engine.
        let value = document.model.metadata.get(tag).map(String::as_str).unwrap_or("");
        write_utf16_string(value, buffer)
    }

    fn page_label(&self, doc: DocumentHandle, index: i32, buffer: &mut [u16]) -> usize {
        let state = self.state();
        let label = state
            .documents
            .get(&doc.as_raw())
            .and_then(|d| d.model.pages.get(index as usize))
            .and_then(|p| p.label.as_deref());
        match label {
            Some(label) => write_utf16_string(label, buffer),
            None => 0,
        }
    }

    fn page_size(&self, doc: DocumentHandle, index: i32) -> Option<(f64, f64)> {
        if index < 0 {
            return None;
        }
        let state = self.state();
        let page = state.documents.get(&doc.as_raw())?.model.pages.get(index as usize)?;
        Some((page.width, page.height))
    }

    fn form_type(&self, doc: DocumentHandle) -> i32 {
        self.state()
            .documents
            .get(&doc.as_raw())
            .map(|d| i32::from(d.model.effective_form_kind()))
            .unwrap_or(0)
    }

    fn save_document(&self, doc: DocumentHandle) -> Option<Vec<u8>> {
        let model = self.state().documents.get(&doc.as_raw())?.model.clone();
        Some(self.add_document(model))
    }

    fn signature_count(&self, doc: DocumentHandle) -> i32 {
        self.state()
            .documents
            .get(&doc.as_raw())
            .map(|d| d.model.signatures.len() as i32)
            .unwrap_or(0)
    }

    fn signature(&self, doc: DocumentHandle, index: i32) -> SignatureHandle {
        let mut state = self.state();
        let exists = index >= 0
            && state
                .documents
                .get(&doc.as_raw())
                .is_some_and(|d| (index as usize) < d.model.signatures.len());
        if !exists {
            return SignatureHandle::NULL;
        }
        let id = state.issue_borrowed();
        state.signatures.insert(id, (doc.as_raw(), index as usize));
        SignatureHandle::from_raw(id)
    }

    fn signature_reason(&self, sig: SignatureHandle, buffer: &mut [u16]) -> usize {
        let state = self.state();
        let reason = state.signatures.get(&sig.as_raw()).and_then(|&(doc, index)| {
            state.documents.get(&doc)?.model.signatures.get(index)?.reason.clone()
        });
        reason.map_or(0, |r| write_utf16_string(&r, buffer))
    }

    fn signature_time(&self, sig: SignatureHandle, buffer: &mut [u8]) -> usize {
        let state = self.state();
        let time = state.signatures.get(&sig.as_raw()).and_then(|&(doc, index)| {
            state.documents.get(&doc)?.model.signatures.get(index)?.time.clone()
        });
        time.map_or(0, |t| write_byte_string(&t, buffer))
    }

    fn load_page(&self, doc: DocumentHandle, index: i32) -> PageHandle {
        let mut state = self.state();
        let count = state
            .documents
            .get(&doc.as_raw())
            .map(|d| d.model.pages.len())
            .unwrap_or(0);
        if index < 0 || index as usize >= count || state.failing_pages.contains(&(index as usize)) {
            state.last_error = ERR_PAGE;
            return PageHandle::NULL;
        }
        let id = state.issue::<PageHandle>();
        state.pages.insert(
            id,
            OpenPage {
                doc: doc.as_raw(),
                index: index as usize,
            },
        );
        state.page_events.push((index as usize, PageEvent::Loaded));
        PageHandle::from_raw(id)
    }

    fn close_page(&self, page: PageHandle) {
        if page.is_null() {
            return;
        }
        let mut state = self.state();
        let id = page.as_raw();
        if state.attached_to_any_form(id) {
            let index = state.page_index(id);
            state.violation(format!("page {} closed while attached", index));
        }
        match state.pages.remove(&id) {
            Some(open) => {
                state.page_events.push((open.index, PageEvent::Closed));
                state.record_release::<PageHandle>(true);
            }
            None => state.record_release::<PageHandle>(false),
        }
    }

    fn page_width(&self, page: PageHandle) -> f64 {
        self.state().page_model(page.as_raw()).map_or(0.0, |p| p.width)
    }

    fn page_height(&self, page: PageHandle) -> f64 {
        self.state().page_model(page.as_raw()).map_or(0.0, |p| p.height)
    }

    fn device_to_page(
        &self,
        page: PageHandle,
        viewport: &Viewport,
        x: i32,
        y: i32,
    ) -> Option<(f64, f64)> {
        let (width, height) = {
            let state = self.state();
            let model = state.page_model(page.as_raw())?;
            (model.width, model.height)
        };
        if viewport.width <= 0 || viewport.height <= 0 {
            return None;
        }
        // Normalized device position inside the viewport.
        let u = f64::from(x - viewport.start_x) / f64::from(viewport.width);
        let v = f64::from(y - viewport.start_y) / f64::from(viewport.height);
        let (px, py) = match viewport.rotation {
            1 => (v, u),
            2 => (1.0 - u, v),
            3 => (1.0 - v, 1.0 - u),
            _ => (u, 1.0 - v),
        };
        Some((px * width, py * height))
    }

    fn page_to_device(
        &self,
        page: PageHandle,
        viewport: &Viewport,
        x: f64,
        y: f64,
    ) -> Option<(i32, i32)> {
        let (width, height) = {
            let state = self.state();
            let model = state.page_model(page.as_raw())?;
            (model.width, model.height)
        };
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let (px, py) = (x / width, y / height);
        let (u, v) = match viewport.rotation {
            1 => (py, px),
            2 => (1.0 - px, py),
            3 => (1.0 - py, 1.0 - px),
            _ => (px, 1.0 - py),
        };
        let dx = viewport.start_x + (u * f64::from(viewport.width)).round() as i32;
        let dy = viewport.start_y + (v * f64::from(viewport.height)).round() as i32;
        Some((dx, dy))
    }

    fn link_at_point(&self, page: PageHandle, x: f64, y: f64) -> LinkHandle {
        let mut state = self.state();
        let Some(open) = state.pages.get(&page.as_raw()) else {
            return LinkHandle::NULL;
        };
        let (doc, page_index) = (open.doc, open.index);
        let hit = state
            .page_model(page.as_raw())
            .and_then(|p| p.links.iter().position(|l| l.rect.contains(x as f32, y as f32)));
        let Some(index) = hit else {
            return LinkHandle::NULL;
        };
        let id = state.issue_borrowed();
        state.links.insert(
            id,
            BorrowedLink {
                doc,
                page_index,
                index,
            },
        );
        LinkHandle::from_raw(id)
    }

    fn link_target_page(&self, _doc: DocumentHandle, link: LinkHandle) -> i32 {
        let state = self.state();
        state
            .links
            .get(&link.as_raw())
            .and_then(|l| {
                let page = state.documents.get(&l.doc)?.model.pages.get(l.page_index)?;
                page.links.get(l.index)?.target_page
            })
            .map_or(-1, |p| p as i32)
    }

    fn link_uri(&self, _doc: DocumentHandle, link: LinkHandle, buffer: &mut [u8]) -> usize {
        let state = self.state();
        let uri = state.links.get(&link.as_raw()).and_then(|l| {
            let page = state.documents.get(&l.doc)?.model.pages.get(l.page_index)?;
            page.links.get(l.index)?.uri.clone()
        });
        uri.map_or(0, |u| write_byte_string(&u, buffer))
    }

    fn link_rect(&self, link: LinkHandle) -> Option<Rect> {
        let state = self.state();
        let l = state.links.get(&link.as_raw())?;
        let page = state.documents.get(&l.doc)?.model.pages.get(l.page_index)?;
        Some(page.links.get(l.index)?.rect)
    }

    fn load_text_page(&self, page: PageHandle) -> TextPageHandle {
        let mut state = self.state();
        if !state.pages.contains_key(&page.as_raw()) {
            return TextPageHandle::NULL;
        }
        let id = state.issue::<TextPageHandle>();
        state.texts.insert(id, OpenText { page: page.as_raw() });
        TextPageHandle::from_raw(id)
    }

    fn close_text_page(&self, text: TextPageHandle) {
        if text.is_null() {
            return;
        }
        let mut state = self.state();
        let found = state.texts.remove(&text.as_raw()).is_some();
        state.record_release::<TextPageHandle>(found);
    }

    fn char_count(&self, text: TextPageHandle) -> i32 {
        self.state()
            .text_units(text.as_raw())
            .map_or(-1, |units| units.len() as i32)
    }

    fn text_range(&self, text: TextPageHandle, start: i32, count: i32, buffer: &mut [u16]) -> i32 {
        let Some(units) = self.state().text_units(text.as_raw()) else {
            return 0;
        };
        if start < 0 || count < 0 || start as usize > units.len() {
            return 0;
        }
        let start = start as usize;
        let end = (start + count as usize).min(units.len());
        let slice = &units[start..end];
        if buffer.len() < slice.len() + 1 {
            return 0;
        }
        buffer[..slice.len()].copy_from_slice(slice);
        buffer[slice.len()] = 0;
        slice.len() as i32 + 1
    }

    fn char_box(&self, text: TextPageHandle, index: i32) -> Option<Rect> {
        let state = self.state();
        let units = state.text_units(text.as_raw())?;
        if index < 0 || index as usize >= units.len() {
            return None;
        }
        let top = state.text_page_height(text.as_raw()) - TOP_MARGIN;
        let left = index as f32 * CHAR_WIDTH;
        Some(Rect::new(left, top, left + CHAR_WIDTH, top - LINE_HEIGHT))
    }

    fn char_index_at(&self, text: TextPageHandle, x: f64, y: f64, tolerance: f64) -> i32 {
        let state = self.state();
        let Some(units) = state.text_units(text.as_raw()) else {
            return -1;
        };
        let top = f64::from(state.text_page_height(text.as_raw()) - TOP_MARGIN);
        let bottom = top - f64::from(LINE_HEIGHT);
        if y > top + tolerance || y < bottom - tolerance || x < -tolerance {
            return -1;
        }
        let index = (x.max(0.0) / f64::from(CHAR_WIDTH)) as usize;
        if index < units.len() {
            index as i32
        } else {
            -1
        }
    }

    fn count_rects(&self, text: TextPageHandle, start: i32, count: i32) -> i32 {
        let Some(units) = self.state().text_units(text.as_raw()) else {
            return 0;
        };
        if start < 0 || start as usize >= units.len() || count == 0 {
            return 0;
        }
        // Single-line layout: one rectangle per range.
        1
    }

    fn rect(&self, text: TextPageHandle, index: i32) -> Option<Rect> {
        let state = self.state();
        let units = state.text_units(text.as_raw())?;
        if index != 0 || units.is_empty() {
            return None;
        }
        let top = state.text_page_height(text.as_raw()) - TOP_MARGIN;
        Some(Rect::new(
            0.0,
            top,
            units.len() as f32 * CHAR_WIDTH,
            top - LINE_HEIGHT,
        ))
    }

    fn find_start(
        &self,
        text: TextPageHandle,
        pattern: &str,
        flags: u32,
        start: i32,
    ) -> SearchHandle {
        let mut state = self.state();
        if !state.texts.contains_key(&text.as_raw()) || pattern.is_empty() {
            return SearchHandle::NULL;
        }
        let id = state.issue::<SearchHandle>();
        state.searches.insert(
            id,
            OpenSearch {
                text: text.as_raw(),
                pattern: pattern.encode_utf16().collect(),
                flags,
                start: start.max(0) as usize,
                current: None,
            },
        );
        SearchHandle::from_raw(id)
    }

    fn find_next(&self, search: SearchHandle) -> bool {
        let mut state = self.state();
        let Some(open) = state.searches.get(&search.as_raw()) else {
            return false;
        };
        let Some(units) = state.text_units(open.text) else {
            return false;
        };
        let from = open.current.map_or(open.start, |(at, _)| at + 1);
        let found = (from..units.len()).find(|&at| matches_at(&units, at, &open.pattern, open.flags));
        let len = open.pattern.len();
        let Some(at) = found else {
            return false;
        };
        if let Some(open) = state.searches.get_mut(&search.as_raw()) {
            open.current = Some((at, len));
        }
        true
    }

    fn find_prev(&self, search: SearchHandle) -> bool {
        let mut state = self.state();
        let Some(open) = state.searches.get(&search.as_raw()) else {
            return false;
        };
        let Some(units) = state.text_units(open.text) else {
            return false;
        };
        let Some((current, _)) = open.current else {
            return false;
        };
        let found = (0..current)
            .rev()
            .find(|&at| matches_at(&units, at, &open.pattern, open.flags));
        let len = open.pattern.len();
        let Some(at) = found else {
            return false;
        };
        if let Some(open) = state.searches.get_mut(&search.as_raw()) {
            open.current = Some((at, len));
        }
        true
    }

    fn search_result_index(&self, search: SearchHandle) -> i32 {
        self.state()
            .searches
            .get(&search.as_raw())
            .and_then(|s| s.current)
            .map_or(-1, |(at, _)| at as i32)
    }

    fn search_result_count(&self, search: SearchHandle) -> i32 {
        self.state()
            .searches
            .get(&search.as_raw())
            .and_then(|s| s.current)
            .map_or(0, |(_, len)| len as i32)
    }

    fn find_close(&self, search: SearchHandle) {
        if search.is_null() {
            return;
        }
        let mut state = self.state();
        let found = state.searches.remove(&search.as_raw()).is_some();
        state.record_release::<SearchHandle>(found);
    }

    fn annotation_count(&self, page: PageHandle) -> i32 {
        self.state()
            .page_model(page.as_raw())
            .map_or(0, |p| p.annotations.len() as i32)
    }

    fn annotation(&self, page: PageHandle, index: i32) -> AnnotationHandle {
        let mut state = self.state();
        let count = state
            .page_model(page.as_raw())
            .map_or(0, |p| p.annotations.len());
        if index < 0 || index as usize >= count {
            return AnnotationHandle::NULL;
        }
        let id = state.issue::<AnnotationHandle>();
        state.annotations.insert(
            id,
            OpenAnnotation {
                page: page.as_raw(),
                index: index as usize,
            },
        );
        AnnotationHandle::from_raw(id)
    }

    fn close_annotation(&self, annot: AnnotationHandle) {
        if annot.is_null() {
            return;
        }
        let mut state = self.state();
        let found = state.annotations.remove(&annot.as_raw()).is_some();
        state.record_release::<AnnotationHandle>(found);
    }

    fn annotation_subtype(&self, annot: AnnotationHandle) -> i32 {
        self.state()
            .annotation_model(annot.as_raw())
            .map_or(0, |a| a.subtype)
    }

    fn annotation_rect(&self, annot: AnnotationHandle) -> Option<Rect> {
        self.state().annotation_model(annot.as_raw()).map(|a| a.rect)
    }

    fn annotation_string(&self, annot: AnnotationHandle, key: &str, buffer: &mut [u16]) -> usize {
        let state = self.state();
        let Some(model) = state.annotation_model(annot.as_raw()) else {
            return 0;
        };
        let value = match (&model.field, key) {
            (Some(field), "V") => Some(field.value.clone()),
            (Some(field), "DV") => field.default_value.clone(),
            (Some(field), "T") => Some(field.name.clone()),
            _ => model.entries.get(key).cloned(),
        };
        // Absent keys read as an empty string.
        write_utf16_string(value.as_deref().unwrap_or(""), buffer)
    }

    fn set_annotation_string(&self, annot: AnnotationHandle, key: &str, value: &str) -> bool {
        let mut state = self.state();
        let Some(page) = state.annotations.get(&annot.as_raw()).map(|a| a.page) else {
            return false;
        };
        let is_field_value = matches!(key, "V" | "DV")
            && state
                .annotation_model(annot.as_raw())
                .is_some_and(|a| a.field.is_some());
        if is_field_value && !state.attached_to_any_form(page) {
            let index = state.page_index(page);
            state.violation(format!("field value write on unattached page {}", index));
        }
        let Some(model) = state.annotation_model_mut(annot.as_raw()) else {
            return false;
        };
        match (&mut model.field, key) {
            (Some(field), "V") => field.value = value.to_string(),
            (Some(field), "DV") => field.default_value = Some(value.to_string()),
            _ => {
                model.entries.insert(key.to_string(), value.to_string());
            }
        }
        true
    }

    fn annotation_number(&self, annot: AnnotationHandle, key: &str) -> Option<f32> {
        let state = self.state();
        let model = state.annotation_model(annot.as_raw())?;
        match (&model.field, key) {
            (Some(field), "MaxLen") => field.max_length.map(|n| n as f32),
            _ => model.entries.get(key)?.parse().ok(),
        }
    }

    fn init_form(&self, doc: DocumentHandle) -> FormHandle {
        let mut state = self.state();
        if !state.documents.contains_key(&doc.as_raw()) {
            return FormHandle::NULL;
        }
        let id = state.issue::<FormHandle>();
        state.forms.insert(
            id,
            OpenForm {
                doc: doc.as_raw(),
                attached: HashSet::new(),
                focused: None,
                selected_all: false,
            },
        );
        FormHandle::from_raw(id)
    }

    fn exit_form(&self, form: FormHandle) {
        if form.is_null() {
            return;
        }
        let mut state = self.state();
        match state.forms.remove(&form.as_raw()) {
            Some(open) => {
                if !open.attached.is_empty() {
                    state.violation(format!(
                        "form environment exited with {} pages attached",
                        open.attached.len()
                    ));
                }
                state.record_release::<FormHandle>(true);
            }
            None => state.record_release::<FormHandle>(false),
        }
    }

    fn on_after_load_page(&self, form: FormHandle, page: PageHandle) {
        let mut state = self.state();
        let index = state.page_index(page.as_raw());
        let form_doc = state.forms.get(&form.as_raw()).map(|f| f.doc);
        let page_doc = state.pages.get(&page.as_raw()).map(|p| p.doc);
        if form_doc.is_none() || page_doc.is_none() || form_doc != page_doc {
            state.violation(format!("attach of page {} to a foreign or closed form", index));
            return;
        }
        let newly = state
            .forms
            .get_mut(&form.as_raw())
            .is_some_and(|f| f.attached.insert(page.as_raw()));
        if newly {
            state.page_events.push((index, PageEvent::Attached));
        } else {
            state.violation(format!("page {} attached twice", index));
        }
    }

    fn on_before_close_page(&self, form: FormHandle, page: PageHandle) {
        let mut state = self.state();
        let index = state.page_index(page.as_raw());
        let focused_here = state
            .forms
            .get(&form.as_raw())
            .and_then(|f| f.focused)
            .and_then(|annot| state.annotations.get(&annot))
            .is_some_and(|a| a.page == page.as_raw());
        let removed = state.forms.get_mut(&form.as_raw()).is_some_and(|f| {
            if focused_here {
                f.focused = None;
                f.selected_all = false;
            }
            f.attached.remove(&page.as_raw())
        });
        if removed {
            state.page_events.push((index, PageEvent::Detached));
        } else {
            state.violation(format!("detach of page {} that was not attached", index));
        }
    }

    fn field_type(&self, form: FormHandle, annot: AnnotationHandle) -> i32 {
        let mut state = self.state();
        state
            .form_field(form.as_raw(), annot.as_raw(), "field_type")
            .map_or(-1, |f| i32::from(f.field_type))
    }

    fn field_flags(&self, form: FormHandle, annot: AnnotationHandle) -> u32 {
        let mut state = self.state();
        state
            .form_field(form.as_raw(), annot.as_raw(), "field_flags")
            .map_or(0, |f| f.flags)
    }

    fn field_name(&self, form: FormHandle, annot: AnnotationHandle, buffer: &mut [u16]) -> usize {
        let mut state = self.state();
        match state.form_field(form.as_raw(), annot.as_raw(), "field_name") {
            Some(field) => write_utf16_string(&field.name, buffer),
            None => 0,
        }
    }

    fn field_value(&self, form: FormHandle, annot: AnnotationHandle, buffer: &mut [u16]) -> usize {
        let mut state = self.state();
        match state.form_field(form.as_raw(), annot.as_raw(), "field_value") {
            Some(field) => write_utf16_string(&field.value, buffer),
            None => 0,
        }
    }

    fn option_count(&self, form: FormHandle, annot: AnnotationHandle) -> i32 {
        let mut state = self.state();
        match state.form_field(form.as_raw(), annot.as_raw(), "option_count") {
            Some(field) if field.field_type.is_choice() => field.options.len() as i32,
            _ => -1,
        }
    }

    fn option_label(
        &self,
        form: FormHandle,
        annot: AnnotationHandle,
        index: i32,
        buffer: &mut [u16],
    ) -> usize {
        let mut state = self.state();
        let label = state
            .form_field(form.as_raw(), annot.as_raw(), "option_label")
            .and_then(|f| f.options.get(usize::try_from(index).ok()?))
            .map(|o| o.label.clone());
        label.map_or(0, |l| write_utf16_string(&l, buffer))
    }

    fn is_option_selected(&self, form: FormHandle, annot: AnnotationHandle, index: i32) -> bool {
        let mut state = self.state();
        state
            .form_field(form.as_raw(), annot.as_raw(), "is_option_selected")
            .and_then(|f| f.options.get(usize::try_from(index).ok()?))
            .is_some_and(|o| o.selected)
    }

    fn is_checked(&self, form: FormHandle, annot: AnnotationHandle) -> bool {
        let mut state = self.state();
        state
            .form_field(form.as_raw(), annot.as_raw(), "is_checked")
            .is_some_and(|f| {
                matches!(f.field_type, FieldType::CheckBox | FieldType::RadioButton)
                    && !f.value.is_empty()
                    && f.value != "Off"
            })
    }

    fn set_focused_annotation(&self, form: FormHandle, annot: AnnotationHandle) -> bool {
        let mut state = self.state();
        let has_field = state
            .form_field(form.as_raw(), annot.as_raw(), "set_focused_annotation")
            .is_some();
        if !has_field {
            return false;
        }
        match state.forms.get_mut(&form.as_raw()) {
            Some(f) => {
                f.focused = Some(annot.as_raw());
                f.selected_all = false;
                true
            }
            None => false,
        }
    }

    fn select_all_text(&self, form: FormHandle, page: PageHandle) -> bool {
        let mut state = self.state();
        if !state.check_attached(form.as_raw(), page.as_raw(), "select_all_text") {
            return false;
        }
        if state.refuse_select_all {
            return false;
        }
        match state.forms.get_mut(&form.as_raw()) {
            Some(f) if f.focused.is_some() => {
                f.selected_all = true;
                true
            }
            _ => false,
        }
    }

    fn replace_selection(&self, form: FormHandle, page: PageHandle, text: &str) {
        let mut state = self.state();
        if !state.check_attached(form.as_raw(), page.as_raw(), "replace_selection") {
            return;
        }
        let replace = state
            .forms
            .get(&form.as_raw())
            .is_some_and(|f| f.selected_all);
        if let Some(field) = state.focused_field_mut(form.as_raw(), page.as_raw()) {
            if replace {
                field.value = text.to_string();
            } else {
                field.value.push_str(text);
            }
        }
        if let Some(f) = state.forms.get_mut(&form.as_raw()) {
            f.selected_all = false;
        }
    }

    fn kill_focus(&self, form: FormHandle) -> bool {
        let mut state = self.state();
        match state.forms.get_mut(&form.as_raw()) {
            Some(f) => {
                f.focused = None;
                f.selected_all = false;
                true
            }
            None => false,
        }
    }

    fn set_index_selected(
        &self,
        form: FormHandle,
        page: PageHandle,
        index: i32,
        selected: bool,
    ) -> bool {
        let mut state = self.state();
        if !state.check_attached(form.as_raw(), page.as_raw(), "set_index_selected") {
            return false;
        }
        let Ok(index) = usize::try_from(index) else {
            return false;
        };
        match state.focused_field_mut(form.as_raw(), page.as_raw()) {
            Some(field) if field.field_type.is_choice() => apply_selection(field, index, selected),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> MemoryDocument {
        MemoryDocument::new()
            .with_page(
                MemoryPage::letter()
                    .with_text("Hello memory engine")
                    .with_field(MemoryField::text("name").with_value("Ada")),
            )
            .with_page(MemoryPage::letter().with_field(MemoryField::combo("color", ["Red", "Green"])))
    }

    #[test]
    fn test_load_registered_document() {
        let engine = MemoryEngine::new();
        let bytes = engine.add_document(sample_document());
        let doc = engine.load_document(&bytes, None);
        assert!(!doc.is_null());
        assert_eq!(engine.page_count(doc), 2);
        engine.close_document(doc);
        assert_eq!(engine.outstanding(), 0);
    }

    #[test]
    fn test_unknown_bytes_report_format_error() {
        let engine = MemoryEngine::new();
        let doc = engine.load_document(b"not a pdf", None);
        assert!(doc.is_null());
        assert_eq!(engine.last_error(), ERR_FORMAT);
    }

    #[test]
    fn test_password_check() {
        let engine = MemoryEngine::new();
        let bytes = engine.add_document(sample_document().with_password("secret"));
        assert!(engine.load_document(&bytes, None).is_null());
        assert_eq!(engine.last_error(), ERR_PASSWORD);
        assert!(engine.load_document(&bytes, Some("wrong")).is_null());
        let doc = engine.load_document(&bytes, Some("secret"));
        assert!(!doc.is_null());
        engine.close_document(doc);
    }

    #[test]
    fn test_double_release_is_counted() {
        let engine = MemoryEngine::new();
        let doc = engine.create_document();
        engine.close_document(doc);
        engine.close_document(doc);
        assert_eq!(engine.double_releases(), 1);
    }

    #[test]
    fn test_form_call_on_unattached_page_is_violation() {
        let engine = MemoryEngine::new();
        let bytes = engine.add_document(sample_document());
        let doc = engine.load_document(&bytes, None);
        let form = engine.init_form(doc);
        let page = engine.load_page(doc, 0);
        let annot = engine.annotation(page, 0);

        assert_eq!(engine.field_type(form, annot), i32::from(FieldType::TextField));
        assert_eq!(engine.contract_violations().len(), 1);

        engine.on_after_load_page(form, page);
        assert_eq!(engine.field_type(form, annot), i32::from(FieldType::TextField));
        assert_eq!(engine.contract_violations().len(), 1);

        engine.close_annotation(annot);
        engine.on_before_close_page(form, page);
        engine.close_page(page);
        engine.exit_form(form);
        engine.close_document(doc);
        assert_eq!(engine.outstanding(), 0);
        assert_eq!(engine.contract_violations().len(), 1);
    }

    #[test]
    fn test_closing_attached_page_is_violation() {
        let engine = MemoryEngine::new();
        let bytes = engine.add_document(sample_document());
        let doc = engine.load_document(&bytes, None);
        let form = engine.init_form(doc);
        let page = engine.load_page(doc, 0);
        engine.on_after_load_page(form, page);
        engine.close_page(page);
        assert!(engine
            .contract_violations()
            .iter()
            .any(|v| v.contains("closed while attached")));
    }

    #[test]
    fn test_focus_select_replace_sequence() {
        let engine = MemoryEngine::new();
        let bytes = engine.add_document(sample_document());
        let doc = engine.load_document(&bytes, None);
        let form = engine.init_form(doc);
        let page = engine.load_page(doc, 0);
        engine.on_after_load_page(form, page);
        let annot = engine.annotation(page, 0);

        assert!(engine.set_focused_annotation(form, annot));
        assert!(engine.select_all_text(form, page));
        engine.replace_selection(form, page, "Grace");
        assert!(engine.kill_focus(form));

        let value = crate::strings::read_utf16_string(|buf| engine.field_value(form, annot, buf));
        assert_eq!(value.as_deref(), Some("Grace"));
    }

    #[test]
    fn test_single_select_choice() {
        let mut field = MemoryField::combo("color", ["Red", "Green", "Blue"]);
        assert!(apply_selection(&mut field, 2, true));
        assert!(apply_selection(&mut field, 1, true));
        assert_eq!(field.value, "Green");
        assert!(!field.options[2].selected);
        assert!(!apply_selection(&mut field, 3, true));
    }

    #[test]
    fn test_search_flags() {
        let text: Vec<u16> = "Cat catalog cat".encode_utf16().collect();
        let pattern: Vec<u16> = "cat".encode_utf16().collect();
        assert!(matches_at(&text, 0, &pattern, 0));
        assert!(!matches_at(&text, 0, &pattern, MATCH_CASE));
        assert!(!matches_at(&text, 4, &pattern, MATCH_WHOLE_WORD));
        assert!(matches_at(&text, 12, &pattern, MATCH_WHOLE_WORD));
    }

    #[test]
    fn test_save_registers_current_state() {
        let engine = MemoryEngine::new();
        let bytes = engine.add_document(sample_document());
        let doc = engine.load_document(&bytes, None);
        let saved = engine.save_document(doc).unwrap();
        assert_ne!(saved, bytes);
        assert_eq!(engine.registered(&saved), engine.registered(&bytes));
        engine.close_document(doc);
    }
}
