//! [`Engine`] implementation over the PDFium C library.
//!
//! Handles cross the boundary as pointer-sized integers; nothing on this side
//! dereferences them. Strings go in as nul-terminated UTF-16 (`FPDF_WIDESTRING`)
//! or C strings (`FPDF_BYTESTRING`), and come back through caller-sized
//! buffers following PDFium's two-call idiom.

use crate::engine::{Engine, Rect, Viewport};
use crate::handle::{
    AnnotationHandle, DocumentHandle, FormHandle, Handle, LinkHandle, PageHandle, SearchHandle,
    SignatureHandle, TextPageHandle,
};
use libc::{c_int, c_ulong, c_void};
use log::warn;
use pdfium_sys::*;
use std::collections::HashMap;
use std::ffi::CString;
use std::ptr;
use std::sync::Mutex;

fn raw<H: Handle, T>(handle: H) -> *mut T {
    handle.as_raw() as *mut T
}

fn wrap<H: Handle, T>(pointer: *mut T) -> H {
    H::from_raw(pointer as usize)
}

fn wide(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Pointer and byte length of a UTF-16 out buffer; null when empty so the
/// call only reports the size.
fn wide_out(buffer: &mut [u16]) -> (*mut u16, c_ulong) {
    if buffer.is_empty() {
        (ptr::null_mut(), 0)
    } else {
        (buffer.as_mut_ptr(), (buffer.len() * 2) as c_ulong)
    }
}

fn byte_out(buffer: &mut [u8]) -> (*mut u8, c_ulong) {
    if buffer.is_empty() {
        (ptr::null_mut(), 0)
    } else {
        (buffer.as_mut_ptr(), buffer.len() as c_ulong)
    }
}

/// Returns `$fail` when any of the handles is null, without calling into
/// PDFium.
macro_rules! require {
    ($($handle:expr),+ => $fail:expr) => {
        if $($handle.is_null())||+ {
            return $fail;
        }
    };
}

fn rect_from(rect: FS_RECTF) -> Rect {
    Rect::new(rect.left, rect.top, rect.right, rect.bottom)
}

/// Form-fill callbacks handed to PDFium. PDFium keeps the pointer until the
/// environment exits, so each one stays boxed in [`PdfiumEngine::forms`].
struct FormFillInfo(Box<FPDF_FORMFILLINFO>);

// Only `version` is set; every callback slot is null and never read here.
unsafe impl Send for FormFillInfo {}

impl FormFillInfo {
    fn new() -> Self {
        Self(Box::new(FPDF_FORMFILLINFO {
            version: 1,
            ..Default::default()
        }))
    }
}

/// The PDFium library.
///
/// Obtain it through [`Library::pdfium`](crate::Library::pdfium), which owns
/// process-wide initialization.
pub struct PdfiumEngine {
    forms: Mutex<HashMap<usize, FormFillInfo>>,
}

impl PdfiumEngine {
    pub(crate) fn new() -> Self {
        Self {
            forms: Mutex::new(HashMap::new()),
        }
    }
}

impl Engine for PdfiumEngine {
    fn init_library(&self) {
        unsafe { FPDF_InitLibrary() }
    }

    fn destroy_library(&self) {
        unsafe { FPDF_DestroyLibrary() }
    }

    fn last_error(&self) -> u32 {
        unsafe { FPDF_GetLastError() as u32 }
    }

    fn load_document(&self, data: &[u8], password: Option<&str>) -> DocumentHandle {
        let Ok(size) = c_int::try_from(data.len()) else {
            return DocumentHandle::NULL;
        };
        let password = password.and_then(|p| CString::new(p).ok());
        let password_ptr = password.as_ref().map_or(ptr::null(), |p| p.as_ptr());
        wrap(unsafe { FPDF_LoadMemDocument(data.as_ptr() as *const c_void, size, password_ptr) })
    }

    fn create_document(&self) -> DocumentHandle {
        wrap(unsafe { FPDF_CreateNewDocument() })
    }

    fn close_document(&self, doc: DocumentHandle) {
        require!(doc => ());
        unsafe { FPDF_CloseDocument(raw(doc)) }
    }

    fn page_count(&self, doc: DocumentHandle) -> i32 {
        require!(doc => 0);
        unsafe { FPDF_GetPageCount(raw(doc)) }
    }

    fn metadata(&self, doc: DocumentHandle, tag: &str, buffer: &mut [u16]) -> usize {
        require!(doc => 0);
        let Ok(tag) = CString::new(tag) else {
            return 0;
        };
        let (out, len) = wide_out(buffer);
        unsafe { FPDF_GetMetaText(raw(doc), tag.as_ptr(), out as *mut c_void, len) as usize }
    }

    fn page_label(&self, doc: DocumentHandle, index: i32, buffer: &mut [u16]) -> usize {
        require!(doc => 0);
        let (out, len) = wide_out(buffer);
        unsafe { FPDF_GetPageLabel(raw(doc), index, out as *mut c_void, len) as usize }
    }

    fn page_size(&self, doc: DocumentHandle, index: i32) -> Option<(f64, f64)> {
        require!(doc => None);
        let (mut width, mut height): (f64, f64) = (0.0, 0.0);
        let ok = unsafe { FPDF_GetPageSizeByIndex(raw(doc), index, &mut width, &mut height) };
        (ok != 0).then_some((width, height))
    }

    fn form_type(&self, doc: DocumentHandle) -> i32 {
        require!(doc => 0);
        unsafe { FPDF_GetFormType(raw(doc)) }
    }

    fn save_document(&self, doc: DocumentHandle) -> Option<Vec<u8>> {
        // FPDF_FILEWRITE followed by our own state, recovered in the callback.
        #[repr(C)]
        struct BufferWriter {
            base: FPDF_FILEWRITE,
            buffer: Vec<u8>,
        }

        unsafe extern "C" fn write_block(
            this: *mut FPDF_FILEWRITE,
            data: *const c_void,
            size: c_ulong,
        ) -> c_int {
            let writer = &mut *(this as *mut BufferWriter);
            if size > 0 {
                let slice = std::slice::from_raw_parts(data as *const u8, size as usize);
                writer.buffer.extend_from_slice(slice);
            }
            1
        }

        require!(doc => None);
        let mut writer = BufferWriter {
            base: FPDF_FILEWRITE {
                version: 1,
                WriteBlock: Some(write_block),
            },
            buffer: Vec::new(),
        };
        let ok = unsafe {
            FPDF_SaveAsCopy(
                raw(doc),
                &mut writer as *mut BufferWriter as *mut FPDF_FILEWRITE,
                FPDF_NO_INCREMENTAL as FPDF_DWORD,
            )
        };
        (ok != 0).then_some(writer.buffer)
    }

    fn signature_count(&self, doc: DocumentHandle) -> i32 {
        require!(doc => 0);
        unsafe { FPDF_GetSignatureCount(raw(doc)) }
    }

    fn signature(&self, doc: DocumentHandle, index: i32) -> SignatureHandle {
        require!(doc => SignatureHandle::NULL);
        wrap(unsafe { FPDF_GetSignatureObject(raw(doc), index) })
    }

    fn signature_reason(&self, sig: SignatureHandle, buffer: &mut [u16]) -> usize {
        require!(sig => 0);
        let (out, len) = wide_out(buffer);
        unsafe { FPDFSignatureObj_GetReason(raw(sig), out as *mut c_void, len) as usize }
    }

    fn signature_time(&self, sig: SignatureHandle, buffer: &mut [u8]) -> usize {
        require!(sig => 0);
        let (out, len) = byte_out(buffer);
        unsafe { FPDFSignatureObj_GetTime(raw(sig), out as *mut libc::c_char, len) as usize }
    }

    fn load_page(&self, doc: DocumentHandle, index: i32) -> PageHandle {
        require!(doc => PageHandle::NULL);
        wrap(unsafe { FPDF_LoadPage(raw(doc), index) })
    }

    fn close_page(&self, page: PageHandle) {
        require!(page => ());
        unsafe { FPDF_ClosePage(raw(page)) }
    }

    fn page_width(&self, page: PageHandle) -> f64 {
        require!(page => 0.0);
        unsafe { FPDF_GetPageWidth(raw(page)) }
    }

    fn page_height(&self, page: PageHandle) -> f64 {
        require!(page => 0.0);
        unsafe { FPDF_GetPageHeight(raw(page)) }
    }

    fn device_to_page(
        &self,
        page: PageHandle,
        viewport: &Viewport,
        x: i32,
        y: i32,
    ) -> Option<(f64, f64)> {
        require!(page => None);
        let (mut page_x, mut page_y): (f64, f64) = (0.0, 0.0);
        let ok = unsafe {
            FPDF_DeviceToPage(
                raw(page),
                viewport.start_x,
                viewport.start_y,
                viewport.width,
                viewport.height,
                viewport.rotation,
                x,
                y,
                &mut page_x,
                &mut page_y,
            )
        };
        (ok != 0).then_some((page_x, page_y))
    }

    fn page_to_device(
        &self,
        page: PageHandle,
        viewport: &Viewport,
        x: f64,
        y: f64,
    ) -> Option<(i32, i32)> {
        require!(page => None);
        let (mut device_x, mut device_y): (c_int, c_int) = (0, 0);
        let ok = unsafe {
            FPDF_PageToDevice(
                raw(page),
                viewport.start_x,
                viewport.start_y,
                viewport.width,
                viewport.height,
                viewport.rotation,
                x,
                y,
                &mut device_x,
                &mut device_y,
            )
        };
        (ok != 0).then_some((device_x, device_y))
    }

    fn link_at_point(&self, page: PageHandle, x: f64, y: f64) -> LinkHandle {
        require!(page => LinkHandle::NULL);
        wrap(unsafe { FPDFLink_GetLinkAtPoint(raw(page), x, y) })
    }

    fn link_target_page(&self, doc: DocumentHandle, link: LinkHandle) -> i32 {
        require!(doc, link => -1);
        unsafe {
            let mut dest = FPDFLink_GetDest(raw(doc), raw(link));
            if dest.is_null() {
                let action = FPDFLink_GetAction(raw(link));
                if !action.is_null() {
                    dest = FPDFAction_GetDest(raw(doc), action);
                }
            }
            if dest.is_null() {
                -1
            } else {
                FPDFDest_GetDestPageIndex(raw(doc), dest)
            }
        }
    }

    fn link_uri(&self, doc: DocumentHandle, link: LinkHandle, buffer: &mut [u8]) -> usize {
        require!(doc, link => 0);
        let action = unsafe { FPDFLink_GetAction(raw(link)) };
        if action.is_null() {
            return 0;
        }
        let (out, len) = byte_out(buffer);
        unsafe { FPDFAction_GetURIPath(raw(doc), action, out as *mut c_void, len) as usize }
    }

    fn link_rect(&self, link: LinkHandle) -> Option<Rect> {
        require!(link => None);
        let mut rect = FS_RECTF::default();
        let ok = unsafe { FPDFLink_GetAnnotRect(raw(link), &mut rect) };
        (ok != 0).then(|| rect_from(rect))
    }

    fn load_text_page(&self, page: PageHandle) -> TextPageHandle {
        require!(page => TextPageHandle::NULL);
        wrap(unsafe { FPDFText_LoadPage(raw(page)) })
    }

    fn close_text_page(&self, text: TextPageHandle) {
        require!(text => ());
        unsafe { FPDFText_ClosePage(raw(text)) }
    }

    fn char_count(&self, text: TextPageHandle) -> i32 {
        require!(text => 0);
        unsafe { FPDFText_CountChars(raw(text)) }
    }

    fn text_range(&self, text: TextPageHandle, start: i32, count: i32, buffer: &mut [u16]) -> i32 {
        require!(text => 0);
        let Ok(needed) = usize::try_from(count) else {
            return 0;
        };
        if buffer.len() <= needed {
            return 0;
        }
        unsafe { FPDFText_GetText(raw(text), start, count, buffer.as_mut_ptr()) }
    }

    fn char_box(&self, text: TextPageHandle, index: i32) -> Option<Rect> {
        require!(text => None);
        let (mut left, mut right, mut bottom, mut top) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        let ok = unsafe {
            FPDFText_GetCharBox(raw(text), index, &mut left, &mut right, &mut bottom, &mut top)
        };
        (ok != 0).then(|| Rect::new(left as f32, top as f32, right as f32, bottom as f32))
    }

    fn char_index_at(&self, text: TextPageHandle, x: f64, y: f64, tolerance: f64) -> i32 {
        require!(text => -1);
        unsafe { FPDFText_GetCharIndexAtPos(raw(text), x, y, tolerance, tolerance) }
    }

    fn count_rects(&self, text: TextPageHandle, start: i32, count: i32) -> i32 {
        require!(text => 0);
        unsafe { FPDFText_CountRects(raw(text), start, count) }
    }

    fn rect(&self, text: TextPageHandle, index: i32) -> Option<Rect> {
        require!(text => None);
        let (mut left, mut top, mut right, mut bottom) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        let ok = unsafe {
            FPDFText_GetRect(raw(text), index, &mut left, &mut top, &mut right, &mut bottom)
        };
        (ok != 0).then(|| Rect::new(left as f32, top as f32, right as f32, bottom as f32))
    }

    fn find_start(&self, text: TextPageHandle, pattern: &str, flags: u32, start: i32) -> SearchHandle {
        require!(text => SearchHandle::NULL);
        let pattern = wide(pattern);
        wrap(unsafe { FPDFText_FindStart(raw(text), pattern.as_ptr(), flags as c_ulong, start) })
    }

    fn find_next(&self, search: SearchHandle) -> bool {
        require!(search => false);
        unsafe { FPDFText_FindNext(raw(search)) != 0 }
    }

    fn find_prev(&self, search: SearchHandle) -> bool {
        require!(search => false);
        unsafe { FPDFText_FindPrev(raw(search)) != 0 }
    }

    fn search_result_index(&self, search: SearchHandle) -> i32 {
        require!(search => -1);
        unsafe { FPDFText_GetSchResultIndex(raw(search)) }
    }

    fn search_result_count(&self, search: SearchHandle) -> i32 {
        require!(search => 0);
        unsafe { FPDFText_GetSchCount(raw(search)) }
    }

    fn find_close(&self, search: SearchHandle) {
        require!(search => ());
        unsafe { FPDFText_FindClose(raw(search)) }
    }

    fn annotation_count(&self, page: PageHandle) -> i32 {
        require!(page => 0);
        unsafe { FPDFPage_GetAnnotCount(raw(page)) }
    }

    fn annotation(&self, page: PageHandle, index: i32) -> AnnotationHandle {
        require!(page => AnnotationHandle::NULL);
        wrap(unsafe { FPDFPage_GetAnnot(raw(page), index) })
    }

    fn close_annotation(&self, annot: AnnotationHandle) {
        require!(annot => ());
        unsafe { FPDFPage_CloseAnnot(raw(annot)) }
    }

    fn annotation_subtype(&self, annot: AnnotationHandle) -> i32 {
        require!(annot => 0);
        unsafe { FPDFAnnot_GetSubtype(raw(annot)) }
    }

    fn annotation_rect(&self, annot: AnnotationHandle) -> Option<Rect> {
        require!(annot => None);
        let mut rect = FS_RECTF::default();
        let ok = unsafe { FPDFAnnot_GetRect(raw(annot), &mut rect) };
        (ok != 0).then(|| rect_from(rect))
    }

    fn annotation_string(&self, annot: AnnotationHandle, key: &str, buffer: &mut [u16]) -> usize {
        require!(annot => 0);
        let Ok(key) = CString::new(key) else {
            return 0;
        };
        let (out, len) = wide_out(buffer);
        unsafe { FPDFAnnot_GetStringValue(raw(annot), key.as_ptr(), out, len) as usize }
    }

    fn set_annotation_string(&self, annot: AnnotationHandle, key: &str, value: &str) -> bool {
        require!(annot => false);
        let Ok(key) = CString::new(key) else {
            return false;
        };
        let value = wide(value);
        unsafe { FPDFAnnot_SetStringValue(raw(annot), key.as_ptr(), value.as_ptr()) != 0 }
    }

    fn annotation_number(&self, annot: AnnotationHandle, key: &str) -> Option<f32> {
        require!(annot => None);
        let key = CString::new(key).ok()?;
        let mut value: f32 = 0.0;
        let ok = unsafe { FPDFAnnot_GetNumberValue(raw(annot), key.as_ptr(), &mut value) };
        (ok != 0).then_some(value)
    }

    fn init_form(&self, doc: DocumentHandle) -> FormHandle {
        require!(doc => FormHandle::NULL);
        let mut info = FormFillInfo::new();
        let handle: FormHandle =
            wrap(unsafe { FPDFDOC_InitFormFillEnvironment(raw(doc), info.0.as_mut()) });
        if !handle.is_null() {
            self.forms
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(handle.as_raw(), info);
        }
        handle
    }

    fn exit_form(&self, form: FormHandle) {
        require!(form => ());
        unsafe { FPDFDOC_ExitFormFillEnvironment(raw(form)) };
        let released = self
            .forms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&form.as_raw());
        if released.is_none() {
            warn!("exited unknown form environment {:#x}", form.as_raw());
        }
    }

    fn on_after_load_page(&self, form: FormHandle, page: PageHandle) {
        require!(form, page => ());
        unsafe { FORM_OnAfterLoadPage(raw(page), raw(form)) }
    }

    fn on_before_close_page(&self, form: FormHandle, page: PageHandle) {
        require!(form, page => ());
        unsafe { FORM_OnBeforeClosePage(raw(page), raw(form)) }
    }

    fn field_type(&self, form: FormHandle, annot: AnnotationHandle) -> i32 {
        require!(form, annot => 0);
        unsafe { FPDFAnnot_GetFormFieldType(raw(form), raw(annot)) }
    }

    fn field_flags(&self, form: FormHandle, annot: AnnotationHandle) -> u32 {
        require!(form, annot => 0);
        let flags = unsafe { FPDFAnnot_GetFormFieldFlags(raw(form), raw(annot)) };
        // -1 signals failure.
        u32::try_from(flags).unwrap_or(0)
    }

    fn field_name(&self, form: FormHandle, annot: AnnotationHandle, buffer: &mut [u16]) -> usize {
        require!(form, annot => 0);
        let (out, len) = wide_out(buffer);
        unsafe { FPDFAnnot_GetFormFieldName(raw(form), raw(annot), out, len) as usize }
    }

    fn field_value(&self, form: FormHandle, annot: AnnotationHandle, buffer: &mut [u16]) -> usize {
        require!(form, annot => 0);
        let (out, len) = wide_out(buffer);
        unsafe { FPDFAnnot_GetFormFieldValue(raw(form), raw(annot), out, len) as usize }
    }

    fn option_count(&self, form: FormHandle, annot: AnnotationHandle) -> i32 {
        require!(form, annot => 0);
        unsafe { FPDFAnnot_GetOptionCount(raw(form), raw(annot)) }
    }

    fn option_label(
        &self,
        form: FormHandle,
        annot: AnnotationHandle,
        index: i32,
        buffer: &mut [u16],
    ) -> usize {
        require!(form, annot => 0);
        let (out, len) = wide_out(buffer);
        unsafe { FPDFAnnot_GetOptionLabel(raw(form), raw(annot), index, out, len) as usize }
    }

    fn is_option_selected(&self, form: FormHandle, annot: AnnotationHandle, index: i32) -> bool {
        require!(form, annot => false);
        unsafe { FPDFAnnot_IsOptionSelected(raw(form), raw(annot), index) != 0 }
    }

    fn is_checked(&self, form: FormHandle, annot: AnnotationHandle) -> bool {
        require!(form, annot => false);
        unsafe { FPDFAnnot_IsChecked(raw(form), raw(annot)) != 0 }
    }

    fn set_focused_annotation(&self, form: FormHandle, annot: AnnotationHandle) -> bool {
        require!(form, annot => false);
        unsafe { FORM_SetFocusedAnnot(raw(form), raw(annot)) != 0 }
    }

    fn select_all_text(&self, form: FormHandle, page: PageHandle) -> bool {
        require!(form, page => false);
        unsafe { FORM_SelectAllText(raw(form), raw(page)) != 0 }
    }

    fn replace_selection(&self, form: FormHandle, page: PageHandle, text: &str) {
        require!(form, page => ());
        let text = wide(text);
        unsafe { FORM_ReplaceSelection(raw(form), raw(page), text.as_ptr()) }
    }

    fn kill_focus(&self, form: FormHandle) -> bool {
        require!(form => false);
        unsafe { FORM_ForceToKillFocus(raw(form)) != 0 }
    }

    fn set_index_selected(
        &self,
        form: FormHandle,
        page: PageHandle,
        index: i32,
        selected: bool,
    ) -> bool {
        require!(form, page => false);
        unsafe { FORM_SetIndexSelected(raw(form), raw(page), index, selected as FPDF_BOOL) != 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_is_nul_terminated() {
        assert_eq!(wide("ab"), vec![0x61, 0x62, 0]);
        assert_eq!(wide(""), vec![0]);
    }

    #[test]
    fn test_empty_out_buffer_is_null() {
        let (pointer, len) = wide_out(&mut []);
        assert!(pointer.is_null());
        assert_eq!(len, 0);

        let mut buffer = [0u16; 4];
        let (pointer, len) = wide_out(&mut buffer);
        assert!(!pointer.is_null());
        assert_eq!(len, 8);
    }

    #[test]
    fn test_null_handles_short_circuit() {
        // None of these reach PDFium; a null handle there would crash.
        let engine = PdfiumEngine::new();
        let mut wide_buffer = [0u16; 8];
        let mut byte_buffer = [0u8; 8];

        assert_eq!(engine.page_count(DocumentHandle::NULL), 0);
        assert_eq!(engine.metadata(DocumentHandle::NULL, "Title", &mut wide_buffer), 0);
        assert_eq!(engine.page_size(DocumentHandle::NULL, 0), None);
        assert!(engine.load_page(DocumentHandle::NULL, 0).is_null());
        assert!(engine.save_document(DocumentHandle::NULL).is_none());
        assert!(engine.signature(DocumentHandle::NULL, 0).is_null());
        assert_eq!(engine.signature_time(SignatureHandle::NULL, &mut byte_buffer), 0);

        assert_eq!(engine.annotation_count(PageHandle::NULL), 0);
        assert!(engine.annotation(PageHandle::NULL, 0).is_null());
        assert!(engine.load_text_page(PageHandle::NULL).is_null());
        assert!(engine.link_at_point(PageHandle::NULL, 1.0, 1.0).is_null());
        assert_eq!(
            engine.device_to_page(PageHandle::NULL, &Viewport::new(10, 10), 1, 1),
            None
        );

        assert_eq!(engine.char_count(TextPageHandle::NULL), 0);
        assert_eq!(engine.text_range(TextPageHandle::NULL, 0, 2, &mut wide_buffer), 0);
        assert!(engine.find_start(TextPageHandle::NULL, "a", 0, 0).is_null());
        assert!(!engine.find_next(SearchHandle::NULL));
        assert_eq!(engine.search_result_index(SearchHandle::NULL), -1);

        assert!(!engine.set_annotation_string(AnnotationHandle::NULL, "V", "x"));
        assert_eq!(engine.annotation_subtype(AnnotationHandle::NULL), 0);

        let form = FormHandle::from_raw(0x10);
        let annot = AnnotationHandle::from_raw(0x20);
        let page = PageHandle::from_raw(0x30);
        assert_eq!(engine.field_type(FormHandle::NULL, annot), 0);
        assert_eq!(engine.field_type(form, AnnotationHandle::NULL), 0);
        assert_eq!(engine.field_value(form, AnnotationHandle::NULL, &mut wide_buffer), 0);
        assert!(!engine.select_all_text(form, PageHandle::NULL));
        assert!(!engine.set_index_selected(FormHandle::NULL, page, 0, true));
        assert!(!engine.kill_focus(FormHandle::NULL));
        engine.on_after_load_page(FormHandle::NULL, page);
        engine.replace_selection(form, PageHandle::NULL, "x");

        engine.close_page(PageHandle::NULL);
        engine.close_annotation(AnnotationHandle::NULL);
        engine.exit_form(FormHandle::NULL);
        engine.close_document(DocumentHandle::NULL);
    }

    #[test]
    fn test_handle_pointer_round_trip() {
        let page = PageHandle::from_raw(0x1000);
        let pointer: FPDF_PAGE = raw(page);
        assert_eq!(wrap::<PageHandle, _>(pointer), page);
        assert!(raw::<PageHandle, fpdf_page_t__>(PageHandle::NULL).is_null());
    }
}
