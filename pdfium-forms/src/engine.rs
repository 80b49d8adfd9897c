//! The seam between the session wrappers and the document engine.
//!
//! [`Engine`] mirrors the C-style PDFium API one call at a time: opaque
//! handles in, opaque handles or plain values out, and a null handle (or
//! zero/false) for failure. Nothing here owns anything; ownership and release
//! ordering live in the session types built on top.
//!
//! String-returning calls follow the engine's two-call idiom. Passing an empty
//! buffer asks for the required size in bytes, terminator included; a second
//! call with a buffer of that size fills it. See [`crate::strings`].
//!
//! Handles passed to an engine must come from the same engine and must not
//! have been released. The session types guarantee this; code calling an
//! engine directly takes that responsibility on itself.

use crate::handle::{
    AnnotationHandle, DocumentHandle, FormHandle, LinkHandle, PageHandle, SearchHandle,
    SignatureHandle, TextPageHandle,
};

/// Rectangle in page coordinates (points, origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f32 {
        (self.right - self.left).abs()
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f32 {
        (self.top - self.bottom).abs()
    }

    /// Whether the point lies inside the rectangle (edges included).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let (lo_x, hi_x) = (self.left.min(self.right), self.left.max(self.right));
        let (lo_y, hi_y) = (self.bottom.min(self.top), self.bottom.max(self.top));
        x >= lo_x && x <= hi_x && y >= lo_y && y <= hi_y
    }
}

/// A device-space viewport used for page/device coordinate mapping.
///
/// `rotation` is in quarter turns clockwise (0..=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub start_x: i32,
    pub start_y: i32,
    pub width: i32,
    pub height: i32,
    pub rotation: i32,
}

impl Viewport {
    /// Viewport at the origin with the given size and no rotation.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Move the viewport origin.
    pub fn with_origin(mut self, start_x: i32, start_y: i32) -> Self {
        self.start_x = start_x;
        self.start_y = start_y;
        self
    }

    /// Rotate by quarter turns clockwise. Values wrap into 0..=3.
    pub fn with_rotation(mut self, quarter_turns: i32) -> Self {
        self.rotation = quarter_turns.rem_euclid(4);
        self
    }
}

/// The document engine API consumed by the session layer.
///
/// Every method is a single engine call. Implementations must treat a null
/// handle argument as "not present" and return the failure value without
/// touching engine state.
pub trait Engine: Send + Sync {
    // Library lifecycle

    /// Process-wide engine initialization.
    fn init_library(&self);
    /// Process-wide engine teardown.
    fn destroy_library(&self);
    /// Error code of the most recent failed call (0 when none).
    fn last_error(&self) -> u32;

    // Documents

    /// Open a document from memory. `data` must stay alive and unmoved until
    /// [`close_document`](Self::close_document) is called for the result.
    fn load_document(&self, data: &[u8], password: Option<&str>) -> DocumentHandle;
    /// Create a new empty document.
    fn create_document(&self) -> DocumentHandle;
    fn close_document(&self, doc: DocumentHandle);
    fn page_count(&self, doc: DocumentHandle) -> i32;
    /// Document info entry (`Title`, `Author`, ...) as UTF-16.
    fn metadata(&self, doc: DocumentHandle, tag: &str, buffer: &mut [u16]) -> usize;
    fn page_label(&self, doc: DocumentHandle, index: i32, buffer: &mut [u16]) -> usize;
    /// Page size without loading the page.
    fn page_size(&self, doc: DocumentHandle, index: i32) -> Option<(f64, f64)>;
    /// Raw form type (0 none, 1 AcroForm, 2 XFA full, 3 XFA foreground).
    fn form_type(&self, doc: DocumentHandle) -> i32;
    /// Serialize the current document state.
    fn save_document(&self, doc: DocumentHandle) -> Option<Vec<u8>>;
    fn signature_count(&self, doc: DocumentHandle) -> i32;
    fn signature(&self, doc: DocumentHandle, index: i32) -> SignatureHandle;
    /// Signing reason as UTF-16.
    fn signature_reason(&self, sig: SignatureHandle, buffer: &mut [u16]) -> usize;
    /// Signing time as a 7-bit ASCII PDF date string.
    fn signature_time(&self, sig: SignatureHandle, buffer: &mut [u8]) -> usize;

    // Pages

    fn load_page(&self, doc: DocumentHandle, index: i32) -> PageHandle;
    fn close_page(&self, page: PageHandle);
    fn page_width(&self, page: PageHandle) -> f64;
    fn page_height(&self, page: PageHandle) -> f64;
    fn device_to_page(
        &self,
        page: PageHandle,
        viewport: &Viewport,
        x: i32,
        y: i32,
    ) -> Option<(f64, f64)>;
    fn page_to_device(
        &self,
        page: PageHandle,
        viewport: &Viewport,
        x: f64,
        y: f64,
    ) -> Option<(i32, i32)>;
    fn link_at_point(&self, page: PageHandle, x: f64, y: f64) -> LinkHandle;
    /// Destination page of a link (direct or through its action), -1 if none.
    fn link_target_page(&self, doc: DocumentHandle, link: LinkHandle) -> i32;
    /// URI of a link's action as bytes.
    fn link_uri(&self, doc: DocumentHandle, link: LinkHandle, buffer: &mut [u8]) -> usize;
    fn link_rect(&self, link: LinkHandle) -> Option<Rect>;

    // Text

    fn load_text_page(&self, page: PageHandle) -> TextPageHandle;
    fn close_text_page(&self, text: TextPageHandle);
    fn char_count(&self, text: TextPageHandle) -> i32;
    /// Copy `count` characters starting at `start` into `buffer`, which must
    /// hold `count + 1` units. Returns the number of units written including
    /// the terminator, 0 on failure.
    fn text_range(&self, text: TextPageHandle, start: i32, count: i32, buffer: &mut [u16]) -> i32;
    fn char_box(&self, text: TextPageHandle, index: i32) -> Option<Rect>;
    /// Index of the character at a page position, -1 if none.
    fn char_index_at(&self, text: TextPageHandle, x: f64, y: f64, tolerance: f64) -> i32;
    fn count_rects(&self, text: TextPageHandle, start: i32, count: i32) -> i32;
    fn rect(&self, text: TextPageHandle, index: i32) -> Option<Rect>;
    fn find_start(&self, text: TextPageHandle, pattern: &str, flags: u32, start: i32)
        -> SearchHandle;
    fn find_next(&self, search: SearchHandle) -> bool;
    fn find_prev(&self, search: SearchHandle) -> bool;
    fn search_result_index(&self, search: SearchHandle) -> i32;
    fn search_result_count(&self, search: SearchHandle) -> i32;
    fn find_close(&self, search: SearchHandle);

    // Annotations

    fn annotation_count(&self, page: PageHandle) -> i32;
    fn annotation(&self, page: PageHandle, index: i32) -> AnnotationHandle;
    fn close_annotation(&self, annot: AnnotationHandle);
    fn annotation_subtype(&self, annot: AnnotationHandle) -> i32;
    fn annotation_rect(&self, annot: AnnotationHandle) -> Option<Rect>;
    /// String entry of the annotation (or its field) dictionary, as UTF-16.
    fn annotation_string(&self, annot: AnnotationHandle, key: &str, buffer: &mut [u16]) -> usize;
    fn set_annotation_string(&self, annot: AnnotationHandle, key: &str, value: &str) -> bool;
    fn annotation_number(&self, annot: AnnotationHandle, key: &str) -> Option<f32>;

    // Form fill

    fn init_form(&self, doc: DocumentHandle) -> FormHandle;
    fn exit_form(&self, form: FormHandle);
    fn on_after_load_page(&self, form: FormHandle, page: PageHandle);
    fn on_before_close_page(&self, form: FormHandle, page: PageHandle);
    /// Raw form-field type (0..=7), -1 when the annotation is not a field.
    fn field_type(&self, form: FormHandle, annot: AnnotationHandle) -> i32;
    fn field_flags(&self, form: FormHandle, annot: AnnotationHandle) -> u32;
    fn field_name(&self, form: FormHandle, annot: AnnotationHandle, buffer: &mut [u16]) -> usize;
    fn field_value(&self, form: FormHandle, annot: AnnotationHandle, buffer: &mut [u16]) -> usize;
    fn option_count(&self, form: FormHandle, annot: AnnotationHandle) -> i32;
    fn option_label(
        &self,
        form: FormHandle,
        annot: AnnotationHandle,
        index: i32,
        buffer: &mut [u16],
    ) -> usize;
    fn is_option_selected(&self, form: FormHandle, annot: AnnotationHandle, index: i32) -> bool;
    fn is_checked(&self, form: FormHandle, annot: AnnotationHandle) -> bool;
    fn set_focused_annotation(&self, form: FormHandle, annot: AnnotationHandle) -> bool;
    fn select_all_text(&self, form: FormHandle, page: PageHandle) -> bool;
    fn replace_selection(&self, form: FormHandle, page: PageHandle, text: &str);
    fn kill_focus(&self, form: FormHandle) -> bool;
    /// Select or deselect an option of the focused choice field.
    fn set_index_selected(
        &self,
        form: FormHandle,
        page: PageHandle,
        index: i32,
        selected: bool,
    ) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_dimensions() {
        let rect = Rect::new(10.0, 110.0, 60.0, 90.0);
        assert_eq!(rect.width(), 50.0);
        assert_eq!(rect.height(), 20.0);
        assert!(rect.contains(10.0, 100.0));
        assert!(!rect.contains(61.0, 100.0));
    }

    #[test]
    fn test_viewport_rotation_wraps() {
        assert_eq!(Viewport::new(100, 200).with_rotation(5).rotation, 1);
        assert_eq!(Viewport::new(100, 200).with_rotation(-1).rotation, 3);
    }
}
