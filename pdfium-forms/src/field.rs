//! Form fields and annotation classification.
//!
//! Widgets are found by walking a page's annotations and asking the form
//! engine for each one's field type. Every annotation taken during that walk
//! is an acquisition that must be released, whether it turned out to be a
//! field or not. [`Classified`] makes both outcomes explicit so each call site
//! decides, per arm, whether to keep or release the handle.

use crate::annotation::Annotation;
use crate::engine::Rect;
use crate::error::Result;
use crate::handle::AnnotationHandle;
use crate::page::PageSession;

/// Type of form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum FieldType {
    /// Unknown field type
    Unknown = 0,
    /// Push button
    PushButton = 1,
    /// Checkbox
    CheckBox = 2,
    /// Radio button
    RadioButton = 3,
    /// Combo box (dropdown)
    ComboBox = 4,
    /// List box
    ListBox = 5,
    /// Text field
    TextField = 6,
    /// Digital signature field
    Signature = 7,
}

impl FieldType {
    /// Create field type from the raw engine value. Out-of-range values,
    /// including the engine's -1 failure value, map to `Unknown`.
    pub fn from_raw(value: i32) -> Self {
        Self::try_from(value).unwrap_or(Self::Unknown)
    }

    /// Check if this is a button-type field.
    pub fn is_button(&self) -> bool {
        matches!(self, Self::PushButton | Self::CheckBox | Self::RadioButton)
    }

    /// Check if this is a choice field (combo/list).
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::ComboBox | Self::ListBox)
    }

    /// Check if this is a text input field.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::TextField)
    }
}

impl From<FieldType> for i32 {
    fn from(value: FieldType) -> Self {
        value as i32
    }
}

impl TryFrom<i32> for FieldType {
    type Error = i32;

    fn try_from(value: i32) -> std::result::Result<Self, i32> {
        Ok(match value {
            0 => Self::Unknown,
            1 => Self::PushButton,
            2 => Self::CheckBox,
            3 => Self::RadioButton,
            4 => Self::ComboBox,
            5 => Self::ListBox,
            6 => Self::TextField,
            7 => Self::Signature,
            other => return Err(other),
        })
    }
}

/// Form field flags (from PDF Reference).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldFlags(pub u32);

impl FieldFlags {
    /// No flags set.
    pub const NONE: FieldFlags = FieldFlags(0);
    /// Field is read-only.
    pub const READ_ONLY: FieldFlags = FieldFlags(1 << 0);
    /// Field is required.
    pub const REQUIRED: FieldFlags = FieldFlags(1 << 1);
    /// Field value should not be exported.
    pub const NO_EXPORT: FieldFlags = FieldFlags(1 << 2);
    /// Text field: Allow multi-line text.
    pub const TEXT_MULTILINE: FieldFlags = FieldFlags(1 << 12);
    /// Text field: Password field (obscured text).
    pub const TEXT_PASSWORD: FieldFlags = FieldFlags(1 << 13);
    /// Choice field: Combo box (not list box).
    pub const CHOICE_COMBO: FieldFlags = FieldFlags(1 << 17);
    /// Choice field: Editable combo box.
    pub const CHOICE_EDIT: FieldFlags = FieldFlags(1 << 18);
    /// Choice field: Allow multiple selection.
    pub const CHOICE_MULTI_SELECT: FieldFlags = FieldFlags(1 << 21);

    /// Check if a flag is set.
    pub fn contains(&self, flag: FieldFlags) -> bool {
        (self.0 & flag.0) != 0
    }

    pub fn is_read_only(&self) -> bool {
        self.contains(Self::READ_ONLY)
    }

    pub fn is_required(&self) -> bool {
        self.contains(Self::REQUIRED)
    }

    pub fn is_password(&self) -> bool {
        self.contains(Self::TEXT_PASSWORD)
    }

    pub fn is_multiline(&self) -> bool {
        self.contains(Self::TEXT_MULTILINE)
    }

    /// Check if this is an editable combo box.
    pub fn is_editable_combo(&self) -> bool {
        self.contains(Self::CHOICE_COMBO) && self.contains(Self::CHOICE_EDIT)
    }

    pub fn allows_multi_select(&self) -> bool {
        self.contains(Self::CHOICE_MULTI_SELECT)
    }
}

impl std::ops::BitOr for FieldFlags {
    type Output = FieldFlags;

    fn bitor(self, rhs: FieldFlags) -> FieldFlags {
        FieldFlags(self.0 | rhs.0)
    }
}

/// A widget annotation recognized as a form field.
///
/// Holds the annotation handle it was built from and releases it once, on
/// [`release`](Self::release) or drop. Names are not guaranteed unique within
/// a document.
pub struct FieldView<'page> {
    annotation: Annotation<'page>,
    name: String,
    field_type: FieldType,
    value: String,
    rect: Option<Rect>,
}

impl<'page> FieldView<'page> {
    pub(crate) fn new(
        annotation: Annotation<'page>,
        name: String,
        field_type: FieldType,
        value: String,
        rect: Option<Rect>,
    ) -> Self {
        Self {
            annotation,
            name,
            field_type,
            value,
            rect,
        }
    }

    /// Fully qualified field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Value at the time the field was enumerated.
    ///
    /// Use [`FormEnvironment::value`](crate::FormEnvironment::value) for the
    /// current value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Index of the page the field lives on.
    pub fn page_index(&self) -> usize {
        self.annotation.page().index()
    }

    /// Widget rectangle in page coordinates.
    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    pub fn page(&self) -> &'page PageSession<'page> {
        self.annotation.page()
    }

    pub fn annotation(&self) -> &Annotation<'page> {
        &self.annotation
    }

    pub(crate) fn handle(&self) -> Result<AnnotationHandle> {
        self.annotation.handle()
    }

    /// Release the underlying annotation handle now.
    pub fn release(self) {
        self.annotation.release();
    }
}

impl std::fmt::Debug for FieldView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldView")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("value", &self.value)
            .field("page_index", &self.page_index())
            .finish()
    }
}

/// Outcome of classifying one annotation during field enumeration.
///
/// Both arms own an annotation acquisition.
#[derive(Debug)]
pub enum Classified<'page> {
    /// The annotation is a form field.
    Field(FieldView<'page>),
    /// The annotation is not a form field and still has to be released.
    Skipped(Annotation<'page>),
}

impl<'page> Classified<'page> {
    /// The field, if this annotation is one. A skipped annotation is released.
    pub fn into_field(self) -> Option<FieldView<'page>> {
        match self {
            Classified::Field(field) => Some(field),
            Classified::Skipped(annotation) => {
                annotation.release();
                None
            }
        }
    }

    /// Release whichever handle this classification holds.
    pub fn release(self) {
        match self {
            Classified::Field(field) => field.release(),
            Classified::Skipped(annotation) => annotation.release(),
        }
    }
}
