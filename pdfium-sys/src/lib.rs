//! FFI bindings to PDFium
//!
//! Generated by `bindgen` from the PDFium headers used by `pdfium-forms`:
//! library lifecycle, document and page loading, text extraction and search,
//! annotations, links, signatures, saving, and the interactive form-fill
//! environment (`fpdfview.h`, `fpdf_doc.h`, `fpdf_edit.h`, `fpdf_text.h`,
//! `fpdf_annot.h`, `fpdf_formfill.h`, `fpdf_save.h`, `fpdf_signature.h`).
//!
//! The declarations are only present with the `bindgen` feature, which needs
//! the headers (`PDFIUM_INCLUDE_DIR`, or an `include/` directory next to
//! `PDFIUM_LIB_DIR`) and libclang at build time. Without it the crate is
//! empty, so a workspace build works on machines without PDFium.
//!
//! Nothing here is safe to call directly; see `pdfium-forms` for the
//! handle-owning wrappers.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(dead_code)]

// Include generated bindings
#[cfg(feature = "bindgen")]
include!(concat!(env!("OUT_DIR"), "/bindings.rs"));

#[cfg(all(test, feature = "bindgen"))]
mod tests {
    use super::*;

    #[test]
    fn test_default_formfillinfo_has_no_callbacks() {
        let info = FPDF_FORMFILLINFO::default();
        assert_eq!(info.version, 0);
        assert!(info.Release.is_none());
        assert!(info.FFI_Invalidate.is_none());
        assert!(info.m_pJsPlatform.is_null());
    }

    #[test]
    fn test_form_field_type_range() {
        assert_eq!(FPDF_FORMFIELD_UNKNOWN, 0);
        assert_eq!(FPDF_FORMFIELD_SIGNATURE, 7);
        assert!(FPDF_FORMFIELD_TEXTFIELD < FPDF_FORMFIELD_SIGNATURE);
    }

    #[test]
    fn test_form_flags_are_distinct_bits() {
        let flags = [
            FPDF_FORMFLAG_READONLY,
            FPDF_FORMFLAG_REQUIRED,
            FPDF_FORMFLAG_NOEXPORT,
            FPDF_FORMFLAG_TEXT_MULTILINE,
            FPDF_FORMFLAG_TEXT_PASSWORD,
            FPDF_FORMFLAG_CHOICE_COMBO,
            FPDF_FORMFLAG_CHOICE_EDIT,
            FPDF_FORMFLAG_CHOICE_MULTI_SELECT,
        ];
        let combined = flags.iter().fold(0u32, |acc, f| {
            assert_eq!(acc & f, 0);
            acc | f
        });
        assert_eq!(combined.count_ones() as usize, flags.len());
    }

    #[test]
    fn test_error_codes_match_open_failure_mapping() {
        assert_eq!(FPDF_ERR_UNKNOWN, 1);
        assert_eq!(FPDF_ERR_FILE, 2);
        assert_eq!(FPDF_ERR_FORMAT, 3);
        assert_eq!(FPDF_ERR_PASSWORD, 4);
        assert_eq!(FPDF_ERR_SECURITY, 5);
        assert_eq!(FPDF_ERR_PAGE, 6);
    }
}
