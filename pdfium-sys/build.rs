use std::env;
use std::path::{Path, PathBuf};

/// Headers the bindings are generated from.
#[cfg(feature = "bindgen")]
const HEADERS: &[&str] = &[
    "fpdfview.h",
    "fpdf_doc.h",
    "fpdf_edit.h",
    "fpdf_text.h",
    "fpdf_annot.h",
    "fpdf_formfill.h",
    "fpdf_save.h",
    "fpdf_signature.h",
];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=PDFIUM_LIB_DIR");
    println!("cargo:rerun-if-env-changed=PDFIUM_INCLUDE_DIR");

    let target = env::var("TARGET").unwrap_or_default();
    let lib_dir = find_library(&target);

    match &lib_dir {
        Some(dir) => setup_linking(dir),
        // Nothing to link against. The crate still builds; any binary that
        // actually calls into PDFium has to be built with PDFIUM_LIB_DIR set.
        None => println!("cargo:warning=pdfium library not found; set PDFIUM_LIB_DIR to link against it"),
    }

    generate_bindings(lib_dir.as_deref());
}

fn find_library(target: &str) -> Option<PathBuf> {
    // Priority 1: Manual override via PDFIUM_LIB_DIR
    if let Ok(lib_dir) = env::var("PDFIUM_LIB_DIR") {
        let lib_dir = PathBuf::from(lib_dir);
        if has_pdfium(&lib_dir, target) {
            println!("cargo:warning=Using PDFIUM_LIB_DIR: {}", lib_dir.display());
            return Some(lib_dir);
        }
        println!(
            "cargo:warning=PDFIUM_LIB_DIR={} does not contain a pdfium library",
            lib_dir.display()
        );
    }

    // Priority 2: Check for out/Release next to the workspace (development mode)
    let release_dir = workspace_root()?.join("out/Release");
    if has_pdfium(&release_dir, target) {
        println!("cargo:warning=Using development build: {}", release_dir.display());
        return Some(release_dir);
    }
    None
}

fn workspace_root() -> Option<PathBuf> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").ok()?);
    manifest_dir.parent().map(Path::to_path_buf)
}

fn library_name(target: &str) -> &'static str {
    if target.contains("windows") {
        "pdfium.dll"
    } else if target.contains("apple") {
        "libpdfium.dylib"
    } else {
        "libpdfium.so"
    }
}

fn has_pdfium(lib_dir: &Path, target: &str) -> bool {
    lib_dir.join(library_name(target)).exists()
}

fn setup_linking(lib_dir: &Path) {
    println!("cargo:rustc-link-search=native={}", lib_dir.display());
    println!("cargo:rustc-link-lib=dylib=pdfium");
    println!("cargo:lib_dir={}", lib_dir.display());

    // Add rpath for runtime library discovery (macOS/Linux)
    if cfg!(target_os = "macos") || cfg!(target_os = "linux") {
        println!("cargo:rustc-link-arg=-Wl,-rpath,{}", lib_dir.display());
    }
}

/// Header directory: PDFIUM_INCLUDE_DIR, then `include/` next to or above
/// the library, then the `public/` tree of a PDFium checkout.
fn find_headers(lib_dir: Option<&Path>) -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(dir) = env::var("PDFIUM_INCLUDE_DIR") {
        candidates.push(PathBuf::from(dir));
    }
    if let Some(lib_dir) = lib_dir {
        candidates.push(lib_dir.join("include"));
        if let Some(parent) = lib_dir.parent() {
            candidates.push(parent.join("include"));
            if let Some(root) = parent.parent() {
                candidates.push(root.join("public"));
            }
        }
    }
    if let Some(root) = workspace_root() {
        candidates.push(root.join("public"));
    }
    candidates
        .into_iter()
        .find(|dir| dir.join("fpdfview.h").exists())
}

#[cfg(feature = "bindgen")]
fn generate_bindings(lib_dir: Option<&Path>) {
    let Some(headers_dir) = find_headers(lib_dir) else {
        panic!(
            "PDFium headers not found. Either:\n\
             1. Set PDFIUM_INCLUDE_DIR to the directory holding fpdfview.h\n\
             2. Set PDFIUM_LIB_DIR to a release with an include/ directory\n\
             3. Build without the `bindgen` feature"
        );
    };
    println!("cargo:rerun-if-changed={}", headers_dir.display());

    let mut builder = bindgen::Builder::default()
        .clang_arg(format!("-I{}", headers_dir.display()))
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
        .derive_default(true)
        .allowlist_function("FPDF_.*")
        .allowlist_function("FPDFDOC_.*")
        .allowlist_function("FPDFText_.*")
        .allowlist_function("FPDFLink_.*")
        .allowlist_function("FPDFAction_.*")
        .allowlist_function("FPDFDest_.*")
        .allowlist_function("FPDFPage_.*Annot.*")
        .allowlist_function("FPDFAnnot_.*")
        .allowlist_function("FPDFSignatureObj_.*")
        .allowlist_function("FORM_.*")
        .allowlist_type("FPDF.*")
        .allowlist_type("FS_.*")
        .allowlist_var("FPDF_ERR_.*")
        .allowlist_var("FPDF_FORMFIELD_.*")
        .allowlist_var("FPDF_FORMFLAG_.*")
        .allowlist_var("FPDF_ANNOT_.*")
        .allowlist_var("FORMTYPE_.*")
        .allowlist_var("FPDF_MATCHCASE")
        .allowlist_var("FPDF_MATCHWHOLEWORD")
        .allowlist_var("FPDF_CONSECUTIVE")
        .allowlist_var("FPDF_INCREMENTAL")
        .allowlist_var("FPDF_NO_INCREMENTAL")
        .allowlist_var("FPDF_REMOVE_SECURITY")
        .opaque_type("fpdf_.*");
    for header in HEADERS {
        builder = builder.header(headers_dir.join(header).to_string_lossy());
    }
    let bindings = builder.generate().expect("Unable to generate bindings");

    let out_path = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    bindings
        .write_to_file(out_path.join("bindings.rs"))
        .expect("Couldn't write bindings!");

    println!("cargo:warning=Generated PDFium bindings from {}", headers_dir.display());
}

#[cfg(not(feature = "bindgen"))]
fn generate_bindings(lib_dir: Option<&Path>) {
    if let Some(headers_dir) = find_headers(lib_dir) {
        println!(
            "cargo:warning=PDFium headers found at {}; enable the `bindgen` feature to generate bindings",
            headers_dir.display()
        );
    }
}
