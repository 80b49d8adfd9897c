//! Form data snapshots: capture every field of a document, restore them into
//! another session.

use crate::error::Result;
use crate::field::{FieldType, FieldView};
use crate::form::{FormEnvironment, FormKind};
use chrono::{DateTime, SubsecRound, Utc};
use log::{debug, warn};
use std::collections::HashMap;

/// One option of a combo or list box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOption {
    /// Display label
    pub label: String,
    /// Export value (same as the label)
    pub value: String,
    /// Whether the option is selected
    pub is_selected: bool,
    /// 0-based position in the option list
    pub index: usize,
}

impl FieldOption {
    /// An option whose export value is its label.
    pub fn new(label: impl Into<String>, index: usize, is_selected: bool) -> Self {
        let label = label.into();
        Self {
            value: label.clone(),
            label,
            is_selected,
            index,
        }
    }
}

/// Captured state of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecord {
    pub name: String,
    pub field_type: FieldType,
    pub value: String,
    pub default_value: String,
    pub is_required: bool,
    pub is_read_only: bool,
    /// Maximum text length, -1 when the field has none.
    pub max_length: i32,
    /// Options, only for combo and list boxes.
    pub options: Vec<FieldOption>,
}

impl FieldRecord {
    /// A record with empty values and no length limit.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            value: String::new(),
            default_value: String::new(),
            is_required: false,
            is_read_only: false,
            max_length: -1,
            options: Vec::new(),
        }
    }

    fn read(form: &FormEnvironment<'_>, field: &FieldView<'_>) -> Result<Self> {
        let flags = form.flags(field)?;
        Ok(Self {
            name: field.name().to_string(),
            field_type: field.field_type(),
            value: field.value().to_string(),
            default_value: form.default_value(field)?,
            is_required: flags.is_required(),
            is_read_only: flags.is_read_only(),
            max_length: form.max_length(field)?,
            options: form.options(field)?,
        })
    }
}

/// Every field of a document at one point in time.
///
/// Records are in capture order: page by page, then in annotation order
/// within a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSnapshot {
    form_kind: FormKind,
    captured_at: DateTime<Utc>,
    records: Vec<FieldRecord>,
}

impl FormSnapshot {
    /// Build a snapshot from parts. The timestamp is kept to the millisecond
    /// and options are dropped from records that are not combo or list boxes.
    pub fn new(
        form_kind: FormKind,
        captured_at: DateTime<Utc>,
        mut records: Vec<FieldRecord>,
    ) -> Self {
        for record in records.iter_mut().filter(|r| !r.field_type.is_choice()) {
            record.options.clear();
        }
        Self {
            form_kind,
            captured_at: captured_at.trunc_subsecs(3),
            records,
        }
    }

    pub fn form_kind(&self) -> FormKind {
        self.form_kind
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn records(&self) -> &[FieldRecord] {
        &self.records
    }

    /// First record named `name`.
    pub fn record(&self, name: &str) -> Option<&FieldRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Read every field of the environment's document.
    ///
    /// Pages are opened one at a time; each is detached and closed before
    /// the next is opened, and on error every in-flight handle is released
    /// before the error is returned.
    pub fn capture(form: &FormEnvironment<'_>) -> Result<Self> {
        let document = form.document();
        let form_kind = document.form_kind()?;
        let page_count = document.page_count()?;
        let mut records = Vec::new();

        for index in 0..page_count {
            let page = document.open_page(index)?;
            let _attachment = form.attach_page(&page)?;
            let fields = form.fields_on_page(&page)?;
            for field in &fields {
                records.push(FieldRecord::read(form, field)?);
            }
        }

        debug!("captured {} fields from {} pages", records.len(), page_count);
        Ok(Self::new(form_kind, Utc::now(), records))
    }

    /// Write recorded values into every live field with a matching name.
    ///
    /// Live fields without a record and records without a live field are
    /// left alone, as are read-only fields. When several records share a
    /// name the first one is used. Returns `Ok(false)` when any write was
    /// rejected; fields written before the rejection keep their new values.
    pub fn restore(&self, form: &FormEnvironment<'_>) -> Result<bool> {
        let mut by_name: HashMap<&str, &FieldRecord> = HashMap::new();
        for record in &self.records {
            by_name.entry(record.name.as_str()).or_insert(record);
        }

        let document = form.document();
        let mut ok = true;
        for index in 0..document.page_count()? {
            let page = document.open_page(index)?;
            let _attachment = form.attach_page(&page)?;
            let fields = form.fields_on_page(&page)?;
            for field in &fields {
                let Some(record) = by_name.get(field.name()) else {
                    continue;
                };
                if form.flags(field)?.is_read_only() {
                    debug!("skipping read-only field {:?}", field.name());
                    continue;
                }
                if !restore_field(form, field, record)? {
                    warn!("restore of field {:?} on page {} was rejected", field.name(), index);
                    ok = false;
                }
            }
        }
        Ok(ok)
    }
}

fn restore_field(form: &FormEnvironment<'_>, field: &FieldView<'_>, record: &FieldRecord) -> Result<bool> {
    let mut ok = form.set_value(field, &record.value)?;
    if !field.field_type().is_choice() {
        return Ok(ok);
    }

    // Selections first so single-select boxes drop their old choice, then
    // clear whatever is still selected against the record.
    for option in record.options.iter().filter(|o| o.is_selected) {
        ok &= form.set_option_selected(field, option.index, true)?;
    }
    let live = form.options(field)?;
    for option in record.options.iter().filter(|o| !o.is_selected) {
        let still_selected = live
            .iter()
            .any(|l| l.index == option.index && l.is_selected);
        if still_selected {
            ok &= form.set_option_selected(field, option.index, false)?;
        }
    }
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::OpenOptions;
    use crate::library::Library;
    use crate::memory::{MemoryDocument, MemoryEngine, MemoryField, MemoryPage};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn two_page_document() -> MemoryDocument {
        MemoryDocument::new()
            .with_page(
                MemoryPage::letter()
                    .with_field(MemoryField::text("firstName").required().with_max_length(32))
                    .with_field(MemoryField::checkbox("subscribe").with_default("Off")),
            )
            .with_page(
                MemoryPage::letter()
                    .with_field(MemoryField::combo("country", ["France", "Japan", "Peru"]).select(1))
                    .with_field(MemoryField::text("ref").with_value("R-1").read_only()),
            )
    }

    #[test]
    fn test_capture_reads_every_field_in_page_order() {
        let engine = Arc::new(MemoryEngine::new());
        let bytes = engine.add_document(two_page_document());
        let library = Library::new(engine.clone());
        let doc = library.open_bytes(bytes, &OpenOptions::new()).unwrap();
        let form = FormEnvironment::open(&doc).unwrap();

        let snapshot = FormSnapshot::capture(&form).unwrap();
        assert_eq!(snapshot.form_kind(), FormKind::AcroForm);
        let names: Vec<&str> = snapshot.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["firstName", "subscribe", "country", "ref"]);

        let first = snapshot.record("firstName").unwrap();
        assert!(first.is_required);
        assert_eq!(first.max_length, 32);
        assert!(first.options.is_empty());

        let subscribe = snapshot.record("subscribe").unwrap();
        assert_eq!(subscribe.value, "Off");
        assert_eq!(subscribe.default_value, "Off");

        let country = snapshot.record("country").unwrap();
        assert_eq!(country.value, "Japan");
        assert_eq!(country.options.len(), 3);
        assert!(country.options[1].is_selected);

        assert!(snapshot.record("ref").unwrap().is_read_only);
        assert_eq!(engine.outstanding(), 2);
        assert!(engine.contract_violations().is_empty());
    }

    #[test]
    fn test_timestamp_has_millisecond_precision() {
        let at = Utc.timestamp_nanos(1_700_000_000_123_456_789);
        let snapshot = FormSnapshot::new(FormKind::None, at, Vec::new());
        assert_eq!(snapshot.captured_at().timestamp_millis(), 1_700_000_000_123);
        assert_eq!(snapshot.captured_at().timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn test_restore_writes_matching_fields() {
        let engine = Arc::new(MemoryEngine::new());
        let template = two_page_document();
        let source = engine.add_document(template.clone());
        let target = engine.add_document(template);
        let library = Library::new(engine.clone());

        let snapshot = {
            let doc = library.open_bytes(source, &OpenOptions::new()).unwrap();
            let form = FormEnvironment::open(&doc).unwrap();
            let page = doc.open_page(0).unwrap();
            let name = form.field_by_name(&page, "firstName").unwrap().unwrap();
            assert!(form.set_value(&name, "Ada").unwrap());
            drop(name);
            drop(page);
            let page = doc.open_page(1).unwrap();
            let country = form.field_by_name(&page, "country").unwrap().unwrap();
            assert!(form.set_option_selected(&country, 2, true).unwrap());
            drop(country);
            drop(page);
            FormSnapshot::capture(&form).unwrap()
        };

        let doc = library.open_bytes(target, &OpenOptions::new()).unwrap();
        let form = FormEnvironment::open(&doc).unwrap();
        assert!(snapshot.restore(&form).unwrap());

        let restored = FormSnapshot::capture(&form).unwrap();
        assert_eq!(restored.records(), snapshot.records());
        assert!(engine.contract_violations().is_empty());
    }

    #[test]
    fn test_restore_first_record_wins_and_unmatched_ignored() {
        let engine = Arc::new(MemoryEngine::new());
        let bytes = engine.add_document(
            MemoryDocument::new().with_page(MemoryPage::letter().with_field(MemoryField::text("city"))),
        );
        let library = Library::new(engine.clone());
        let doc = library.open_bytes(bytes, &OpenOptions::new()).unwrap();
        let form = FormEnvironment::open(&doc).unwrap();

        let mut first = FieldRecord::new("city", FieldType::TextField);
        first.value = "Lyon".into();
        let mut second = FieldRecord::new("city", FieldType::TextField);
        second.value = "Osaka".into();
        let stray = FieldRecord::new("zip", FieldType::TextField);
        let snapshot = FormSnapshot::new(FormKind::AcroForm, Utc::now(), vec![first, second, stray]);

        assert!(snapshot.restore(&form).unwrap());
        let page = doc.open_page(0).unwrap();
        let city = form.field_by_name(&page, "city").unwrap().unwrap();
        assert_eq!(form.value(&city).unwrap(), "Lyon");
    }

    #[test]
    fn test_restore_on_closed_form_is_an_error() {
        let engine = Arc::new(MemoryEngine::new());
        let bytes = engine.add_document(two_page_document());
        let library = Library::new(engine);
        let doc = library.open_bytes(bytes, &OpenOptions::new()).unwrap();
        let mut form = FormEnvironment::open(&doc).unwrap();
        let snapshot = FormSnapshot::capture(&form).unwrap();
        form.close();
        assert!(snapshot.restore(&form).is_err());
    }
}
