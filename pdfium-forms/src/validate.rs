//! Snapshot validation. Pure; needs no engine.

use crate::field::FieldType;
use crate::snapshot::FormSnapshot;
use std::fmt;

/// A rule a field value breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// The field is required and its value is empty.
    Required,
    /// The text is longer than the field's maximum length.
    ExceedsMaxLength { max: usize, actual: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("required"),
            Self::ExceedsMaxLength { .. } => f.write_str("exceeds max length"),
        }
    }
}

/// Errors found on one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors {
    pub name: String,
    pub errors: Vec<ValidationError>,
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Per-record errors, in record order. Records without errors are absent.
    pub field_errors: Vec<FieldErrors>,
}

impl ValidationReport {
    /// Errors of the first record named `name`.
    pub fn errors_for(&self, name: &str) -> &[ValidationError] {
        self.field_errors
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.errors.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of errors over all fields.
    pub fn error_count(&self) -> usize {
        self.field_errors.iter().map(|e| e.errors.len()).sum()
    }
}

/// Check required fields and text length limits.
///
/// Length is counted in characters (Unicode scalar values), not bytes.
pub fn validate(snapshot: &FormSnapshot) -> ValidationReport {
    let mut field_errors = Vec::new();
    for record in snapshot.records() {
        let mut errors = Vec::new();
        if record.is_required && record.value.is_empty() {
            errors.push(ValidationError::Required);
        }
        if record.field_type == FieldType::TextField && record.max_length > 0 {
            let max = record.max_length as usize;
            let actual = record.value.chars().count();
            if actual > max {
                errors.push(ValidationError::ExceedsMaxLength { max, actual });
            }
        }
        if !errors.is_empty() {
            field_errors.push(FieldErrors {
                name: record.name.clone(),
                errors,
            });
        }
    }
    ValidationReport {
        is_valid: field_errors.is_empty(),
        field_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormKind;
    use crate::snapshot::FieldRecord;
    use chrono::Utc;

    fn text(name: &str, value: &str, required: bool, max_length: i32) -> FieldRecord {
        let mut record = FieldRecord::new(name, FieldType::TextField);
        record.value = value.to_string();
        record.is_required = required;
        record.max_length = max_length;
        record
    }

    fn snapshot(records: Vec<FieldRecord>) -> FormSnapshot {
        FormSnapshot::new(FormKind::AcroForm, Utc::now(), records)
    }

    #[test]
    fn test_required_empty() {
        let report = validate(&snapshot(vec![text("firstName", "", true, -1)]));
        assert!(!report.is_valid);
        assert_eq!(report.errors_for("firstName"), [ValidationError::Required]);
        assert_eq!(report.errors_for("firstName")[0].to_string(), "required");
    }

    #[test]
    fn test_exceeds_max_length() {
        let report = validate(&snapshot(vec![text("zip", "123456", false, 5)]));
        assert_eq!(
            report.errors_for("zip"),
            [ValidationError::ExceedsMaxLength { max: 5, actual: 6 }]
        );
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.errors_for("zip")[0].to_string(), "exceeds max length");
    }

    #[test]
    fn test_satisfied_constraints() {
        let report = validate(&snapshot(vec![
            text("firstName", "Ada", true, 10),
            text("note", "", false, 0),
        ]));
        assert!(report.is_valid);
        assert_eq!(report.error_count(), 0);
        assert!(report.errors_for("firstName").is_empty());
    }

    #[test]
    fn test_length_counts_characters() {
        let report = validate(&snapshot(vec![text("city", "Zürich", false, 6)]));
        assert!(report.is_valid);
    }

    #[test]
    fn test_length_rule_skips_choice_fields_and_keeps_record_order() {
        let mut combo = FieldRecord::new("country", FieldType::ComboBox);
        combo.is_required = true;
        combo.max_length = 1;
        combo.value = "Peru".into();
        let report = validate(&snapshot(vec![text("b", "", true, -1), text("a", "xy", false, 1), combo]));
        let names: Vec<&str> = report.field_errors.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(report.error_count(), 2);
    }
}
