//! Admission rules for error definitions.
//!
//! Validation never fails fast: every rule is checked independently and all
//! defects are reported together in a [`Diagnosis`]. A diagnosis holds at
//! most one defect per field.
//!
//! # Rules
//!
//! | Field     | Defect                    | Fires when                                   |
//! |-----------|---------------------------|----------------------------------------------|
//! | `code`    | `Missing Code`            | no identifier                                |
//! | `code`    | `Code does not match key` | keyed submission, key differs from identifier|
//! | `code`    | `Code already in use`     | identifier collides with a registered entry  |
//! | `domain`  | `Missing Domain`          | domain absent or empty                       |
//! | `title`   | `Missing Title`           | title absent or empty                        |
//! | `message` | `Missing Message`         | message absent or empty                      |
//!
//! The three `code` rules are evaluated in the order listed; the first that
//! fires wins. An absent identifier cannot collide.
//!
//! # Example
//!
//! ```rust
//! use standard_errors::{validation, ErrorDefinition};
//!
//! let def = ErrorDefinition::new("600", "This is a test").domain("application");
//! let diagnosis = validation::validate(&def, |_| false);
//!
//! assert!(!diagnosis.passed());
//! assert_eq!(diagnosis.title(), Some("Missing Title"));
//! assert_eq!(diagnosis.code(), None);
//! ```

use crate::ErrorDefinition;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::fmt;

/// A single violated admission rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Defect {
    /// No identifier.
    MissingCode,
    /// Keyed submission whose key differs from the identifier.
    CodeMismatch,
    /// Identifier already registered.
    CodeInUse,
    /// No domain.
    MissingDomain,
    /// No title.
    MissingTitle,
    /// No message template.
    MissingMessage,
}

impl Defect {
    /// Definition field the defect is reported under.
    #[inline]
    pub const fn field(self) -> &'static str {
        match self {
            Self::MissingCode | Self::CodeMismatch | Self::CodeInUse => "code",
            Self::MissingDomain => "domain",
            Self::MissingTitle => "title",
            Self::MissingMessage => "message",
        }
    }

    /// Human-readable defect text.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingCode => "Missing Code",
            Self::CodeMismatch => "Code does not match key",
            Self::CodeInUse => "Code already in use",
            Self::MissingDomain => "Missing Domain",
            Self::MissingTitle => "Missing Title",
            Self::MissingMessage => "Missing Message",
        }
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured pass/fail report for one definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnosis {
    defects: SmallVec<[Defect; 4]>,
}

impl Diagnosis {
    /// A diagnosis with no defects.
    #[inline]
    pub fn clean() -> Self {
        Self::default()
    }

    /// True iff no rule fired.
    #[inline]
    pub fn passed(&self) -> bool {
        self.defects.is_empty()
    }

    /// Every defect, in field order (code, domain, title, message).
    #[inline]
    pub fn defects(&self) -> &[Defect] {
        &self.defects
    }

    /// Defect text reported under `field`, if any.
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.defects
            .iter()
            .find(|d| d.field() == field)
            .map(|d| d.as_str())
    }

    /// Defect text for the identifier field.
    #[inline]
    pub fn code(&self) -> Option<&'static str> {
        self.get("code")
    }

    /// Defect text for the domain field.
    #[inline]
    pub fn domain(&self) -> Option<&'static str> {
        self.get("domain")
    }

    /// Defect text for the title field.
    #[inline]
    pub fn title(&self) -> Option<&'static str> {
        self.get("title")
    }

    /// Defect text for the message field.
    #[inline]
    pub fn message(&self) -> Option<&'static str> {
        self.get("message")
    }

    /// Check whether a specific defect fired.
    #[inline]
    pub fn has(&self, defect: Defect) -> bool {
        self.defects.contains(&defect)
    }

    /// Record a defect, replacing any earlier one on the same field.
    pub(crate) fn push(&mut self, defect: Defect) {
        if let Some(slot) = self.defects.iter_mut().find(|d| d.field() == defect.field()) {
            *slot = defect;
        } else {
            self.defects.push(defect);
        }
    }

    /// JSON shape: `{"passed": bool, "<field>": "<defect>", ...}`.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("passed".to_owned(), Value::Bool(self.passed()));
        for defect in &self.defects {
            map.insert(defect.field().to_owned(), Value::from(defect.as_str()));
        }
        Value::Object(map)
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            return f.write_str("passed");
        }
        for (i, defect) in self.defects.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", defect.field(), defect)?;
        }
        Ok(())
    }
}

/// Check a definition against every admission rule.
///
/// `in_use` decides whether an identifier collides with a registered entry;
/// it is only consulted when the identifier is present.
pub fn validate(definition: &ErrorDefinition, in_use: impl FnOnce(&str) -> bool) -> Diagnosis {
    let mut diagnosis = Diagnosis::clean();
    match definition.name() {
        None => diagnosis.push(Defect::MissingCode),
        Some(name) if in_use(name) => diagnosis.push(Defect::CodeInUse),
        Some(_) => {}
    }
    check_descriptive_fields(definition, &mut diagnosis);
    diagnosis
}

/// Check a definition submitted under an explicit key.
///
/// A present identifier that differs from `key` is reported as a mismatch
/// and is not checked for collision.
pub fn validate_keyed(
    key: &str,
    definition: &ErrorDefinition,
    in_use: impl FnOnce(&str) -> bool,
) -> Diagnosis {
    let mut diagnosis = Diagnosis::clean();
    match definition.name() {
        None => diagnosis.push(Defect::MissingCode),
        Some(name) if name != key => diagnosis.push(Defect::CodeMismatch),
        Some(name) if in_use(name) => diagnosis.push(Defect::CodeInUse),
        Some(_) => {}
    }
    check_descriptive_fields(definition, &mut diagnosis);
    diagnosis
}

fn check_descriptive_fields(definition: &ErrorDefinition, diagnosis: &mut Diagnosis) {
    if definition.domain_str().is_none() {
        diagnosis.push(Defect::MissingDomain);
    }
    if definition.title_str().is_none() {
        diagnosis.push(Defect::MissingTitle);
    }
    if definition.message_str().is_none() {
        diagnosis.push(Defect::MissingMessage);
    }
}

/// Per-entry diagnoses for a batch submission plus the aggregate verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    entries: Vec<(String, Diagnosis)>,
}

impl VerificationReport {
    /// Create an empty report (vacuously passed).
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, key: impl Into<String>, diagnosis: Diagnosis) {
        self.entries.push((key.into(), diagnosis));
    }

    /// Logical AND of every entry's verdict.
    pub fn passed(&self) -> bool {
        self.entries.iter().all(|(_, d)| d.passed())
    }

    /// Diagnosis for `key`; the latest one if the key was submitted twice.
    pub fn get(&self, key: &str) -> Option<&Diagnosis> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, d)| d)
    }

    /// Entries in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Diagnosis)> {
        self.entries.iter().map(|(k, d)| (k.as_str(), d))
    }

    /// Entries that failed, in submission order.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Diagnosis)> {
        self.iter().filter(|(_, d)| !d.passed())
    }

    /// Number of submitted entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether nothing was submitted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold another report's entries into this one.
    pub fn merge(&mut self, other: VerificationReport) {
        self.entries.extend(other.entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(
        code: Option<&str>,
        domain: Option<&str>,
        title: Option<&str>,
        message: Option<&str>,
    ) -> ErrorDefinition {
        ErrorDefinition {
            name: code.map(str::to_owned),
            domain: domain.map(str::to_owned),
            title: title.map(str::to_owned),
            message: message.map(str::to_owned),
            ..ErrorDefinition::default()
        }
    }

    #[test]
    fn complete_free_definition_passes() {
        let d = validate(
            &def(Some("600"), Some("application"), Some("Test 1"), Some("This is a test")),
            |_| false,
        );
        assert!(d.passed());
        assert!(d.defects().is_empty());
        assert_eq!(d.to_string(), "passed");
    }

    #[test]
    fn each_missing_field_reports_its_own_defect() {
        let cases = [
            (def(None, Some("a"), Some("t"), Some("m")), "code", "Missing Code"),
            (def(Some("602"), None, Some("t"), Some("m")), "domain", "Missing Domain"),
            (def(Some("603"), Some("a"), None, Some("m")), "title", "Missing Title"),
            (def(Some("604"), Some("a"), Some("t"), None), "message", "Missing Message"),
        ];

        for (definition, field, text) in cases {
            let d = validate(&definition, |_| false);
            assert!(!d.passed());
            assert_eq!(d.defects().len(), 1, "{field}");
            assert_eq!(d.get(field), Some(text));
        }
    }

    #[test]
    fn all_defects_reported_together() {
        let d = validate(&def(Some("600"), None, None, None), |_| true);
        assert!(!d.passed());
        assert_eq!(d.code(), Some("Code already in use"));
        assert_eq!(d.domain(), Some("Missing Domain"));
        assert_eq!(d.title(), Some("Missing Title"));
        assert_eq!(d.message(), Some("Missing Message"));
    }

    #[test]
    fn in_use_and_missing_message_combine() {
        let d = validate(&def(Some("600"), Some("application"), Some("Test 7"), None), |_| true);
        assert_eq!(d.defects(), &[Defect::CodeInUse, Defect::MissingMessage]);
    }

    #[test]
    fn missing_code_cannot_collide() {
        let mut consulted = false;
        let d = validate(&def(None, Some("a"), Some("t"), Some("m")), |_| {
            consulted = true;
            true
        });
        assert!(!consulted);
        assert_eq!(d.code(), Some("Missing Code"));
    }

    #[test]
    fn keyed_mismatch_supersedes_collision() {
        let d = validate_keyed("700", &def(Some("701"), Some("a"), Some("t"), Some("m")), |_| true);
        assert_eq!(d.code(), Some("Code does not match key"));

        let d = validate_keyed("700", &def(None, Some("a"), Some("t"), Some("m")), |_| true);
        assert_eq!(d.code(), Some("Missing Code"));

        let d = validate_keyed("700", &def(Some("700"), Some("a"), Some("t"), Some("m")), |_| true);
        assert_eq!(d.code(), Some("Code already in use"));
    }

    #[test]
    fn push_keeps_one_defect_per_field() {
        let mut d = Diagnosis::clean();
        d.push(Defect::MissingCode);
        d.push(Defect::CodeInUse);
        assert_eq!(d.defects(), &[Defect::CodeInUse]);
    }

    #[test]
    fn diagnosis_json_shape() {
        let d = validate(&def(Some("1"), None, Some("t"), Some("m")), |_| false);
        assert_eq!(
            d.to_value(),
            serde_json::json!({"passed": false, "domain": "Missing Domain"})
        );
    }

    #[test]
    fn report_aggregates_and_keeps_latest_duplicate() {
        let mut report = VerificationReport::new();
        assert!(report.passed());

        report.record("600", Diagnosis::clean());
        let mut failed = Diagnosis::clean();
        failed.push(Defect::CodeInUse);
        report.record("600", failed);

        assert!(!report.passed());
        assert_eq!(report.len(), 2);
        assert_eq!(report.get("600").and_then(Diagnosis::code), Some("Code already in use"));
        assert_eq!(report.failures().count(), 1);
    }
}
