//! # Standard Errors
//!
//! A registry of structured, namespaced error definitions. Callers describe
//! error kinds declaratively (identifier, domain, title, message template,
//! positional properties) and the registry turns each accepted description
//! into an [`ErrorType`] whose instances carry rendered messages and
//! structured payloads.
//!
//! ## Design Philosophy
//!
//! 1. **Definitions are data**: they validate, serialise and batch-load like data
//! 2. **Validation is exhaustive**: every defect is reported, never just the first
//! 3. **Types are identities**: a definition registered twice into the same
//!    non-default namespace yields the same type, not a look-alike
//! 4. **Batches never roll back**: good entries land even when neighbours fail
//! 5. **Collisions are advised, not hidden**: redeclarations go to a pluggable sink
//!
//! ## Lookup Model
//!
//! Every accepted definition is reachable through its namespace table. Unless
//! marked `namespace_only` it is also reachable by bare name through the flat
//! table, as long as no other namespace claimed that name first. The
//! `Default` namespace is strict: a name may exist in it once.
//!
//! ## Quick Start
//!
//! ```rust
//! use standard_errors::{ErrorDefinition, Registry};
//! use serde_json::json;
//!
//! let mut registry = Registry::new();
//!
//! let not_found = registry.get("http_404").unwrap();
//! assert_eq!(not_found.title(), Some("Not Found"));
//!
//! let quota = registry.register(
//!     ErrorDefinition::new("QuotaExceeded", "Quota of ``limit`` requests exceeded")
//!         .domain("billing")
//!         .title("Quota Exceeded")
//!         .properties(["limit"]),
//! )?;
//!
//! let err = quota.instantiate([json!(1000)]);
//! assert_eq!(err.to_string(), "QuotaExceeded: Quota of 1000 requests exceeded");
//! # Ok::<(), standard_errors::RaisedError>(())
//! ```
//!
//! ## Batch Loading
//!
//! ```rust
//! use standard_errors::Registry;
//!
//! let mut registry = Registry::new();
//! let report = registry.expand_json(r#"[
//!     { "code": 704, "domain": "application", "title": "Test", "message": "This is a test" },
//!     { "code": 705, "domain": "application", "message": "No title" }
//! ]"#).unwrap();
//!
//! assert!(!report.passed());
//! assert!(report.get("704").unwrap().passed());
//! assert_eq!(report.get("705").unwrap().title(), Some("Missing Title"));
//! assert!(registry.get("704").is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde_json::{Map, Value};
use std::backtrace::Backtrace;
use std::fmt;
use std::result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use zeroize::Zeroize;

pub mod advisory;
pub mod catalog;
pub mod convenience;
pub mod definition;
pub mod factory;
pub mod global;
pub mod namespace;
pub mod registry;
pub mod ring_buffer;
pub mod validation;

pub use advisory::{Advisory, AdvisoryKind, AdvisorySink, NullSink, TracingSink};
pub use catalog::{CatalogDocument, CatalogError};
pub use definition::{ErrorDefinition, ExtraProps, Fields, LogLevel};
pub use factory::{BASE_ERROR_NAME, ErrorType};
pub use namespace::Namespace;
pub use registry::{Registry, RegistryBuilder};
pub use ring_buffer::{AdvisoryEntry, RingBufferSink};
pub use validation::{Defect, Diagnosis, VerificationReport};

#[doc(hidden)]
pub use serde_json as __serde_json;

/// Type alias for Results using our error type.
pub type Result<T> = result::Result<T, RaisedError>;

/// An instance of a registered error type.
///
/// Carries the rendered message, the positional and extra properties merged
/// at construction, an optional free-form `info` payload, and the namespace
/// when it is not the default. Property values and `info` are wiped on drop.
#[must_use = "errors should be handled or logged"]
pub struct RaisedError {
    kind: ErrorType,
    message: String,
    fields: Fields,
    info: Option<Value>,
    created_at: Instant,
    backtrace: Arc<Backtrace>,
}

impl RaisedError {
    pub(crate) fn new(kind: ErrorType, message: String, fields: Fields, info: Option<Value>) -> Self {
        Self {
            kind,
            message,
            fields,
            info,
            created_at: Instant::now(),
            backtrace: Arc::new(Backtrace::capture()),
        }
    }

    /// Name of the error type.
    #[inline]
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Namespace, present only when the type is not in the default namespace.
    #[inline]
    pub fn namespace(&self) -> Option<&Namespace> {
        Some(self.kind.namespace()).filter(|ns| !ns.is_default())
    }

    /// Rendered message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Free-form payload supplied as the trailing surplus argument.
    #[inline]
    pub fn info(&self) -> Option<&Value> {
        self.info.as_ref()
    }

    /// A merged property (positional or extra).
    #[inline]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// All merged properties in assignment order.
    #[inline]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// The type this error was instantiated from.
    #[inline]
    pub fn kind(&self) -> &ErrorType {
        &self.kind
    }

    /// Domain of the error type.
    #[inline]
    pub fn domain(&self) -> Option<&str> {
        self.kind.domain()
    }

    /// Title of the error type.
    #[inline]
    pub fn title(&self) -> Option<&str> {
        self.kind.title()
    }

    /// Check the instance relation.
    ///
    /// Every raised error is an instance of its own type and of the shared
    /// base type.
    #[inline]
    pub fn is_instance_of(&self, ty: &ErrorType) -> bool {
        self.kind == *ty || ty.is_base()
    }

    /// Backtrace captured at construction (empty unless `RUST_BACKTRACE` is set).
    #[inline]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Get how long ago this error was created.
    #[inline]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Structured form: name, namespace, message, info, then merged fields.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("name".to_owned(), Value::from(self.name()));
        if let Some(ns) = self.namespace() {
            map.insert("namespace".to_owned(), Value::from(ns.as_str()));
        }
        map.insert("message".to_owned(), Value::from(self.message.as_str()));
        if let Some(info) = &self.info {
            map.insert("info".to_owned(), info.clone());
        }
        for (key, value) in &self.fields {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(map)
    }
}

/// Wipe string payloads inside a JSON value.
fn wipe(value: &mut Value) {
    match value {
        Value::String(s) => s.zeroize(),
        Value::Array(items) => items.iter_mut().for_each(wipe),
        Value::Object(map) => map.values_mut().for_each(wipe),
        _ => {}
    }
}

impl Drop for RaisedError {
    #[inline(never)]
    fn drop(&mut self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.message.zeroize();
            self.fields.values_mut().for_each(wipe);
            if let Some(info) = self.info.as_mut() {
                wipe(info);
            }
        }));
    }
}

impl Clone for RaisedError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            message: self.message.clone(),
            fields: self.fields.clone(),
            info: self.info.clone(),
            created_at: self.created_at,
            backtrace: Arc::clone(&self.backtrace),
        }
    }
}

/// Structural equality: same type, message, fields and info.
impl PartialEq for RaisedError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.message == other.message
            && self.fields == other.fields
            && self.info == other.info
    }
}

impl fmt::Debug for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaisedError")
            .field("name", &self.name())
            .field("namespace", &self.namespace())
            .field("message", &self.message)
            .field("fields", &self.fields)
            .field("info", &self.info)
            .field("age", &self.created_at.elapsed())
            .finish()
    }
}

impl fmt::Display for RaisedError {
    /// Format: `"{name}: {message}"`, or `"{namespace}::{name}: {message}"`
    /// outside the default namespace.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RaisedError {}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use serde_json::json;
    use std::thread;

    fn sample() -> ErrorType {
        let mut registry = Registry::builder().with_http_catalog(false).build();
        registry
            .register(
                ErrorDefinition::new("Sample", "Sample ``who``")
                    .domain("test")
                    .title("Sample")
                    .properties(["who"])
                    .namespace("unit"),
            )
            .unwrap()
    }

    #[test]
    fn display_includes_namespace_outside_default() {
        let err = sample().instantiate([json!("bob")]);
        assert_eq!(err.to_string(), "unit::Sample: Sample bob");
        assert_eq!(err.namespace().map(Namespace::as_str), Some("unit"));
    }

    #[test]
    fn default_namespace_is_not_attached() {
        let registry = Registry::new();
        let err = registry.instantiate("http_404", Vec::new()).unwrap();
        assert!(err.namespace().is_none());
        assert_eq!(err.to_string(), "http_404: The requested resource could not be found");
    }

    #[test]
    fn instance_of_own_type_and_base() {
        let ty = sample();
        let err = ty.instantiate([json!("x")]);
        assert!(err.is_instance_of(&ty));
        assert!(err.is_instance_of(&ErrorType::base()));
        assert!(!err.is_instance_of(&sample()));
    }

    #[test]
    fn structural_equality_and_clone() {
        let ty = sample();
        let a = ty.instantiate([json!("x"), json!({"k": 1})]);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, ty.instantiate([json!("y")]));
    }

    #[test]
    fn value_form_lists_core_attributes_first() {
        let err = sample().instantiate([json!("x"), json!("ctx")]);
        assert_eq!(
            err.to_value(),
            json!({
                "name": "Sample",
                "namespace": "unit",
                "message": "Sample x",
                "info": "ctx",
                "who": "x"
            })
        );
    }

    #[test]
    fn error_age_increases() {
        let err = sample().instantiate(Vec::new());
        let age1 = err.age();
        thread::sleep(Duration::from_millis(10));
        let age2 = err.age();
        assert!(age2 > age1);
    }

    #[test]
    fn wipe_clears_nested_strings() {
        let mut value = json!({"a": ["secret", {"b": "token"}], "n": 3});
        wipe(&mut value);
        assert_eq!(value, json!({"a": ["", {"b": ""}], "n": 3}));
    }
}
