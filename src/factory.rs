//! Error types and the per-instance construction algorithm.
//!
//! Every accepted definition becomes one [`ErrorType`]: an immutable,
//! reference-counted descriptor closing over the definition's name,
//! namespace, message template, property order and extra-properties table.
//! Type identity is descriptor identity: two `ErrorType` handles are equal
//! only when they point at the same descriptor, however similar their
//! definitions look.
//!
//! # Construction Order
//!
//! Instantiation is a pure function of (definition, arguments) but it reads
//! and writes instance attributes as it goes, so the order is fixed:
//!
//! 1. Surplus argument (more arguments than properties) becomes `info`
//! 2. Properties assigned positionally; conditional extras merged after each
//! 3. Wildcard extras merged (wins on conflict)
//! 4. Message template rendered against the attributes assigned so far
//! 5. Namespace attached when not the default
//!
//! # Example
//!
//! ```rust
//! use standard_errors::{ErrorDefinition, ExtraProps, Registry};
//! use serde_json::json;
//!
//! let mut registry = Registry::builder().with_http_catalog(false).build();
//! let ty = registry.register(
//!     ErrorDefinition::new("Test", "Testing ``prop`` (``extraProp``)")
//!         .domain("application")
//!         .title("Test")
//!         .properties(["prop"])
//!         .extra_props(ExtraProps::new().when(
//!             "prop",
//!             "testProp",
//!             [("extraProp", json!("testExtraProp"))],
//!         )),
//! )?;
//!
//! let err = ty.instantiate([json!("testProp")]);
//! assert_eq!(err.message(), "Testing testProp (testExtraProp)");
//! # Ok::<(), standard_errors::RaisedError>(())
//! ```

use crate::{ErrorDefinition, ExtraProps, Fields, Namespace, RaisedError};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// Delimiter around property references in message templates.
pub const TEMPLATE_MARKER: &str = "``";

/// Name of the reserved base error type.
pub const BASE_ERROR_NAME: &str = "StandardError";

struct TypeDescriptor {
    name: String,
    definition: ErrorDefinition,
}

/// A registered error kind; instantiate it to get a [`RaisedError`].
///
/// Cloning is a refcount increment. Equality and hashing are by identity.
#[derive(Clone)]
pub struct ErrorType(Arc<TypeDescriptor>);

impl ErrorType {
    /// Build a type from an already-validated definition.
    pub(crate) fn from_definition(definition: ErrorDefinition) -> Self {
        let name = definition.name().unwrap_or_default().to_owned();
        Self(Arc::new(TypeDescriptor { name, definition }))
    }

    /// The shared base type every raised error is an instance of.
    pub fn base() -> Self {
        static BASE: OnceLock<ErrorType> = OnceLock::new();
        BASE.get_or_init(|| {
            Self::from_definition(
                ErrorDefinition::new(BASE_ERROR_NAME, "An unexpected error occurred")
                    .domain("standard")
                    .title("Standard Error"),
            )
        })
        .clone()
    }

    /// Type name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Namespace the type was registered under.
    #[inline]
    pub fn namespace(&self) -> &Namespace {
        &self.0.definition.namespace
    }

    /// Grouping tag.
    #[inline]
    pub fn domain(&self) -> Option<&str> {
        self.0.definition.domain_str()
    }

    /// Human-readable title.
    #[inline]
    pub fn title(&self) -> Option<&str> {
        self.0.definition.title_str()
    }

    /// Unrendered message template.
    #[inline]
    pub fn template(&self) -> &str {
        self.0.definition.message_str().unwrap_or_default()
    }

    /// Declared properties in positional order.
    #[inline]
    pub fn properties(&self) -> &[String] {
        &self.0.definition.properties
    }

    /// Extra-properties table.
    #[inline]
    pub fn extra_props(&self) -> &ExtraProps {
        &self.0.definition.extra_props
    }

    /// The definition this type was built from.
    #[inline]
    pub fn definition(&self) -> &ErrorDefinition {
        &self.0.definition
    }

    /// Check whether this is the reserved base type.
    #[inline]
    pub fn is_base(&self) -> bool {
        *self == Self::base()
    }

    /// Build an instance from positional arguments.
    ///
    /// Arguments beyond the declared properties are not assigned; the last
    /// of them becomes the free-form `info` payload. Properties without a
    /// matching argument are left unset.
    pub fn instantiate<I>(&self, args: I) -> RaisedError
    where
        I: IntoIterator<Item = Value>,
    {
        let mut args: Vec<Value> = args.into_iter().collect();
        let properties = self.properties();
        let info = if args.len() > properties.len() {
            args.pop()
        } else {
            None
        };

        let extra_props = self.extra_props();
        let mut fields = Fields::with_capacity(properties.len());
        for (property, value) in properties.iter().zip(args) {
            let extras = extra_props.lookup(property, &display_value(&value));
            fields.insert(property.clone(), value);
            if let Some(extras) = extras {
                merge(&mut fields, extras);
            }
        }
        merge(&mut fields, extra_props.wildcard());

        let message = render_message(self.template(), |token| {
            attribute(&fields, self.name(), info.as_ref(), token)
        });

        tracing::trace!(name = self.name(), namespace = %self.namespace(), "instantiated error");
        RaisedError::new(self.clone(), message, fields, info)
    }

    /// Instantiate and return as `Err`, for `?`-style propagation.
    #[inline]
    pub fn raise<T, I>(&self, args: I) -> crate::Result<T>
    where
        I: IntoIterator<Item = Value>,
    {
        Err(self.instantiate(args))
    }
}

impl PartialEq for ErrorType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ErrorType {}

impl Hash for ErrorType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorType")
            .field("name", &self.name())
            .field("namespace", self.namespace())
            .field("properties", &self.properties())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace().is_default() {
            f.write_str(self.name())
        } else {
            write!(f, "{}::{}", self.namespace(), self.name())
        }
    }
}

/// Later writes win; no protection for earlier fields.
#[inline]
fn merge(fields: &mut Fields, extras: &Fields) {
    for (key, value) in extras {
        fields.insert(key.clone(), value.clone());
    }
}

/// Attribute lookup used while rendering: merged fields, then `name`, then `info`.
fn attribute<'a>(
    fields: &'a Fields,
    name: &'a str,
    info: Option<&'a Value>,
    token: &str,
) -> Option<Cow<'a, str>> {
    if let Some(value) = fields.get(token) {
        return Some(display_value(value));
    }
    match (token, info) {
        ("name", _) => Some(Cow::Borrowed(name)),
        ("info", Some(info)) => Some(display_value(info)),
        _ => None,
    }
}

/// String form of a value: strings verbatim, everything else as JSON text.
pub fn display_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Render a message template.
///
/// The template is split on [`TEMPLATE_MARKER`]; each token that `lookup`
/// resolves is replaced by its value, every other token is kept verbatim.
///
/// ```rust
/// use standard_errors::factory::render_message;
/// use std::borrow::Cow;
///
/// let out = render_message("Hello ``who``!", |token| {
///     (token == "who").then(|| Cow::Borrowed("world"))
/// });
/// assert_eq!(out, "Hello world!");
/// ```
pub fn render_message<'v, F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<Cow<'v, str>>,
{
    let mut out = String::with_capacity(template.len());
    for token in template.split(TEMPLATE_MARKER) {
        match lookup(token) {
            Some(value) => out.push_str(&value),
            None => out.push_str(token),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ty(definition: ErrorDefinition) -> ErrorType {
        ErrorType::from_definition(definition.domain("test").title("Test"))
    }

    #[test]
    fn renders_properties_and_conditional_extras() {
        let t = ty(ErrorDefinition::new("Test", "Testing ``prop`` (``extraProp``)")
            .properties(["prop"])
            .extra_props(ExtraProps::new().when(
                "prop",
                "testProp",
                [("extraProp", json!("testExtraProp"))],
            )));

        let err = t.instantiate([json!("testProp")]);
        assert_eq!(err.message(), "Testing testProp (testExtraProp)");
        assert_eq!(err.get("extraProp"), Some(&json!("testExtraProp")));
        assert!(err.info().is_none());
    }

    #[test]
    fn unmatched_value_skips_conditional_extras() {
        let t = ty(ErrorDefinition::new("Test", "``prop`` ``extraProp``")
            .properties(["prop"])
            .extra_props(ExtraProps::new().when("prop", "a", [("extraProp", json!(1))])));

        let err = t.instantiate([json!("b")]);
        assert_eq!(err.message(), "b extraProp");
        assert!(err.get("extraProp").is_none());
    }

    #[test]
    fn numeric_values_key_extras_by_their_text() {
        let t = ty(ErrorDefinition::new("HttpError", "``statusCode`` ``title``")
            .properties(["statusCode"])
            .extra_props(ExtraProps::new().when("statusCode", "404", [("title", json!("Not Found"))])));

        let err = t.instantiate([json!(404)]);
        assert_eq!(err.message(), "404 Not Found");
    }

    #[test]
    fn surplus_argument_becomes_info() {
        let t = ty(ErrorDefinition::new("Test", "``a``").properties(["a"]));

        let err = t.instantiate([json!("x"), json!({"user": "bob"})]);
        assert_eq!(err.get("a"), Some(&json!("x")));
        assert_eq!(err.info(), Some(&json!({"user": "bob"})));

        let err = t.instantiate([json!("x")]);
        assert!(err.info().is_none());
    }

    #[test]
    fn only_last_surplus_argument_is_kept() {
        let t = ty(ErrorDefinition::new("Test", "m").properties(["a"]));
        let err = t.instantiate([json!(1), json!(2), json!(3)]);
        assert_eq!(err.get("a"), Some(&json!(1)));
        assert_eq!(err.info(), Some(&json!(3)));
        assert_eq!(err.fields().len(), 1);
    }

    #[test]
    fn missing_arguments_leave_properties_unset() {
        let t = ty(ErrorDefinition::new("Test", "``a``/``b``").properties(["a", "b"]));
        let err = t.instantiate([json!("x")]);
        assert_eq!(err.message(), "x/b");
        assert!(err.get("b").is_none());
        assert!(err.info().is_none());
    }

    #[test]
    fn later_extras_overwrite_earlier_fields() {
        let t = ty(ErrorDefinition::new("Test", "``level``")
            .properties(["a", "b"])
            .extra_props(
                ExtraProps::new()
                    .when("a", "1", [("level", json!("from-a"))])
                    .when("b", "2", [("level", json!("from-b"))]),
            ));
        let err = t.instantiate([json!(1), json!(2)]);
        assert_eq!(err.message(), "from-b");
    }

    #[test]
    fn wildcard_wins_on_conflict() {
        let t = ty(ErrorDefinition::new("Test", "``level``")
            .properties(["a"])
            .extra_props(
                ExtraProps::new()
                    .when("a", "1", [("level", json!("conditional"))])
                    .always([("level", json!("wildcard"))]),
            ));
        let err = t.instantiate([json!(1)]);
        assert_eq!(err.message(), "wildcard");
    }

    #[test]
    fn name_and_info_are_renderable() {
        let t = ty(ErrorDefinition::new("Named", "``name``: ``info``"));
        assert_eq!(t.instantiate([json!("ctx")]).message(), "Named: ctx");
        assert_eq!(t.instantiate(Vec::new()).message(), "Named: info");
    }

    #[test]
    fn identity_is_per_descriptor() {
        let a = ty(ErrorDefinition::new("Same", "m"));
        let b = ty(ErrorDefinition::new("Same", "m"));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(ErrorType::base().is_base());
        assert!(!a.is_base());
    }

    #[test]
    fn template_without_markers_matches_whole_token() {
        let t = ty(ErrorDefinition::new("Test", "a").properties(["a"]));
        assert_eq!(t.instantiate([json!("swapped")]).message(), "swapped");
    }

    #[test]
    fn display_value_forms() {
        assert_eq!(display_value(&json!("s")), "s");
        assert_eq!(display_value(&json!(12)), "12");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&Value::Null), "null");
    }
}
