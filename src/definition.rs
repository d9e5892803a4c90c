//! Error definitions - the caller-supplied description of an error kind.
//!
//! A definition names an error (`name`, called `code` in catalogue data),
//! groups it (`domain`), describes it (`title`, `message` template) and
//! declares the payload an instance carries (`properties`, `extraProps`).
//!
//! # Wire Format
//!
//! Definitions deserialise from the same camelCase JSON shape catalogues are
//! written in:
//!
//! ```rust
//! use standard_errors::ErrorDefinition;
//!
//! let def: ErrorDefinition = serde_json::from_str(r#"{
//!     "code": 600,
//!     "domain": "application",
//!     "title": "Quota",
//!     "message": "Quota ``quota`` exceeded",
//!     "properties": ["quota"],
//!     "extraProps": { "*": { "retryable": false } },
//!     "namespace": "billing",
//!     "logLevel": "info"
//! }"#).unwrap();
//!
//! assert_eq!(def.name(), Some("600"));
//! assert!(def.suppresses_advisories());
//! ```
//!
//! Numeric codes are stringified; every registry key is a string.

use crate::Namespace;
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Attribute map merged onto an instance.
pub type Fields = IndexMap<String, Value>;

/// Key of the unconditional entry in an `extraProps` table.
pub const WILDCARD: &str = "*";

/// Advisory verbosity for a definition.
///
/// Only `Info` changes behaviour: it silences collision advisories for the
/// definition carrying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose diagnostics.
    Debug,
    /// Collision advisories are suppressed.
    Info,
    /// Default behaviour.
    Warn,
    /// Default behaviour.
    Error,
}

/// Conditional and unconditional extra properties.
///
/// `by_property[prop][value]` is merged onto an instance when declared
/// property `prop` was assigned a value whose string form is `value`.
/// The wildcard table is merged onto every instance, after all conditional
/// merges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexMap<String, Value>", into = "IndexMap<String, Value>")]
pub struct ExtraProps {
    by_property: IndexMap<String, IndexMap<String, Fields>>,
    wildcard: Fields,
}

impl ExtraProps {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `fields` when `property` is assigned a value rendering as `value`.
    pub fn when<I, K>(
        mut self,
        property: impl Into<String>,
        value: impl Into<String>,
        fields: I,
    ) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let entry = self
            .by_property
            .entry(property.into())
            .or_default()
            .entry(value.into())
            .or_default();
        entry.extend(fields.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Merge `fields` onto every instance.
    pub fn always<I, K>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.wildcard
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Fields to merge for `property` holding a value rendering as `value`.
    #[inline]
    pub fn lookup(&self, property: &str, value: &str) -> Option<&Fields> {
        self.by_property.get(property)?.get(value)
    }

    /// Unconditional fields.
    #[inline]
    pub fn wildcard(&self) -> &Fields {
        &self.wildcard
    }

    /// Check whether the table holds nothing at all.
    pub fn is_empty(&self) -> bool {
        self.by_property.is_empty() && self.wildcard.is_empty()
    }
}

impl TryFrom<IndexMap<String, Value>> for ExtraProps {
    type Error = String;

    fn try_from(raw: IndexMap<String, Value>) -> Result<Self, Self::Error> {
        let mut table = Self::default();
        for (key, value) in raw {
            let Value::Object(entries) = value else {
                return Err(format!("extraProps entry '{key}' must be an object"));
            };

            if key == WILDCARD {
                table.wildcard.extend(entries);
                continue;
            }

            let per_value = table.by_property.entry(key.clone()).or_default();
            for (value_key, fields) in entries {
                let Value::Object(fields) = fields else {
                    return Err(format!(
                        "extraProps entry '{key}.{value_key}' must be an object"
                    ));
                };
                per_value.insert(value_key, fields.into_iter().collect());
            }
        }
        Ok(table)
    }
}

impl From<ExtraProps> for IndexMap<String, Value> {
    fn from(table: ExtraProps) -> Self {
        let mut raw: IndexMap<String, Value> = table
            .by_property
            .into_iter()
            .map(|(property, per_value)| {
                let per_value = per_value
                    .into_iter()
                    .map(|(value, fields)| (value, Value::Object(fields.into_iter().collect())))
                    .collect();
                (property, Value::Object(per_value))
            })
            .collect();
        if !table.wildcard.is_empty() {
            raw.insert(
                WILDCARD.to_owned(),
                Value::Object(table.wildcard.into_iter().collect()),
            );
        }
        raw
    }
}

/// Description of one error kind, as submitted for registration.
///
/// All textual fields are optional at this level: completeness is the
/// validator's call, not the parser's.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDefinition {
    /// Stable identifier (`code` in catalogue data).
    #[serde(
        default,
        alias = "code",
        deserialize_with = "deserialize_identifier",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    /// Grouping tag used for filtered listing and removal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Short human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Message template; property names fenced by double backticks are substituted per instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Declared positional properties, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<String>,
    /// Conditional and wildcard extra properties.
    #[serde(default, skip_serializing_if = "ExtraProps::is_empty")]
    pub extra_props: ExtraProps,
    /// Isolation scope.
    #[serde(default)]
    pub namespace: Namespace,
    /// Keep the entry out of the flat view.
    #[serde(default, skip_serializing_if = "is_false")]
    pub namespace_only: bool,
    /// Advisory verbosity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

#[inline]
fn is_false(value: &bool) -> bool {
    !*value
}

fn deserialize_identifier<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "error name must be a string or a number, found {other}"
        ))),
    }
}

/// Treat empty strings like absent ones.
#[inline]
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

impl ErrorDefinition {
    /// Start a definition from its identifier and message template.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Catalogue-shaped definition: code, domain, title and message.
    pub fn entry(
        code: impl Into<String>,
        domain: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(code, message).domain(domain).title(title)
    }

    /// Set the domain.
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Declare positional properties.
    pub fn properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = properties.into_iter().map(Into::into).collect();
        self
    }

    /// Set the extra-properties table.
    pub fn extra_props(mut self, extra_props: ExtraProps) -> Self {
        self.extra_props = extra_props;
        self
    }

    /// Set the namespace.
    pub fn namespace(mut self, namespace: impl Into<Namespace>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Keep the definition out of the flat view.
    pub fn namespace_only(mut self, namespace_only: bool) -> Self {
        self.namespace_only = namespace_only;
        self
    }

    /// Set the advisory verbosity.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Identifier, if present and non-empty.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        present(&self.name)
    }

    /// Domain, if present and non-empty.
    #[inline]
    pub fn domain_str(&self) -> Option<&str> {
        present(&self.domain)
    }

    /// Title, if present and non-empty.
    #[inline]
    pub fn title_str(&self) -> Option<&str> {
        present(&self.title)
    }

    /// Message template, if present and non-empty.
    #[inline]
    pub fn message_str(&self) -> Option<&str> {
        present(&self.message)
    }

    /// Whether collision advisories are silenced for this definition.
    #[inline]
    pub fn suppresses_advisories(&self) -> bool {
        self.log_level == Some(LogLevel::Info)
    }
}
