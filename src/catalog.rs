//! Built-in definitions and catalogue loading.
//!
//! A fresh [`Registry`](crate::Registry) is seeded with one conventional
//! entry per HTTP status code (`http_200` … `http_503`, domain `http`) and
//! with the parametrised `HttpError` type, whose title and details are
//! picked per instance from the status code it is raised with.
//!
//! Catalogues can also be supplied as JSON, either as an array of
//! definitions or as an object mapping each key to its definition. The
//! keyed form is validated with the key-must-match-code rule.
//!
//! ```rust
//! use standard_errors::catalog::{self, CatalogDocument};
//!
//! let doc = catalog::from_json(r#"{ "900": { "code": 900, "domain": "app", "title": "T", "message": "m" } }"#)?;
//! assert!(matches!(doc, CatalogDocument::Keyed(_)));
//! # Ok::<(), standard_errors::CatalogError>(())
//! ```

use crate::{ErrorDefinition, ExtraProps};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::json;
use std::fmt;

/// Domain of the built-in HTTP entries.
pub const HTTP_DOMAIN: &str = "http";

/// Name of the parametrised HTTP error type.
pub const HTTP_ERROR_NAME: &str = "HttpError";

/// `(status, title, details)` for every built-in HTTP entry.
pub const HTTP_STATUS: &[(u16, &str, &str)] = &[
    (200, "OK", "Request successful"),
    (201, "Created", "Request successful, resource created"),
    (202, "Accepted", "The request has been accepted for processing"),
    (204, "No Content", "Request successful, but no content returned"),
    (400, "Bad Request", "The server cannot or will not process the request"),
    (401, "Unauthorized", "Authentication required"),
    (403, "Forbidden", "Valid request, but the requested action is forbidden"),
    (404, "Not Found", "The requested resource could not be found"),
    (405, "Method Not Allowed", "The requested method is not supported for the requested resource"),
    (
        406,
        "Not Acceptable",
        "The requested resource is capable of generating only content not acceptable according to the Accept headers sent in the request",
    ),
    (407, "Proxy Authentication Required", "The client must first authenticate itself with the proxy"),
    (
        408,
        "Request Timeout",
        "The client did not produce a request within the time that the server was prepared to wait",
    ),
    (
        409,
        "Conflict",
        "The request could not be processed because of a conflict in the current state of the resource",
    ),
    (410, "Gone", "The resource requested is no longer available and will not be available again"),
    (418, "I'm a Teapot", "The requested entity body is short and stout"),
    (429, "Too Many Request", "Too many requests sent in a given amount of time"),
    (500, "Internal Error", "Unexpected condition was encountered"),
    (501, "Not Implemented", "Request method unsupported or unfulfillable"),
    (502, "Bad Gateway", "Invalid response received from upstream server"),
    (503, "Service Unavailable", "The server is currently unavailable"),
];

/// Registry key of the entry for `status`.
#[inline]
pub fn http_key(status: u16) -> String {
    format!("http_{status}")
}

/// One definition per built-in HTTP status, in ascending order.
pub fn http_definitions() -> impl Iterator<Item = ErrorDefinition> {
    HTTP_STATUS.iter().map(|&(status, title, details)| {
        ErrorDefinition::entry(http_key(status), HTTP_DOMAIN, title, details)
    })
}

/// The parametrised `HttpError` definition.
///
/// Raised with a status code, it gains the `title` and `details` of that
/// status and renders `Request failed with status code 404 (Not Found)`.
pub fn http_error_definition() -> ErrorDefinition {
    let extra_props = HTTP_STATUS
        .iter()
        .fold(ExtraProps::new(), |table, &(status, title, details)| {
            table.when(
                "statusCode",
                status.to_string(),
                [("title", json!(title)), ("details", json!(details))],
            )
        });

    ErrorDefinition::new(
        HTTP_ERROR_NAME,
        "Request failed with status code ``statusCode`` (``title``)",
    )
    .domain(HTTP_DOMAIN)
    .title("HTTP Error")
    .properties(["statusCode"])
    .extra_props(extra_props)
}

/// Everything a fresh registry is seeded with besides the base type.
pub fn builtin_definitions() -> impl Iterator<Item = ErrorDefinition> {
    http_definitions().chain(std::iter::once(http_error_definition()))
}

/// A parsed JSON catalogue.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CatalogDocument {
    /// Array of definitions, keyed by their own names.
    List(Vec<ErrorDefinition>),
    /// Object mapping explicit keys to definitions.
    Keyed(IndexMap<String, ErrorDefinition>),
}

impl CatalogDocument {
    /// Number of definitions in the document.
    pub fn len(&self) -> usize {
        match self {
            Self::List(defs) => defs.len(),
            Self::Keyed(defs) => defs.len(),
        }
    }

    /// Check whether the document holds no definitions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Malformed catalogue input.
#[derive(Debug)]
pub struct CatalogError {
    source: serde_json::Error,
}

impl CatalogError {
    /// Line of the offending input (1-based).
    #[inline]
    pub fn line(&self) -> usize {
        self.source.line()
    }

    /// Column of the offending input (1-based).
    #[inline]
    pub fn column(&self) -> usize {
        self.source.column()
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error catalogue: {}", self.source)
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(source: serde_json::Error) -> Self {
        Self { source }
    }
}

/// Parse a JSON catalogue (array or keyed object).
pub fn from_json(input: &str) -> Result<CatalogDocument, CatalogError> {
    Ok(serde_json::from_str(input)?)
}
