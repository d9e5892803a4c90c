//! Namespace identifiers - isolation scopes for error type names.
//!
//! Two callers may register an error under the same human name without
//! collision as long as they register into different namespaces. Exactly one
//! namespace is special: [`Namespace::DEFAULT`] backs the flat (un-namespaced)
//! view of the registry, and collisions inside it are hard failures.
//!
//! # Reserved Names
//!
//! - **Default**: the shared namespace; every non-`namespaceOnly` entry in it
//!   is also reachable by bare name.
//! - **Registry**: owns the registry's own failure types. Nothing is ever
//!   inserted into a table under this namespace.
//!
//! # Example
//!
//! ```rust
//! use standard_errors::Namespace;
//!
//! let billing = Namespace::new("billing");
//! assert!(!billing.is_default());
//! assert_eq!(Namespace::default(), Namespace::DEFAULT);
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Name of the reserved default namespace.
pub const DEFAULT_NAMESPACE: &str = "Default";

/// Name of the namespace owning the registry's internal failure types.
pub const REGISTRY_NAMESPACE: &str = "Registry";

/// An isolation scope for error type names.
///
/// Cheap to clone for the reserved names (borrowed `'static` data); owned
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(Cow<'static, str>);

impl Namespace {
    /// The reserved default namespace.
    pub const DEFAULT: Namespace = Namespace(Cow::Borrowed(DEFAULT_NAMESPACE));

    /// Namespace of the registry's own failure types.
    pub const REGISTRY: Namespace = Namespace(Cow::Borrowed(REGISTRY_NAMESPACE));

    /// Create a namespace from any string.
    #[inline]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Get the namespace identifier.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }

    /// Check whether this is the reserved default namespace.
    #[inline]
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_NAMESPACE
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&'static str> for Namespace {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for Namespace {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
