//! Advisory notices for name collisions.
//!
//! Advisories are best-effort diagnostics, never errors: registration
//! succeeds (or fails) the same way whether or not anyone listens. The
//! registry routes every notice through one injected [`AdvisorySink`].
//!
//! # Notice Kinds
//!
//! - **Reused**: a non-default `(namespace, name)` pair was declared again
//!   and the existing type was returned.
//! - **Shadowed**: a new namespaced type was registered whose name already
//!   belongs to another namespace in the flat view.
//!
//! A definition with `logLevel: "info"` never produces a notice.
//!
//! # Example
//!
//! ```rust
//! use standard_errors::{Advisory, ErrorDefinition, Registry};
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = {
//!     let seen = Arc::clone(&seen);
//!     move |advisory: &Advisory| seen.lock().unwrap().push(advisory.to_string())
//! };
//!
//! let mut registry = Registry::builder().sink(Arc::new(sink)).build();
//! let def = ErrorDefinition::new("Timeout", "Timed out")
//!     .domain("net")
//!     .title("Timeout")
//!     .namespace("net");
//! registry.register(def.clone())?;
//! registry.register(def)?;
//!
//! assert_eq!(seen.lock().unwrap().len(), 1);
//! # Ok::<(), standard_errors::RaisedError>(())
//! ```

use crate::Namespace;
use std::fmt;
use std::time::SystemTime;

/// What triggered an advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvisoryKind {
    /// Existing type returned for a redeclared namespaced pair.
    Reused,
    /// Same name already owned by another namespace in the flat view.
    Shadowed,
}

impl AdvisoryKind {
    /// Stable lowercase label.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reused => "reused",
            Self::Shadowed => "shadowed",
        }
    }
}

impl fmt::Display for AdvisoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One collision notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    /// Trigger.
    pub kind: AdvisoryKind,
    /// Colliding error name.
    pub name: String,
    /// Namespace of the definition being registered.
    pub namespace: Namespace,
    /// Namespace already owning the name in the flat view (`Shadowed` only).
    pub existing_namespace: Option<Namespace>,
    /// Wall-clock time the notice was raised.
    pub timestamp: SystemTime,
}

impl Advisory {
    pub(crate) fn reused(name: &str, namespace: &Namespace) -> Self {
        Self {
            kind: AdvisoryKind::Reused,
            name: name.to_owned(),
            namespace: namespace.clone(),
            existing_namespace: None,
            timestamp: SystemTime::now(),
        }
    }

    pub(crate) fn shadowed(name: &str, namespace: &Namespace, existing: &Namespace) -> Self {
        Self {
            kind: AdvisoryKind::Shadowed,
            name: name.to_owned(),
            namespace: namespace.clone(),
            existing_namespace: Some(existing.clone()),
            timestamp: SystemTime::now(),
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.existing_namespace) {
            (AdvisoryKind::Shadowed, Some(existing)) => write!(
                f,
                "error '{}' already exists in namespace '{}'; registered separately in '{}'",
                self.name, existing, self.namespace
            ),
            _ => write!(
                f,
                "error '{}' already exists in namespace '{}'; reusing existing type",
                self.name, self.namespace
            ),
        }
    }
}

/// Destination for advisory notices.
///
/// Implementations must not panic; notices are fire-and-forget.
pub trait AdvisorySink: Send + Sync {
    /// Receive one notice.
    fn notify(&self, advisory: &Advisory);
}

impl<F> AdvisorySink for F
where
    F: Fn(&Advisory) + Send + Sync,
{
    fn notify(&self, advisory: &Advisory) {
        self(advisory)
    }
}

/// Emits each notice as a `tracing` warning event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AdvisorySink for TracingSink {
    fn notify(&self, advisory: &Advisory) {
        tracing::warn!(
            kind = advisory.kind.as_str(),
            name = %advisory.name,
            namespace = %advisory.namespace,
            existing_namespace = advisory.existing_namespace.as_ref().map(Namespace::as_str),
            "{advisory}"
        );
    }
}

/// Discards every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AdvisorySink for NullSink {
    #[inline]
    fn notify(&self, _advisory: &Advisory) {}
}
