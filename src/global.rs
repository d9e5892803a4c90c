//! The process-wide registry.
//!
//! Constructed lazily on first access with the default configuration
//! ([`Registry::new`]). Reads and writes go through `RwLock` guards that
//! recover from poisoning, so a panic in one test cannot wedge the rest.
//!
//! Tests that mutate the registry should [`reset`] it first and serialise
//! among themselves; the lock protects memory, not test isolation.
//!
//! # Example
//!
//! ```rust
//! use standard_errors::{global, ErrorDefinition};
//!
//! global::reset();
//! global::register(
//!     ErrorDefinition::entry("MaintenanceMode", "ops", "Maintenance", "Back at ``eta``")
//!         .properties(["eta"]),
//! )?;
//!
//! let err = global::raise("MaintenanceMode", [serde_json::json!("09:00")]).unwrap();
//! assert_eq!(err.message(), "Back at 09:00");
//! # Ok::<(), standard_errors::RaisedError>(())
//! ```

use crate::{ErrorDefinition, ErrorType, RaisedError, Registry, Result};
use serde_json::Value;
use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

static GLOBAL: OnceLock<RwLock<Registry>> = OnceLock::new();

#[inline]
fn cell() -> &'static RwLock<Registry> {
    GLOBAL.get_or_init(|| RwLock::new(Registry::new()))
}

/// Shared read access.
pub fn registry() -> RwLockReadGuard<'static, Registry> {
    match cell().read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Exclusive write access.
pub fn registry_mut() -> RwLockWriteGuard<'static, Registry> {
    match cell().write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Swap in a new registry, returning the previous one.
pub fn install(registry: Registry) -> Registry {
    std::mem::replace(&mut *registry_mut(), registry)
}

/// Restore the default registry.
pub fn reset() {
    let previous = install(Registry::new());
    tracing::debug!(entries = previous.len(), "global registry reset");
}

/// Register into the process-wide registry.
pub fn register(definition: ErrorDefinition) -> Result<ErrorType> {
    registry_mut().register(definition)
}

/// Instantiate a flat entry of the process-wide registry.
pub fn raise<I>(name: &str, args: I) -> Option<RaisedError>
where
    I: IntoIterator<Item = Value>,
{
    registry().instantiate(name, args)
}
