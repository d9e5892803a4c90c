//! The definition table, namespace resolution and the registry operations.
//!
//! A [`Registry`] owns two views of every accepted definition:
//!
//! - the **namespace tables**: `namespace -> name -> ErrorType`, holding
//!   every accepted definition exactly once per `(namespace, name)` pair;
//! - the **flat table**: `name -> ErrorType`, holding the first claimant of
//!   each bare name among definitions not marked `namespace_only`.
//!
//! Both are insertion-ordered, so listings follow registration order.
//!
//! # Admission Policy
//!
//! Every registration goes through one path, [`Registry::admit`]:
//!
//! 1. Validate. In the `Default` namespace a name collides if it exists in
//!    the `Default` table or anywhere in the flat table.
//! 2. Reuse. A non-default pair that already exists returns the existing
//!    type unchanged (advisory `Reused`).
//! 3. Shadow. A new non-default pair whose name is already in the flat table
//!    becomes an independent type; the flat slot keeps its owner (advisory
//!    `Shadowed` unless `namespace_only`).
//! 4. Fresh. Insert into the namespace table, and into the flat table unless
//!    `namespace_only`.
//!
//! `logLevel: "info"` silences both advisories.
//!
//! [`register`](Registry::register) raises a failed diagnosis as a
//! [`RaisedError`]; [`expand`](Registry::expand) and
//! [`expand_keyed`](Registry::expand_keyed) report it and move on. Batches are
//! never rolled back and later entries see earlier ones.
//!
//! # Example
//!
//! ```rust
//! use standard_errors::{ErrorDefinition, Namespace, Registry};
//! use serde_json::json;
//!
//! let mut registry = Registry::new();
//!
//! let def = |ns: &'static str| {
//!     ErrorDefinition::new("Timeout", "Timed out after ``ms`` milliseconds")
//!         .domain("net")
//!         .title("Timeout")
//!         .properties(["ms"])
//!         .namespace(ns)
//! };
//! let http = registry.register(def("http-client"))?;
//! let db = registry.register(def("database"))?;
//!
//! assert_ne!(http, db);
//! assert_eq!(registry.get("Timeout"), Some(&http));
//! assert_eq!(registry.resolve(&Namespace::new("database"), "Timeout"), Some(&db));
//!
//! let err = db.instantiate([json!(250)]);
//! assert_eq!(err.to_string(), "database::Timeout: Timed out after 250 milliseconds");
//! # Ok::<(), standard_errors::RaisedError>(())
//! ```

use crate::advisory::{Advisory, AdvisorySink, TracingSink};
use crate::catalog::{self, CatalogDocument, CatalogError};
use crate::factory::{BASE_ERROR_NAME, ErrorType};
use crate::validation::{self, Defect, Diagnosis, VerificationReport};
use crate::{ErrorDefinition, Namespace, RaisedError, Result};
use indexmap::IndexMap;
use serde_json::{Value, json};
use std::fmt;
use std::sync::{Arc, OnceLock};

type Table = IndexMap<String, ErrorType>;

// ============================================================================
// Internal failure types
// ============================================================================

/// Failure types owned by the registry itself.
///
/// They live in the reserved `Registry` namespace and are never inserted
/// into any table, so callers can neither shadow nor remove them.
mod failures {
    use super::*;

    fn internal(name: &str, title: &str, message: &str, properties: &[&str]) -> ErrorType {
        ErrorType::from_definition(
            ErrorDefinition::new(name, message)
                .domain("registry")
                .title(title)
                .properties(properties.iter().copied())
                .namespace(Namespace::REGISTRY),
        )
    }

    pub(super) fn duplicate_name() -> &'static ErrorType {
        static TYPE: OnceLock<ErrorType> = OnceLock::new();
        TYPE.get_or_init(|| {
            internal(
                "DuplicateNameError",
                "Duplicate Name",
                "Error ``code`` already exists in namespace ``namespace``",
                &["code", "namespace"],
            )
        })
    }

    pub(super) fn protected_type() -> &'static ErrorType {
        static TYPE: OnceLock<ErrorType> = OnceLock::new();
        TYPE.get_or_init(|| {
            internal(
                "ProtectedTypeError",
                "Protected Type",
                "Error ``code`` cannot be removed",
                &["code"],
            )
        })
    }

    pub(super) fn invalid_definition() -> &'static ErrorType {
        static TYPE: OnceLock<ErrorType> = OnceLock::new();
        TYPE.get_or_init(|| {
            internal(
                "InvalidDefinitionError",
                "Invalid Definition",
                "Definition ``code`` was rejected: ``defects``",
                &["code", "defects"],
            )
        })
    }
}

/// Type of the error raised for a default-namespace name collision.
pub fn duplicate_name_error() -> &'static ErrorType {
    failures::duplicate_name()
}

/// Type of the error raised when removing the base type.
pub fn protected_type_error() -> &'static ErrorType {
    failures::protected_type()
}

/// Type of the error raised for an incomplete definition.
pub fn invalid_definition_error() -> &'static ErrorType {
    failures::invalid_definition()
}

// ============================================================================
// Registry
// ============================================================================

/// Table of registered error types.
pub struct Registry {
    flat: Table,
    namespaces: IndexMap<Namespace, Table>,
    sink: Arc<dyn AdvisorySink>,
}

impl Registry {
    /// A registry with the built-in HTTP catalogue and the `tracing` sink.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Only the base type, advising to `sink`.
    fn bare(sink: Arc<dyn AdvisorySink>) -> Self {
        let base = ErrorType::base();
        let mut default_table = Table::new();
        default_table.insert(BASE_ERROR_NAME.to_owned(), base.clone());
        let mut flat = Table::new();
        flat.insert(BASE_ERROR_NAME.to_owned(), base);

        let mut namespaces = IndexMap::new();
        namespaces.insert(Namespace::DEFAULT, default_table);
        Self {
            flat,
            namespaces,
            sink,
        }
    }

    /// Replace the advisory sink.
    pub fn set_sink(&mut self, sink: Arc<dyn AdvisorySink>) {
        self.sink = sink;
    }

    // ------------------------------------------------------------------------
    // Admission
    // ------------------------------------------------------------------------

    /// Would a `Default`-namespace definition named `name` collide?
    fn collides_in_default(&self, name: &str) -> bool {
        self.flat.contains_key(name)
            || self
                .namespaces
                .get(&Namespace::DEFAULT)
                .is_some_and(|table| table.contains_key(name))
    }

    fn in_use(&self, namespace: &Namespace) -> impl FnOnce(&str) -> bool + '_ {
        let strict = namespace.is_default();
        move |name: &str| strict && self.collides_in_default(name)
    }

    /// Validate and, if admissible, resolve and insert one definition.
    ///
    /// Returns the diagnosis and the resulting type (new or reused). The
    /// table is untouched when the diagnosis fails.
    pub fn admit(&mut self, definition: ErrorDefinition) -> (Diagnosis, Option<ErrorType>) {
        let diagnosis = validation::validate(&definition, self.in_use(&definition.namespace));
        self.commit(diagnosis, definition)
    }

    /// Like [`admit`](Self::admit), for a definition submitted under `key`.
    pub fn admit_keyed(
        &mut self,
        key: &str,
        definition: ErrorDefinition,
    ) -> (Diagnosis, Option<ErrorType>) {
        let diagnosis =
            validation::validate_keyed(key, &definition, self.in_use(&definition.namespace));
        self.commit(diagnosis, definition)
    }

    fn commit(
        &mut self,
        diagnosis: Diagnosis,
        definition: ErrorDefinition,
    ) -> (Diagnosis, Option<ErrorType>) {
        if !diagnosis.passed() {
            tracing::debug!(
                name = definition.name().unwrap_or_default(),
                namespace = %definition.namespace,
                %diagnosis,
                "definition rejected"
            );
            return (diagnosis, None);
        }
        let ty = self.resolve_and_insert(definition);
        (diagnosis, Some(ty))
    }

    fn resolve_and_insert(&mut self, definition: ErrorDefinition) -> ErrorType {
        let namespace = definition.namespace.clone();
        let name = definition.name().unwrap_or_default().to_owned();
        let quiet = definition.suppresses_advisories();
        let namespace_only = definition.namespace_only;

        if let Some(existing) = self.get_in(&namespace, &name) {
            let existing = existing.clone();
            if !quiet {
                self.sink.notify(&Advisory::reused(&name, &namespace));
            }
            return existing;
        }

        let owner = self.flat.get(&name).map(|ty| ty.namespace().clone());
        let ty = ErrorType::from_definition(definition);
        self.namespaces
            .entry(namespace.clone())
            .or_default()
            .insert(name.clone(), ty.clone());

        if !namespace_only {
            match owner {
                Some(owner) => {
                    if !quiet {
                        self.sink
                            .notify(&Advisory::shadowed(&name, &namespace, &owner));
                    }
                }
                None => {
                    self.flat.insert(name.clone(), ty.clone());
                }
            }
        }

        tracing::debug!(%name, %namespace, namespace_only, "registered error type");
        ty
    }

    /// Register one definition, raising on failure.
    ///
    /// A name collision in the `Default` namespace raises
    /// `DuplicateNameError`; any other defect raises `InvalidDefinitionError`
    /// with the diagnosis as `info`. Redeclaring a non-default pair returns
    /// the existing type.
    pub fn register(&mut self, definition: ErrorDefinition) -> Result<ErrorType> {
        let name = definition.name().unwrap_or_default().to_owned();
        let namespace = definition.namespace.clone();

        match self.admit(definition) {
            (_, Some(ty)) => Ok(ty),
            (diagnosis, None) if diagnosis.defects() == [Defect::CodeInUse] => {
                duplicate_name_error().raise([json!(name), json!(namespace.as_str())])
            }
            (diagnosis, None) => invalid_definition_error().raise([
                json!(name),
                json!(diagnosis.to_string()),
                diagnosis.to_value(),
            ]),
        }
    }

    /// Admit a batch in order, reporting each entry.
    ///
    /// Entries are keyed by name; an unnamed entry is keyed `#<position>`.
    pub fn expand<I>(&mut self, definitions: I) -> VerificationReport
    where
        I: IntoIterator<Item = ErrorDefinition>,
    {
        let mut report = VerificationReport::new();
        for (index, definition) in definitions.into_iter().enumerate() {
            let key = definition
                .name()
                .map_or_else(|| format!("#{index}"), str::to_owned);
            let (diagnosis, _) = self.admit(definition);
            report.record(key, diagnosis);
        }
        report
    }

    /// Admit a keyed batch in order; each key must match its definition's name.
    pub fn expand_keyed<I, K>(&mut self, definitions: I) -> VerificationReport
    where
        I: IntoIterator<Item = (K, ErrorDefinition)>,
        K: Into<String>,
    {
        let mut report = VerificationReport::new();
        for (key, definition) in definitions {
            let key = key.into();
            let (diagnosis, _) = self.admit_keyed(&key, definition);
            report.record(key, diagnosis);
        }
        report
    }

    /// Admit a parsed catalogue document.
    pub fn expand_document(&mut self, document: CatalogDocument) -> VerificationReport {
        match document {
            CatalogDocument::List(definitions) => self.expand(definitions),
            CatalogDocument::Keyed(definitions) => self.expand_keyed(definitions),
        }
    }

    /// Parse and admit a JSON catalogue (array or keyed object).
    pub fn expand_json(&mut self, input: &str) -> std::result::Result<VerificationReport, CatalogError> {
        Ok(self.expand_document(catalog::from_json(input)?))
    }

    // ------------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------------

    /// Remove `name` from the `Default` namespace and the flat table.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        self.remove_in(name, &Namespace::DEFAULT, false)
    }

    /// Remove `(namespace, name)`, and the flat entry for `name` unless
    /// `namespace_only`.
    ///
    /// The flat entry is removed whichever namespace owns it. Removing the
    /// base type raises `ProtectedTypeError`. Absent entries are ignored.
    pub fn remove_in(&mut self, name: &str, namespace: &Namespace, namespace_only: bool) -> Result<()> {
        if name == BASE_ERROR_NAME {
            return protected_type_error().raise([json!(name)]);
        }

        if let Some(table) = self.namespaces.get_mut(namespace) {
            table.shift_remove(name);
            if table.is_empty() && !namespace.is_default() {
                self.namespaces.shift_remove(namespace);
            }
        }
        if !namespace_only {
            self.flat.shift_remove(name);
        }

        tracing::debug!(%name, %namespace, namespace_only, "removed error type");
        Ok(())
    }

    /// Remove every flat entry whose domain is `domain`, with its namespace
    /// entry. Returns the removed names in registration order.
    pub fn remove_by_domain(&mut self, domain: &str) -> Vec<String> {
        let doomed: Vec<(String, ErrorType)> = self
            .flat
            .iter()
            .filter(|(_, ty)| ty.domain() == Some(domain) && !ty.is_base())
            .map(|(name, ty)| (name.clone(), ty.clone()))
            .collect();

        for (name, ty) in &doomed {
            self.flat.shift_remove(name);
            let namespace = ty.namespace();
            let owned = self
                .namespaces
                .get(namespace)
                .and_then(|table| table.get(name))
                .is_some_and(|current| current == ty);
            if owned {
                if let Some(table) = self.namespaces.get_mut(namespace) {
                    table.shift_remove(name);
                }
            }
        }
        self.namespaces
            .retain(|namespace, table| namespace.is_default() || !table.is_empty());

        tracing::debug!(%domain, removed = doomed.len(), "removed error types by domain");
        doomed.into_iter().map(|(name, _)| name).collect()
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    /// Flat lookup by bare name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&ErrorType> {
        self.flat.get(name)
    }

    /// Lookup within one namespace.
    #[inline]
    pub fn get_in(&self, namespace: &Namespace, name: &str) -> Option<&ErrorType> {
        self.namespaces.get(namespace)?.get(name)
    }

    /// Namespace lookup falling through to the flat table.
    pub fn resolve(&self, namespace: &Namespace, name: &str) -> Option<&ErrorType> {
        self.get_in(namespace, name).or_else(|| self.get(name))
    }

    /// Check whether `name` is reachable by bare name.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.flat.contains_key(name)
    }

    /// Instantiate the flat entry `name`, if registered.
    pub fn instantiate<I>(&self, name: &str, args: I) -> Option<RaisedError>
    where
        I: IntoIterator<Item = Value>,
    {
        self.get(name).map(|ty| ty.instantiate(args))
    }

    /// The base type.
    #[inline]
    pub fn base(&self) -> ErrorType {
        ErrorType::base()
    }

    /// Number of entries reachable by bare name.
    #[inline]
    pub fn len(&self) -> usize {
        self.flat.len()
    }

    /// Check whether the flat table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    // ------------------------------------------------------------------------
    // Listing
    // ------------------------------------------------------------------------

    fn flat_in_domain<'a>(
        &'a self,
        domain: Option<&'a str>,
    ) -> impl Iterator<Item = (&'a String, &'a ErrorType)> + 'a {
        self.flat
            .iter()
            .filter(move |(_, ty)| domain.is_none_or(|d| ty.domain() == Some(d)))
    }

    /// Flat entries as `name -> definition`, optionally filtered by domain.
    pub fn list(&self, domain: Option<&str>) -> IndexMap<String, ErrorDefinition> {
        self.flat_in_domain(domain)
            .map(|(name, ty)| (name.clone(), ty.definition().clone()))
            .collect()
    }

    /// Flat entry names, optionally filtered by domain.
    pub fn list_keys(&self, domain: Option<&str>) -> Vec<String> {
        self.flat_in_domain(domain).map(|(name, _)| name.clone()).collect()
    }

    /// Flat entry definitions, optionally filtered by domain.
    pub fn list_errors(&self, domain: Option<&str>) -> Vec<ErrorDefinition> {
        self.flat_in_domain(domain)
            .map(|(_, ty)| ty.definition().clone())
            .collect()
    }

    /// Types registered in one namespace, in registration order.
    pub fn list_namespace(&self, namespace: &Namespace) -> Vec<ErrorType> {
        self.namespaces
            .get(namespace)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Namespaces holding at least one type (plus `Default`).
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.keys()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("flat", &self.flat.len())
            .field("namespaces", &self.namespaces.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Configures a [`Registry`].
///
/// ```rust
/// use standard_errors::{ErrorDefinition, NullSink, Registry};
/// use std::sync::Arc;
///
/// let (registry, report) = Registry::builder()
///     .sink(Arc::new(NullSink))
///     .with_http_catalog(false)
///     .definitions([ErrorDefinition::entry("E1", "app", "First", "first failure")])
///     .build_with_report();
///
/// assert!(report.passed());
/// assert!(registry.get("http_404").is_none());
/// assert!(registry.get("E1").is_some());
/// ```
pub struct RegistryBuilder {
    sink: Option<Arc<dyn AdvisorySink>>,
    http_catalog: bool,
    definitions: Vec<ErrorDefinition>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            sink: None,
            http_catalog: true,
            definitions: Vec::new(),
        }
    }
}

impl RegistryBuilder {
    /// Route advisories to `sink` (default: [`TracingSink`]).
    pub fn sink(mut self, sink: Arc<dyn AdvisorySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Seed the built-in HTTP catalogue (default: on).
    pub fn with_http_catalog(mut self, enabled: bool) -> Self {
        self.http_catalog = enabled;
        self
    }

    /// Admit these definitions after the built-ins.
    pub fn definitions<I>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = ErrorDefinition>,
    {
        self.definitions.extend(definitions);
        self
    }

    /// Build, discarding the report for extra definitions.
    pub fn build(self) -> Registry {
        self.build_with_report().0
    }

    /// Build and report on the definitions passed to [`definitions`](Self::definitions).
    pub fn build_with_report(self) -> (Registry, VerificationReport) {
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));
        let mut registry = Registry::bare(sink);

        if self.http_catalog {
            let seeded = registry.expand(catalog::builtin_definitions());
            debug_assert!(seeded.passed(), "built-in catalogue rejected: {seeded:?}");
        }
        let report = registry.expand(self.definitions);
        (registry, report)
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("custom_sink", &self.sink.is_some())
            .field("http_catalog", &self.http_catalog)
            .field("definitions", &self.definitions.len())
            .finish()
    }
}
