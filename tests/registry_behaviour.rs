//! End-to-end behaviour of the registry: admission, batches, namespaces,
//! removal, listing and the advisory channel.

use serde_json::json;
use standard_errors::{
    AdvisoryKind, BASE_ERROR_NAME, Defect, ErrorDefinition, ExtraProps, LogLevel, Namespace,
    Registry, RingBufferSink, TracingSink, args, raise,
};
use std::io;
use std::sync::{Arc, Mutex};

fn with_ring() -> (Registry, RingBufferSink) {
    let sink = RingBufferSink::new(64);
    let registry = Registry::builder().sink(Arc::new(sink.clone())).build();
    (registry, sink)
}

fn app(code: &str) -> ErrorDefinition {
    ErrorDefinition::entry(code, "application", "Test", "This is a test")
}

// ============================================================================
// VALIDATION
// ============================================================================

#[test]
fn complete_definition_passes_and_each_gap_is_named() {
    let mut registry = Registry::new();
    let report = registry.expand([
        app("600"),
        ErrorDefinition { name: None, ..app("x") },
        ErrorDefinition { domain: None, ..app("602") },
        ErrorDefinition { title: None, ..app("603") },
        ErrorDefinition { message: None, ..app("604") },
    ]);

    assert!(!report.passed());
    assert!(report.get("600").unwrap().passed());
    assert_eq!(report.get("#1").unwrap().code(), Some("Missing Code"));
    assert_eq!(report.get("602").unwrap().domain(), Some("Missing Domain"));
    assert_eq!(report.get("603").unwrap().title(), Some("Missing Title"));
    assert_eq!(report.get("604").unwrap().message(), Some("Missing Message"));
    for key in ["602", "603", "604"] {
        assert_eq!(report.get(key).unwrap().defects().len(), 1);
    }
}

#[test]
fn collision_and_missing_message_reported_together() {
    let mut registry = Registry::new();
    let report = registry.expand([ErrorDefinition { message: None, ..app("http_500") }]);
    let diagnosis = report.get("http_500").unwrap();
    assert_eq!(diagnosis.defects(), &[Defect::CodeInUse, Defect::MissingMessage]);
}

// ============================================================================
// BATCHES
// ============================================================================

#[test]
fn batch_without_rollback_registers_only_valid_entry() {
    let mut registry = Registry::new();
    let before = registry.get("http_500").cloned().unwrap();

    let report = registry
        .expand_json(
            r#"[
                { "code": "http_500", "domain": "application", "title": "Dup", "message": "dup" },
                { "code": 701, "title": "No domain", "message": "m" },
                { "code": 702, "domain": "application", "message": "m" },
                { "code": 703, "domain": "application", "title": "No message" },
                { "code": 704, "domain": "application", "title": "Valid", "message": "ok" }
            ]"#,
        )
        .unwrap();

    assert!(!report.passed());
    assert_eq!(report.get("http_500").unwrap().code(), Some("Code already in use"));
    assert_eq!(report.get("701").unwrap().domain(), Some("Missing Domain"));
    assert_eq!(report.get("702").unwrap().title(), Some("Missing Title"));
    assert_eq!(report.get("703").unwrap().message(), Some("Missing Message"));
    assert!(report.get("704").unwrap().passed());

    assert_eq!(registry.list_keys(Some("application")), ["704"]);
    for absent in ["701", "702", "703"] {
        assert!(registry.get(absent).is_none());
    }

    let after = registry.get("http_500").unwrap();
    assert_eq!(after, &before);
    assert_eq!(after.domain(), Some("http"));
    assert_eq!(after.template(), "Unexpected condition was encountered");
}

#[test]
fn keyed_catalogue_requires_matching_keys() {
    let mut registry = Registry::new();
    let report = registry
        .expand_json(
            r#"{
                "800": { "code": 800, "domain": "application", "title": "T", "message": "m" },
                "801": { "code": 802, "domain": "application", "title": "T", "message": "m" },
                "803": { "domain": "application", "title": "T", "message": "m" }
            }"#,
        )
        .unwrap();

    assert!(report.get("800").unwrap().passed());
    assert_eq!(report.get("801").unwrap().code(), Some("Code does not match key"));
    assert_eq!(report.get("803").unwrap().code(), Some("Missing Code"));
    assert_eq!(registry.list_keys(Some("application")), ["800"]);
}

#[test]
fn builder_reports_extra_definitions() {
    let (registry, report) = Registry::builder()
        .definitions([app("900"), app("http_404")])
        .build_with_report();

    assert!(registry.contains("900"));
    assert!(report.get("900").unwrap().passed());
    assert_eq!(report.get("http_404").unwrap().code(), Some("Code already in use"));
}

// ============================================================================
// INSTANTIATION
// ============================================================================

#[test]
fn conditional_extra_props_render_into_message() {
    let mut registry = Registry::new();
    let ty = registry
        .register(
            ErrorDefinition::new("Test", "Testing ``prop`` (``extraProp``)")
                .domain("application")
                .title("Test")
                .properties(["prop"])
                .extra_props(ExtraProps::new().when(
                    "prop",
                    "testProp",
                    [("extraProp", json!("testExtraProp"))],
                )),
        )
        .unwrap();

    let err = raise!(ty, "testProp");
    assert_eq!(err.message(), "Testing testProp (testExtraProp)");
    assert!(err.info().is_none());

    let err = raise!(ty, "testProp", json!({"request": 7}));
    assert_eq!(err.info(), Some(&json!({"request": 7})));
}

#[test]
fn http_error_picks_title_and_details_by_status() {
    let registry = Registry::new();
    let err = registry.instantiate("HttpError", args![404]).unwrap();

    assert_eq!(err.message(), "Request failed with status code 404 (Not Found)");
    assert_eq!(err.get("statusCode"), Some(&json!(404)));
    assert_eq!(
        err.get("details"),
        Some(&json!("The requested resource could not be found"))
    );
    assert_eq!(err.domain(), Some("http"));
}

#[test]
fn raised_errors_propagate_with_question_mark() {
    fn lookup(registry: &Registry, id: u32) -> standard_errors::Result<u32> {
        if id == 0 {
            return registry.get("http_404").unwrap().raise(args![]);
        }
        Ok(id)
    }

    let registry = Registry::new();
    assert_eq!(lookup(&registry, 3).unwrap(), 3);
    let err = lookup(&registry, 0).unwrap_err();
    assert_eq!(err.title(), Some("Not Found"));
    let as_dyn: Box<dyn std::error::Error> = Box::new(err);
    assert!(as_dyn.to_string().starts_with("http_404: "));
}

// ============================================================================
// NAMESPACES
// ============================================================================

#[test]
fn same_name_in_two_namespaces_gives_distinct_types() {
    let (mut registry, _) = with_ring();
    let def = |ns: &'static str| {
        ErrorDefinition::entry("Conflict", "application", "Conflict", "Conflict in ``ns``")
            .namespace(ns)
    };
    let first = registry.register(def("alpha")).unwrap();
    let second = registry.register(def("beta")).unwrap();

    let a = first.instantiate(Vec::new());
    let b = second.instantiate(Vec::new());

    assert!(a.is_instance_of(&first));
    assert!(!a.is_instance_of(&second));
    assert!(!b.is_instance_of(&first));
    assert!(a.is_instance_of(&registry.base()));
    assert!(b.is_instance_of(&registry.base()));
    assert_eq!(a.namespace(), Some(&Namespace::new("alpha")));
    assert_eq!(b.namespace(), Some(&Namespace::new("beta")));
}

#[test]
fn identical_reregistration_returns_original_type() {
    let (mut registry, sink) = with_ring();
    let def = app("Retry").namespace("jobs");
    let first = registry.register(def.clone()).unwrap();
    let again = registry.register(def).unwrap();

    assert_eq!(first, again);
    let notices = sink.get_all();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, AdvisoryKind::Reused);
    assert_eq!(notices[0].namespace.as_ref(), "jobs");
}

#[test]
fn default_namespace_duplicate_is_fatal() {
    let (mut registry, sink) = with_ring();
    let err = registry.register(app("http_404")).unwrap_err();
    assert_eq!(err.name(), "DuplicateNameError");
    assert_eq!(registry.get("http_404").unwrap().domain(), Some("http"));
    assert!(sink.is_empty());
}

#[test]
fn shadowing_advisory_respects_info_level() {
    let (mut registry, sink) = with_ring();
    registry.register(app("Busy").namespace("a")).unwrap();
    registry
        .register(app("Busy").namespace("b").log_level(LogLevel::Info))
        .unwrap();
    assert!(sink.is_empty());

    registry.register(app("Busy").namespace("c")).unwrap();
    let shadowed = sink.get_filtered(|e| e.kind == AdvisoryKind::Shadowed);
    assert_eq!(shadowed.len(), 1);
    assert_eq!(shadowed[0].existing_namespace.as_deref(), Some("a"));
}

// ============================================================================
// REMOVAL AND LISTING
// ============================================================================

#[test]
fn removal_hides_key_from_lookup_and_every_listing() {
    let mut registry = Registry::new();
    registry.remove("http_418").unwrap();

    assert!(registry.get("http_418").is_none());
    assert!(!registry.list_keys(None).iter().any(|k| k == "http_418"));
    assert!(!registry.list(Some("http")).contains_key("http_418"));
    assert!(
        !registry
            .list_errors(None)
            .iter()
            .any(|d| d.name() == Some("http_418"))
    );
}

#[test]
fn remove_by_domain_is_exact() {
    let mut registry = Registry::new();
    registry.register(app("A1")).unwrap();
    registry
        .register(ErrorDefinition::entry("H1", "https", "T", "m"))
        .unwrap();

    let removed = registry.remove_by_domain("http");
    assert!(removed.iter().all(|k| k.starts_with("http_") || k == "HttpError"));
    assert!(registry.list_keys(Some("http")).is_empty());
    assert_eq!(registry.list_keys(Some("https")), ["H1"]);
    assert_eq!(registry.list_keys(Some("application")), ["A1"]);
}

#[test]
fn base_type_is_protected() {
    let mut registry = Registry::new();
    let err = registry
        .remove_in(BASE_ERROR_NAME, &Namespace::DEFAULT, true)
        .unwrap_err();
    assert_eq!(err.name(), "ProtectedTypeError");
    assert!(registry.get(BASE_ERROR_NAME).is_some());
}

#[test]
fn unfiltered_listing_is_registration_ordered() {
    let registry = Registry::new();
    let keys = registry.list_keys(None);
    assert_eq!(keys.first().map(String::as_str), Some(BASE_ERROR_NAME));
    assert_eq!(keys[1], "http_200");
    assert_eq!(keys.last().map(String::as_str), Some("HttpError"));
    assert_eq!(registry.list_errors(Some("http")).len(), 21);
}

// ============================================================================
// TRACING SINK
// ============================================================================

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn tracing_sink_emits_structured_warning() {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut registry = Registry::builder()
            .sink(Arc::new(TracingSink))
            .with_http_catalog(false)
            .build();
        let def = app("Flaky").namespace("net");
        registry.register(def.clone()).unwrap();
        registry.register(def).unwrap();
    });

    let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("WARN"));
    assert!(output.contains("kind=\"reused\"") || output.contains("kind=reused"));
    assert!(output.contains("already exists in namespace 'net'"));
}
