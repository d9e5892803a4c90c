use standard_errors::{ErrorDefinition, LogLevel, Namespace, Registry, RingBufferSink};
use std::sync::Arc;

fn timeout(namespace: &'static str) -> ErrorDefinition {
    ErrorDefinition::entry("Timeout", "io", "Timeout", "``service`` timed out")
        .properties(["service"])
        .namespace(namespace)
}

fn main() -> standard_errors::Result<()> {
    let advisories = RingBufferSink::new(16);
    let mut registry = Registry::builder()
        .sink(Arc::new(advisories.clone()))
        .with_http_catalog(false)
        .build();

    println!("--- Namespace Example ---\n");

    let http = registry.register(timeout("http-client"))?;
    let db = registry.register(timeout("database"))?;
    let http_again = registry.register(timeout("http-client"))?;
    registry.register(timeout("cache").log_level(LogLevel::Info))?;

    println!("http == db:          {}", http == db);
    println!("http == http_again:  {}", http == http_again);
    println!("flat 'Timeout' owner: {}", registry.get("Timeout").map_or("-", |t| t.namespace().as_str()));

    let err = db.instantiate([serde_json::json!("postgres")]);
    println!("\n{err}");
    println!("instance of db type:   {}", err.is_instance_of(&db));
    println!("instance of http type: {}", err.is_instance_of(&http));
    println!("instance of base:      {}", err.is_instance_of(&registry.base()));

    println!("\nAdvisories (newest first):");
    for entry in advisories.get_all() {
        println!("  [{}] {}", entry.kind, entry.message);
    }

    let cache = Namespace::new("cache");
    println!("\ncache namespace holds {} type(s)", registry.list_namespace(&cache).len());
    Ok(())
}
