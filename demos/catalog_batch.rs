use standard_errors::{CatalogError, Registry};

const CATALOGUE: &str = r#"[
    { "code": "http_500", "domain": "application", "title": "Duplicate", "message": "dup" },
    { "code": 701, "title": "No domain", "message": "m" },
    { "code": 702, "domain": "application", "message": "m" },
    { "code": 703, "domain": "application", "title": "No message" },
    { "code": 704, "domain": "application", "title": "Valid", "message": "This is a test" }
]"#;

fn main() -> Result<(), CatalogError> {
    let mut registry = Registry::new();

    println!("--- Catalogue Batch Example ---\n");

    let report = registry.expand_json(CATALOGUE)?;
    println!("batch passed: {}", report.passed());
    for (key, diagnosis) in report.iter() {
        println!("  {key:>8}: {}", diagnosis.to_value());
    }

    println!("\napplication errors now registered: {:?}", registry.list_keys(Some("application")));

    let removed = registry.remove_by_domain("http");
    println!("removed {} http entries", removed.len());
    println!("remaining: {:?}", registry.list_keys(None));
    Ok(())
}
