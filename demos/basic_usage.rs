use serde_json::json;
use standard_errors::{ErrorDefinition, Registry, Result, args};

fn charge(registry: &Registry, amount: u64) -> Result<u64> {
    if amount > 500 {
        // Surplus argument becomes the info payload.
        return registry
            .get("LimitExceeded")
            .expect("registered in main")
            .raise(args![500, amount, json!({"customer": "c-1029"})]);
    }
    Ok(amount)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    println!("--- Basic Usage Example ---\n");

    let mut registry = Registry::new();
    registry.register(
        ErrorDefinition::new("LimitExceeded", "Limit of ``limit`` exceeded by request for ``amount``")
            .domain("payments")
            .title("Limit Exceeded")
            .properties(["limit", "amount"]),
    )?;

    match charge(&registry, 900) {
        Ok(amount) => println!("charged {amount}"),
        Err(err) => {
            println!("1. Display:  {err}");
            println!("2. Title:    {}", err.title().unwrap_or("-"));
            println!("3. Info:     {}", err.info().cloned().unwrap_or_default());
            println!("4. As value: {}", err.to_value());
        }
    }

    // Built-in HTTP catalogue.
    let err = registry
        .instantiate("HttpError", args![429])
        .expect("seeded by Registry::new");
    println!("\n5. Catalogue: {err}");
    println!("   details:   {}", err.get("details").cloned().unwrap_or_default());

    Ok(())
}
