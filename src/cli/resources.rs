use anyhow::Result;
use switchyard_core::{ResourceFilter, ResourceRegistry, ResourceType};

pub fn list(
    registry: &ResourceRegistry,
    resource_type: Option<ResourceType>,
    source: Option<String>,
    enabled_only: bool,
) -> Result<()> {
    let mut filter = ResourceFilter::new();
    if let Some(kind) = resource_type {
        filter = filter.with_type(kind);
    }
    if let Some(source) = source {
        filter = filter.with_source(source);
    }
    if enabled_only {
        filter = filter.enabled_only();
    }

    let records = registry.list(&filter);
    if records.is_empty() {
        println!("No resources registered.");
        return Ok(());
    }

    println!(
        "{:<32} {:<8} {:>8}  {:<10} {}",
        "NAMESPACE", "TYPE", "PRIORITY", "SOURCE", "STATUS"
    );
    for record in records {
        let status = if record.enabled { "enabled" } else { "disabled" };
        println!(
            "{:<32} {:<8} {:>8}  {:<10} {}",
            record.namespace, record.resource_type, record.priority, record.source, status
        );
        if record.has_dependencies() {
            println!("  └─ depends on: {}", record.dependencies.join(", "));
        }
    }
    Ok(())
}

pub fn inspect(registry: &ResourceRegistry) -> Result<()> {
    let stats = registry.stats();
    println!("🔎 Registry\n");
    println!("Resources: {} ({} enabled)", stats.total, stats.enabled);
    for (kind, count) in &stats.by_type {
        println!("  {:<8} {}", kind, count);
    }
    println!("Sources:");
    for (source, count) in &stats.by_source {
        println!("  {:<10} {}", source, count);
    }
    println!("With dependencies: {}\n", stats.with_dependencies);

    let missing = registry.validate_dependencies();
    if missing.is_empty() {
        println!("✅ All dependencies registered");
    } else {
        println!("⚠️  {} missing dependencies:", missing.len());
        for line in &missing {
            println!("  - {}", line);
        }
    }

    let cycles = registry.check_circular_dependency();
    if cycles.is_empty() {
        println!("✅ No dependency cycles");
    } else {
        println!("❌ {} dependency cycle(s):", cycles.len());
        for cycle in &cycles {
            let mut members = cycle.clone();
            if let Some(first) = cycle.first() {
                members.push(first.clone());
            }
            println!("  - {}", members.join(" -> "));
        }
    }
    Ok(())
}
