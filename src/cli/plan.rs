use crate::manifest;
use anyhow::{Context, Result};
use std::path::Path;
use switchyard_core::{DependencyAnalyzer, ResourceRegistry};

/// Print parallel levels and the flattened order for a task file.
///
/// Tasks without a `dependencies` key take them from the registry record
/// with the same namespace.
pub fn run(registry: &ResourceRegistry, tasks_path: &Path) -> Result<()> {
    let tasks = manifest::load_tasks(tasks_path)?;
    let analyzer = DependencyAnalyzer::with_registry(registry);

    let stats = analyzer.analyze(&tasks);
    println!(
        "📋 {} task(s), {} edge(s), {} independent",
        stats.total_tasks, stats.total_edges, stats.independent_count
    );

    for warning in analyzer.validate_dependencies(&tasks) {
        println!("⚠️  {}", warning);
    }

    let levels = analyzer
        .group_parallel_tasks(&tasks)
        .context("Cannot plan task file")?;
    for (index, level) in levels.iter().enumerate() {
        let ids: Vec<&str> = level.iter().map(|t| t.id.as_str()).collect();
        println!("Level {}: {}", index, ids.join(", "));
    }

    let order = analyzer.execution_order(&tasks)?;
    println!("Order: {}", order.join(" → "));
    Ok(())
}
