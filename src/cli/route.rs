use crate::config::AppConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use switchyard_core::{
    ExecutionContext, ExecutionRouter, ExecutorSet, ResourceExecutor, ResourceRegistry,
    ResourceType,
};

/// Executor that answers with the request and the resource that handled it
struct EchoExecutor;

#[async_trait]
impl ResourceExecutor for EchoExecutor {
    async fn execute(
        &self,
        request: &Value,
        context: &ExecutionContext,
    ) -> std::result::Result<Value, String> {
        Ok(json!({
            "namespace": context.record.namespace,
            "type": context.namespace.kind,
            "attempt": context.attempt,
            "request": request,
        }))
    }
}

fn echo_router(registry: ResourceRegistry, config: &AppConfig) -> Result<ExecutionRouter> {
    let echo: Arc<dyn ResourceExecutor> = Arc::new(EchoExecutor);
    let executors = ResourceType::ALL
        .into_iter()
        .fold(ExecutorSet::new(), |set, kind| set.with_executor(kind, echo.clone()));
    ExecutionRouter::new(registry.into_shared(), executors)
        .with_config(config.router.clone())
        .context("Invalid router configuration")
}

pub async fn check(
    registry: ResourceRegistry,
    config: &AppConfig,
    candidates: &[String],
) -> Result<()> {
    let router = echo_router(registry, config)?;
    let reports = router.check_candidates(candidates).await;

    for report in &reports {
        match &report.reason {
            None => println!(
                "✅ {} → {}",
                report.candidate,
                report.namespace.as_deref().unwrap_or("?")
            ),
            Some(reason) => println!("❌ {} ({})", report.candidate, reason),
        }
    }

    match reports.iter().find(|r| r.is_available()) {
        Some(first) => println!("\nWould route to {}", first.candidate),
        None => println!("\nNo candidate is available"),
    }
    Ok(())
}

pub async fn route(
    registry: ResourceRegistry,
    config: &AppConfig,
    candidates: &[String],
    request: &str,
) -> Result<()> {
    let request: Value = serde_json::from_str(request).context("Request must be valid JSON")?;
    let router = echo_router(registry, config)?;

    let result = router.route(candidates, &request).await?;
    for attempt in &result.attempts {
        println!("↪ skipped {} ({})", attempt.namespace, attempt.reason);
    }
    println!("{}", serde_json::to_string_pretty(&result.output)?);
    Ok(())
}
