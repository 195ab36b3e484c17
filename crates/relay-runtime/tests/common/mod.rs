//! Shared fixtures for relay-runtime integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use relay_registry::{policy_from_list, JsonSchemaInput, ToolRegistration};
use relay_runtime::{
    handler_fn, Registry, RuntimeConfig, ToolContext, ToolHandler, ToolOrchestrator,
};
use relay_types::{Outcome, ToolError, ToolName};
use serde_json::{json, Value};

pub fn name(s: &str) -> ToolName {
    ToolName::new(s).expect("valid tool name")
}

/// Registration callable from the chain root and from any tool.
pub fn open(tool: &str) -> ToolRegistration {
    ToolRegistration::new(name(tool), format!("{tool} test tool"))
        .with_policy(policy_from_list(["*"]))
}

pub fn echo() -> Arc<dyn ToolHandler> {
    handler_fn(|args: Value, _ctx: ToolContext| async move { Ok(Outcome::ok(args)) })
}

pub fn upper() -> Arc<dyn ToolHandler> {
    handler_fn(|args: Value, _ctx: ToolContext| async move {
        match args.as_str() {
            Some(text) => Ok(Outcome::ok(text.to_uppercase())),
            None => Err(ToolError::new("expected a string")),
        }
    })
}

/// Returns `success: false` without raising.
pub fn refuses() -> Arc<dyn ToolHandler> {
    handler_fn(|_args: Value, _ctx: ToolContext| async move {
        Ok(Outcome::failure("nothing to do"))
    })
}

/// Raises a handler error.
pub fn raises() -> Arc<dyn ToolHandler> {
    handler_fn(|_args: Value, _ctx: ToolContext| async move {
        Err(ToolError::new("disk on fire"))
    })
}

pub fn sleeps(duration: Duration) -> Arc<dyn ToolHandler> {
    handler_fn(move |_args: Value, _ctx: ToolContext| async move {
        tokio::time::sleep(duration).await;
        Ok(Outcome::ok("late"))
    })
}

/// Counts executions and takes a little time so calls overlap.
pub fn counting(counter: Arc<AtomicUsize>) -> Arc<dyn ToolHandler> {
    handler_fn(move |args: Value, _ctx: ToolContext| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(Outcome::ok(args))
        }
    })
}

/// Calls `target` with its own arguments as a nested call.
pub fn forwards(target: &'static str) -> Arc<dyn ToolHandler> {
    handler_fn(move |args: Value, ctx: ToolContext| async move {
        ctx.invoke(target, args, Default::default())
            .await
            .map_err(ToolError::from)
    })
}

/// Calls itself forever.
pub fn recurses(own_name: &'static str) -> Arc<dyn ToolHandler> {
    forwards(own_name)
}

pub fn schema_tool(tool: &str) -> ToolRegistration {
    let schema = JsonSchemaInput::new(json!({
        "type": "object",
        "required": ["text"],
        "properties": {"text": {"type": "string"}}
    }))
    .expect("valid schema");
    open(tool).with_schema(schema)
}

/// Orchestrator with the usual fixtures registered under their own names.
pub fn orchestrator(config: RuntimeConfig) -> ToolOrchestrator {
    let mut registry = Registry::new();
    let tools: Vec<(ToolRegistration, Arc<dyn ToolHandler>)> = vec![
        (open("echo"), echo()),
        (open("upper"), upper()),
        (open("refuses"), refuses()),
        (open("raises"), raises()),
        (open("slow"), sleeps(Duration::from_secs(10))),
        (open("forward_echo"), forwards("echo")),
        (open("loop"), recurses("loop")),
        (schema_tool("strict"), echo()),
        (
            ToolRegistration::new(name("root_only"), "callable only at chain root"),
            echo(),
        ),
        (open("calls_root_only"), forwards("root_only")),
        (
            ToolRegistration::new(name("for_planner"), "callable by planner")
                .with_policy(policy_from_list(["planner"])),
            echo(),
        ),
        (open("planner"), forwards("for_planner")),
        (open("intruder"), forwards("for_planner")),
        (
            open("shouts"),
            handler_fn(|_args: Value, _ctx: ToolContext| async move {
                Ok(Outcome::ok("x".repeat(1000)))
            }),
        ),
        (
            open("panics"),
            handler_fn(|_args: Value, _ctx: ToolContext| async move {
                if true {
                    panic!("handler blew up");
                }
                Ok(Outcome::empty())
            }),
        ),
    ];
    for (registration, handler) in tools {
        registry.register(registration, handler).expect("unique names");
    }
    ToolOrchestrator::new(registry, config)
}

pub fn default_orchestrator() -> ToolOrchestrator {
    orchestrator(RuntimeConfig::default())
}
