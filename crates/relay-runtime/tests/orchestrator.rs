//! Integration tests for `ToolOrchestrator::invoke`.

mod common;

use std::time::Duration;

use relay_runtime::{
    ChainConfig, InvokeOptions, RuntimeConfig, RuntimeError, MAX_SUMMARY_CHARS, TRUNCATION_MARKER,
};
use relay_types::{ExecutionStatus, Outcome, RelayEvent, ToolError};
use serde_json::json;

use common::default_orchestrator;

#[tokio::test]
async fn invoke_without_context_returns_outcome() {
    let orch = default_orchestrator();
    let outcome = orch
        .invoke("upper", json!("abc"), None, InvokeOptions::default())
        .await
        .expect("invoke");
    assert_eq!(outcome, Outcome::ok("ABC"));
}

#[tokio::test]
async fn success_is_audited() {
    let orch = default_orchestrator();
    let ctx = orch.root_context(None);
    orch.invoke("upper", json!("abc"), Some(&ctx), InvokeOptions::default())
        .await
        .unwrap();

    let entry = ctx.execution_log().last().expect("entry");
    assert_eq!(entry.tool_name, "upper");
    assert_eq!(entry.status, ExecutionStatus::Success);
    assert_eq!(entry.output_summary, "ABC");
    assert_eq!(entry.input_hash, relay_runtime::hash_input(&json!("abc")));
    assert_eq!(entry.depth, 0);
    assert!(entry.error_details.is_none());
}

#[tokio::test]
async fn unknown_tool_is_not_found() {
    let orch = default_orchestrator();
    let ctx = orch.root_context(None);
    let result = orch
        .invoke("missing", json!({}), Some(&ctx), InvokeOptions::default())
        .await;
    assert!(matches!(result, Err(RuntimeError::ToolNotFound { ref name }) if name == "missing"));
    assert_eq!(ctx.execution_log().last().unwrap().status, ExecutionStatus::Error);
}

#[tokio::test]
async fn invalid_arguments_fail_validation() {
    let orch = default_orchestrator();
    let result = orch
        .invoke("strict", json!({"text": 5}), None, InvokeOptions::default())
        .await;
    assert!(matches!(result, Err(RuntimeError::Validation { .. })));

    let ok = orch
        .invoke("strict", json!({"text": "fine"}), None, InvokeOptions::default())
        .await;
    assert!(ok.is_ok());
}

#[tokio::test]
async fn handler_failure_outcome_is_returned_not_raised() {
    let orch = default_orchestrator();
    let ctx = orch.root_context(None);
    let recovered = InvokeOptions::default()
        .with_recovery(|_e| async { Ok::<_, ToolError>(Outcome::ok("should not run")) });
    let outcome = orch
        .invoke("refuses", json!({}), Some(&ctx), recovered)
        .await
        .expect("returned failure is Ok");
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("nothing to do"));

    let entry = ctx.execution_log().last().unwrap();
    assert_eq!(entry.status, ExecutionStatus::Error);
    assert_eq!(entry.error_details.as_deref(), Some("nothing to do"));
}

#[tokio::test]
async fn raised_failure_propagates_without_recovery() {
    let orch = default_orchestrator();
    let result = orch
        .invoke("raises", json!({}), None, InvokeOptions::default())
        .await;
    match result {
        Err(RuntimeError::Handler { tool, message }) => {
            assert_eq!(tool, "raises");
            assert_eq!(message, "disk on fire");
        }
        other => panic!("expected handler error, got {other:?}"),
    }
}

#[tokio::test]
async fn recovery_replaces_raised_failure() {
    let orch = default_orchestrator();
    let ctx = orch.root_context(None);
    let options = InvokeOptions::default().with_recovery(|e| async move {
        Ok::<_, ToolError>(Outcome::ok(format!("recovered from: {e}")))
    });
    let outcome = orch
        .invoke("raises", json!({}), Some(&ctx), options)
        .await
        .expect("recovered");
    assert!(outcome.success);
    assert!(outcome.data.unwrap().as_str().unwrap().contains("disk on fire"));

    let entry = ctx.execution_log().last().unwrap();
    assert_eq!(entry.status, ExecutionStatus::Success);
    assert!(entry.error_details.unwrap().contains("disk on fire"));
    assert_eq!(orch.metrics().snapshot().recoveries, 1);
}

#[tokio::test]
async fn failing_recovery_surfaces_its_own_error() {
    let orch = default_orchestrator();
    let options = InvokeOptions::default()
        .with_recovery(|_e| async { Err::<Outcome, _>(ToolError::new("fallback also down")) });
    let result = orch.invoke("raises", json!({}), None, options).await;
    match result {
        Err(RuntimeError::Recovery { message, .. }) => assert_eq!(message, "fallback also down"),
        other => panic!("expected recovery error, got {other:?}"),
    }
}

#[tokio::test]
async fn panicking_handler_is_a_handler_failure() {
    let orch = default_orchestrator();
    let result = orch
        .invoke("panics", json!({}), None, InvokeOptions::default())
        .await;
    match result {
        Err(RuntimeError::Handler { message, .. }) => assert!(message.contains("blew up")),
        other => panic!("expected handler error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn slow_handler_times_out() {
    let orch = default_orchestrator();
    let ctx = orch.root_context(None);
    let options = InvokeOptions::default().with_timeout(Duration::from_millis(50));
    let result = orch.invoke("slow", json!({}), Some(&ctx), options).await;
    assert!(matches!(
        result,
        Err(RuntimeError::Timeout { timeout_ms: 50, .. })
    ));
    assert_eq!(orch.metrics().snapshot().timeouts, 1);
    assert_eq!(ctx.execution_log().last().unwrap().status, ExecutionStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn timeout_is_recoverable() {
    let orch = default_orchestrator();
    let options = InvokeOptions::default()
        .with_timeout(Duration::from_millis(10))
        .with_recovery(|_e| async { Ok::<_, ToolError>(Outcome::ok("cached copy")) });
    let outcome = orch.invoke("slow", json!({}), None, options).await.unwrap();
    assert_eq!(outcome, Outcome::ok("cached copy"));
}

#[tokio::test(start_paused = true)]
async fn chain_deadline_caps_call_timeout() {
    let config = RuntimeConfig {
        chain: ChainConfig {
            chain_timeout: Some(Duration::from_millis(100)),
            ..ChainConfig::default()
        },
        ..RuntimeConfig::default()
    };
    let orch = common::orchestrator(config);
    let ctx = orch.root_context(None);
    tokio::time::advance(Duration::from_millis(70)).await;

    let options = InvokeOptions::default().with_timeout(Duration::from_secs(5));
    let result = orch.invoke("slow", json!({}), Some(&ctx), options).await;
    assert!(matches!(
        result,
        Err(RuntimeError::Timeout { timeout_ms: 30, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn expired_chain_rejects_before_running() {
    let config = RuntimeConfig {
        chain: ChainConfig {
            chain_timeout: Some(Duration::from_millis(100)),
            ..ChainConfig::default()
        },
        ..RuntimeConfig::default()
    };
    let orch = common::orchestrator(config);
    let ctx = orch.root_context(Some("late-chain".into()));
    tokio::time::advance(Duration::from_millis(150)).await;

    let options = InvokeOptions::default()
        .with_recovery(|_e| async { Ok::<_, ToolError>(Outcome::ok("must not run")) });
    let result = orch.invoke("echo", json!(1), Some(&ctx), options).await;
    match result {
        Err(RuntimeError::ChainTimeout {
            chain_timeout_ms,
            snapshot,
            ..
        }) => {
            assert_eq!(chain_timeout_ms, 100);
            assert_eq!(snapshot.correlation_id, "late-chain");
        }
        other => panic!("expected chain timeout, got {other:?}"),
    }
    let entry = ctx.execution_log().last().expect("rejection is logged");
    assert_eq!(entry.status, ExecutionStatus::Error);
    assert_eq!(orch.metrics().snapshot().fatal_rejections, 1);
    assert_eq!(orch.metrics().snapshot().invocations, 0);
}

#[tokio::test]
async fn context_at_ceiling_is_rejected_and_not_recovered() {
    let orch = default_orchestrator();
    let mut ctx = orch.root_context(None);
    for _ in 0..orch.config().chain.max_depth {
        ctx = ctx.child(&common::name("echo")).unwrap();
    }
    let options = InvokeOptions::default()
        .with_recovery(|_e| async { Ok::<_, ToolError>(Outcome::ok("must not run")) });
    let result = orch.invoke("echo", json!(1), Some(&ctx), options).await;
    assert!(matches!(result, Err(RuntimeError::RecursionDepth { .. })));
    assert_eq!(ctx.execution_log().len(), 1);
}

#[tokio::test]
async fn runaway_recursion_reaches_the_root() {
    let orch = default_orchestrator();
    let ctx = orch.root_context(None);
    let options = InvokeOptions::default()
        .with_recovery(|_e| async { Ok::<_, ToolError>(Outcome::ok("must not run")) });
    let result = orch.invoke("loop", json!({}), Some(&ctx), options).await;
    match result {
        Err(RuntimeError::RecursionDepth {
            attempted_depth,
            max_depth,
            ..
        }) => {
            assert_eq!(attempted_depth, 5);
            assert_eq!(max_depth, 5);
        }
        other => panic!("expected recursion error, got {other:?}"),
    }
    // Five executed levels plus the rejected call at depth 5.
    let summary = ctx.summarize();
    assert_eq!(summary.tool_count, 6);
    assert_eq!(summary.error_count, 6);
    assert_eq!(summary.max_depth_reached, 5);
}

#[tokio::test]
async fn nested_call_runs_one_level_deeper() {
    let orch = default_orchestrator();
    let ctx = orch.root_context(None);
    let outcome = orch
        .invoke("forward_echo", json!({"v": 1}), Some(&ctx), InvokeOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.data, Some(json!({"v": 1})));

    let entries = ctx.execution_log().entries();
    assert_eq!(entries.len(), 2);
    // Completion order: the nested call settles first.
    assert_eq!(entries[0].tool_name, "echo");
    assert_eq!(entries[0].depth, 1);
    assert_eq!(entries[1].tool_name, "forward_echo");
    assert_eq!(entries[1].depth, 0);
}

#[tokio::test]
async fn listed_caller_is_authorized() {
    let orch = default_orchestrator();
    let ctx = orch.root_context(None);
    let outcome = orch
        .invoke("planner", json!("plan"), Some(&ctx), InvokeOptions::default())
        .await;
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn unlisted_caller_is_unauthorized() {
    let orch = default_orchestrator();
    let ctx = orch.root_context(None);
    let result = orch
        .invoke("intruder", json!("plan"), Some(&ctx), InvokeOptions::default())
        .await;
    assert!(matches!(result, Err(RuntimeError::Handler { .. })));

    let nested = &ctx.execution_log().entries()[0];
    assert_eq!(nested.tool_name, "for_planner");
    assert!(nested
        .error_details
        .as_deref()
        .unwrap()
        .contains("'intruder' is not permitted"));
}

#[tokio::test]
async fn chain_root_may_call_root_only_tool() {
    let orch = default_orchestrator();
    let ctx = orch.root_context(None);
    assert!(orch
        .invoke("root_only", json!(1), Some(&ctx), InvokeOptions::default())
        .await
        .is_ok());
    assert!(orch
        .invoke("calls_root_only", json!(1), Some(&ctx), InvokeOptions::default())
        .await
        .is_err());
}

#[tokio::test]
async fn long_output_summary_is_capped() {
    let orch = default_orchestrator();
    let ctx = orch.root_context(None);
    let outcome = orch
        .invoke("shouts", json!({}), Some(&ctx), InvokeOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.data.unwrap().as_str().unwrap().len(), 1000);

    let summary = ctx.execution_log().last().unwrap().output_summary;
    assert_eq!(summary.chars().count(), MAX_SUMMARY_CHARS + TRUNCATION_MARKER.len());
    assert!(summary.ends_with(TRUNCATION_MARKER));
}

#[tokio::test]
async fn events_follow_the_call() {
    let orch = default_orchestrator();
    let mut events = orch.subscribe();
    let ctx = orch.root_context(Some("evt".into()));
    orch.invoke("echo", json!(1), Some(&ctx), InvokeOptions::default())
        .await
        .unwrap();

    match events.recv().await.unwrap() {
        RelayEvent::InvocationStarted {
            tool,
            correlation_id,
            depth,
            ..
        } => {
            assert_eq!(tool, "echo");
            assert_eq!(correlation_id.as_deref(), Some("evt"));
            assert_eq!(depth, 0);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(matches!(
        events.recv().await.unwrap(),
        RelayEvent::InvocationCompleted {
            status: ExecutionStatus::Success,
            ..
        }
    ));
}
