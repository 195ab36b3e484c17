//! Output formatting for CLI responses.

use relay_runtime::{ChainContext, RuntimeError};
use relay_types::{DiagnosticError, ExecutionStatus, Outcome};

/// Prints a success message.
pub fn print_success(message: &str) {
    println!("[OK] {message}");
}

/// Prints an error message.
pub fn print_error(message: &str) {
    eprintln!("[ERROR] {message}");
}

/// Prints an outcome as pretty JSON, or its error line when it failed.
pub fn print_outcome(outcome: &Outcome) -> anyhow::Result<()> {
    if outcome.success {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        print_error(outcome.error.as_deref().unwrap_or("tool reported failure"));
    }
    Ok(())
}

/// Prints a runtime error with its cause and fix, when known.
pub fn print_failure(err: &RuntimeError) {
    print_error(&err.to_string());
    if let Some(hint) = err.hint() {
        eprintln!("\n  Cause: {hint}");
    }
    if let Some(fix) = err.fix() {
        eprintln!("  Fix:   {fix}\n");
    }
}

/// Prints the chain summary and, optionally, every log entry.
pub fn print_chain(ctx: &ChainContext, with_log: bool) {
    let s = ctx.summarize();
    eprintln!();
    eprintln!("Chain {}", s.correlation_id);
    eprintln!("{}", "─".repeat(40));
    eprintln!(
        "  Calls      : {} ({} ok, {} failed, {} deduplicated)",
        s.tool_count, s.success_count, s.error_count, s.skipped_count
    );
    eprintln!("  Handler ms : {}", s.total_duration_ms);
    eprintln!("  Max depth  : {}", s.max_depth_reached);

    if with_log {
        eprintln!();
        for entry in ctx.execution_log().entries() {
            let mark = match entry.status {
                ExecutionStatus::Success => "ok",
                ExecutionStatus::Error => "err",
                ExecutionStatus::Skipped => "dup",
            };
            eprintln!(
                "  [{mark:>3}] {indent}{} ({} ms) {}",
                entry.tool_name,
                entry.duration_ms,
                entry.error_details.as_deref().unwrap_or(&entry.output_summary),
                indent = "  ".repeat(entry.depth as usize),
            );
        }
    }
}
