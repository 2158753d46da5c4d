//! Best-effort trigger command execution.
//!
//! The trigger is a notification, not part of the publish transaction: a
//! non-zero exit or launch failure is logged and never rolls back the
//! already-published output.

use std::process::Command;

use sockgen_core::command::split_command;

/// Outcome of a trigger invocation, for cycle reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// No command configured, or the command tokenized to nothing.
    Skipped,
    /// The command ran and exited zero.
    Completed,
    /// The command failed to launch or exited non-zero.
    Failed,
}

/// Tokenize and run `command_line` with inherited stdio, waiting for it to
/// finish.
pub fn run_trigger(command_line: &str) -> TriggerOutcome {
    let (program, args) = split_command(command_line);
    if program.is_empty() {
        tracing::warn!("trigger command is empty, skipping");
        return TriggerOutcome::Skipped;
    }

    match Command::new(&program).args(&args).status() {
        Ok(status) if status.success() => {
            tracing::info!(command = command_line, "trigger completed");
            TriggerOutcome::Completed
        }
        Ok(status) => {
            tracing::error!(command = command_line, %status, "trigger exited non-zero");
            TriggerOutcome::Failed
        }
        Err(err) => {
            tracing::error!(command = command_line, error = %err, "failed to run trigger");
            TriggerOutcome::Failed
        }
    }
}
