//! Task execution module
//!
//! This module handles the actual execution of tasks including dependency
//! resolution, the sequential run loop, external command execution and the
//! retry policy used around individual publish calls.

pub mod command;
pub mod dependencies;
pub mod retry;
pub mod runner;

pub use command::{CommandOutput, CommandRunner, ShellCommandRunner};
pub use dependencies::{resolve_execution_plan, ExecutionPlan};
pub use retry::{Backoff, RetryExhausted, RetryPolicy};
pub use runner::TaskRunner;
