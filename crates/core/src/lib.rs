//! Shipwright Core Library
//!
//! This is the core library for the Shipwright build orchestrator. It provides
//! the task graph, the sequential runner, the release policy and the retrying
//! publish workflow used by the CLI.
//!
//! ## Architecture
//!
//! The core library is organized into several modules:
//!
//! - [`pipeline_manager`] - High-level interface loading a pipeline file
//! - [`pipeline`] - Task registration, plan resolution and lifecycle hooks
//! - [`task`] - Task definitions and the fluent task builder
//! - [`execution`] - Dependency resolution, run loop, commands and retries
//! - [`release`] - Channel, version and publish eligibility decisions
//! - [`publish`] - Pack and push workflow for package tasks
//! - [`configs`] - Pipeline file and run settings
//! - [`console`] - Task banners and CI log formatting
//! - [`results`] - Result types for pipeline operations
//! - [`types`] - Common error types and type aliases
//!
//! ## Usage
//!
//! Pipelines can be declared in code with the [`Pipeline`] builder:
//!
//! ```rust,no_run
//! use shipwright_core::Pipeline;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> shipwright_core::ShipwrightResult<()> {
//! let pipeline = Pipeline::builder()
//!     .with_setup(|| Ok(()))
//!     .with_task("build", |b| b.with_description("build").with_execution(|_| async { Ok(()) }))
//!     .with_task("Default", |b| b.with_dependency("build"))
//!     .build()?;
//!
//! let report = pipeline.run("Default", &CancellationToken::new()).await?;
//! assert_eq!(report.completed, ["build", "Default"]);
//! # Ok(())
//! # }
//! ```

pub mod configs;
pub mod console;
pub mod execution;
pub mod pipeline;
pub mod pipeline_manager;
pub mod publish;
pub mod release;
pub mod results;
pub mod task;
pub mod types;

// Re-export the main types for easier usage
pub use pipeline::Pipeline;
pub use pipeline_manager::{PipelineManager, PipelineManagerConfig};
pub use task::Task;
pub use types::{ShipwrightError, ShipwrightResult};
