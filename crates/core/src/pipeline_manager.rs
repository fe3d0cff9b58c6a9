//! High-level pipeline management interface
//!
//! This module provides the [`PipelineManager`] which serves as the primary
//! interface for the CLI. It loads the pipeline file, turns every task
//! declaration into a [`Task`] with the matching action, wires the console
//! hooks and exposes listing, planning and running.
//!
//! ## Example
//!
//! ```rust,no_run
//! use shipwright_core::configs::settings::{RunArgs, RunSettings};
//! use shipwright_core::pipeline_manager::{PipelineManager, PipelineManagerConfig};
//! use std::path::PathBuf;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> shipwright_core::types::ShipwrightResult<()> {
//! let settings = RunSettings::from_env(RunArgs::default());
//! let manager = PipelineManager::new(PipelineManagerConfig {
//!     workspace_root: PathBuf::from("."),
//!     pipeline_file: None,
//!     settings,
//! })?;
//!
//! let plan = manager.get_execution_plan("Default")?;
//! manager.run_task("Default", &CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::configs::settings::RunSettings;
use crate::configs::tasks::{parse_pipeline_config, PipelineFileConfig, SetupConfig, TaskConfig};
use crate::console::{Console, LogFormat};
use crate::execution::command::{CommandRunner, ShellCommandRunner};
use crate::execution::dependencies::ExecutionPlan;
use crate::pipeline::{Pipeline, PipelineBuilder};
use crate::publish::PackagePublisher;
use crate::results::{RunReport, TaskInfo, TaskListResult};
use crate::task::Task;
use crate::types::{ShipwrightError, ShipwrightResult};

pub const DEFAULT_PIPELINE_FILE: &str = "shipwright.yml";

/// High-level manager owning a loaded pipeline
pub struct PipelineManager {
    pub root: PathBuf,
    pub config: PipelineFileConfig,
    pub settings: RunSettings,
    pipeline: Pipeline,
}

/// Configuration for initializing a pipeline manager
pub struct PipelineManagerConfig {
    pub workspace_root: PathBuf,
    /// Defaults to `shipwright.yml` in the workspace root
    pub pipeline_file: Option<PathBuf>,
    pub settings: RunSettings,
}

impl PipelineManager {
    /// Load the pipeline file and run external commands through the shell
    pub fn new(config: PipelineManagerConfig) -> ShipwrightResult<Self> {
        let console = Console::new(LogFormat::detect(config.settings.ci));
        let mut runner = ShellCommandRunner::new(&config.workspace_root, console);
        for secret in [&config.settings.api_key, &config.settings.environment_api_key]
            .into_iter()
            .flatten()
        {
            runner = runner.with_redacted(secret);
        }
        Self::with_runner(config, Arc::new(runner), console)
    }

    /// Load the pipeline file with a custom command runner
    pub fn with_runner(
        config: PipelineManagerConfig,
        runner: Arc<dyn CommandRunner>,
        console: Console,
    ) -> ShipwrightResult<Self> {
        let pipeline_path = config
            .pipeline_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PIPELINE_FILE));
        let pipeline_path = if pipeline_path.is_relative() {
            config.workspace_root.join(pipeline_path)
        } else {
            pipeline_path
        };

        let file_config = Self::load_pipeline_config(&pipeline_path)?;
        Self::from_config(
            config.workspace_root,
            file_config,
            config.settings,
            runner,
            console,
        )
    }

    /// Build a manager from an already parsed pipeline configuration
    pub fn from_config(
        root: PathBuf,
        config: PipelineFileConfig,
        settings: RunSettings,
        runner: Arc<dyn CommandRunner>,
        console: Console,
    ) -> ShipwrightResult<Self> {
        let pipeline = Self::build_pipeline(&root, &config, &settings, runner, console)?;
        debug!(tasks = config.tasks.len(), "pipeline loaded");

        Ok(Self {
            root,
            config,
            settings,
            pipeline,
        })
    }

    /// List all declared tasks
    pub fn list_tasks(&self) -> TaskListResult {
        TaskListResult {
            pipeline_name: self.config.name.clone(),
            tasks: self.pipeline.tasks().into_iter().map(TaskInfo::from).collect(),
        }
    }

    /// Get the execution plan for a target without running it
    pub fn get_execution_plan(&self, target: &str) -> ShipwrightResult<ExecutionPlan> {
        self.pipeline.resolve(target)
    }

    /// Resolve and run a target
    pub async fn run_task(
        &self,
        target: &str,
        cancellation: &CancellationToken,
    ) -> ShipwrightResult<RunReport> {
        info!(requested = target, "running pipeline");
        self.pipeline.run(target, cancellation).await
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    // Private helper methods

    fn load_pipeline_config(path: &Path) -> ShipwrightResult<PipelineFileConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ShipwrightError::Config(format!(
                "Failed to read pipeline file {}: {}",
                path.display(),
                e
            ))
        })?;

        parse_pipeline_config(&content).map_err(|e| match e {
            ShipwrightError::Config(message) => ShipwrightError::Config(format!(
                "Invalid pipeline file {}: {}",
                path.display(),
                message
            )),
            other => ShipwrightError::Config(format!(
                "Failed to parse pipeline file {}: {}",
                path.display(),
                other
            )),
        })
    }

    fn build_pipeline(
        root: &Path,
        config: &PipelineFileConfig,
        settings: &RunSettings,
        runner: Arc<dyn CommandRunner>,
        console: Console,
    ) -> ShipwrightResult<Pipeline> {
        let mut builder = PipelineBuilder::default()
            .with_task_executing(move |task| console.task_executing(task))
            .with_task_executed(move |task| console.task_executed(task))
            .with_task_failed(move |task, _| console.task_failed(task.name()));

        if let Some(setup) = &config.setup {
            builder = builder.with_setup(clean_hook(root, setup));
        }

        for task_config in &config.tasks {
            builder = builder.with_built_task(Self::build_task(
                root,
                task_config,
                settings,
                runner.clone(),
                console,
            ));
        }

        builder.build()
    }

    fn build_task(
        root: &Path,
        task_config: &TaskConfig,
        settings: &RunSettings,
        runner: Arc<dyn CommandRunner>,
        console: Console,
    ) -> Task {
        let mut builder = Task::builder(&task_config.name)
            .with_dependencies(task_config.dependencies.iter().flatten().cloned());
        if let Some(description) = &task_config.description {
            builder = builder.with_description(description);
        }

        let commands = Arc::new(task_config.command_lines(settings.ci));
        let publisher = task_config.package.clone().map(|package| {
            Arc::new(PackagePublisher::new(
                runner.clone(),
                package,
                root,
                settings.release_inputs(),
                console,
            ))
        });

        if commands.is_empty() && publisher.is_none() {
            return builder.build();
        }

        builder
            .with_execution(move |cancellation| {
                let commands = commands.clone();
                let runner = runner.clone();
                let publisher = publisher.clone();
                async move {
                    for command in commands.iter() {
                        runner.run_checked(command, &cancellation).await?;
                    }
                    if let Some(publisher) = publisher {
                        publisher.run(&cancellation).await?;
                    }
                    Ok(())
                }
            })
            .build()
    }
}

fn clean_hook(
    root: &Path,
    setup: &SetupConfig,
) -> impl Fn() -> ShipwrightResult<()> + Send + Sync + 'static {
    let directories: Vec<PathBuf> = setup
        .clean
        .iter()
        .flatten()
        .map(|dir| root.join(dir))
        .collect();

    move || {
        for directory in &directories {
            if directory.exists() {
                debug!(directory = %directory.display(), "removing previous artifacts");
                std::fs::remove_dir_all(directory)?;
            }
        }
        Ok(())
    }
}
