//! Pipeline (task graph)
//!
//! A [`Pipeline`] owns the tasks of a build, resolves a requested target into
//! an [`ExecutionPlan`] and runs it sequentially with lifecycle hooks.
//!
//! ```rust,no_run
//! use shipwright_core::pipeline::Pipeline;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> shipwright_core::types::ShipwrightResult<()> {
//! let pipeline = Pipeline::builder()
//!     .with_task_executing(|task| println!("executing {}", task.name()))
//!     .with_task("build", |b| b.with_description("build"))
//!     .with_task("test", |b| b.with_dependency("build"))
//!     .build()?;
//!
//! pipeline.run("test", &CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use crate::execution::dependencies::{resolve_execution_plan, ExecutionPlan};
use crate::execution::runner::TaskRunner;
use crate::results::RunReport;
use crate::task::{Task, TaskBuilder};
use crate::types::{ShipwrightError, ShipwrightResult};

pub type SetupHook = Box<dyn Fn() -> ShipwrightResult<()> + Send + Sync>;
pub type TaskHook = Box<dyn Fn(&Task) + Send + Sync>;
pub type TaskFailedHook = Box<dyn Fn(&Task, &ShipwrightError) + Send + Sync>;

/// Optional callbacks invoked around a run
#[derive(Default)]
pub struct PipelineHooks {
    /// Runs once, before the first task
    pub setup: Option<SetupHook>,
    pub on_executing: Option<TaskHook>,
    pub on_executed: Option<TaskHook>,
    pub on_failed: Option<TaskFailedHook>,
}

#[derive(Default)]
pub struct Pipeline {
    tasks: HashMap<String, Task>,
    hooks: PipelineHooks,
}

impl Pipeline {
    pub fn new(hooks: PipelineHooks) -> Self {
        Self {
            tasks: HashMap::new(),
            hooks,
        }
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Add a task; names are unique and a second registration is rejected
    pub fn register(&mut self, task: Task) -> ShipwrightResult<()> {
        if self.tasks.contains_key(task.name()) {
            return Err(ShipwrightError::DuplicateTask(task.name().to_string()));
        }
        self.tasks.insert(task.name().to_string(), task);
        Ok(())
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// All tasks sorted by name
    pub fn tasks(&self) -> Vec<&Task> {
        let mut tasks: Vec<_> = self.tasks.values().collect();
        tasks.sort_by(|a, b| a.name().cmp(b.name()));
        tasks
    }

    pub fn resolve(&self, target: &str) -> ShipwrightResult<ExecutionPlan> {
        resolve_execution_plan(&self.tasks, target)
    }

    /// Resolve `target` and execute the plan
    ///
    /// Configuration errors surface before the setup hook or any task runs.
    pub async fn run(
        &self,
        target: &str,
        cancellation: &CancellationToken,
    ) -> ShipwrightResult<RunReport> {
        let plan = self.resolve(target)?;
        TaskRunner::new(&self.tasks, &self.hooks)
            .run_plan(&plan, cancellation)
            .await
    }
}

/// Fluent configuration for a [`Pipeline`]
#[derive(Default)]
pub struct PipelineBuilder {
    hooks: PipelineHooks,
    tasks: Vec<Task>,
}

impl PipelineBuilder {
    pub fn with_setup<F>(mut self, setup: F) -> Self
    where
        F: Fn() -> ShipwrightResult<()> + Send + Sync + 'static,
    {
        self.hooks.setup = Some(Box::new(setup));
        self
    }

    pub fn with_task_executing<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Task) + Send + Sync + 'static,
    {
        self.hooks.on_executing = Some(Box::new(hook));
        self
    }

    pub fn with_task_executed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Task) + Send + Sync + 'static,
    {
        self.hooks.on_executed = Some(Box::new(hook));
        self
    }

    pub fn with_task_failed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Task, &ShipwrightError) + Send + Sync + 'static,
    {
        self.hooks.on_failed = Some(Box::new(hook));
        self
    }

    pub fn with_task<F>(mut self, name: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(TaskBuilder) -> TaskBuilder,
    {
        self.tasks.push(configure(TaskBuilder::new(name)).build());
        self
    }

    pub fn with_built_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Register every task; fails on the first duplicate name
    pub fn build(self) -> ShipwrightResult<Pipeline> {
        let mut pipeline = Pipeline::new(self.hooks);
        for task in self.tasks {
            pipeline.register(task)?;
        }
        Ok(pipeline)
    }
}
