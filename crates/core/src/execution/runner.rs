//! Sequential task runner
//!
//! Executes an [`ExecutionPlan`] one task at a time: the setup hook runs once,
//! then every task is bracketed by the executing/executed hooks. The first
//! failure stops the run. Cancellation is checked at every task boundary.

use std::collections::HashMap;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::execution::dependencies::ExecutionPlan;
use crate::pipeline::PipelineHooks;
use crate::results::RunReport;
use crate::task::Task;
use crate::types::{ShipwrightError, ShipwrightResult};

pub struct TaskRunner<'a> {
    tasks: &'a HashMap<String, Task>,
    hooks: &'a PipelineHooks,
}

impl<'a> TaskRunner<'a> {
    pub fn new(tasks: &'a HashMap<String, Task>, hooks: &'a PipelineHooks) -> Self {
        Self { tasks, hooks }
    }

    pub async fn run_plan(
        &self,
        plan: &ExecutionPlan,
        cancellation: &CancellationToken,
    ) -> ShipwrightResult<RunReport> {
        let started = Instant::now();
        let mut completed: Vec<String> = Vec::with_capacity(plan.len());

        if cancellation.is_cancelled() {
            return Err(ShipwrightError::Cancelled { completed });
        }

        if let Some(setup) = &self.hooks.setup {
            debug!("running setup hook");
            setup()?;
        }

        for name in &plan.tasks {
            if cancellation.is_cancelled() {
                info!(completed = completed.len(), "run cancelled between tasks");
                return Err(ShipwrightError::Cancelled { completed });
            }

            // Plans come from the same task map, a miss means the caller mixed pipelines
            let task = self.tasks.get(name).ok_or_else(|| ShipwrightError::UnknownTask {
                name: name.clone(),
                required_by: None,
            })?;

            if let Some(hook) = &self.hooks.on_executing {
                hook(task);
            }

            let task_started = Instant::now();
            if let Err(error) = task.execute(cancellation.child_token()).await {
                if let Some(hook) = &self.hooks.on_failed {
                    hook(task, &error);
                }
                if matches!(error, ShipwrightError::Cancelled { .. }) {
                    return Err(ShipwrightError::Cancelled { completed });
                }
                return Err(ShipwrightError::TaskExecution {
                    task: task.name().to_string(),
                    description: task.description().to_string(),
                    completed,
                    source: Box::new(error),
                });
            }
            debug!(task = name.as_str(), elapsed = ?task_started.elapsed(), "task completed");

            if let Some(hook) = &self.hooks.on_executed {
                hook(task);
            }
            completed.push(name.clone());
        }

        Ok(RunReport {
            target: plan.target.clone(),
            completed,
            duration: started.elapsed(),
        })
    }
}
