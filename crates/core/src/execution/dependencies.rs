//! Task dependency management
//!
//! This module resolves a requested target into an ordered, deduplicated
//! [`ExecutionPlan`] using a depth-first traversal that visits every
//! dependency before the task that needs it.

use std::collections::HashMap;

use serde::Serialize;

use crate::task::Task;
use crate::types::{ShipwrightError, ShipwrightResult};

/// Ordered task names; every task appears after all of its dependencies, exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    pub target: String,
    pub tasks: Vec<String>,
}

impl ExecutionPlan {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn position(&self, task: &str) -> Option<usize> {
        self.tasks.iter().position(|name| name == task)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Done,
}

/// Resolve the execution order for `target`
///
/// Fails with [`ShipwrightError::UnknownTask`] when the target or any
/// transitive dependency is missing and with [`ShipwrightError::Cycle`] when
/// a task can reach itself. No partial plan is returned on failure.
pub fn resolve_execution_plan(
    tasks: &HashMap<String, Task>,
    target: &str,
) -> ShipwrightResult<ExecutionPlan> {
    if !tasks.contains_key(target) {
        return Err(ShipwrightError::UnknownTask {
            name: target.to_string(),
            required_by: None,
        });
    }

    let mut states: HashMap<&str, VisitState> = HashMap::new();
    let mut path: Vec<&str> = Vec::new();
    let mut order = Vec::new();

    visit(tasks, target, &mut states, &mut path, &mut order)?;

    tracing::debug!(requested = target, plan = ?order, "resolved execution plan");

    Ok(ExecutionPlan {
        target: target.to_string(),
        tasks: order,
    })
}

fn visit<'a>(
    tasks: &'a HashMap<String, Task>,
    name: &'a str,
    states: &mut HashMap<&'a str, VisitState>,
    path: &mut Vec<&'a str>,
    order: &mut Vec<String>,
) -> ShipwrightResult<()> {
    match states.get(name) {
        Some(VisitState::Done) => return Ok(()),
        Some(VisitState::InProgress) => {
            let start = path.iter().position(|entry| *entry == name).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(|s| s.to_string()).collect();
            cycle.push(name.to_string());
            return Err(ShipwrightError::Cycle { path: cycle });
        }
        None => {}
    }

    let task = tasks.get(name).ok_or_else(|| ShipwrightError::UnknownTask {
        name: name.to_string(),
        required_by: path.last().map(|parent| parent.to_string()),
    })?;

    states.insert(name, VisitState::InProgress);
    path.push(name);

    for dependency in task.dependencies() {
        visit(tasks, dependency, states, path, order)?;
    }

    path.pop();
    states.insert(name, VisitState::Done);
    order.push(name.to_string());
    Ok(())
}
