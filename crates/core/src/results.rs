//! Result types for pipeline operations
//!
//! This module contains the result types returned by pipeline manager
//! operations, providing a centralized location for output structures.

use std::time::Duration;

use colored::Color;
use serde::Serialize;

use crate::console::get_task_color;
use crate::task::Task;

/// Summary of a declared task
#[derive(Debug, Clone, Serialize)]
pub struct TaskInfo {
    pub name: String,
    pub description: String,
    pub dependencies: Vec<String>,
}

impl TaskInfo {
    pub fn color(&self) -> Color {
        get_task_color(&self.name)
    }
}

impl From<&Task> for TaskInfo {
    fn from(task: &Task) -> Self {
        Self {
            name: task.name().to_string(),
            description: task.description().to_string(),
            dependencies: task.dependencies().to_vec(),
        }
    }
}

/// Result of listing the tasks of a pipeline
#[derive(Debug)]
pub struct TaskListResult {
    pub pipeline_name: Option<String>,
    pub tasks: Vec<TaskInfo>,
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub target: String,
    /// Task names in the order they completed
    pub completed: Vec<String>,
    pub duration: Duration,
}
