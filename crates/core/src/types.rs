use thiserror::Error;

/// The main error type for Shipwright operations
#[derive(Debug, Error)]
pub enum ShipwrightError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{}", unknown_task_message(.name, .required_by.as_deref()))]
    UnknownTask {
        name: String,
        required_by: Option<String>,
    },

    #[error("Circular dependency detected: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("Task '{0}' is already registered")]
    DuplicateTask(String),

    #[error("Task '{task}' ({description}) failed: {source}")]
    TaskExecution {
        task: String,
        description: String,
        /// Tasks that finished successfully before the failure
        completed: Vec<String>,
        #[source]
        source: Box<ShipwrightError>,
    },

    #[error("Command '{command}' failed with exit code {exit_code}")]
    CommandFailed { command: String, exit_code: i32 },

    #[error("Publishing '{artifact}' failed after {attempts} attempt(s): {source}")]
    TransientPublish {
        artifact: String,
        attempts: u32,
        #[source]
        source: Box<ShipwrightError>,
    },

    #[error("Run cancelled")]
    Cancelled { completed: Vec<String> },
}

impl ShipwrightError {
    /// Tasks that completed before this error stopped the run, if the error came from a run
    pub fn completed_tasks(&self) -> &[String] {
        match self {
            ShipwrightError::TaskExecution { completed, .. }
            | ShipwrightError::Cancelled { completed } => completed,
            _ => &[],
        }
    }

    /// Whether the error is a configuration problem detected before any task ran
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ShipwrightError::Config(_)
                | ShipwrightError::Yaml(_)
                | ShipwrightError::UnknownTask { .. }
                | ShipwrightError::Cycle { .. }
                | ShipwrightError::DuplicateTask(_)
        )
    }
}

fn unknown_task_message(name: &str, required_by: Option<&str>) -> String {
    match required_by {
        Some(parent) => format!("Dependency '{}' not found for task '{}'", name, parent),
        None => format!("Task '{}' not found", name),
    }
}

/// Result type alias for Shipwright operations
pub type ShipwrightResult<T> = Result<T, ShipwrightError>;
