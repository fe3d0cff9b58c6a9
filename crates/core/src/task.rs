//! Task definitions
//!
//! A [`Task`] is a named unit of work with a description, the names of the
//! tasks it depends on, and an asynchronous action. Tasks are assembled with a
//! [`TaskBuilder`] and registered on a [`crate::pipeline::Pipeline`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::types::ShipwrightResult;

/// Boxed future returned by a task action
pub type TaskFuture = Pin<Box<dyn Future<Output = ShipwrightResult<()>> + Send + 'static>>;

/// Asynchronous, cancellable task body
pub type TaskAction = Arc<dyn Fn(CancellationToken) -> TaskFuture + Send + Sync>;

/// A named unit of work in a pipeline
#[derive(Clone)]
pub struct Task {
    name: String,
    description: String,
    dependencies: Vec<String>,
    action: Option<TaskAction>,
}

impl Task {
    pub fn builder(name: impl Into<String>) -> TaskBuilder {
        TaskBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable label; falls back to the task name when none was given
    pub fn description(&self) -> &str {
        if self.description.is_empty() {
            &self.name
        } else {
            &self.description
        }
    }

    /// Dependency names in declaration order, without duplicates
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Run the task action. Tasks without an action only aggregate their dependencies.
    pub async fn execute(&self, cancellation: CancellationToken) -> ShipwrightResult<()> {
        match &self.action {
            Some(action) => action(cancellation).await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("dependencies", &self.dependencies)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

/// Fluent builder for [`Task`]
pub struct TaskBuilder {
    name: String,
    description: String,
    dependencies: Vec<String>,
    action: Option<TaskAction>,
}

impl TaskBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            dependencies: Vec::new(),
            action: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        let dependency = dependency.into();
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency);
        }
        self
    }

    pub fn with_dependencies<I, S>(self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        dependencies
            .into_iter()
            .fold(self, |builder, dependency| builder.with_dependency(dependency))
    }

    pub fn with_execution<F, Fut>(mut self, action: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ShipwrightResult<()>> + Send + 'static,
    {
        let action: TaskAction =
            Arc::new(move |token: CancellationToken| -> TaskFuture { Box::pin(action(token)) });
        self.action = Some(action);
        self
    }

    pub fn build(self) -> Task {
        Task {
            name: self.name,
            description: self.description,
            dependencies: self.dependencies,
            action: self.action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShipwrightError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_dependencies_are_deduplicated_in_order() {
        let task = Task::builder("pack")
            .with_dependency("build")
            .with_dependencies(["test", "build"])
            .build();
        assert_eq!(task.dependencies(), ["build", "test"]);
    }

    #[test]
    fn test_description_falls_back_to_name() {
        let task = Task::builder("Default").build();
        assert_eq!(task.description(), "Default");

        let task = Task::builder("test").with_description("dotnet test").build();
        assert_eq!(task.description(), "dotnet test");
    }

    #[tokio::test]
    async fn test_execute_runs_action() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let task = Task::builder("build")
            .with_execution(move |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .build();

        task.execute(CancellationToken::new()).await.unwrap();
        task.execute(CancellationToken::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_execute_without_action_succeeds() {
        let task = Task::builder("Default").with_dependency("pack").build();
        assert!(task.execute(CancellationToken::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_propagates_failure() {
        let task = Task::builder("build")
            .with_execution(|_| async { Err(ShipwrightError::Config("boom".into())) })
            .build();
        let err = task.execute(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ShipwrightError::Config(_)));
    }
}
