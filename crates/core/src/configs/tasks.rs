use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::execution::retry::{Backoff, RetryPolicy};
use crate::types::{ShipwrightError, ShipwrightResult};

pub const DEFAULT_PACKAGE_OUTPUT: &str = "./artifacts/packages";
pub const DEFAULT_ARTIFACT_PATTERN: &str = "*.nupkg";
pub const DEFAULT_PUSH_SOURCE: &str = "https://api.nuget.org/v3/index.json";
pub const DEFAULT_PACK_COMMAND: &str = "dotnet pack {project} -o {output}";
pub const DEFAULT_PUSH_COMMAND: &str =
    "dotnet nuget push {artifact} -s {source} -k {apiKey} --skip-duplicate";

/// One command line, or several run in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Command {
    Single(String),
    Multiple(Vec<String>),
}

impl Command {
    pub fn lines(&self) -> Vec<String> {
        match self {
            Command::Single(line) => vec![line.clone()],
            Command::Multiple(lines) => lines.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskConfig {
    pub name: String,
    pub description: Option<String>,
    pub dependencies: Option<Vec<String>>,
    pub command: Option<Command>,
    /// Replaces `command` when running inside CI
    pub ci_command: Option<Command>,
    /// Pack and publish packages after the commands ran
    pub package: Option<PackageConfig>,
}

impl TaskConfig {
    pub fn command_lines(&self, ci: bool) -> Vec<String> {
        let command = if ci {
            self.ci_command.as_ref().or(self.command.as_ref())
        } else {
            self.command.as_ref()
        };
        command.map(Command::lines).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PackageConfig {
    /// Projects passed to the pack command, one invocation each
    pub projects: Vec<String>,
    /// Directory the packager writes artifacts to
    pub output: Option<PathBuf>,
    /// File name glob selecting artifacts to push
    pub artifacts: Option<String>,
    /// Package feed URL
    pub source: Option<String>,
    /// Template with `{project}` and `{output}` placeholders
    pub pack_command: Option<String>,
    /// Template with `{artifact}`, `{source}` and `{apiKey}` placeholders
    pub push_command: Option<String>,
    pub retry: Option<RetryConfig>,
}

impl PackageConfig {
    pub fn output_dir(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PACKAGE_OUTPUT))
    }

    pub fn artifact_pattern(&self) -> &str {
        self.artifacts.as_deref().unwrap_or(DEFAULT_ARTIFACT_PATTERN)
    }

    pub fn push_source(&self) -> &str {
        self.source.as_deref().unwrap_or(DEFAULT_PUSH_SOURCE)
    }

    pub fn pack_template(&self) -> &str {
        self.pack_command.as_deref().unwrap_or(DEFAULT_PACK_COMMAND)
    }

    pub fn push_template(&self) -> &str {
        self.push_command.as_deref().unwrap_or(DEFAULT_PUSH_COMMAND)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::to_policy)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    /// Delay before the second attempt; doubles afterwards
    pub delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        let (default_initial, default_max) = match defaults.backoff {
            Backoff::Exponential { initial, max } => (initial, max),
            Backoff::Fixed(delay) => (delay, delay),
        };
        let initial = self
            .delay_ms
            .map(std::time::Duration::from_millis)
            .unwrap_or(default_initial);
        let max = self
            .max_delay_ms
            .map(std::time::Duration::from_millis)
            .unwrap_or(default_max)
            .max(initial);

        RetryPolicy::new(
            self.max_attempts.unwrap_or(defaults.max_attempts),
            Backoff::Exponential { initial, max },
        )
    }
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetupConfig {
    /// Directories removed before the first task runs
    pub clean: Option<Vec<PathBuf>>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PipelineFileConfig {
    pub name: Option<String>,
    pub description: Option<String>,
    pub setup: Option<SetupConfig>,
    pub tasks: Vec<TaskConfig>,
}

pub fn parse_pipeline_config(yaml_str: &str) -> ShipwrightResult<PipelineFileConfig> {
    let config: PipelineFileConfig = serde_yaml::from_str(yaml_str)?;
    validate_pipeline_config(&config)?;
    Ok(config)
}

fn validate_pipeline_config(config: &PipelineFileConfig) -> ShipwrightResult<()> {
    for task in &config.tasks {
        if task.name.trim().is_empty() {
            return Err(ShipwrightError::Config(
                "Task names must not be empty".to_string(),
            ));
        }
        if let Some(package) = &task.package {
            if package.projects.is_empty() {
                return Err(ShipwrightError::Config(format!(
                    "Task '{}' declares a package without projects",
                    task.name
                )));
            }
            if package.retry.as_ref().and_then(|r| r.max_attempts) == Some(0) {
                return Err(ShipwrightError::Config(format!(
                    "Task '{}' retry.maxAttempts must be at least 1",
                    task.name
                )));
            }
        }
    }
    Ok(())
}

/// JSON Schema describing the pipeline file
pub fn pipeline_schema() -> ShipwrightResult<String> {
    let schema = schemars::schema_for!(PipelineFileConfig);
    serde_json::to_string_pretty(&schema)
        .map_err(|e| ShipwrightError::Config(format!("Failed to render schema: {}", e)))
}
