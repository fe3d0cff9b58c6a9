//! Pack and publish workflow
//!
//! Body of a task that declares a `package` section: pack every configured
//! project with the version override chosen by the release policy, then push
//! each produced artifact separately under its own retry policy, so a
//! transient failure on one artifact never re-pushes those already accepted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::Glob;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::configs::tasks::PackageConfig;
use crate::console::Console;
use crate::execution::command::CommandRunner;
use crate::release::{decide_now, PublishDecision, ReleaseDecision, ReleaseInputs};
use crate::types::{ShipwrightError, ShipwrightResult};

const REDACTED: &str = "***";

/// What a publish run did
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub decision: ReleaseDecision,
    pub pushed: Vec<PathBuf>,
}

pub struct PackagePublisher {
    runner: Arc<dyn CommandRunner>,
    config: PackageConfig,
    root: PathBuf,
    release: ReleaseInputs,
    console: Console,
}

impl PackagePublisher {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        config: PackageConfig,
        root: impl Into<PathBuf>,
        release: ReleaseInputs,
        console: Console,
    ) -> Self {
        Self {
            runner,
            config,
            root: root.into(),
            release,
            console,
        }
    }

    pub async fn run(&self, cancellation: &CancellationToken) -> ShipwrightResult<PublishOutcome> {
        let decision = decide_now(&self.release);
        info!(
            channel = ?decision.channel,
            version = decision.version_label().unwrap_or("packager default"),
            "release decision"
        );

        self.pack(&decision, cancellation).await?;

        let api_key = match &decision.publish {
            PublishDecision::Publish { api_key } => api_key.clone(),
            PublishDecision::SkipNoPush => {
                self.console.note("Skip push since noPush was specified");
                return Ok(PublishOutcome {
                    decision,
                    pushed: Vec::new(),
                });
            }
            PublishDecision::SkipMissingCredential => {
                self.console.note("Skip push since there's no apiKey found");
                return Ok(PublishOutcome {
                    decision,
                    pushed: Vec::new(),
                });
            }
        };

        let artifacts = self.find_artifacts()?;
        if artifacts.is_empty() {
            self.console.note(&format!(
                "No artifacts matching '{}' found in {}",
                self.config.artifact_pattern(),
                self.config.output_dir().display()
            ));
        }

        let mut pushed = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            self.push(&artifact, &api_key, cancellation).await?;
            pushed.push(artifact);
        }

        Ok(PublishOutcome { decision, pushed })
    }

    async fn pack(
        &self,
        decision: &ReleaseDecision,
        cancellation: &CancellationToken,
    ) -> ShipwrightResult<()> {
        let output = self.config.output_dir();
        let output = output.to_string_lossy();
        let version_arguments = decision.pack_arguments();

        for project in &self.config.projects {
            let command = render(
                self.config.pack_template(),
                &[("project", project.as_str()), ("output", output.as_ref())],
            );
            self.runner
                .run_checked(&format!("{}{}", command, version_arguments), cancellation)
                .await?;
        }
        Ok(())
    }

    async fn push(
        &self,
        artifact: &Path,
        api_key: &str,
        cancellation: &CancellationToken,
    ) -> ShipwrightResult<()> {
        let artifact_display = artifact.to_string_lossy();
        let command = render(
            self.config.push_template(),
            &[
                ("artifact", artifact_display.as_ref()),
                ("source", self.config.push_source()),
                ("apiKey", api_key),
            ],
        );

        let policy = self.config.retry_policy();
        debug!(
            artifact = %artifact_display,
            max_attempts = policy.max_attempts,
            "pushing artifact"
        );

        let runner = &self.runner;
        let command = command.as_str();
        policy
            .invoke(
                || async move {
                    runner
                        .run_checked(command, cancellation)
                        .await
                        .map(|_| ())
                        .map_err(|error| redact_error(error, api_key))
                },
                cancellation,
            )
            .await
            .map_err(|exhausted| match exhausted.error {
                ShipwrightError::Cancelled { completed } => {
                    ShipwrightError::Cancelled { completed }
                }
                error => ShipwrightError::TransientPublish {
                    artifact: artifact_display.to_string(),
                    attempts: exhausted.attempts,
                    source: Box::new(error),
                },
            })
    }

    /// Artifacts in the output directory matching the configured pattern, sorted by name
    pub fn find_artifacts(&self) -> ShipwrightResult<Vec<PathBuf>> {
        let output = self.config.output_dir();
        let directory = self.root.join(&output);
        if !directory.is_dir() {
            return Ok(Vec::new());
        }

        let matcher = Glob::new(self.config.artifact_pattern())
            .map_err(|e| {
                ShipwrightError::Config(format!(
                    "Invalid artifact pattern '{}': {}",
                    self.config.artifact_pattern(),
                    e
                ))
            })?
            .compile_matcher();

        let mut artifacts = Vec::new();
        for entry in std::fs::read_dir(&directory)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            if matcher.is_match(Path::new(&file_name)) {
                artifacts.push(output.join(file_name));
            }
        }
        artifacts.sort();
        Ok(artifacts)
    }
}

/// Substitute `{name}` placeholders
fn render(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |rendered, (name, value)| {
            rendered.replace(&format!("{{{}}}", name), value)
        })
}

fn redact_error(error: ShipwrightError, secret: &str) -> ShipwrightError {
    match error {
        ShipwrightError::CommandFailed { command, exit_code } if !secret.is_empty() => {
            ShipwrightError::CommandFailed {
                command: command.replace(secret, REDACTED),
                exit_code,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::LogFormat;
    use crate::execution::command::CommandOutput;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Records command lines; fails each command whose line contains a key
    /// as many times as configured before succeeding
    #[derive(Default)]
    struct FakeRunner {
        calls: Mutex<Vec<String>>,
        failures: Mutex<HashMap<String, u32>>,
    }

    impl FakeRunner {
        fn failing(pattern: &str, times: u32) -> Self {
            let runner = Self::default();
            runner
                .failures
                .lock()
                .unwrap()
                .insert(pattern.to_string(), times);
            runner
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn execute(
            &self,
            command_line: &str,
            _cancellation: &CancellationToken,
        ) -> ShipwrightResult<CommandOutput> {
            self.calls.lock().unwrap().push(command_line.to_string());
            let mut failures = self.failures.lock().unwrap();
            for (pattern, remaining) in failures.iter_mut() {
                if command_line.contains(pattern.as_str()) && *remaining > 0 {
                    *remaining -= 1;
                    return Ok(CommandOutput {
                        exit_code: 1,
                        output: "503 Service Unavailable".into(),
                    });
                }
            }
            Ok(CommandOutput {
                exit_code: 0,
                output: String::new(),
            })
        }
    }

    fn package(max_attempts: u32) -> PackageConfig {
        PackageConfig {
            projects: vec!["./src/Lib/Lib.csproj".into()],
            output: Some(PathBuf::from("out")),
            artifacts: None,
            source: Some("https://feed.example/v3/index.json".into()),
            pack_command: None,
            push_command: None,
            retry: Some(crate::configs::tasks::RetryConfig {
                max_attempts: Some(max_attempts),
                delay_ms: Some(1),
                max_delay_ms: Some(1),
            }),
        }
    }

    fn workspace_with(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        for file in files {
            std::fs::write(out.join(file), b"pkg").unwrap();
        }
        dir
    }

    fn publisher(
        runner: Arc<FakeRunner>,
        root: &Path,
        release: ReleaseInputs,
        max_attempts: u32,
    ) -> PackagePublisher {
        PackagePublisher::new(
            runner,
            package(max_attempts),
            root,
            release,
            Console::new(LogFormat::Plain),
        )
    }

    fn publish_inputs() -> ReleaseInputs {
        ReleaseInputs {
            explicit_api_key: Some("secret-key".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_placeholders() {
        assert_eq!(
            render(
                "push {artifact} -k {apiKey} {unknown}",
                &[("artifact", "a.nupkg"), ("apiKey", "k")]
            ),
            "push a.nupkg -k k {unknown}"
        );
    }

    #[test]
    fn test_find_artifacts_filters_and_sorts() {
        let dir = workspace_with(&["b.nupkg", "a.nupkg", "a.snupkg", "notes.txt"]);
        let publisher = publisher(Arc::default(), dir.path(), publish_inputs(), 1);
        let artifacts = publisher.find_artifacts().unwrap();
        assert_eq!(
            artifacts,
            [PathBuf::from("out/a.nupkg"), PathBuf::from("out/b.nupkg")]
        );
    }

    #[tokio::test]
    async fn test_preview_pack_and_push() {
        let dir = workspace_with(&["a.nupkg", "b.nupkg"]);
        let runner = Arc::new(FakeRunner::default());
        let outcome = publisher(runner.clone(), dir.path(), publish_inputs(), 3)
            .run(&CancellationToken::new())
            .await
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0]
            .starts_with("dotnet pack ./src/Lib/Lib.csproj -o out --version-suffix preview-"));
        assert_eq!(
            calls[1],
            "dotnet nuget push out/a.nupkg -s https://feed.example/v3/index.json -k secret-key --skip-duplicate"
        );
        assert!(calls[2].contains("out/b.nupkg"));
        assert_eq!(outcome.pushed.len(), 2);
        assert!(!outcome.decision.is_stable());
    }

    #[tokio::test]
    async fn test_stable_version_is_passed_to_pack() {
        let dir = workspace_with(&[]);
        let runner = Arc::new(FakeRunner::default());
        let release = ReleaseInputs {
            explicit_version: Some("2.3.0".into()),
            no_push: true,
            ..Default::default()
        };
        let outcome = publisher(runner.clone(), dir.path(), release, 3)
            .run(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            runner.calls(),
            ["dotnet pack ./src/Lib/Lib.csproj -o out -p VersionPrefix=2.3.0"]
        );
        assert!(outcome.pushed.is_empty());
        assert_eq!(outcome.decision.publish, PublishDecision::SkipNoPush);
    }

    #[tokio::test]
    async fn test_missing_credential_packs_without_pushing() {
        let dir = workspace_with(&["a.nupkg"]);
        let runner = Arc::new(FakeRunner::default());
        let outcome = publisher(runner.clone(), dir.path(), ReleaseInputs::default(), 3)
            .run(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(runner.calls().len(), 1);
        assert_eq!(
            outcome.decision.publish,
            PublishDecision::SkipMissingCredential
        );
    }

    #[tokio::test]
    async fn test_retry_is_scoped_to_one_artifact() {
        let dir = workspace_with(&["a.nupkg", "b.nupkg", "c.nupkg"]);
        let runner = Arc::new(FakeRunner::failing("out/b.nupkg", 2));
        let outcome = publisher(runner.clone(), dir.path(), publish_inputs(), 3)
            .run(&CancellationToken::new())
            .await
            .unwrap();

        let pushes: Vec<_> = runner
            .calls()
            .into_iter()
            .filter(|c| c.contains("nuget push"))
            .collect();
        assert_eq!(pushes.len(), 5);
        assert_eq!(pushes.iter().filter(|c| c.contains("a.nupkg")).count(), 1);
        assert_eq!(pushes.iter().filter(|c| c.contains("b.nupkg")).count(), 3);
        assert_eq!(pushes.iter().filter(|c| c.contains("c.nupkg")).count(), 1);
        assert_eq!(outcome.pushed.len(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_push_reports_artifact_without_key() {
        let dir = workspace_with(&["a.nupkg", "b.nupkg"]);
        let runner = Arc::new(FakeRunner::failing("out/a.nupkg", 10));
        let err = publisher(runner.clone(), dir.path(), publish_inputs(), 2)
            .run(&CancellationToken::new())
            .await
            .unwrap_err();

        match &err {
            ShipwrightError::TransientPublish {
                artifact, attempts, ..
            } => {
                assert_eq!(artifact, "out/a.nupkg");
                assert_eq!(*attempts, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!err.to_string().contains("secret-key"));
        assert!(!format!("{:?}", err).contains("secret-key"));
        assert!(!runner.calls().iter().any(|c| c.contains("b.nupkg")));
    }

    #[tokio::test]
    async fn test_pack_failure_stops_before_push() {
        let dir = workspace_with(&["a.nupkg"]);
        let runner = Arc::new(FakeRunner::failing("dotnet pack", 1));
        let err = publisher(runner.clone(), dir.path(), publish_inputs(), 3)
            .run(&CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ShipwrightError::CommandFailed { .. }));
        assert_eq!(runner.calls().len(), 1);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_retried_push_does_not_log_key() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let dir = workspace_with(&["a.nupkg"]);
        let runner = Arc::new(FakeRunner::failing("out/a.nupkg", 1));
        publisher(runner.clone(), dir.path(), publish_inputs(), 3)
            .run(&CancellationToken::new())
            .await
            .unwrap();

        let logs = logs.contents();
        assert!(logs.contains("attempt failed, retrying"));
        assert!(logs.contains("-k *** --skip-duplicate"));
        assert!(!logs.contains("secret-key"));
    }
}
