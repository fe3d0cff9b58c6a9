use crate::release::ReleaseInputs;

pub const DEFAULT_TARGET: &str = "Default";
pub const VERSION_ENV: &str = "VERSION";
pub const API_KEY_ENV: &str = "NUGET_API_KEY";
pub const CI_ENV: &str = "GITHUB_ACTIONS";

/// Strongly-typed settings for one run
///
/// Built once at the process boundary from command-line flags and the
/// environment; everything past this point only sees typed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub target: String,
    pub api_key: Option<String>,
    pub no_push: bool,
    pub stable: bool,
    pub version: Option<String>,
    pub environment_api_key: Option<String>,
    /// Running inside CI; only changes the log format
    pub ci: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            api_key: None,
            no_push: false,
            stable: false,
            version: None,
            environment_api_key: None,
            ci: false,
        }
    }
}

/// Flags supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub target: Option<String>,
    pub api_key: Option<String>,
    pub no_push: bool,
    pub stable: bool,
}

impl RunSettings {
    /// Combine command-line flags with values read through `env`
    pub fn from_sources<F>(args: RunArgs, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        Self {
            target: non_empty(args.target).unwrap_or_else(|| DEFAULT_TARGET.to_string()),
            api_key: non_empty(args.api_key),
            no_push: args.no_push,
            stable: args.stable,
            version: non_empty(env(VERSION_ENV)),
            environment_api_key: non_empty(env(API_KEY_ENV)),
            ci: env(CI_ENV).as_deref() == Some("true"),
        }
    }

    pub fn from_env(args: RunArgs) -> Self {
        Self::from_sources(args, |key| std::env::var(key).ok())
    }

    pub fn release_inputs(&self) -> ReleaseInputs {
        ReleaseInputs {
            explicit_version: self.version.clone(),
            stable: self.stable,
            no_push: self.no_push,
            explicit_api_key: self.api_key.clone(),
            environment_api_key: self.environment_api_key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = RunSettings::from_sources(RunArgs::default(), env_of(&[]));
        assert_eq!(settings, RunSettings::default());
        assert_eq!(settings.target, "Default");
    }

    #[test]
    fn test_reads_environment() {
        let settings = RunSettings::from_sources(
            RunArgs {
                target: Some("pack".into()),
                ..Default::default()
            },
            env_of(&[
                (VERSION_ENV, "2.3.0"),
                (API_KEY_ENV, "env-key"),
                (CI_ENV, "true"),
            ]),
        );
        assert_eq!(settings.target, "pack");
        assert_eq!(settings.version.as_deref(), Some("2.3.0"));
        assert_eq!(settings.environment_api_key.as_deref(), Some("env-key"));
        assert!(settings.ci);
    }

    #[test]
    fn test_ci_requires_literal_true() {
        let settings = RunSettings::from_sources(RunArgs::default(), env_of(&[(CI_ENV, "1")]));
        assert!(!settings.ci);
    }

    #[test]
    fn test_blank_values_are_absent() {
        let settings = RunSettings::from_sources(
            RunArgs {
                target: Some(" ".into()),
                api_key: Some(String::new()),
                ..Default::default()
            },
            env_of(&[(VERSION_ENV, ""), (API_KEY_ENV, "   ")]),
        );
        assert_eq!(settings.target, DEFAULT_TARGET);
        assert_eq!(settings.api_key, None);
        assert_eq!(settings.version, None);
        assert_eq!(settings.environment_api_key, None);
    }

    #[test]
    fn test_release_inputs_carry_flags() {
        let settings = RunSettings {
            api_key: Some("arg".into()),
            no_push: true,
            stable: true,
            ..Default::default()
        };
        let inputs = settings.release_inputs();
        assert!(inputs.no_push);
        assert!(inputs.stable);
        assert_eq!(inputs.explicit_api_key.as_deref(), Some("arg"));
    }
}
