//! Release policy
//!
//! Pure decision logic for the publish workflow: which channel a build is
//! released on, what version override the packager receives, and whether the
//! produced packages should be pushed at all. Nothing here touches processes,
//! the network or the environment; the clock is an explicit input.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Timestamp layout of preview suffixes, sortable and unique per second
pub const PREVIEW_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Stable,
    Preview,
}

/// Version adjustment handed to the packager
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VersionOverride {
    /// Stable build without an explicit version; the packager keeps its own
    PackagerDefault,
    /// Stable build pinned to an explicit version
    Prefix(String),
    /// Preview build, `preview-<timestamp>`
    Suffix(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishDecision {
    Publish { api_key: String },
    SkipNoPush,
    SkipMissingCredential,
}

/// Inputs to [`decide`]; empty strings count as absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseInputs {
    pub explicit_version: Option<String>,
    pub stable: bool,
    pub no_push: bool,
    pub explicit_api_key: Option<String>,
    pub environment_api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDecision {
    pub channel: Channel,
    pub version: VersionOverride,
    pub publish: PublishDecision,
}

impl ReleaseDecision {
    pub fn is_stable(&self) -> bool {
        self.channel == Channel::Stable
    }

    pub fn should_publish(&self) -> bool {
        matches!(self.publish, PublishDecision::Publish { .. })
    }

    pub fn api_key(&self) -> Option<&str> {
        match &self.publish {
            PublishDecision::Publish { api_key } => Some(api_key),
            _ => None,
        }
    }

    /// Explicit version or preview suffix; `None` when the packager default applies
    pub fn version_label(&self) -> Option<&str> {
        match &self.version {
            VersionOverride::PackagerDefault => None,
            VersionOverride::Prefix(label) | VersionOverride::Suffix(label) => Some(label),
        }
    }

    /// Extra packager arguments carrying the version override
    pub fn pack_arguments(&self) -> String {
        match &self.version {
            VersionOverride::PackagerDefault => String::new(),
            VersionOverride::Prefix(version) => format!(" -p VersionPrefix={}", version),
            VersionOverride::Suffix(suffix) => format!(" --version-suffix {}", suffix),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Compute the release decision for one run
pub fn decide(inputs: &ReleaseInputs, now: DateTime<Utc>) -> ReleaseDecision {
    let explicit_version = non_empty(inputs.explicit_version.as_deref());
    let stable = inputs.stable || explicit_version.is_some();

    let (channel, version) = match (stable, explicit_version) {
        (true, Some(version)) => (Channel::Stable, VersionOverride::Prefix(version.to_string())),
        (true, None) => (Channel::Stable, VersionOverride::PackagerDefault),
        (false, _) => (
            Channel::Preview,
            VersionOverride::Suffix(preview_suffix(now)),
        ),
    };

    let api_key = non_empty(inputs.explicit_api_key.as_deref())
        .or_else(|| non_empty(inputs.environment_api_key.as_deref()));

    let publish = match (inputs.no_push, api_key) {
        (true, _) => PublishDecision::SkipNoPush,
        (false, None) => PublishDecision::SkipMissingCredential,
        (false, Some(key)) => PublishDecision::Publish {
            api_key: key.to_string(),
        },
    };

    ReleaseDecision {
        channel,
        version,
        publish,
    }
}

/// [`decide`] against the current UTC time
pub fn decide_now(inputs: &ReleaseInputs) -> ReleaseDecision {
    decide(inputs, Utc::now())
}

pub fn preview_suffix(now: DateTime<Utc>) -> String {
    format!("preview-{}", now.format(PREVIEW_TIMESTAMP_FORMAT))
}
