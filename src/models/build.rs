//! Image build configuration

use super::common::{self, string_mapping, StringList, StringMap};
use super::secrets::UsedSecret;
use super::validate::{self, Validate, MAX_FIELD_LENGTH};
use crate::compose::{BuildSpec, BuildSpecLong};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Build context used when none is given
pub const DEFAULT_CONTEXT: &str = ".";

/// Dockerfile `ARG` value
pub type BuildArg = StringMap;

/// Metadata attached to the built image
pub type ImageLabel = StringMap;

/// Secret made available while building
pub type BuildSecret = UsedSecret;

/// Tag attached to the built image
pub type ImageTag = StringList;

fn default_context() -> String {
    DEFAULT_CONTEXT.to_string()
}

/// How a service's image is built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfiguration {
    /// Directory containing a Dockerfile, or a git repository URL
    #[serde(default = "default_context")]
    pub context: String,
    /// Alternate Dockerfile name
    #[serde(default)]
    pub dockerfile: Option<String>,
    /// Stage to build in a multi-stage Dockerfile
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub args: Vec<BuildArg>,
    #[serde(default)]
    pub labels: Vec<ImageLabel>,
    #[serde(default)]
    pub secrets: Vec<BuildSecret>,
    #[serde(default)]
    pub tags: Vec<ImageTag>,
}

impl Default for BuildConfiguration {
    fn default() -> Self {
        Self {
            context: default_context(),
            dockerfile: None,
            target: None,
            args: Vec::new(),
            labels: Vec::new(),
            secrets: Vec::new(),
            tags: Vec::new(),
        }
    }
}

impl BuildConfiguration {
    pub fn new(context: &str) -> Self {
        Self {
            context: context.to_string(),
            ..Self::default()
        }
    }

    pub fn dockerfile(mut self, dockerfile: &str) -> Self {
        self.dockerfile = Some(dockerfile.to_string());
        self
    }

    pub fn target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn set_arg(&mut self, key: &str, value: &str) {
        common::upsert(&mut self.args, key, value);
    }

    pub fn set_label(&mut self, key: &str, value: &str) {
        common::upsert(&mut self.labels, key, value);
    }

    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t.value == tag) {
            self.tags.push(ImageTag::new(tag));
        }
    }

    /// Whether the configuration can be written as its context alone
    pub fn is_short_form(&self) -> bool {
        self.dockerfile.is_none()
            && self.target.is_none()
            && self.args.is_empty()
            && self.labels.is_empty()
            && self.secrets.is_empty()
            && self.tags.is_empty()
    }

    /// Compose value for this build
    pub fn value(&self) -> BuildSpec {
        if self.is_short_form() {
            return BuildSpec::Short(self.context.clone());
        }

        let secrets = (!self.secrets.is_empty())
            .then(|| self.secrets.iter().map(UsedSecret::value).collect());
        let tags = (!self.tags.is_empty())
            .then(|| self.tags.iter().map(|t| t.value.clone()).collect());

        BuildSpec::Long(BuildSpecLong {
            context: self.context.clone(),
            dockerfile: self.dockerfile.clone(),
            target: self.target.clone(),
            args: string_mapping(&self.args),
            labels: string_mapping(&self.labels),
            secrets,
            tags,
        })
    }
}

impl Validate for BuildConfiguration {
    fn validate(&self) -> Result<()> {
        validate::required("context", &self.context)?;
        validate::max_length("context", &self.context, MAX_FIELD_LENGTH)?;
        validate::optional_length("dockerfile", self.dockerfile.as_deref())?;
        validate::optional_length("target", self.target.as_deref())?;
        self.args.validate()?;
        self.labels.validate()?;
        self.secrets.validate()?;
        self.tags.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_only_is_short_form() {
        let build = BuildConfiguration::default();
        assert!(build.is_short_form());
        assert_eq!(build.value(), BuildSpec::Short(".".to_string()));
    }

    #[test]
    fn test_target_forces_long_form() {
        let build = BuildConfiguration::new("./web").target("prod");
        let value = serde_json::to_value(build.value()).unwrap();
        assert_eq!(value, json!({ "context": "./web", "target": "prod" }));
    }

    #[test]
    fn test_full_build() {
        let mut build = BuildConfiguration::new(".").dockerfile("Dockerfile-dev");
        build.set_arg("GIT_COMMIT", "cdc3b19");
        build.set_label("com.example.department", "Finance");
        build.set_label("com.example.label-with-empty-value", "");
        build.secrets.push(UsedSecret::new("npm_token"));
        build.secrets.push(UsedSecret::new("ssh_key").target("id_rsa"));
        build.add_tag("myapp:latest");
        build.add_tag("myapp:latest");
        build.add_tag("registry.local/myapp:1.0");

        let value = serde_json::to_value(build.value()).unwrap();
        assert_eq!(
            value,
            json!({
                "context": ".",
                "dockerfile": "Dockerfile-dev",
                "args": { "GIT_COMMIT": "cdc3b19" },
                "labels": {
                    "com.example.department": "Finance",
                    "com.example.label-with-empty-value": ""
                },
                "secrets": ["npm_token", { "source": "ssh_key", "target": "id_rsa" }],
                "tags": ["myapp:latest", "registry.local/myapp:1.0"]
            })
        );
    }

    #[test]
    fn test_validate_nested_secret() {
        let mut build = BuildConfiguration::default();
        build.secrets.push(UsedSecret::new("key").mode("777"));
        assert!(build.validate().is_ok());

        build.secrets.push(UsedSecret::new("key").mode("rwx"));
        assert!(build.validate().is_err());
    }

    #[test]
    fn test_deserialize_defaults_context() {
        let build: BuildConfiguration = serde_json::from_str("{}").unwrap();
        assert_eq!(build.context, ".");
    }
}
