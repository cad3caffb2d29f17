//! Service definitions

use super::build::BuildConfiguration;
use super::common::{self, string_mapping, StringMap};
use super::deploy::Deploy;
use super::secrets::UsedSecret;
use super::validate::{self, Validate, MAX_FIELD_LENGTH};
use crate::compose::ServiceSpec;
use crate::error::{ComposeError, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static SERVICE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.-]*$").expect("service name pattern is valid")
});

/// Arbitrary metadata on a service's containers
pub type ServiceAnnotation = StringMap;

/// A service in the Compose project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub annotations: Vec<ServiceAnnotation>,
    #[serde(default)]
    pub build: Option<BuildConfiguration>,
    #[serde(default)]
    pub deploy: Option<Deploy>,
    /// Names of the networks the service joins
    #[serde(default)]
    pub networks: Vec<String>,
    #[serde(default)]
    pub secrets: Vec<UsedSecret>,
    /// Created timestamp
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

impl Default for Service {
    fn default() -> Self {
        Self {
            name: String::new(),
            image: None,
            annotations: Vec::new(),
            build: None,
            deploy: None,
            networks: Vec::new(),
            secrets: Vec::new(),
            created: Utc::now(),
        }
    }
}

impl Service {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn image(mut self, image: &str) -> Self {
        self.image = Some(image.to_string());
        self
    }

    pub fn set_annotation(&mut self, key: &str, value: &str) {
        common::upsert(&mut self.annotations, key, value);
    }

    /// Drop an annotation, returning whether it was set
    pub fn remove_annotation(&mut self, key: &str) -> bool {
        common::remove_key(&mut self.annotations, key)
    }

    /// Join a network, ignoring networks already joined
    pub fn connect(&mut self, network: &str) {
        if !self.networks.iter().any(|n| n == network) {
            self.networks.push(network.to_string());
        }
    }

    /// Leave a network, returning whether the service had joined it
    pub fn disconnect(&mut self, network: &str) -> bool {
        let before = self.networks.len();
        self.networks.retain(|n| n != network);
        self.networks.len() != before
    }

    /// Replace a secret with the same source, or add it
    pub fn use_secret(&mut self, secret: UsedSecret) {
        match self.secrets.iter_mut().find(|s| s.source == secret.source) {
            Some(existing) => *existing = secret,
            None => self.secrets.push(secret),
        }
    }

    /// Every secret source the service or its build refers to
    pub fn secret_sources(&self) -> impl Iterator<Item = &str> {
        let build_secrets = self.build.iter().flat_map(|b| b.secrets.iter());
        self.secrets
            .iter()
            .chain(build_secrets)
            .map(|s| s.source.as_str())
    }

    /// Compose value for this service
    pub fn value(&self) -> ServiceSpec {
        ServiceSpec {
            image: self.image.clone(),
            build: self.build.as_ref().map(BuildConfiguration::value),
            deploy: self
                .deploy
                .as_ref()
                .filter(|d| !d.is_empty())
                .map(Deploy::value),
            annotations: string_mapping(&self.annotations),
            networks: (!self.networks.is_empty()).then(|| self.networks.clone()),
            secrets: (!self.secrets.is_empty())
                .then(|| self.secrets.iter().map(UsedSecret::value).collect()),
        }
    }
}

impl Validate for Service {
    fn validate(&self) -> Result<()> {
        validate::required("name", &self.name)?;
        validate::max_length("name", &self.name, MAX_FIELD_LENGTH)?;
        if !SERVICE_NAME.is_match(&self.name) {
            return Err(ComposeError::validation(
                "name",
                "Service names may only contain letters, digits, '_', '.' and '-'",
            ));
        }
        validate::optional_length("image", self.image.as_deref())?;
        for network in &self.networks {
            validate::required("networks", network)?;
        }
        self.annotations.validate()?;
        self.build.validate()?;
        self.deploy.validate()?;
        self.secrets.validate()
    }
}
