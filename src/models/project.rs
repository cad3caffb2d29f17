//! A whole Compose project

use super::networking::Network;
use super::service::Service;
use super::validate::{self, Validate};
use crate::compose::{ComposeFile, SecretDeclaration};
use crate::error::{ComposeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashSet;

/// Networks and services that make up one Compose file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub networks: Vec<Network>,
    #[serde(default)]
    pub services: Vec<Service>,
}

impl Project {
    pub fn network(&self, name: &str) -> Option<&Network> {
        self.networks.iter().find(|n| n.name == name)
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Compose document for the project.
    ///
    /// Every secret a service or build refers to is declared at the top
    /// level as external, since secret contents are not modeled here.
    pub fn value(&self) -> ComposeFile {
        let services = self
            .services
            .iter()
            .map(|s| (s.name.clone(), s.value()))
            .collect();

        let networks = self
            .networks
            .iter()
            .map(|n| (n.name.clone(), n.value()))
            .collect();

        let secrets: BTreeMap<String, SecretDeclaration> = self
            .services
            .iter()
            .flat_map(|s| s.secret_sources())
            .map(|source| (source.to_string(), SecretDeclaration { external: true }))
            .collect();

        ComposeFile {
            name: self.name.clone(),
            services,
            networks,
            secrets,
        }
    }

    /// Render the project as Compose YAML
    pub fn to_yaml(&self) -> Result<String> {
        self.value().to_yaml()
    }

    /// Problems that do not stop rendering but make the file unusable as-is
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for service in &self.services {
            if service.image.is_none() && service.build.is_none() {
                warnings.push(format!(
                    "Service '{}' has neither an image nor a build configuration",
                    service.name
                ));
            }

            for network in &service.networks {
                if network != "default" && self.network(network).is_none() {
                    warnings.push(format!(
                        "Service '{}' references undefined network '{}'",
                        service.name, network
                    ));
                }
            }
        }

        warnings
    }
}

impl Validate for Project {
    fn validate(&self) -> Result<()> {
        validate::optional_length("name", self.name.as_deref())?;

        let mut seen = HashSet::new();
        for network in &self.networks {
            network.validate()?;
            if !seen.insert(network.name.as_str()) {
                return Err(ComposeError::NetworkExists(network.name.clone()));
            }
        }

        let mut seen = HashSet::new();
        for service in &self.services {
            service.validate()?;
            if !seen.insert(service.name.as_str()) {
                return Err(ComposeError::ServiceExists(service.name.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuildConfiguration, IpamConfig, UsedSecret};
    use serde_json::json;

    fn sample_project() -> Project {
        let mut network = Network::new("back").driver("overlay");
        network.attachable = true;
        network.ipam_configs.push(IpamConfig::subnet("10.226.126.0/24"));

        let mut web = Service::new("web").image("nginx:latest");
        web.connect("back");
        web.use_secret(UsedSecret::new("tls_cert").target("server.cert"));

        let mut api = Service::new("api");
        let mut build = BuildConfiguration::new("./api");
        build.secrets.push(UsedSecret::new("npm_token"));
        api.build = Some(build);

        Project {
            name: Some("shop".to_string()),
            networks: vec![network],
            services: vec![web, api],
        }
    }

    #[test]
    fn test_project_value() {
        let value = serde_json::to_value(sample_project().value()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "shop",
                "services": {
                    "api": {
                        "build": {
                            "context": "./api",
                            "secrets": ["npm_token"]
                        }
                    },
                    "web": {
                        "image": "nginx:latest",
                        "networks": ["back"],
                        "secrets": [{ "source": "tls_cert", "target": "server.cert" }]
                    }
                },
                "networks": {
                    "back": {
                        "name": "back",
                        "attachable": true,
                        "driver": "overlay",
                        "ipam": {
                            "driver": "default",
                            "config": [{ "subnet": "10.226.126.0/24" }]
                        }
                    }
                },
                "secrets": {
                    "npm_token": { "external": true },
                    "tls_cert": { "external": true }
                }
            })
        );
    }

    #[test]
    fn test_yaml_round_trip_keeps_short_forms() {
        let yaml = sample_project().to_yaml().unwrap();
        assert!(yaml.contains("name: shop"));

        let parsed = ComposeFile::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, sample_project().value());
    }

    #[test]
    fn test_warnings() {
        let mut project = sample_project();
        assert!(project.warnings().is_empty());

        let mut orphan = Service::new("orphan");
        orphan.connect("missing");
        orphan.connect("default");
        project.services.push(orphan);

        let warnings = project.warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("neither an image nor a build"));
        assert!(warnings[1].contains("'missing'"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut project = sample_project();
        assert!(project.validate().is_ok());

        project.services.push(Service::new("web"));
        assert!(matches!(
            project.validate(),
            Err(ComposeError::ServiceExists(name)) if name == "web"
        ));
    }
}
