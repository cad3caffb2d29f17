//! Swarm deploy specification

use super::common::{self, string_mapping, StringMap};
use super::validate::Validate;
use crate::compose::DeploySpec;
use crate::error::{ComposeError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Service label set by a deploy specification
pub type DeployLabel = StringMap;

/// Service discovery method for external clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointMode {
    /// Assign a virtual IP
    Vip,
    /// DNS round-robin
    Dnsrr,
}

impl EndpointMode {
    pub const ALL: [EndpointMode; 2] = [EndpointMode::Vip, EndpointMode::Dnsrr];

    /// Human readable description
    pub fn label(&self) -> &'static str {
        match self {
            EndpointMode::Vip => "Assign Virtual IP",
            EndpointMode::Dnsrr => "DNS Round-Robin",
        }
    }
}

impl std::fmt::Display for EndpointMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointMode::Vip => write!(f, "vip"),
            EndpointMode::Dnsrr => write!(f, "dnsrr"),
        }
    }
}

impl FromStr for EndpointMode {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "vip" => Ok(EndpointMode::Vip),
            "dnsrr" => Ok(EndpointMode::Dnsrr),
            other => Err(ComposeError::validation(
                "endpoint_mode",
                format!("Value '{}' is not a valid choice (vip, dnsrr)", other),
            )),
        }
    }
}

/// Metadata for allocating and configuring a service on the platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deploy {
    #[serde(default)]
    pub endpoint_mode: Option<EndpointMode>,
    /// Labels set on the service, not its containers
    #[serde(default)]
    pub labels: Vec<DeployLabel>,
}

impl Deploy {
    pub fn set_label(&mut self, key: &str, value: &str) {
        common::upsert(&mut self.labels, key, value);
    }

    pub fn remove_label(&mut self, key: &str) -> bool {
        common::remove_key(&mut self.labels, key)
    }

    pub fn is_empty(&self) -> bool {
        self.endpoint_mode.is_none() && self.labels.is_empty()
    }

    pub fn value(&self) -> DeploySpec {
        DeploySpec {
            endpoint_mode: self.endpoint_mode,
            labels: string_mapping(&self.labels),
        }
    }
}

impl Validate for Deploy {
    fn validate(&self) -> Result<()> {
        self.labels.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_mode_choices() {
        assert_eq!("vip".parse::<EndpointMode>().unwrap(), EndpointMode::Vip);
        assert_eq!("dnsrr".parse::<EndpointMode>().unwrap(), EndpointMode::Dnsrr);
        assert!("round-robin".parse::<EndpointMode>().is_err());
        assert_eq!(EndpointMode::Dnsrr.label(), "DNS Round-Robin");
    }

    #[test]
    fn test_deploy_value() {
        let mut deploy = Deploy {
            endpoint_mode: Some(EndpointMode::Dnsrr),
            ..Default::default()
        };
        deploy.set_label("com.example.description", "This label will appear on the web service");

        let value = serde_json::to_value(deploy.value()).unwrap();
        assert_eq!(
            value,
            json!({
                "endpoint_mode": "dnsrr",
                "labels": { "com.example.description": "This label will appear on the web service" }
            })
        );
    }

    #[test]
    fn test_every_choice_has_a_label() {
        let choices: Vec<(String, &str)> = EndpointMode::ALL
            .iter()
            .map(|mode| (mode.to_string(), mode.label()))
            .collect();
        assert_eq!(
            choices,
            vec![
                ("vip".to_string(), "Assign Virtual IP"),
                ("dnsrr".to_string(), "DNS Round-Robin"),
            ]
        );
    }

    #[test]
    fn test_remove_label_empties_deploy() {
        let mut deploy = Deploy::default();
        deploy.set_label("tier", "web");
        assert!(deploy.remove_label("tier"));
        assert!(deploy.is_empty());
    }

    #[test]
    fn test_empty_deploy() {
        let deploy = Deploy::default();
        assert!(deploy.is_empty());
        assert_eq!(serde_json::to_value(deploy.value()).unwrap(), json!({}));
    }
}
