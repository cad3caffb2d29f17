//! Network configuration

use super::common::to_mapping;
use super::validate::{self, Validate, IP_RANGE, MAX_FIELD_LENGTH};
use crate::compose::{IpamPoolSpec, IpamSpec, NetworkSpec};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const IP_RANGE_MESSAGE: &str =
    "Values must be in the format of \"10.226.126.0/24\" or \"192.168.127.12/27\"";

/// IPAM driver written for every network with populated IPAM configs
pub const DEFAULT_IPAM_DRIVER: &str = "default";

/// A network driver that ships with Docker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDriver {
    /// Value written to the Compose file
    pub value: &'static str,
    /// Display text
    pub text: &'static str,
    /// What the driver does
    pub description: &'static str,
}

const STOCK_DRIVERS: &[StockDriver] = &[
    StockDriver {
        value: "bridge",
        text: "Bridge",
        description: "Bridge networks are commonly used when your application runs in a container \
                      that needs to communicate with other containers on the same host.",
    },
    StockDriver {
        value: "host",
        text: "Host",
        description: "Remove network isolation between the container and the Docker host, and use \
                      the host's networking directly",
    },
    StockDriver {
        value: "overlay",
        text: "Overlay",
        description: "Overlay networks connect multiple Docker daemons together and enable Swarm \
                      services and containers to communicate across nodes. This strategy removes \
                      the need to do OS-level routing.",
    },
    StockDriver {
        value: "ipvlan",
        text: "IPvlan",
        description: "IPvlan networks give users total control over both IPv4 and IPv6 addressing. \
                      The VLAN driver builds on top of that in giving operators complete control \
                      of layer 2 VLAN tagging and even IPvlan L3 routing for users interested in \
                      underlay network integration.",
    },
    StockDriver {
        value: "macvlan",
        text: "Macvlan",
        description: "Macvlan networks allow you to assign a MAC address to a container, making it \
                      appear as a physical device on your network. The Docker daemon routes \
                      traffic to containers by their MAC addresses. Using the macvlan driver is \
                      sometimes the best choice when dealing with legacy applications that expect \
                      to be directly connected to the physical network, rather than routed \
                      through the Docker host's network stack.",
    },
];

/// A network that services may reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    /// Name that services reference
    pub name: String,
    /// Network driver
    #[serde(default)]
    pub driver: Option<String>,
    /// Standalone containers may attach in addition to services
    #[serde(default)]
    pub attachable: bool,
    /// Lifecycle is maintained outside of the application
    #[serde(default)]
    pub external: bool,
    /// Externally isolated
    #[serde(default)]
    pub internal: bool,
    /// Metadata labels
    #[serde(default)]
    pub labels: Vec<NetworkLabel>,
    /// Driver options
    #[serde(default)]
    pub driver_opts: Vec<NetworkDriverOption>,
    /// IPAM configurations
    #[serde(default)]
    pub ipam_configs: Vec<IpamConfig>,
    /// Created timestamp
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            name: String::new(),
            driver: None,
            attachable: false,
            external: false,
            internal: false,
            labels: Vec::new(),
            driver_opts: Vec::new(),
            ipam_configs: Vec::new(),
            created: Utc::now(),
        }
    }
}

impl Network {
    /// Create a new network
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Set network driver
    pub fn driver(mut self, driver: &str) -> Self {
        self.driver = Some(driver.to_string());
        self
    }

    /// Drivers available without plugins
    pub fn stock_drivers() -> &'static [StockDriver] {
        STOCK_DRIVERS
    }

    /// Set a label, replacing any label with the same key
    pub fn set_label(&mut self, key: &str, label: &str) {
        match self.labels.iter_mut().find(|l| l.key == key) {
            Some(existing) => existing.label = label.to_string(),
            None => self.labels.push(NetworkLabel {
                key: key.to_string(),
                label: label.to_string(),
            }),
        }
    }

    /// Drop a label, returning whether it was set
    pub fn remove_label(&mut self, key: &str) -> bool {
        let before = self.labels.len();
        self.labels.retain(|l| l.key != key);
        self.labels.len() != before
    }

    /// Set a driver option, replacing any option with the same key
    pub fn set_driver_opt(&mut self, key: &str, value: &str) {
        match self.driver_opts.iter_mut().find(|o| o.key == key) {
            Some(existing) => existing.value = value.to_string(),
            None => self.driver_opts.push(NetworkDriverOption {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Compose value for this network
    pub fn value(&self) -> NetworkSpec {
        let configs: Vec<IpamPoolSpec> = self
            .ipam_configs
            .iter()
            .filter(|c| c.is_populated())
            .map(IpamConfig::value)
            .collect();

        let ipam = if configs.is_empty() {
            None
        } else {
            Some(IpamSpec {
                driver: DEFAULT_IPAM_DRIVER.to_string(),
                config: configs,
            })
        };

        NetworkSpec {
            name: self.name.clone(),
            attachable: self.attachable.then_some(true),
            internal: self.internal.then_some(true),
            external: self.external.then_some(true),
            driver: self.driver.clone().filter(|d| !d.is_empty()),
            labels: to_mapping(self.labels.iter().map(|l| (l.key.as_str(), l.label.as_str()))),
            driver_opts: to_mapping(
                self.driver_opts
                    .iter()
                    .map(|o| (o.key.as_str(), o.value.as_str())),
            ),
            ipam,
        }
    }
}

impl Validate for Network {
    fn validate(&self) -> Result<()> {
        validate::required("name", &self.name)?;
        validate::max_length("name", &self.name, MAX_FIELD_LENGTH)?;
        validate::optional_length("driver", self.driver.as_deref())?;
        self.labels.validate()?;
        self.driver_opts.validate()?;
        self.ipam_configs.validate()
    }
}

/// Additional option for the chosen network driver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDriverOption {
    pub key: String,
    pub value: String,
}

impl Validate for NetworkDriverOption {
    fn validate(&self) -> Result<()> {
        validate::required("key", &self.key)?;
        validate::max_length("key", &self.key, MAX_FIELD_LENGTH)?;
        validate::max_length("value", &self.value, MAX_FIELD_LENGTH)
    }
}

/// Metadata attached to a network.
///
/// Reverse-DNS keys keep labels from clashing with other software.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkLabel {
    pub key: String,
    pub label: String,
}

impl Validate for NetworkLabel {
    fn validate(&self) -> Result<()> {
        validate::required("key", &self.key)?;
        validate::max_length("key", &self.key, MAX_FIELD_LENGTH)?;
        validate::max_length("label", &self.label, MAX_FIELD_LENGTH)
    }
}

/// IP address management configuration for a network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpamConfig {
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub subnet: Option<String>,
    #[serde(default)]
    pub ip_range: Option<String>,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub auxiliary_addresses: Vec<IpamAuxiliaryAddress>,
}

impl IpamConfig {
    /// Config with only a subnet
    pub fn subnet(subnet: &str) -> Self {
        Self {
            subnet: Some(subnet.to_string()),
            ..Self::default()
        }
    }

    /// Whether any of the scalar fields is set.
    ///
    /// Auxiliary addresses alone do not count.
    pub fn is_populated(&self) -> bool {
        self.driver.is_some()
            || self.subnet.is_some()
            || self.ip_range.is_some()
            || self.gateway.is_some()
    }

    /// Compose value for this pool
    pub fn value(&self) -> IpamPoolSpec {
        IpamPoolSpec {
            driver: self.driver.clone(),
            subnet: self.subnet.clone(),
            ip_range: self.ip_range.clone(),
            gateway: self.gateway.clone(),
            aux_addresses: to_mapping(
                self.auxiliary_addresses
                    .iter()
                    .map(|a| (a.address_name.as_str(), a.address.as_str())),
            ),
        }
    }
}

impl Validate for IpamConfig {
    fn validate(&self) -> Result<()> {
        validate::optional_length("driver", self.driver.as_deref())?;

        for (field, value) in [("subnet", &self.subnet), ("ip_range", &self.ip_range)] {
            if let Some(value) = value {
                validate::max_length(field, value, MAX_FIELD_LENGTH)?;
                validate::matches(field, value, &IP_RANGE, IP_RANGE_MESSAGE)?;
            }
        }

        if let Some(gateway) = &self.gateway {
            validate::ip_address("gateway", gateway)?;
        }

        self.auxiliary_addresses.validate()
    }
}

/// Auxiliary address used by a network driver, mapped from a hostname
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpamAuxiliaryAddress {
    pub address_name: String,
    pub address: String,
}

impl IpamAuxiliaryAddress {
    pub fn new(address_name: &str, address: &str) -> Self {
        Self {
            address_name: address_name.to_string(),
            address: address.to_string(),
        }
    }
}

impl Validate for IpamAuxiliaryAddress {
    fn validate(&self) -> Result<()> {
        validate::required("address_name", &self.address_name)?;
        validate::max_length("address_name", &self.address_name, MAX_FIELD_LENGTH)?;
        validate::ip_address("address", &self.address)
    }
}
