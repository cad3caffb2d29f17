//! Compose entities
//!
//! Each entity owns its child rows and knows how to turn itself into the
//! matching Compose value. Removing a parent drops its children with it.

pub mod build;
pub mod common;
pub mod deploy;
pub mod networking;
pub mod project;
pub mod secrets;
pub mod service;
pub mod validate;

pub use build::{BuildArg, BuildConfiguration, BuildSecret, ImageLabel, ImageTag};
pub use common::{StringList, StringMap};
pub use deploy::{Deploy, DeployLabel, EndpointMode};
pub use networking::{
    IpamAuxiliaryAddress, IpamConfig, Network, NetworkDriverOption, NetworkLabel, StockDriver,
};
pub use project::Project;
pub use secrets::UsedSecret;
pub use service::{Service, ServiceAnnotation};
pub use validate::Validate;
