//! Docker Compose file schema
//!
//! The types here describe the Compose document that the models serialize
//! into. Only keys that carry a value are written out.

pub mod schema;

pub use schema::{
    BuildSpec, BuildSpecLong, ComposeFile, DeploySpec, IpamPoolSpec, IpamSpec, NetworkSpec,
    SecretDeclaration, SecretRef, SecretRefLong, ServiceSpec,
};
