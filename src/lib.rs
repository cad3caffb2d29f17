//! swarm-compose - Docker Compose / Swarm configuration records
//!
//! swarm-compose keeps Compose entities as typed records and turns them
//! into Compose file values:
//!
//! - Networks with labels, driver options and IPAM configs
//! - Services with build configurations, deploy specs and secrets
//! - Short-form collapsing wherever the Compose schema allows it
//! - A file-backed record store configured from the environment

pub mod compose;
pub mod error;
pub mod models;
pub mod settings;
pub mod store;
pub mod utils;

pub use error::{ComposeError, Result};
pub use settings::Settings;
pub use store::ProjectStore;
