//! Record store for networks and services
//!
//! Records live in memory behind a lock. A store opened from settings is
//! backed by a JSON file that is rewritten after every change. A change
//! is only kept in memory once it has been written out.

use crate::compose::ComposeFile;
use crate::error::{ComposeError, Result};
use crate::models::{Network, Project, Service, Validate};
use crate::settings::{DatabaseSettings, FILE_ENGINE};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard};
use tracing::{debug, info};

/// Store for a single Compose project
pub struct ProjectStore {
    project: Arc<RwLock<Project>>,
    path: Option<PathBuf>,
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl ProjectStore {
    /// Create a store that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            project: Arc::new(RwLock::new(Project::default())),
            path: None,
        }
    }

    /// Open the store described by the database settings
    pub fn open(database: &DatabaseSettings) -> Result<Self> {
        if database.engine != FILE_ENGINE {
            return Err(ComposeError::InvalidConfig(format!(
                "Unsupported database engine '{}', only '{}' is available",
                database.engine, FILE_ENGINE
            )));
        }

        Self::open_file(Path::new(&database.name))
    }

    /// Open a store backed by a JSON file, starting empty if it does not exist
    pub fn open_file(path: &Path) -> Result<Self> {
        let project = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let project: Project = serde_json::from_str(&content)?;
            project.validate()?;
            debug!(
                "Loaded {} networks and {} services from {}",
                project.networks.len(),
                project.services.len(),
                path.display()
            );
            project
        } else {
            debug!("No database at {}, starting empty", path.display());
            Project::default()
        };

        Ok(Self {
            project: Arc::new(RwLock::new(project)),
            path: Some(path.to_path_buf()),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Project>> {
        self.project
            .read()
            .map_err(|_| ComposeError::Lock("Failed to acquire read lock".to_string()))
    }

    /// Apply a change to a copy of the project, write the copy out, then
    /// swap it in. A failed change or write leaves the project untouched.
    fn commit<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut Project) -> Result<T>,
    {
        let mut project = self
            .project
            .write()
            .map_err(|_| ComposeError::Lock("Failed to acquire write lock".to_string()))?;

        let mut updated = project.clone();
        let output = change(&mut updated)?;
        self.persist(&updated)?;
        *project = updated;
        Ok(output)
    }

    fn persist(&self, project: &Project) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // The database file is only ever replaced by a complete write.
        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        let content = serde_json::to_string_pretty(project)?;
        std::fs::write(&staging, content)?;
        if let Err(e) = std::fs::rename(&staging, path) {
            let _ = std::fs::remove_file(&staging);
            return Err(e.into());
        }

        debug!("Saved project to {}", path.display());
        Ok(())
    }

    /// Copy of the whole project
    pub fn project(&self) -> Result<Project> {
        Ok(self.read()?.clone())
    }

    /// Set or clear the project name
    pub fn set_name(&self, name: Option<String>) -> Result<()> {
        self.commit(|project| {
            project.name = name;
            project.validate()
        })
    }

    /// Compose document for the current project
    pub fn render(&self) -> Result<ComposeFile> {
        let project = self.read()?;
        for warning in project.warnings() {
            tracing::warn!("{}", warning);
        }
        Ok(project.value())
    }

    /// Add a network
    pub fn create_network(&self, network: Network) -> Result<()> {
        network.validate()?;

        self.commit(|project| {
            if project.network(&network.name).is_some() {
                return Err(ComposeError::NetworkExists(network.name));
            }

            info!("Created network {}", network.name);
            project.networks.push(network);
            Ok(())
        })
    }

    /// Get a network by name
    pub fn get_network(&self, name: &str) -> Result<Network> {
        self.read()?
            .network(name)
            .cloned()
            .ok_or_else(|| ComposeError::NetworkNotFound(name.to_string()))
    }

    /// List all networks
    pub fn list_networks(&self) -> Result<Vec<Network>> {
        Ok(self.read()?.networks.clone())
    }

    /// Change a network in place.
    ///
    /// The change is validated before it is kept. Renaming a network
    /// renames it in every service that joins it.
    pub fn update_network<F>(&self, name: &str, change: F) -> Result<Network>
    where
        F: FnOnce(&mut Network),
    {
        self.commit(|project| {
            let index = project
                .networks
                .iter()
                .position(|n| n.name == name)
                .ok_or_else(|| ComposeError::NetworkNotFound(name.to_string()))?;

            let mut updated = project.networks[index].clone();
            change(&mut updated);
            updated.validate()?;

            if updated.name != name {
                if project.network(&updated.name).is_some() {
                    return Err(ComposeError::NetworkExists(updated.name));
                }
                for service in project.services.iter_mut() {
                    for network in service.networks.iter_mut() {
                        if network == name {
                            *network = updated.name.clone();
                        }
                    }
                }
                info!("Renamed network {} to {}", name, updated.name);
            } else {
                debug!("Updated network {}", name);
            }

            project.networks[index] = updated.clone();
            Ok(updated)
        })
    }

    /// Remove a network along with its labels, options and IPAM configs.
    ///
    /// Services that joined the network leave it.
    pub fn remove_network(&self, name: &str) -> Result<Network> {
        self.commit(|project| {
            let index = project
                .networks
                .iter()
                .position(|n| n.name == name)
                .ok_or_else(|| ComposeError::NetworkNotFound(name.to_string()))?;

            let removed = project.networks.remove(index);
            for service in project.services.iter_mut() {
                if service.disconnect(name) {
                    debug!("Disconnected service {} from network {}", service.name, name);
                }
            }

            info!("Removed network {}", name);
            Ok(removed)
        })
    }

    /// Add a service
    pub fn create_service(&self, service: Service) -> Result<()> {
        service.validate()?;

        self.commit(|project| {
            if project.service(&service.name).is_some() {
                return Err(ComposeError::ServiceExists(service.name));
            }

            info!("Created service {}", service.name);
            project.services.push(service);
            Ok(())
        })
    }

    /// Get a service by name
    pub fn get_service(&self, name: &str) -> Result<Service> {
        self.read()?
            .service(name)
            .cloned()
            .ok_or_else(|| ComposeError::ServiceNotFound(name.to_string()))
    }

    /// List all services
    pub fn list_services(&self) -> Result<Vec<Service>> {
        Ok(self.read()?.services.clone())
    }

    /// Change a service in place, validating the result
    pub fn update_service<F>(&self, name: &str, change: F) -> Result<Service>
    where
        F: FnOnce(&mut Service),
    {
        self.commit(|project| {
            let index = project
                .services
                .iter()
                .position(|s| s.name == name)
                .ok_or_else(|| ComposeError::ServiceNotFound(name.to_string()))?;

            let mut updated = project.services[index].clone();
            change(&mut updated);
            updated.validate()?;

            if updated.name != name && project.service(&updated.name).is_some() {
                return Err(ComposeError::ServiceExists(updated.name));
            }

            debug!("Updated service {}", name);
            project.services[index] = updated.clone();
            Ok(updated)
        })
    }

    /// Remove a service along with its build, deploy spec and secrets
    pub fn remove_service(&self, name: &str) -> Result<Service> {
        self.commit(|project| {
            let index = project
                .services
                .iter()
                .position(|s| s.name == name)
                .ok_or_else(|| ComposeError::ServiceNotFound(name.to_string()))?;

            let removed = project.services.remove(index);
            info!("Removed service {}", name);
            Ok(removed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuildConfiguration, IpamConfig, UsedSecret};

    #[test]
    fn test_create_and_get_network() {
        let store = ProjectStore::in_memory();
        store.create_network(Network::new("front")).unwrap();

        let network = store.get_network("front").unwrap();
        assert_eq!(network.name, "front");
        assert!(matches!(
            store.get_network("back"),
            Err(ComposeError::NetworkNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_network() {
        let store = ProjectStore::in_memory();
        store.create_network(Network::new("front")).unwrap();
        assert!(matches!(
            store.create_network(Network::new("front")),
            Err(ComposeError::NetworkExists(_))
        ));
    }

    #[test]
    fn test_invalid_network_rejected() {
        let store = ProjectStore::in_memory();
        let mut network = Network::new("front");
        network.ipam_configs.push(IpamConfig::subnet("not-a-subnet"));

        assert!(matches!(
            store.create_network(network),
            Err(ComposeError::Validation { .. })
        ));
        assert!(store.list_networks().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_update_leaves_record_unchanged() {
        let store = ProjectStore::in_memory();
        store.create_network(Network::new("front")).unwrap();

        let result = store.update_network("front", |n| {
            n.ipam_configs.push(IpamConfig {
                gateway: Some("nowhere".to_string()),
                ..Default::default()
            })
        });

        assert!(result.is_err());
        assert!(store.get_network("front").unwrap().ipam_configs.is_empty());
    }

    #[test]
    fn test_rename_network_updates_services() {
        let store = ProjectStore::in_memory();
        store.create_network(Network::new("front")).unwrap();

        let mut web = Service::new("web").image("nginx");
        web.connect("front");
        store.create_service(web).unwrap();

        store
            .update_network("front", |n| n.name = "edge".to_string())
            .unwrap();

        assert_eq!(store.get_service("web").unwrap().networks, vec!["edge"]);
    }

    #[test]
    fn test_remove_network_cascades() {
        let store = ProjectStore::in_memory();
        let mut network = Network::new("back");
        network.set_label("tier", "data");
        network.ipam_configs.push(IpamConfig::subnet("10.226.126.0/24"));
        store.create_network(network).unwrap();

        let mut db = Service::new("db").image("postgres:16");
        db.connect("back");
        store.create_service(db).unwrap();

        let removed = store.remove_network("back").unwrap();
        assert_eq!(removed.labels.len(), 1);
        assert!(store.list_networks().unwrap().is_empty());
        assert!(store.get_service("db").unwrap().networks.is_empty());
        assert!(store.remove_network("back").is_err());
    }

    #[test]
    fn test_update_and_remove_service() {
        let store = ProjectStore::in_memory();
        store.create_service(Service::new("api")).unwrap();

        store
            .update_service("api", |s| {
                let mut build = BuildConfiguration::new("./api");
                build.secrets.push(UsedSecret::new("npm_token"));
                s.build = Some(build);
            })
            .unwrap();

        let file = store.render().unwrap();
        assert!(file.secrets.contains_key("npm_token"));

        store.remove_service("api").unwrap();
        let file = store.render().unwrap();
        assert!(file.services.is_empty());
        assert!(file.secrets.is_empty());
    }

    #[test]
    fn test_rename_service_to_existing_name() {
        let store = ProjectStore::in_memory();
        store.create_service(Service::new("a")).unwrap();
        store.create_service(Service::new("b")).unwrap();

        let result = store.update_service("a", |s| s.name = "b".to_string());
        assert!(matches!(result, Err(ComposeError::ServiceExists(_))));
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db.json");

        {
            let store = ProjectStore::open_file(&path).unwrap();
            store.set_name(Some("shop".to_string())).unwrap();
            store.create_network(Network::new("front")).unwrap();
            store
                .create_service(Service::new("web").image("nginx:latest"))
                .unwrap();
        }

        let store = ProjectStore::open_file(&path).unwrap();
        let project = store.project().unwrap();
        assert_eq!(project.name.as_deref(), Some("shop"));
        assert_eq!(project.networks.len(), 1);
        assert_eq!(
            store.get_service("web").unwrap().image.as_deref(),
            Some("nginx:latest")
        );
    }

    #[test]
    fn test_open_rejects_unknown_engine() {
        let database = DatabaseSettings {
            engine: "postgresql".to_string(),
            name: "compose".to_string(),
            user: "user".to_string(),
            password: "password".to_string(),
            host: "localhost".to_string(),
            port: "5432".to_string(),
        };

        assert!(matches!(
            ProjectStore::open(&database),
            Err(ComposeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_failed_write_keeps_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let store = ProjectStore::open_file(&blocker.join("db.json")).unwrap();

        assert!(matches!(
            store.create_network(Network::new("front")),
            Err(ComposeError::Io(_))
        ));
        assert!(matches!(
            store.get_network("front"),
            Err(ComposeError::NetworkNotFound(_))
        ));
        assert!(matches!(
            store.create_network(Network::new("front")),
            Err(ComposeError::Io(_))
        ));
        assert!(store.set_name(Some("shop".to_string())).is_err());
        assert_eq!(store.project().unwrap().name, None);
    }

    #[test]
    fn test_save_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");

        let store = ProjectStore::open_file(&path).unwrap();
        store.create_network(Network::new("front")).unwrap();
        store.create_network(Network::new("back")).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["db.json"]);

        let saved: Project =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.networks.len(), 2);
    }
}
