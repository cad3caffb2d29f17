//! swarm-compose - Docker Compose / Swarm configuration records
//!
//! This is the CLI entry point for swarm-compose.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use swarm_compose::models::{
    BuildConfiguration, EndpointMode, IpamAuxiliaryAddress, IpamConfig, Network, Service,
    UsedSecret,
};
use swarm_compose::{ProjectStore, Settings};
use tracing_subscriber::EnvFilter;

/// swarm-compose - Compose file records for Docker Swarm
#[derive(Parser)]
#[command(name = "swarm-compose")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Manage Docker Compose / Swarm configuration records", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active settings
    Settings,

    /// List the stock network drivers
    Drivers,

    /// List the deploy endpoint modes
    #[command(name = "endpoint-modes")]
    EndpointModes,

    /// Set or clear the project name
    Name {
        /// Project name, cleared when omitted
        name: Option<String>,
    },

    /// Render the project as a Compose file
    Render {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Render JSON instead of YAML
        #[arg(long)]
        json: bool,
    },

    /// Manage networks
    Network {
        #[command(subcommand)]
        command: NetworkCommands,
    },

    /// Manage services
    Service {
        #[command(subcommand)]
        command: ServiceCommands,
    },
}

#[derive(Subcommand)]
enum NetworkCommands {
    /// List networks
    #[command(name = "ls")]
    List,
    /// Create a network
    Create {
        /// Network name
        name: String,
        /// Driver
        #[arg(short, long)]
        driver: Option<String>,
        /// Allow standalone containers to attach
        #[arg(long)]
        attachable: bool,
        /// Isolate the network externally
        #[arg(long)]
        internal: bool,
        /// Network is managed outside the project
        #[arg(long)]
        external: bool,
    },
    /// Remove a network
    #[command(name = "rm")]
    Remove {
        /// Network name
        network: String,
    },
    /// Inspect a network
    Inspect {
        /// Network name
        network: String,
    },
    /// Set a network label
    Label {
        /// Network name
        network: String,
        /// Label key
        key: String,
        /// Label text
        label: String,
    },
    /// Remove a network label
    Unlabel {
        /// Network name
        network: String,
        /// Label key
        key: String,
    },
    /// Set a driver option
    #[command(name = "option")]
    DriverOpt {
        /// Network name
        network: String,
        /// Option name
        key: String,
        /// Option value
        value: String,
    },
    /// Add an IPAM config
    Ipam {
        /// Network name
        network: String,
        /// IPAM driver
        #[arg(long)]
        driver: Option<String>,
        /// Subnet
        #[arg(long)]
        subnet: Option<String>,
        /// IP range
        #[arg(long)]
        ip_range: Option<String>,
        /// Gateway
        #[arg(long)]
        gateway: Option<String>,
        /// Auxiliary address (name=address)
        #[arg(long, value_parser = parse_key_value)]
        aux_address: Vec<(String, String)>,
    },
}

#[derive(Subcommand)]
enum ServiceCommands {
    /// List services
    #[command(name = "ls")]
    List,
    /// Create a service
    Create {
        /// Service name
        name: String,
        /// Image
        #[arg(long)]
        image: Option<String>,
    },
    /// Remove a service
    #[command(name = "rm")]
    Remove {
        /// Service name
        service: String,
    },
    /// Inspect a service
    Inspect {
        /// Service name
        service: String,
    },
    /// Set the build configuration
    Build {
        /// Service name
        service: String,
        /// Build context
        #[arg(long, default_value = ".")]
        context: String,
        /// Dockerfile name
        #[arg(short = 'f', long)]
        dockerfile: Option<String>,
        /// Target build stage
        #[arg(long)]
        target: Option<String>,
        /// Build argument (KEY=value)
        #[arg(long, value_parser = parse_key_value)]
        build_arg: Vec<(String, String)>,
        /// Image label (KEY=value)
        #[arg(long, value_parser = parse_key_value)]
        label: Vec<(String, String)>,
        /// Secret available while building
        #[arg(long)]
        secret: Vec<String>,
        /// Image tag
        #[arg(short, long)]
        tag: Vec<String>,
    },
    /// Update the deploy specification
    Deploy {
        /// Service name
        service: String,
        /// Endpoint mode (vip or dnsrr)
        #[arg(long)]
        endpoint_mode: Option<EndpointMode>,
        /// Service label (KEY=value)
        #[arg(long, value_parser = parse_key_value)]
        label: Vec<(String, String)>,
        /// Service label key to remove
        #[arg(long)]
        unlabel: Vec<String>,
    },
    /// Grant a secret to a service
    Secret {
        /// Service name
        service: String,
        /// Secret name
        source: String,
        /// File name under /run/secrets/
        #[arg(long)]
        target: Option<String>,
        /// Owning UID
        #[arg(long)]
        uid: Option<String>,
        /// Owning GID
        #[arg(long)]
        gid: Option<String>,
        /// Octal file mode
        #[arg(long)]
        mode: Option<String>,
    },
    /// Set a service annotation
    Annotate {
        /// Service name
        service: String,
        /// Annotation key
        key: String,
        /// Annotation value
        value: String,
    },
    /// Remove a service annotation
    Unannotate {
        /// Service name
        service: String,
        /// Annotation key
        key: String,
    },
    /// Connect a service to a network
    Connect {
        /// Service name
        service: String,
        /// Network name
        network: String,
    },
    /// Disconnect a service from a network
    Disconnect {
        /// Service name
        service: String,
        /// Network name
        network: String,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=value, got '{}'", s))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env().context("Failed to load settings")?;

    // Initialize logging
    let filter = if cli.debug || settings.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Settings => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            return Ok(());
        }
        Commands::Drivers => {
            println!("{:<10} {:<10} DESCRIPTION", "DRIVER", "NAME");
            for driver in Network::stock_drivers() {
                println!(
                    "{:<10} {:<10} {}",
                    driver.value, driver.text, driver.description
                );
            }
            return Ok(());
        }
        Commands::EndpointModes => {
            println!("{:<10} DESCRIPTION", "MODE");
            for mode in EndpointMode::ALL {
                println!("{:<10} {}", mode.to_string(), mode.label());
            }
            return Ok(());
        }
        _ => {}
    }

    let store = ProjectStore::open(&settings.database).with_context(|| {
        format!("Failed to open database '{}'", settings.database.name)
    })?;

    match cli.command {
        Commands::Settings | Commands::Drivers | Commands::EndpointModes => {}

        Commands::Name { name } => {
            store.set_name(name.clone())?;
            match name {
                Some(name) => println!("Project name set to {}", name),
                None => println!("Project name cleared"),
            }
        }

        Commands::Render { output, json } => {
            let file = store.render()?;
            let content = if json { file.to_json()? } else { file.to_yaml()? };

            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{}", content),
            }
        }

        Commands::Network { command } => match command {
            NetworkCommands::List => {
                println!("{:<20} {:<10} {:<20}", "NAME", "DRIVER", "CREATED");
                for network in store.list_networks()? {
                    println!(
                        "{:<20} {:<10} {:<20}",
                        network.name,
                        network.driver.as_deref().unwrap_or("-"),
                        settings.format_timestamp(&network.created)
                    );
                }
            }
            NetworkCommands::Create {
                name,
                driver,
                attachable,
                internal,
                external,
            } => {
                let mut network = Network::new(&name);
                network.driver = driver;
                network.attachable = attachable;
                network.internal = internal;
                network.external = external;
                store.create_network(network)?;
                println!("Created network {}", name);
            }
            NetworkCommands::Remove { network } => {
                store.remove_network(&network)?;
                println!("Removed network {}", network);
            }
            NetworkCommands::Inspect { network } => {
                let network = store.get_network(&network)?;
                println!("{}", serde_json::to_string_pretty(&network)?);
                print!("{}", serde_yaml::to_string(&network.value())?);
            }
            NetworkCommands::Label {
                network,
                key,
                label,
            } => {
                store.update_network(&network, |n| n.set_label(&key, &label))?;
                println!("Labeled network {}", network);
            }
            NetworkCommands::Unlabel { network, key } => {
                let mut removed = false;
                store.update_network(&network, |n| removed = n.remove_label(&key))?;
                if removed {
                    println!("Removed label {} from network {}", key, network);
                } else {
                    println!("Network {} has no label {}", network, key);
                }
            }
            NetworkCommands::DriverOpt {
                network,
                key,
                value,
            } => {
                store.update_network(&network, |n| n.set_driver_opt(&key, &value))?;
                println!("Set option {} on network {}", key, network);
            }
            NetworkCommands::Ipam {
                network,
                driver,
                subnet,
                ip_range,
                gateway,
                aux_address,
            } => {
                let config = IpamConfig {
                    driver,
                    subnet,
                    ip_range,
                    gateway,
                    auxiliary_addresses: aux_address
                        .iter()
                        .map(|(name, address)| IpamAuxiliaryAddress::new(name, address))
                        .collect(),
                };
                if !config.is_populated() {
                    tracing::warn!(
                        "IPAM config for {} has no driver, subnet, IP range or gateway and will not be rendered",
                        network
                    );
                }
                store.update_network(&network, |n| n.ipam_configs.push(config))?;
                println!("Added IPAM config to network {}", network);
            }
        },

        Commands::Service { command } => match command {
            ServiceCommands::List => {
                println!(
                    "{:<20} {:<30} {:<10} {:<20}",
                    "NAME", "IMAGE", "BUILD", "CREATED"
                );
                for service in store.list_services()? {
                    println!(
                        "{:<20} {:<30} {:<10} {:<20}",
                        service.name,
                        service.image.as_deref().unwrap_or("-"),
                        service.build.as_ref().map_or("-", |b| b.context.as_str()),
                        settings.format_timestamp(&service.created)
                    );
                }
            }
            ServiceCommands::Create { name, image } => {
                let mut service = Service::new(&name);
                service.image = image;
                store.create_service(service)?;
                println!("Created service {}", name);
            }
            ServiceCommands::Remove { service } => {
                store.remove_service(&service)?;
                println!("Removed service {}", service);
            }
            ServiceCommands::Inspect { service } => {
                let service = store.get_service(&service)?;
                println!("{}", serde_json::to_string_pretty(&service)?);
                print!("{}", serde_yaml::to_string(&service.value())?);
            }
            ServiceCommands::Build {
                service,
                context,
                dockerfile,
                target,
                build_arg,
                label,
                secret,
                tag,
            } => {
                let mut build = BuildConfiguration::new(&context);
                build.dockerfile = dockerfile;
                build.target = target;
                for (key, value) in &build_arg {
                    build.set_arg(key, value);
                }
                for (key, value) in &label {
                    build.set_label(key, value);
                }
                build.secrets = secret.iter().map(|s| UsedSecret::new(s)).collect();
                for t in &tag {
                    build.add_tag(t);
                }

                store.update_service(&service, |s| s.build = Some(build))?;
                println!("Set build configuration for service {}", service);
            }
            ServiceCommands::Deploy {
                service,
                endpoint_mode,
                label,
                unlabel,
            } => {
                store.update_service(&service, |s| {
                    let deploy = s.deploy.get_or_insert_with(Default::default);
                    if endpoint_mode.is_some() {
                        deploy.endpoint_mode = endpoint_mode;
                    }
                    for (key, value) in &label {
                        deploy.set_label(key, value);
                    }
                    for key in &unlabel {
                        deploy.remove_label(key);
                    }
                })?;
                println!("Updated deploy specification for service {}", service);
            }
            ServiceCommands::Secret {
                service,
                source,
                target,
                uid,
                gid,
                mode,
            } => {
                let secret = UsedSecret {
                    source: source.clone(),
                    target,
                    uid,
                    gid,
                    mode,
                };
                store.update_service(&service, |s| s.use_secret(secret))?;
                println!("Granted secret {} to service {}", source, service);
            }
            ServiceCommands::Annotate {
                service,
                key,
                value,
            } => {
                store.update_service(&service, |s| s.set_annotation(&key, &value))?;
                println!("Annotated service {}", service);
            }
            ServiceCommands::Unannotate { service, key } => {
                let mut removed = false;
                store.update_service(&service, |s| removed = s.remove_annotation(&key))?;
                if removed {
                    println!("Removed annotation {} from service {}", key, service);
                } else {
                    println!("Service {} has no annotation {}", service, key);
                }
            }
            ServiceCommands::Connect { service, network } => {
                store.get_network(&network)?;
                store.update_service(&service, |s| s.connect(&network))?;
                println!("Connected {} to {}", service, network);
            }
            ServiceCommands::Disconnect { service, network } => {
                store.update_service(&service, |s| {
                    s.disconnect(&network);
                })?;
                println!("Disconnected {} from {}", service, network);
            }
        },
    }

    Ok(())
}
