use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    /// Departments ensured at startup. Catalog management proper lives
    /// outside this service; the seed list only guarantees the queues
    /// named here exist before the first request arrives.
    #[serde(default)]
    pub departments: Vec<DepartmentSeed>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("vestibule.db")
}

/// Queue engine tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Minutes of service assumed per pending ticket when estimating wait.
    #[serde(default = "default_service_minutes")]
    pub service_minutes_per_ticket: u32,
    /// Per-department change notification channel capacity.
    #[serde(default = "default_notify_buffer")]
    pub notify_buffer: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            service_minutes_per_ticket: default_service_minutes(),
            notify_buffer: default_notify_buffer(),
        }
    }
}

fn default_service_minutes() -> u32 {
    15
}

fn default_notify_buffer() -> usize {
    256
}

/// A department to get-or-create at startup, keyed by name + facility.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DepartmentSeed {
    pub name: String,
    pub facility: String,
}

/// Sanitized config for API responses (seed list omitted; live department
/// state is served by its own endpoint)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub queue: QueueConfig,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            queue: config.queue.clone(),
        }
    }
}
