use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Queue tuning values are usable
/// - Seed departments are well formed and unique
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.queue.service_minutes_per_ticket == 0 {
        return Err(ConfigError::ValidationError(
            "queue.service_minutes_per_ticket must be at least 1".to_string(),
        ));
    }

    if config.queue.notify_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "queue.notify_buffer must be at least 1".to_string(),
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for seed in &config.departments {
        if seed.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "departments entries require a non-empty name".to_string(),
            ));
        }
        if seed.facility.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "department '{}' requires a non-empty facility",
                seed.name
            )));
        }
        if !seen.insert((seed.name.as_str(), seed.facility.as_str())) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate department seed '{}' at '{}'",
                seed.name, seed.facility
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DepartmentSeed, QueueConfig, ServerConfig};
    use std::net::IpAddr;

    fn base_config() -> Config {
        Config {
            server: ServerConfig::default(),
            database: Default::default(),
            queue: QueueConfig::default(),
            departments: vec![],
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = base_config();
        config.server = ServerConfig {
            host: "0.0.0.0".parse::<IpAddr>().unwrap(),
            port: 0,
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_service_minutes_fails() {
        let mut config = base_config();
        config.queue.service_minutes_per_ticket = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_empty_seed_name_fails() {
        let mut config = base_config();
        config.departments.push(DepartmentSeed {
            name: "  ".to_string(),
            facility: "Central".to_string(),
        });
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_duplicate_seed_fails() {
        let mut config = base_config();
        let seed = DepartmentSeed {
            name: "Radiology".to_string(),
            facility: "Central".to_string(),
        };
        config.departments.push(seed.clone());
        config.departments.push(seed);
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_distinct_seeds_ok() {
        let mut config = base_config();
        config.departments.push(DepartmentSeed {
            name: "Radiology".to_string(),
            facility: "Central".to_string(),
        });
        config.departments.push(DepartmentSeed {
            name: "Radiology".to_string(),
            facility: "North".to_string(),
        });
        assert!(validate_config(&config).is_ok());
    }
}
