//! Main application configuration
//!
//! This module defines the primary configuration structures for the elo-sim
//! engine, including environment variable and TOML file loading and validation.

use crate::config::rating::RatingConfig;
use crate::error::EloSimError;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub simulation: SimulationSettings,
    pub rating: RatingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Simulation run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Number of competitors registered before the run
    pub competitors: usize,
    /// Number of match simulations to attempt
    pub matches: usize,
    /// Number of concurrent workers driving simulations
    pub workers: usize,
    /// Fixed seed for the process-wide random source
    pub seed: Option<u64>,
    /// Pairing re-draws allowed before a self-pairing fails the match
    pub max_pairing_attempts: u32,
    /// Capacity of the rating store's request queue
    pub store_queue_capacity: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "elo-sim".to_string(),
            log_level: "info".to_string(),
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            competitors: 50,
            matches: 5000,
            workers: 64,
            seed: None,
            max_pairing_attempts: 16,
            store_queue_capacity: 1024,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("Invalid {} value: {}", name, value))
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds =
                parse_var("SHUTDOWN_TIMEOUT_SECONDS", &timeout)?;
        }

        // Simulation settings
        if let Ok(competitors) = env::var("SIM_COMPETITORS") {
            config.simulation.competitors = parse_var("SIM_COMPETITORS", &competitors)?;
        }
        if let Ok(matches) = env::var("SIM_MATCHES") {
            config.simulation.matches = parse_var("SIM_MATCHES", &matches)?;
        }
        if let Ok(workers) = env::var("SIM_WORKERS") {
            config.simulation.workers = parse_var("SIM_WORKERS", &workers)?;
        }
        if let Ok(seed) = env::var("SIM_SEED") {
            config.simulation.seed = Some(parse_var("SIM_SEED", &seed)?);
        }
        if let Ok(attempts) = env::var("SIM_MAX_PAIRING_ATTEMPTS") {
            config.simulation.max_pairing_attempts =
                parse_var("SIM_MAX_PAIRING_ATTEMPTS", &attempts)?;
        }
        if let Ok(capacity) = env::var("STORE_QUEUE_CAPACITY") {
            config.simulation.store_queue_capacity = parse_var("STORE_QUEUE_CAPACITY", &capacity)?;
        }

        // Rating settings
        if let Ok(base) = env::var("BASE_RATING") {
            config.rating.base_rating = parse_var("BASE_RATING", &base)?;
        }
        if let Ok(min) = env::var("MIN_RATING") {
            config.rating.min_rating = parse_var("MIN_RATING", &min)?;
        }
        if let Ok(max) = env::var("MAX_RATING") {
            config.rating.max_rating = parse_var("MAX_RATING", &max)?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents).context("Invalid TOML configuration")?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> crate::error::Result<()> {
    let invalid = |message: &str| EloSimError::InvalidConfig {
        message: message.to_string(),
    };

    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => {
            return Err(invalid(&format!(
                "Invalid log level: {}",
                config.service.log_level
            )))
        }
    }

    if config.service.shutdown_timeout_seconds == 0 {
        return Err(invalid("Shutdown timeout must be greater than 0"));
    }
    if config.simulation.workers == 0 {
        return Err(invalid("Worker count must be greater than 0"));
    }
    if config.simulation.max_pairing_attempts == 0 {
        return Err(invalid("Max pairing attempts must be greater than 0"));
    }
    if config.simulation.store_queue_capacity == 0 {
        return Err(invalid("Store queue capacity must be greater than 0"));
    }

    config.rating.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = AppConfig::default();
        config.service.log_level = "verbose".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(EloSimError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = AppConfig::default();
        config.simulation.workers = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_inverted_rating_bounds_rejected() {
        let mut config = AppConfig::default();
        config.rating.min_rating = 3000;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_from_toml_str() {
        let config = AppConfig::from_toml_str(
            r#"
            [simulation]
            competitors = 10
            matches = 200
            workers = 4
            seed = 7

            [rating]
            base_rating = 1200
            min_rating = 100
            max_rating = 3000

            [[rating.k_factor_tiers]]
            max_rating = 1500
            k_factor = 40.0

            [[rating.k_factor_tiers]]
            k_factor = 20.0
            "#,
        )
        .unwrap();

        assert_eq!(config.service.name, "elo-sim");
        assert_eq!(config.simulation.competitors, 10);
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.simulation.max_pairing_attempts, 16);
        assert_eq!(config.rating.base_rating, 1200);
        assert_eq!(config.rating.k_factor_for(1500), 40.0);
        assert_eq!(config.rating.k_factor_for(1501), 20.0);
    }

    #[test]
    fn test_from_toml_str_rejects_invalid_tiers() {
        let result = AppConfig::from_toml_str(
            r#"
            [[rating.k_factor_tiers]]
            max_rating = 1500
            k_factor = 40.0
            "#,
        );
        let err = result.unwrap_err();
        assert!(err.downcast_ref::<EloSimError>().is_some());
    }
}
