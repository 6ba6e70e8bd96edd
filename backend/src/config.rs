//! Configuration management for the bar stock ledger
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with BARSTOCK_ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Which store backs the repositories
    pub storage: StorageConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Stock ledger rules
    pub stock: StockConfig,

    /// Log output
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StockConfig {
    /// Remaining length (mm) at or below which a lot is reported as low
    pub low_stock_threshold: Decimal,

    /// Multiplier applied to the base price of a quote
    pub price_margin: Decimal,

    /// Attempts made when a concurrent write beats ours
    pub max_write_attempts: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("BARSTOCK_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("storage.backend", "postgres")?
            .set_default("database.url", "postgres://localhost/barstock")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("stock.low_stock_threshold", "200")?
            .set_default("stock.price_margin", "1.3")?
            .set_default("stock.max_write_attempts", 3)?
            .set_default("log.format", "pretty")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (BARSTOCK_ prefix)
            .add_source(
                Environment::with_prefix("BARSTOCK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.stock.max_write_attempts == 0 {
            return Err(ConfigError::Message(
                "stock.max_write_attempts must be at least 1".to_string(),
            ));
        }
        if self.stock.low_stock_threshold < Decimal::ZERO {
            return Err(ConfigError::Message(
                "stock.low_stock_threshold cannot be negative".to_string(),
            ));
        }
        if self.stock.price_margin <= Decimal::ZERO {
            return Err(ConfigError::Message(
                "stock.price_margin must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[cfg(test)]
impl Config {
    /// In-memory configuration with default rules
    pub fn in_memory() -> Self {
        Self {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            storage: StorageConfig {
                backend: StorageBackend::Memory,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 1,
                min_connections: 0,
            },
            stock: StockConfig::default(),
            log: LogConfig {
                format: LogFormat::Pretty,
            },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: Decimal::from(shared::reporting::DEFAULT_LOW_STOCK_THRESHOLD),
            price_margin: shared::reporting::default_price_margin(),
            max_write_attempts: 3,
        }
    }
}
