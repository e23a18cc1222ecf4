// Configuration management with layered configuration (file, env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// JWT secret shipped in the defaults; only acceptable outside production
pub const DEV_JWT_SECRET: &str = "secret-dev";

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `development`, `test` or `production`
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_environment() -> String {
    "development".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_bcrypt_cost() -> u32 {
    12
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub tracing_endpoint: Option<String>,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    ///
    /// Every key can be overridden from the environment, e.g.
    /// `APP__DATABASE__URL` or `APP__AUTH__JWT_SECRET`.
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let defaults = Settings::default();

        let builder = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("server.environment", defaults.server.environment)?
            .set_default("database.url", defaults.database.url)?
            .set_default(
                "database.max_connections",
                i64::from(defaults.database.max_connections),
            )?
            .set_default(
                "database.min_connections",
                i64::from(defaults.database.min_connections),
            )?
            .set_default(
                "database.connect_timeout_seconds",
                defaults.database.connect_timeout_seconds as i64,
            )?
            .set_default("auth.jwt_secret", defaults.auth.jwt_secret)?
            .set_default(
                "auth.jwt_expiration_hours",
                defaults.auth.jwt_expiration_hours as i64,
            )?
            .set_default("auth.bcrypt_cost", i64::from(defaults.auth.bcrypt_cost))?
            .set_default("observability.log_level", defaults.observability.log_level)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Local overrides (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.server.environment.eq_ignore_ascii_case("production")
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.database.min_connections > self.database.max_connections {
            return Err("Database min_connections cannot exceed max_connections".to_string());
        }

        if self.auth.jwt_secret.is_empty() {
            return Err("JWT secret cannot be empty".to_string());
        }
        if self.is_production() && self.auth.jwt_secret == DEV_JWT_SECRET {
            return Err("JWT secret must be overridden in production".to_string());
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err("bcrypt_cost must be between 4 and 31".to_string());
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
                environment: default_environment(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/jobly".to_string(),
                max_connections: 10,
                min_connections: 2,
                connect_timeout_seconds: 30,
            },
            auth: AuthConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiration_hours: 24,
                bcrypt_cost: default_bcrypt_cost(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                tracing_endpoint: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_catches_empty_database_url() {
        let mut settings = Settings::default();
        settings.database.url = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_port() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_empty_jwt_secret() {
        let mut settings = Settings::default();
        settings.auth.jwt_secret = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_production_rejects_dev_jwt_secret() {
        let mut settings = Settings::default();
        settings.server.environment = "production".to_string();
        assert_eq!(
            settings.validate(),
            Err("JWT secret must be overridden in production".to_string())
        );

        settings.auth.jwt_secret = "a-real-secret".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_catches_bcrypt_cost_out_of_range() {
        let mut settings = Settings::default();
        settings.auth.bcrypt_cost = 3;
        assert!(settings.validate().is_err());
        settings.auth.bcrypt_cost = 32;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        let settings = Settings::load_from_path("does-not-exist").unwrap();
        assert_eq!(settings.auth.jwt_expiration_hours, 24);
        assert!(settings.validate().is_ok());
    }
}
