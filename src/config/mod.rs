use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::database::manager::DatabaseError;

/// Upper bound for token lifetimes (one year)
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub reports: ReportConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// Full connection URL; when unset the URL is assembled from the parts below
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub high_value_threshold: Decimal,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from `lookup` (the process environment in production).
    /// Values that fail to parse keep the current setting and log a warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Server overrides
        if let Some(v) = lookup("APP_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("APP_PORT").or_else(|| lookup("PORT")) {
            self.server.port = parse_or_keep("APP_PORT", &v, self.server.port);
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_BACKEND") {
            self.database.backend = match v.trim().to_ascii_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "postgres" | "postgresql" => StorageBackend::Postgres,
                other => {
                    warn!("Ignoring DATABASE_BACKEND={:?}; expected postgres or memory", other);
                    self.database.backend
                }
            };
        }
        if let Some(v) = lookup("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Some(v) = lookup("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = lookup("DB_PORT") {
            self.database.port = parse_or_keep("DB_PORT", &v, self.database.port);
        }
        if let Some(v) = lookup("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = lookup("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Some(v) = lookup("DB_NAME") {
            self.database.name = v;
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_or_keep("DATABASE_MAX_CONNECTIONS", &v, self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout =
                parse_or_keep("DATABASE_CONNECTION_TIMEOUT", &v, self.database.connection_timeout);
        }
        if let Some(v) = lookup("DATABASE_SEED_DEMO_DATA") {
            self.database.seed_demo_data =
                parse_or_keep("DATABASE_SEED_DEMO_DATA", &v, self.database.seed_demo_data);
        }

        // Security overrides
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("SECURITY_JWT_EXPIRY_HOURS") {
            let hours = parse_or_keep("SECURITY_JWT_EXPIRY_HOURS", &v, self.security.jwt_expiry_hours);
            self.security.jwt_expiry_hours = if (1..=MAX_JWT_EXPIRY_HOURS).contains(&hours) {
                hours
            } else {
                let clamped = hours.clamp(1, MAX_JWT_EXPIRY_HOURS);
                warn!(
                    "SECURITY_JWT_EXPIRY_HOURS={} is outside 1..={}; using {}",
                    hours, MAX_JWT_EXPIRY_HOURS, clamped
                );
                clamped
            };
        }
        if let Some(v) = lookup("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = parse_or_keep("SECURITY_BCRYPT_COST", &v, self.security.bcrypt_cost);
        }
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = parse_or_keep("SECURITY_ENABLE_CORS", &v, self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Report overrides
        if let Some(v) = lookup("REPORT_HIGH_VALUE_THRESHOLD") {
            self.reports.high_value_threshold =
                parse_or_keep("REPORT_HIGH_VALUE_THRESHOLD", &v, self.reports.high_value_threshold);
        }

        self
    }

    /// Connection URL for the configured PostgreSQL database
    pub fn connection_url(&self) -> Result<String, DatabaseError> {
        if let Some(url) = &self.database.url {
            url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
            return Ok(url.clone());
        }

        let db = &self.database;
        let mut url = url::Url::parse(&format!("postgres://{}:{}", db.host, db.port))
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_username(&db.user)
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if !db.password.is_empty() {
            url.set_password(Some(&db.password))
                .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        }
        url.set_path(&format!("/{}", db.name));
        Ok(url.into())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                host: "127.0.0.1".to_string(),
                port: 5432,
                user: "demo".to_string(),
                password: "demopass".to_string(),
                name: "demo".to_string(),
                max_connections: 10,
                connection_timeout: 30,
                seed_demo_data: true,
            },
            security: SecurityConfig {
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_hours: 24,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            reports: ReportConfig {
                high_value_threshold: Decimal::from(50_000),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                host: "127.0.0.1".to_string(),
                port: 5432,
                user: "demo".to_string(),
                password: "demopass".to_string(),
                name: "demo".to_string(),
                max_connections: 20,
                connection_timeout: 10,
                seed_demo_data: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 8,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            reports: ReportConfig {
                high_value_threshold: Decimal::from(50_000),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                host: "127.0.0.1".to_string(),
                port: 5432,
                user: "demo".to_string(),
                password: String::new(),
                name: "demo".to_string(),
                max_connections: 50,
                connection_timeout: 5,
                seed_demo_data: false,
            },
            security: SecurityConfig {
                // Must come from JWT_SECRET; token issuance refuses an empty secret
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            reports: ReportConfig {
                high_value_threshold: Decimal::from(50_000),
            },
        }
    }
}

fn parse_or_keep<T>(key: &str, raw: &str, current: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("Ignoring {}={:?}; keeping {:?}", key, raw, current);
            current
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
