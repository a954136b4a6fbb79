use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

use crate::access::{AdmissionFilter, AllowedNetwork, RealIpResolver};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub access: AccessConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Raw `ALLOWED_HOME_IP` value; empty means internal traffic only
    pub allowed_home_ip: String,
    pub trusted_proxy_headers: Vec<String>,
    pub use_leftmost_ip: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub automigrate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub http_addr: String,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AccessConfig {
    pub fn allowed_network(&self) -> AllowedNetwork {
        AllowedNetwork::parse(&self.allowed_home_ip)
    }

    pub fn admission_filter(&self) -> AdmissionFilter {
        AdmissionFilter::new(self.allowed_network())
    }

    pub fn real_ip_resolver(&self) -> RealIpResolver {
        RealIpResolver::new(self.trusted_proxy_headers.clone(), self.use_leftmost_ip)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match var("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(var)
    }

    fn with_overrides<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Access overrides
        if let Some(v) = var("ALLOWED_HOME_IP") {
            self.access.allowed_home_ip = v.trim().to_string();
        }
        if let Some(v) = var("TRUSTED_PROXY_HEADERS") {
            self.access.trusted_proxy_headers = split_list(&v);
        }
        if let Some(v) = var("TRUSTED_PROXY_USE_LEFTMOST_IP") {
            self.access.use_leftmost_ip = v.parse().unwrap_or(self.access.use_leftmost_ip);
        }

        // Database overrides
        if let Some(v) = var("DATABASE_URL") {
            self.database.url = Some(v).filter(|url| !url.is_empty());
        }
        if let Some(v) = var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = var("AUTOMIGRATE") {
            self.database.automigrate = v.parse().unwrap_or(self.database.automigrate);
        }

        // API overrides
        if let Some(v) = var("HTTP_ADDR") {
            self.api.http_addr = v;
        }
        if let Some(port) = var("PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.api.http_addr = with_port(&self.api.http_addr, port);
        }
        if let Some(v) = var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Some(v) = var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            access: AccessConfig {
                allowed_home_ip: String::new(),
                trusted_proxy_headers: Vec::new(),
                use_leftmost_ip: false,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
                automigrate: true,
            },
            api: ApiConfig {
                http_addr: "127.0.0.1:8090".to_string(),
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            access: AccessConfig {
                allowed_home_ip: String::new(),
                trusted_proxy_headers: vec!["Fly-Client-IP".to_string()],
                use_leftmost_ip: false,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
                automigrate: true,
            },
            api: ApiConfig {
                http_addr: "0.0.0.0:8090".to_string(),
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: Vec::new(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            access: AccessConfig {
                allowed_home_ip: String::new(),
                trusted_proxy_headers: vec!["Fly-Client-IP".to_string()],
                use_leftmost_ip: false,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
                automigrate: true,
            },
            api: ApiConfig {
                http_addr: "0.0.0.0:8090".to_string(),
                enable_request_logging: false,
            },
            security: SecurityConfig {
                enable_cors: false,
                cors_origins: Vec::new(),
            },
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Replace the port of a `host:port` bind address
fn with_port(addr: &str, port: u16) -> String {
    let host = match addr.rsplit_once(':') {
        Some((host, _)) => host,
        None => addr,
    };
    format!("{}:{}", host, port)
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
