//! Configuration management for InfoNest Core

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Redis configuration
    pub redis: RedisConfig,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Session permission-cache configuration
    pub session_cache: SessionCacheConfig,
    /// Allowed CORS origins (empty means allow any, dev only)
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    /// When false the in-memory cache store is used instead of Redis
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub access_token_ttl_secs: i64,
}

/// Settings for the session permission cache
#[derive(Debug, Clone)]
pub struct SessionCacheConfig {
    /// Freshness window for cached profile/permission entries
    pub ttl_secs: u64,
}

impl Default for SessionCacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("Invalid DATABASE_MAX_CONNECTIONS")?,
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()
                    .context("Invalid DATABASE_MIN_CONNECTIONS")?,
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string()),
                enabled: env::var("REDIS_ENABLED")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .context("Invalid REDIS_ENABLED")?,
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").context("JWT_SECRET is required")?,
                issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "infonest".to_string()),
                access_token_ttl_secs: env::var("JWT_ACCESS_TOKEN_TTL_SECS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()
                    .context("Invalid JWT_ACCESS_TOKEN_TTL_SECS")?,
            },
            session_cache: SessionCacheConfig {
                ttl_secs: env::var("SESSION_CACHE_TTL_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .context("Invalid SESSION_CACHE_TTL_SECS")?,
            },
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        })
    }

    /// HTTP bind address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cache_default_ttl_is_five_minutes() {
        assert_eq!(SessionCacheConfig::default().ttl_secs, 300);
    }

    #[test]
    fn test_http_addr_format() {
        let config = Config {
            http_host: "127.0.0.1".to_string(),
            http_port: 9090,
            database: DatabaseConfig {
                url: "mysql://test".to_string(),
                max_connections: 5,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost".to_string(),
                enabled: false,
            },
            jwt: JwtConfig {
                secret: "secret".to_string(),
                issuer: "infonest".to_string(),
                access_token_ttl_secs: 3600,
            },
            session_cache: SessionCacheConfig::default(),
            cors_allowed_origins: vec![],
        };
        assert_eq!(config.http_addr(), "127.0.0.1:9090");
    }
}
