//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection URL (PostgreSQL)
    pub database_url: String,

    /// Redis connection URL (verification codes and bind staging)
    pub redis_url: String,

    /// Deployment environment: "production" enables strict cookie attributes
    pub environment: String,

    /// Public base URL of this service (used for locally stored avatars)
    pub public_url: String,

    /// Frontend URL the OAuth callback redirects back to
    pub frontend_callback_url: String,

    /// Runtime configuration
    pub rust_log: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let config = Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL is required"))?,

            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),

            environment: env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string()),

            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),

            frontend_callback_url: env::var("FRONTEND_CALLBACK_URL")
                .unwrap_or_else(|_| "http://localhost:5173/oauth/callback".to_string()),

            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "gatehouse=debug".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        };

        Ok(config)
    }

    /// Whether the service runs in production mode
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
