//! Configuration module
//!
//! Environment-driven configuration for the sketchdrop server. Loaded once at
//! startup; every value is validated before the server binds its listener.

use std::env;

const DEFAULT_PORT: u16 = 8080;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_IMAGE_WIDTH: u32 = 1920;
const MAX_IMAGE_HEIGHT: u32 = 1080;
const RATE_LIMIT_MAX_REQUESTS: usize = 10;
const RATE_LIMIT_PERIOD_SECS: u64 = 60;
const WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub server_port: u16,
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// Pixel ceiling is `max_image_width * max_image_height`; decoding never
    /// materializes a raster larger than that area.
    pub max_image_width: u32,
    pub max_image_height: u32,
    pub rate_limit_max_requests: usize,
    pub rate_limit_period_secs: u64,
    pub saved_images_path: String,
    pub webhook_url: String,
    pub webhook_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            max_image_width: env::var("MAX_IMAGE_WIDTH")
                .unwrap_or_else(|_| MAX_IMAGE_WIDTH.to_string())
                .parse()
                .unwrap_or(MAX_IMAGE_WIDTH),
            max_image_height: env::var("MAX_IMAGE_HEIGHT")
                .unwrap_or_else(|_| MAX_IMAGE_HEIGHT.to_string())
                .parse()
                .unwrap_or(MAX_IMAGE_HEIGHT),
            rate_limit_max_requests: env::var("RATE_LIMIT_MAX_REQUESTS")
                .unwrap_or_else(|_| RATE_LIMIT_MAX_REQUESTS.to_string())
                .parse()
                .unwrap_or(RATE_LIMIT_MAX_REQUESTS),
            rate_limit_period_secs: env::var("RATE_LIMIT_PERIOD_SECS")
                .unwrap_or_else(|_| RATE_LIMIT_PERIOD_SECS.to_string())
                .parse()
                .unwrap_or(RATE_LIMIT_PERIOD_SECS),
            saved_images_path: env::var("SAVED_IMAGES_PATH")
                .unwrap_or_else(|_| "images".to_string()),
            webhook_url: env::var("DISCORD_WEBHOOK_URL")
                .map_err(|_| anyhow::anyhow!("DISCORD_WEBHOOK_URL must be set"))?,
            webhook_timeout_secs: env::var("WEBHOOK_TIMEOUT_SECS")
                .unwrap_or_else(|_| WEBHOOK_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(WEBHOOK_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if !self.webhook_url.starts_with("https://") {
            return Err(anyhow::anyhow!("DISCORD_WEBHOOK_URL must be an https URL"));
        }

        if self.max_image_width == 0 || self.max_image_height == 0 {
            return Err(anyhow::anyhow!(
                "MAX_IMAGE_WIDTH and MAX_IMAGE_HEIGHT must be greater than 0"
            ));
        }

        Ok(())
    }

    /// Maximum decoded pixel area (width * height) accepted from a payload.
    pub fn max_pixel_area(&self) -> u64 {
        u64::from(self.max_image_width) * u64::from(self.max_image_height)
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}
