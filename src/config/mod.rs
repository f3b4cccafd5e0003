//! Application configuration management

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Default upstream listing relayed by the feed endpoint
pub const DEFAULT_FEED_URL: &str = "https://www.reddit.com/r/news/top.json";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// SQLite database path or `sqlite:` URL
    pub database_url: String,

    /// Maximum pooled database connections
    pub database_max_connections: u32,

    /// JWT secret for token verification
    pub jwt_secret: String,

    /// Upstream top-news listing
    pub feed_url: String,

    /// User agent sent with every feed request
    pub feed_user_agent: String,

    /// Upper bound on a single feed request
    pub feed_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Prefer DATABASE_PATH, fall back to DATABASE_URL
        let database_url = env::var("DATABASE_PATH")
            .or_else(|_| env::var("DATABASE_URL"))
            .unwrap_or_else(|_| "./data/newsletter.db".to_string());

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            // In production, this should be set explicitly
            tracing::warn!("JWT_SECRET not set, using development secret");
            "dev-secret-change-me".to_string()
        });

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("Invalid PORT")?,

            database_url,

            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),

            jwt_secret: jwt_secret.trim().to_string(),

            feed_url: env::var("FEED_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.to_string()),

            feed_user_agent: env::var("FEED_USER_AGENT")
                .unwrap_or_else(|_| "newsletter-backend".to_string()),

            feed_timeout: Duration::from_secs(
                env::var("FEED_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .context("Invalid FEED_TIMEOUT_SECS")?,
            ),
        })
    }

    /// Configuration suitable for tests: in-memory database, fixed secret.
    pub fn for_tests(feed_url: impl Into<String>) -> Self {
        Self {
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            feed_url: feed_url.into(),
            feed_user_agent: "newsletter-tests".to_string(),
            feed_timeout: Duration::from_secs(2),
        }
    }
}
