//! Application configuration loaded from environment variables.

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — PostgreSQL connection string; absent means the
///   in-memory store is used
/// - `AI_GENERATION_TIMEOUT_SECS` — how long a search request waits for
///   the listing generator before giving up (default: `5`)
/// - `STALE_LISTING_MAX_AGE_HOURS` — age past which never-ordered AI
///   listings are cleaned up (default: `168`, one week)
/// - `CLEANUP_INTERVAL_SECS` — how often the cleanup task is scheduled
///   (default: `3600`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub ai_generation_timeout_secs: u64,
    pub stale_listing_max_age_hours: i64,
    pub cleanup_interval_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            ai_generation_timeout_secs: std::env::var("AI_GENERATION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            stale_listing_max_age_hours: std::env::var("STALE_LISTING_MAX_AGE_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(168),
            cleanup_interval_secs: std::env::var("CLEANUP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Timeout for the synchronous AI-generation search fallback.
    pub fn ai_generation_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.ai_generation_timeout_secs)
    }

    /// Maximum age of a never-ordered AI listing before cleanup.
    pub fn stale_listing_max_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.stale_listing_max_age_hours)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            ai_generation_timeout_secs: 5,
            stale_listing_max_age_hours: 168,
            cleanup_interval_secs: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert!(config.database_url.is_none());
        assert_eq!(config.ai_generation_timeout_secs, 5);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_duration_helpers() {
        let config = Config::default();
        assert_eq!(
            config.ai_generation_timeout(),
            std::time::Duration::from_secs(5)
        );
        assert_eq!(config.stale_listing_max_age(), chrono::Duration::days(7));
    }
}
