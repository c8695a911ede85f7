use serde::Deserialize;

use crate::services::providers::tmdb::DEFAULT_TMDB_API_URL;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL. User documents are kept in memory when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// TMDB API key. The catalog proxy routes answer 503 when unset.
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Lifetime of a login session
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    /// Allow cross-origin requests from any origin
    #[serde(default = "default_cors_allow_any")]
    pub cors_allow_any: bool,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// One hour up to one year
const SESSION_TTL_HOURS_RANGE: std::ops::RangeInclusive<i64> = 1..=24 * 365;

fn default_tmdb_api_url() -> String {
    DEFAULT_TMDB_API_URL.to_string()
}

fn default_session_ttl_hours() -> i64 {
    24 * 30
}

fn default_cors_allow_any() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the server cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if !SESSION_TTL_HOURS_RANGE.contains(&self.session_ttl_hours) {
            anyhow::bail!(
                "SESSION_TTL_HOURS must be between {} and {}, got {}",
                SESSION_TTL_HOURS_RANGE.start(),
                SESSION_TTL_HOURS_RANGE.end(),
                self.session_ttl_hours
            );
        }
        Ok(())
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
