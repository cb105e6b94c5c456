use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use tokio::time::Duration;

use crate::mitigation::lookup::DEFAULT_GIPHY_API_URL;
use crate::router::EngineSettings;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every
/// engine constant has a default, so an empty environment is a valid
/// configuration (with image lookups disabled).
pub struct Config {
    /// Ratings kept per user
    pub user_window: usize,
    /// Ratings kept per channel
    pub channel_window: usize,
    /// Channel score that must be exceeded to trigger enforcement
    pub threshold: f64,
    /// Channel messages to wait after a trigger before checking again
    pub cooldown: u32,
    /// Entries shown at each end of a leaderboard
    pub leaderboard_k: usize,
    pub db_path: String,
    /// Giphy API key; empty disables image lookups
    pub giphy_api_key: String,
    pub giphy_api_url: String,
    /// Tag used when looking up enforcement images
    pub lookup_query: String,
    pub lookup_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let config = Self {
            user_window: parse_var("SIBYL_USER_WINDOW", 50)?,
            channel_window: parse_var("SIBYL_CHANNEL_WINDOW", 100)?,
            threshold: parse_var("SIBYL_THRESHOLD", 100.0)?,
            cooldown: parse_var("SIBYL_COOLDOWN", 10)?,
            leaderboard_k: parse_var("SIBYL_LEADERBOARD_K", 5)?,
            db_path: env::var("SIBYL_DB_PATH").unwrap_or_else(|_| "./sibyl.db".to_string()),
            giphy_api_key: env::var("GIPHY_API_KEY").unwrap_or_default(),
            giphy_api_url: env::var("GIPHY_API_URL")
                .unwrap_or_else(|_| DEFAULT_GIPHY_API_URL.to_string()),
            lookup_query: env::var("SIBYL_LOOKUP_QUERY")
                .unwrap_or_else(|_| "psycho pass dominator".to_string()),
            lookup_timeout: Duration::from_millis(parse_var("SIBYL_LOOKUP_TIMEOUT_MS", 3000)?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.user_window == 0 || self.channel_window == 0 {
            anyhow::bail!(
                "SIBYL_USER_WINDOW and SIBYL_CHANNEL_WINDOW must be at least 1 \
                 (got {} and {})",
                self.user_window,
                self.channel_window
            );
        }
        if !self.threshold.is_finite() {
            anyhow::bail!("SIBYL_THRESHOLD must be a finite number");
        }
        if self.leaderboard_k == 0 {
            anyhow::bail!("SIBYL_LEADERBOARD_K must be at least 1");
        }
        Ok(())
    }

    /// Engine tunables derived from this configuration.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            user_window: self.user_window,
            channel_window: self.channel_window,
            threshold: self.threshold,
            cooldown: self.cooldown,
            leaderboard_k: self.leaderboard_k,
        }
    }

    pub fn lookup_enabled(&self) -> bool {
        !self.giphy_api_key.is_empty()
    }
}

/// Read `name` from the environment, falling back to `default` when unset.
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {name}: {raw:?}")),
        _ => Ok(default),
    }
}
