use std::{env, fmt::Display, str::FromStr};

use anyhow::{Context, Result};
use chrono::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub dev_mode: bool,
    pub payment_ttl: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            port: try_load("SANDBOX_PORT", "8000")?,
            dev_mode: try_load("SANDBOX_DEV_MODE", "true")?,
            payment_ttl: Duration::seconds(try_load("SANDBOX_PAYMENT_TTL_SECS", "86400")?),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            dev_mode: true,
            payment_ttl: Duration::days(1),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            anyhow::anyhow!("{e}")
        })
        .with_context(|| format!("Environment misconfigured: {key}"))
}
