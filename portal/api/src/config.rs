use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::error::ApiError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

const API_SUFFIX: &str = "/api";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub poll_interval: Duration,
    pub dev_mode: bool,
    pub session_file: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, ApiError> {
        Self::load_with(|key| env::var(key).ok())
    }

    /// Same as [`Config::load`] but reads variables through `lookup`.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let api_url: String = try_load(&lookup, "ACARA_API_URL", DEFAULT_API_URL)?;
        let poll_secs: u64 = try_load(&lookup, "ACARA_POLL_INTERVAL_SECS", "5")?;

        if poll_secs == 0 {
            return Err(ApiError::Config(
                "ACARA_POLL_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_url: normalize(&api_url)?,
            poll_interval: Duration::from_secs(poll_secs),
            dev_mode: try_load(&lookup, "ACARA_DEV_MODE", "false")?,
            session_file: PathBuf::from(try_load::<String>(
                &lookup,
                "ACARA_SESSION_FILE",
                ".acara-session.json",
            )?),
        })
    }

    /// Defaults pointed at `api_url`.
    pub fn new(api_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            api_url: normalize(api_url)?,
            poll_interval: Duration::from_secs(5),
            dev_mode: false,
            session_file: PathBuf::from(".acara-session.json"),
        })
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    /// Static assets live next to the API: `https://host/api` serves files from
    /// `https://host/storage`.
    pub fn storage_url(&self) -> String {
        let root = self.api_url.strip_suffix(API_SUFFIX).unwrap_or(&self.api_url);

        format!("{root}/storage")
    }

    pub fn asset_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        format!("{}/{}", self.storage_url(), path.trim_start_matches('/'))
    }
}

fn normalize(api_url: &str) -> Result<String, ApiError> {
    let trimmed = api_url.trim().trim_end_matches('/');

    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ApiError::Config(format!(
            "API URL must start with http:// or https://, got {api_url:?}"
        )));
    }

    Ok(trimmed.to_string())
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ApiError>
where
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            ApiError::Config(format!("invalid {key}: {e}"))
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_with(lookup(&[])).unwrap();

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert!(!config.dev_mode);
    }

    #[test]
    fn test_overrides() {
        let config = Config::load_with(lookup(&[
            ("ACARA_API_URL", "https://acara.example.com/api/"),
            ("ACARA_POLL_INTERVAL_SECS", "2"),
            ("ACARA_DEV_MODE", "true"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://acara.example.com/api");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert!(config.dev_mode);
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::load_with(lookup(&[("ACARA_DEV_MODE", "maybe")])).is_err());
        assert!(Config::load_with(lookup(&[("ACARA_POLL_INTERVAL_SECS", "0")])).is_err());
        assert!(Config::load_with(lookup(&[("ACARA_API_URL", "localhost:8000")])).is_err());
    }

    #[test]
    fn test_storage_url_strips_api_suffix() {
        let config = Config::new("https://acara.example.com/api").unwrap();

        assert_eq!(config.storage_url(), "https://acara.example.com/storage");
        assert_eq!(
            config.asset_url("/profile/7.png"),
            "https://acara.example.com/storage/profile/7.png"
        );
    }

    #[test]
    fn test_storage_url_without_suffix() {
        let config = Config::new("http://localhost:9000").unwrap();

        assert_eq!(config.storage_url(), "http://localhost:9000/storage");
        assert_eq!(config.asset_url("https://cdn.example.com/a.png"), "https://cdn.example.com/a.png");
    }

    #[test]
    fn test_endpoint_join() {
        let config = Config::new("http://localhost:8000/api").unwrap();

        assert_eq!(config.endpoint("/events/1"), "http://localhost:8000/api/events/1");
        assert_eq!(config.endpoint("events"), "http://localhost:8000/api/events");
    }
}
