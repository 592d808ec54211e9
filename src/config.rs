//! Console configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the console runtime
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// API root all feeds and actions live under
    pub api_base: String,

    /// Poll interval in milliseconds
    pub poll_interval_ms: u64,

    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Buffer size of the feed update channel
    pub channel_buffer: usize,

    /// Threats generated by the `seed` console command
    pub seed_count: u32,

    /// Directory evidence bundles are written to
    pub evidence_dir: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl DashboardConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `KAVACH_API_BASE` (default: http://127.0.0.1:8000/api)
    /// - `POLL_INTERVAL_MS` (default: 6000)
    /// - `REQUEST_TIMEOUT_MS` (default: 10000)
    /// - `UPDATE_CHANNEL_BUFFER` (default: 1000)
    /// - `SEED_COUNT` (default: 8)
    /// - `EVIDENCE_DIR` (default: .)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base = var("KAVACH_API_BASE")
            .unwrap_or_else(|| "http://127.0.0.1:8000/api".to_string());

        if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "KAVACH_API_BASE must start with http:// or https://".to_string(),
            ));
        }

        let poll_interval_ms = parse_or(&var, "POLL_INTERVAL_MS", 6_000)?;
        if poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "POLL_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }

        let channel_buffer = parse_or(&var, "UPDATE_CHANNEL_BUFFER", 1_000)?;
        if channel_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "UPDATE_CHANNEL_BUFFER must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            api_base,
            poll_interval_ms,
            request_timeout_ms: parse_or(&var, "REQUEST_TIMEOUT_MS", 10_000)?,
            channel_buffer,
            seed_count: parse_or(&var, "SEED_COUNT", 8)?,
            evidence_dir: var("EVIDENCE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{}={:?} is not a valid number", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::from_vars(lookup(&[])).unwrap();

        assert_eq!(config.api_base, "http://127.0.0.1:8000/api");
        assert_eq!(config.poll_interval_ms, 6_000);
        assert_eq!(config.request_timeout_ms, 10_000);
        assert_eq!(config.channel_buffer, 1_000);
        assert_eq!(config.seed_count, 8);
        assert_eq!(config.evidence_dir, PathBuf::from("."));
    }

    #[test]
    fn test_custom_config() {
        let config = DashboardConfig::from_vars(lookup(&[
            ("KAVACH_API_BASE", "https://ops.example.net/api"),
            ("POLL_INTERVAL_MS", "2000"),
            ("SEED_COUNT", " 3 "),
            ("EVIDENCE_DIR", "/tmp/evidence"),
        ]))
        .unwrap();

        assert_eq!(config.api_base, "https://ops.example.net/api");
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.seed_count, 3);
        assert_eq!(config.evidence_dir, PathBuf::from("/tmp/evidence"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(DashboardConfig::from_vars(lookup(&[("KAVACH_API_BASE", "ftp://x")])).is_err());
        assert!(DashboardConfig::from_vars(lookup(&[("POLL_INTERVAL_MS", "soon")])).is_err());
        assert!(DashboardConfig::from_vars(lookup(&[("POLL_INTERVAL_MS", "0")])).is_err());
    }
}
