use anyhow::{anyhow, Result};
use url::Url;

use crate::pipeline::PipelineOptions;

pub const DEFAULT_ENDPOINT: &str = "https://stronk.rocks/orch/json";

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    /// Read the payload from disk instead of the endpoint.
    pub payload_file: Option<String>,
    pub fetch_timeout_secs: u64,
    /// 0 fetches once and exits.
    pub poll_secs: u64,
    pub bucket_count: usize,
    pub ranking_top: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            payload_file: None,
            fetch_timeout_secs: 10,
            poll_secs: 0,
            bucket_count: 10,
            ranking_top: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            endpoint: std::env::var("ORCH_ENDPOINT").unwrap_or(d.endpoint),
            payload_file: std::env::var("PAYLOAD_FILE").ok().filter(|p| !p.is_empty()),
            fetch_timeout_secs: std::env::var("FETCH_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.fetch_timeout_secs),
            poll_secs: std::env::var("POLL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.poll_secs),
            bucket_count: std::env::var("BUCKET_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(d.bucket_count),
            ranking_top: std::env::var("RANKING_TOP").ok().and_then(|v| v.parse().ok()).unwrap_or(d.ranking_top),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| anyhow!("ORCH_ENDPOINT {:?} is not a URL: {}", self.endpoint, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("ORCH_ENDPOINT must be http(s), got {}", url.scheme()));
        }
        if self.bucket_count == 0 {
            return Err(anyhow!("BUCKET_COUNT must be at least 1"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(anyhow!("FETCH_TIMEOUT_SECS must be at least 1"));
        }
        Ok(())
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions { bucket_count: self.bucket_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.pipeline_options().bucket_count, 10);
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let cfg = Config { endpoint: "not a url".to_string(), ..Config::default() };
        assert!(cfg.validate().is_err());
        let cfg = Config { endpoint: "ftp://example.com/orch".to_string(), ..Config::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_buckets() {
        let cfg = Config { bucket_count: 0, ..Config::default() };
        assert!(cfg.validate().is_err());
    }
}
