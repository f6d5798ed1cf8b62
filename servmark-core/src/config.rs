use std::cmp;

use http::Uri;

/// The number of requests issued per warm-up pass is capped at this value.
const WARMUP_REQUEST_CAP: u64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("concurrency must be at least 1")]
    /// The configured worker count cannot drive any requests.
    InvalidConcurrency,
}

/// The immutable parameters of one benchmark run.
///
/// A config is owned by the orchestrator for the duration of a single
/// server's run and handed to the [LoadDriver](crate::LoadDriver) by
/// reference for the warm-up and measured passes.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// The full target URI including the path and query to request.
    pub target: Uri,
    /// The total number of requests issued across all workers.
    pub total_requests: u64,
    /// The number of concurrent workers driving requests.
    pub concurrency: usize,
    /// Reuse one connection per worker rather than reconnecting
    /// for every request.
    pub keep_alive: bool,
}

impl BenchmarkConfig {
    pub fn new(
        target: Uri,
        total_requests: u64,
        concurrency: usize,
        keep_alive: bool,
    ) -> Result<Self, ConfigError> {
        if concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }

        Ok(Self {
            target,
            total_requests,
            concurrency,
            keep_alive,
        })
    }

    /// Derives the reduced-volume warm-up variant of this config.
    ///
    /// The warm-up issues 1% of the configured volume, capped at
    /// [WARMUP_REQUEST_CAP] requests.
    pub fn warmup(&self) -> Self {
        let mut copy = self.clone();
        copy.total_requests = cmp::min(self.total_requests / 100, WARMUP_REQUEST_CAP);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Uri {
        "http://localhost:8989/rnd?c=2048".parse().expect("Parse URI")
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let result = BenchmarkConfig::new(target(), 1000, 0, true);
        assert!(matches!(result, Err(ConfigError::InvalidConcurrency)));
    }

    #[test]
    fn test_warmup_scales_down() {
        let config = BenchmarkConfig::new(target(), 5000, 10, true).unwrap();
        assert_eq!(config.warmup().total_requests, 50);
    }

    #[test]
    fn test_warmup_is_capped() {
        let config = BenchmarkConfig::new(target(), 100_000, 10, true).unwrap();
        assert_eq!(config.warmup().total_requests, 100);
    }

    #[test]
    fn test_warmup_of_tiny_run_is_empty() {
        let config = BenchmarkConfig::new(target(), 50, 10, true).unwrap();
        assert_eq!(config.warmup().total_requests, 0);
    }

    #[test]
    fn test_warmup_keeps_other_fields() {
        let config = BenchmarkConfig::new(target(), 5000, 10, false).unwrap();
        let warmup = config.warmup();
        assert_eq!(warmup.concurrency, 10);
        assert!(!warmup.keep_alive);
        assert_eq!(warmup.target, config.target);
    }
}
