use std::time::Duration;

pub const ENV_FETCH_TIMEOUT_SECS: &str = "SITECLONE_FETCH_TIMEOUT_SECS";
pub const ENV_MAX_SNAPSHOT_BYTES: &str = "SITECLONE_MAX_SNAPSHOT_BYTES";

/// Clone configuration
///
/// Limits for remote snapshot downloads and the key prefix under which
/// upload files are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneConfig {
    /// Timeout for downloading a remote snapshot
    pub fetch_timeout: Duration,

    /// Largest snapshot accepted from a remote source
    pub max_snapshot_bytes: usize,

    /// Blob key prefix for upload files
    pub blob_prefix: String,
}

impl CloneConfig {
    pub fn new() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            max_snapshot_bytes: 256 * 1024 * 1024,
            blob_prefix: "site_uploads".to_string(),
        }
    }

    /// Defaults overridden by `SITECLONE_*` environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `SITECLONE_*` keys
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::new();

        if let Some(raw) = lookup(ENV_FETCH_TIMEOUT_SECS) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| format!("{} must be a number of seconds", ENV_FETCH_TIMEOUT_SECS))?;
            config = config.fetch_timeout(Duration::from_secs(secs));
        }

        if let Some(raw) = lookup(ENV_MAX_SNAPSHOT_BYTES) {
            let bytes: usize = raw
                .trim()
                .parse()
                .map_err(|_| format!("{} must be a byte count", ENV_MAX_SNAPSHOT_BYTES))?;
            config = config.max_snapshot_bytes(bytes);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set fetch timeout
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set maximum snapshot size
    pub fn max_snapshot_bytes(mut self, max: usize) -> Self {
        self.max_snapshot_bytes = max;
        self
    }

    /// Set blob key prefix
    pub fn blob_prefix(mut self, prefix: &str) -> Self {
        self.blob_prefix = prefix.to_string();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.fetch_timeout.is_zero() {
            return Err("fetch_timeout must be > 0".to_string());
        }

        if self.max_snapshot_bytes == 0 {
            return Err("max_snapshot_bytes must be > 0".to_string());
        }

        if self.blob_prefix.is_empty() || self.blob_prefix.contains('/') {
            return Err("blob_prefix must be a single non-empty path segment".to_string());
        }

        Ok(())
    }
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self::new()
    }
}
