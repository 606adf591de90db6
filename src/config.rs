//! Engine configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::url::DEFAULT_MANIFEST_FILE;

/// Update interval used when neither the caller nor the config picks one
pub const FALLBACK_UPDATE_INTERVAL: Duration = Duration::from_secs(60);

/// Default upper bound on cached entries
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Engine configuration options
#[derive(Debug, Clone)]
pub struct FundamentConfig {
    /// Interval for sources registered without one
    pub default_update_interval: Duration,

    /// Build listener ids from the observer's name instead of random tokens
    pub descriptive_listener_ids: bool,

    /// Maximum number of cached values (oldest is evicted first)
    pub cache_capacity: usize,

    /// Abandon a fetch still outstanding after this long (None = wait forever)
    pub fetch_timeout: Option<Duration>,

    /// Run the first fetch as soon as a source is registered
    pub fire_immediately: bool,

    /// URL source manifest loaded by `Fundament::open` (None = load nothing)
    pub manifest_path: Option<PathBuf>,
}

impl Default for FundamentConfig {
    fn default() -> Self {
        Self {
            default_update_interval: FALLBACK_UPDATE_INTERVAL,
            descriptive_listener_ids: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            fetch_timeout: None,
            fire_immediately: false,
            manifest_path: Some(PathBuf::from(DEFAULT_MANIFEST_FILE)),
        }
    }
}

impl FundamentConfig {
    /// Set the default update interval
    ///
    /// A zero duration falls back to [`FALLBACK_UPDATE_INTERVAL`].
    pub fn default_update_interval(mut self, interval: Duration) -> Self {
        self.default_update_interval = normalize_interval(interval);
        self
    }

    /// Enable descriptive listener ids
    pub fn descriptive_listener_ids(mut self, enabled: bool) -> Self {
        self.descriptive_listener_ids = enabled;
        self
    }

    /// Set cache capacity (minimum 1)
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }

    /// Set a per-fetch timeout
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Fire the first fetch immediately instead of after one interval
    pub fn fire_immediately(mut self, enabled: bool) -> Self {
        self.fire_immediately = enabled;
        self
    }

    /// Set the manifest loaded at start-up
    pub fn manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    /// Skip loading a manifest at start-up
    pub fn without_manifest(mut self) -> Self {
        self.manifest_path = None;
        self
    }
}

/// Map a zero interval to the fallback
pub(crate) fn normalize_interval(interval: Duration) -> Duration {
    if interval.is_zero() {
        FALLBACK_UPDATE_INTERVAL
    } else {
        interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FundamentConfig::default();

        assert_eq!(config.default_update_interval, Duration::from_secs(60));
        assert!(!config.descriptive_listener_ids);
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert!(config.fetch_timeout.is_none());
        assert!(!config.fire_immediately);
        assert_eq!(config.manifest_path, Some(PathBuf::from("fundament.json")));
    }

    #[test]
    fn test_manifest_path() {
        let config = FundamentConfig::default().manifest_path("/etc/fundament/sources.json");
        assert_eq!(
            config.manifest_path.as_deref(),
            Some(std::path::Path::new("/etc/fundament/sources.json"))
        );

        assert!(config.without_manifest().manifest_path.is_none());
    }

    #[test]
    fn test_zero_interval_uses_fallback() {
        let config = FundamentConfig::default().default_update_interval(Duration::ZERO);

        assert_eq!(config.default_update_interval, FALLBACK_UPDATE_INTERVAL);
    }

    #[test]
    fn test_cache_capacity_floor() {
        let config = FundamentConfig::default().cache_capacity(0);

        assert_eq!(config.cache_capacity, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = FundamentConfig::default()
            .default_update_interval(Duration::from_secs(5))
            .descriptive_listener_ids(true)
            .cache_capacity(16)
            .fetch_timeout(Duration::from_secs(2))
            .fire_immediately(true);

        assert_eq!(config.default_update_interval, Duration::from_secs(5));
        assert!(config.descriptive_listener_ids);
        assert_eq!(config.cache_capacity, 16);
        assert_eq!(config.fetch_timeout, Some(Duration::from_secs(2)));
        assert!(config.fire_immediately);
    }
}
