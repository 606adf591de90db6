//! The engine facade
//!
//! [`Fundament`] owns the source registry, result cache, observer registry
//! and scheduler. It is a cheap handle: clone it and pass it to whatever
//! needs access. Timers stop when the last handle is dropped or on
//! [`Fundament::shutdown`].

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::runtime::Handle;
use url::Url;

use crate::cache::ResultCache;
use crate::config::{normalize_interval, FundamentConfig};
use crate::error::{FundamentError, Result};
use crate::ident::{IdAllocator, IdMode};
use crate::observer::{ListenerOptions, Notifiable, ObserverRegistry, TargetAction};
use crate::scheduler::Scheduler;
use crate::source::{DataSource, SourceEntry, SourceRegistry};
use crate::stats::{FundamentStats, SourceStats};
use crate::url::{
    HttpFetcher, Payload, ResponseFormat, SourceManifest, UrlFetcher, UrlSource, UrlSourceSpec,
};

struct Shared<V> {
    config: FundamentConfig,
    default_interval: RwLock<Duration>,
    sources: SourceRegistry<V>,
    cache: Arc<ResultCache<V>>,
    observers: Arc<ObserverRegistry<V>>,
    scheduler: Arc<Scheduler<V>>,
    keys: IdAllocator,
    url_fetcher: RwLock<Arc<dyn UrlFetcher>>,
}

impl<V> Drop for Shared<V> {
    fn drop(&mut self) {
        let stopped = self.sources.drain().len();
        if stopped > 0 {
            tracing::debug!(sources = stopped, "Timers stopped on drop");
        }
    }
}

/// Key-addressed data refresh engine
///
/// ```no_run
/// # use std::time::Duration;
/// # use fundament::{source_fn, Fundament, FundamentConfig};
/// # async fn demo() -> fundament::Result<()> {
/// let engine: Fundament<u32> = Fundament::new(FundamentConfig::default())?;
///
/// engine.add_data_source_with_interval(
///     "inbox",
///     source_fn(|| async { Some(3) }),
///     Duration::from_secs(30),
/// )?;
/// let id = engine.add_listener("inbox", |count: &u32| println!("{} unread", count))?;
///
/// // ...
/// engine.remove_listener(&id);
/// # Ok(())
/// # }
/// ```
pub struct Fundament<V = Payload> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for Fundament<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> Fundament<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create an engine on the current Tokio runtime
    pub fn new(config: FundamentConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| FundamentError::NoRuntime)?;
        Ok(Self::with_runtime(config, runtime))
    }

    /// Create an engine spawning its timers onto `runtime`
    pub fn with_runtime(config: FundamentConfig, runtime: Handle) -> Self {
        let id_mode = if config.descriptive_listener_ids {
            IdMode::Descriptive
        } else {
            IdMode::Opaque
        };

        let cache = Arc::new(ResultCache::new(config.cache_capacity));
        let observers = Arc::new(ObserverRegistry::new(IdAllocator::new(id_mode)));
        let scheduler = Arc::new(Scheduler::new(
            runtime,
            Arc::clone(&cache),
            Arc::clone(&observers),
            config.fetch_timeout,
            config.fire_immediately,
        ));

        Self {
            shared: Arc::new(Shared {
                default_interval: RwLock::new(normalize_interval(config.default_update_interval)),
                config,
                sources: SourceRegistry::new(),
                cache,
                observers,
                scheduler,
                keys: IdAllocator::new(IdMode::Opaque),
                url_fetcher: RwLock::new(Arc::new(HttpFetcher::default())),
            }),
        }
    }

    /// Configuration the engine was created with
    pub fn config(&self) -> &FundamentConfig {
        &self.shared.config
    }

    /// Interval applied to sources registered without one
    pub fn default_update_interval(&self) -> Duration {
        *self
            .shared
            .default_interval
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the default interval
    ///
    /// Only sources registered afterwards are affected. Zero restores the
    /// fallback interval.
    pub fn set_default_update_interval(&self, interval: Duration) {
        let interval = normalize_interval(interval);
        *self
            .shared
            .default_interval
            .write()
            .unwrap_or_else(PoisonError::into_inner) = interval;
        tracing::debug!(
            interval_ms = interval.as_millis() as u64,
            "Default update interval changed"
        );
    }

    /// Register a data source
    ///
    /// `key` defaults to a generated token and `interval` to the current
    /// default. Returns the key. Fails with `DuplicateKey` if the key is
    /// already registered.
    pub fn register_source(
        &self,
        key: Option<&str>,
        source: impl DataSource<V>,
        interval: Option<Duration>,
    ) -> Result<String> {
        let key = match key {
            Some(key) => key.to_string(),
            None => self.shared.keys.opaque(),
        };
        let interval = interval
            .map(normalize_interval)
            .unwrap_or_else(|| self.default_update_interval());

        let entry = self
            .shared
            .sources
            .insert(SourceEntry::new(key.clone(), Arc::new(source), interval))?;
        self.shared.scheduler.start(&entry);

        tracing::info!(
            key = %key,
            interval_ms = interval.as_millis() as u64,
            "Data source registered"
        );

        Ok(key)
    }

    /// Register a data source with an explicit interval
    pub fn add_data_source_with_interval(
        &self,
        key: &str,
        source: impl DataSource<V>,
        interval: Duration,
    ) -> Result<()> {
        self.register_source(Some(key), source, Some(interval)).map(|_| ())
    }

    /// Register a data source at the default interval
    pub fn add_data_source(&self, key: &str, source: impl DataSource<V>) -> Result<()> {
        self.register_source(Some(key), source, None).map(|_| ())
    }

    /// Register a data source under a generated key
    pub fn add_generated_data_source(&self, source: impl DataSource<V>) -> Result<String> {
        self.register_source(None, source, None)
    }

    /// Remove a data source
    ///
    /// Stops its timer, drops its listeners and its cached value. A fetch
    /// already in flight is not cancelled; its result is discarded.
    pub fn remove_data_source(&self, key: &str) -> Result<()> {
        let entry = self
            .shared
            .sources
            .remove(key)
            .ok_or_else(|| FundamentError::UnknownSource(key.to_string()))?;
        self.shared.scheduler.stop(&entry);

        let listeners = self.shared.observers.remove_key(key);
        // The entry is retired before this, so a racing delivery is refused
        self.shared.cache.evict(key);

        tracing::info!(key = %key, listeners = listeners, "Data source removed");
        Ok(())
    }

    /// Check whether a key is registered
    pub fn has_data_source(&self, key: &str) -> bool {
        self.shared.sources.contains(key)
    }

    /// Registered keys, sorted
    pub fn data_source_keys(&self) -> Vec<String> {
        self.shared.sources.keys()
    }

    /// Most recently cached value for a key
    ///
    /// Never blocks on or triggers a fetch. `None` means no value is known:
    /// nothing fetched yet, or the entry was evicted.
    pub fn get(&self, key: &str) -> Option<V> {
        self.shared.cache.get(key)
    }

    /// Run a fetch cycle now instead of waiting for the next tick
    ///
    /// Returns false if a fetch for this key is already outstanding.
    pub fn refresh_now(&self, key: &str) -> Result<bool> {
        let entry = self
            .shared
            .sources
            .get(key)
            .ok_or_else(|| FundamentError::UnknownSource(key.to_string()))?;
        Ok(self.shared.scheduler.tick(&entry))
    }

    /// Add a listener with a generated, namespaced id
    pub fn add_listener(
        &self,
        key: &str,
        listener: impl Notifiable<V> + 'static,
    ) -> Result<String> {
        self.add_listener_with(key, listener, ListenerOptions::default())
    }

    /// Add a listener with explicit id, namespacing and overwrite options
    ///
    /// Returns the fully-qualified id, or `DuplicateListener` when the id is
    /// taken and overwriting is disabled.
    pub fn add_listener_with(
        &self,
        key: &str,
        listener: impl Notifiable<V> + 'static,
        options: ListenerOptions,
    ) -> Result<String> {
        self.shared.observers.add(key, Arc::new(listener), options)
    }

    /// Add a listener that calls `action` on `target`
    pub fn add_target_listener<T>(
        &self,
        key: &str,
        target: &Arc<T>,
        action_name: &str,
        action: fn(&T, &V),
    ) -> Result<String>
    where
        T: Send + Sync + 'static,
    {
        self.add_target_listener_with(key, target, action_name, action, ListenerOptions::default())
    }

    /// Target/action variant of [`Fundament::add_listener_with`]
    pub fn add_target_listener_with<T>(
        &self,
        key: &str,
        target: &Arc<T>,
        action_name: &str,
        action: fn(&T, &V),
        options: ListenerOptions,
    ) -> Result<String>
    where
        T: Send + Sync + 'static,
    {
        self.add_listener_with(key, TargetAction::new(target, action_name, action), options)
    }

    /// Remove a listener by its fully-qualified id
    ///
    /// Returns false if no listener had this id.
    pub fn remove_listener(&self, id: &str) -> bool {
        self.shared.observers.remove(id)
    }

    /// Fully-qualified listener ids for a key, in delivery order
    pub fn listener_ids(&self, key: &str) -> Vec<String> {
        self.shared.observers.listener_ids(key)
    }

    /// The result cache, for forced eviction and eviction hooks
    pub fn cache(&self) -> &ResultCache<V> {
        &self.shared.cache
    }

    /// Status of one source
    pub fn source_stats(&self, key: &str) -> Option<SourceStats> {
        let entry = self.shared.sources.get(key)?;
        Some(self.stats_for(&entry))
    }

    /// Status of the whole engine
    pub fn stats(&self) -> FundamentStats {
        let mut stats = FundamentStats::new();
        for entry in self.shared.sources.entries() {
            stats.add_source(&self.stats_for(&entry));
        }
        stats.cached_values = self.shared.cache.len();
        stats.listener_count = self.shared.observers.total_listeners();
        stats
    }

    /// Stop every timer and drop every source
    ///
    /// Listeners and cached values are kept.
    pub fn shutdown(&self) {
        let entries = self.shared.sources.drain();
        for entry in &entries {
            self.shared.scheduler.stop(entry);
        }
        tracing::info!(sources = entries.len(), "Fundament shut down");
    }

    fn stats_for(&self, entry: &SourceEntry<V>) -> SourceStats {
        SourceStats::from_entry(
            entry,
            self.shared.cache.contains(entry.key()),
            self.shared.observers.listener_count(entry.key()),
        )
    }
}

impl<V> Fundament<V>
where
    V: From<Payload> + Clone + Send + Sync + 'static,
{
    /// Create an engine and register the sources of the configured manifest
    ///
    /// A missing manifest file registers nothing.
    pub fn open(config: FundamentConfig) -> Result<Self> {
        let manifest = config.manifest_path.clone();
        let engine = Self::new(config)?;
        if let Some(path) = manifest {
            engine.load_manifest_file(path)?;
        }
        Ok(engine)
    }

    /// Replace the fetcher used by URL sources registered afterwards
    pub fn set_url_fetcher(&self, fetcher: Arc<dyn UrlFetcher>) {
        *self
            .shared
            .url_fetcher
            .write()
            .unwrap_or_else(PoisonError::into_inner) = fetcher;
    }

    /// Register a URL as a data source
    pub fn add_url_data_source(
        &self,
        key: &str,
        url: Url,
        format: ResponseFormat,
        interval: Option<Duration>,
    ) -> Result<()> {
        self.register_url_source(Some(key), UrlSourceSpec::new(url, format), interval)
            .map(|_| ())
    }

    /// Register a URL source described by `spec`
    ///
    /// `key` defaults to a generated token. Returns the key.
    pub fn register_url_source(
        &self,
        key: Option<&str>,
        spec: UrlSourceSpec,
        interval: Option<Duration>,
    ) -> Result<String> {
        let fetcher = Arc::clone(
            &self
                .shared
                .url_fetcher
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        );
        tracing::debug!(url = %spec.url, format = %spec.format, "Registering URL source");
        self.register_source(key, UrlSource::new(spec.url, spec.format, fetcher), interval)
    }

    /// Register every source in a manifest at the default interval
    ///
    /// Names already registered are skipped with a warning. Returns the
    /// number of sources added.
    pub fn add_url_data_sources(&self, manifest: &SourceManifest) -> usize {
        let mut added = 0;
        for (name, spec) in manifest.iter() {
            match self.register_url_source(Some(name), spec.clone(), None) {
                Ok(_) => added += 1,
                Err(e) => tracing::warn!(key = %name, error = %e, "Manifest source skipped"),
            }
        }
        added
    }

    /// Load and register a manifest file
    ///
    /// A missing file registers nothing and is not an error.
    pub fn load_manifest_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let Some(manifest) = SourceManifest::from_path(path)? else {
            return Ok(0);
        };

        let added = self.add_url_data_sources(&manifest);
        tracing::info!(path = %path.display(), sources = added, "Source manifest loaded");
        Ok(added)
    }
}
