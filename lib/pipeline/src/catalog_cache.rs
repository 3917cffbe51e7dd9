use dealscout_core::{CatalogSource, DocumentSchema, Result, ValueCatalog};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

struct Snapshot {
    catalog: Arc<ValueCatalog>,
    fetched_at: Instant,
}

/// Shared, periodically rebuilt value catalog.
///
/// Readers get an `Arc` to an immutable snapshot; a refresh swaps in a new
/// one. When a refresh fails the previous snapshot keeps being served, or an
/// empty catalog if there never was one, and the next read tries again.
pub struct CatalogCache {
    source: Arc<dyn CatalogSource>,
    schema: DocumentSchema,
    ttl: Duration,
    max_values: usize,
    snapshot: RwLock<Option<Snapshot>>,
}

impl CatalogCache {
    pub fn new(source: Arc<dyn CatalogSource>, schema: DocumentSchema, ttl: Duration, max_values: usize) -> Self {
        Self {
            source,
            schema,
            ttl,
            max_values,
            snapshot: RwLock::new(None),
        }
    }

    /// Current snapshot, rebuilt first if it is older than the TTL
    pub fn current(&self) -> Arc<ValueCatalog> {
        if let Some(snapshot) = self.snapshot.read().as_ref() {
            if snapshot.fetched_at.elapsed() < self.ttl {
                return Arc::clone(&snapshot.catalog);
            }
        }

        match self.refresh() {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(error = %e, "catalog refresh failed, serving previous snapshot");
                self.snapshot
                    .read()
                    .as_ref()
                    .map(|s| Arc::clone(&s.catalog))
                    .unwrap_or_else(|| Arc::new(ValueCatalog::empty()))
            }
        }
    }

    /// Rebuild unconditionally
    pub fn refresh(&self) -> Result<Arc<ValueCatalog>> {
        let catalog = Arc::new(self.source.fetch_catalog(&self.schema, self.max_values)?);
        info!(fields = catalog.fields.len(), "value catalog refreshed");
        *self.snapshot.write() = Some(Snapshot {
            catalog: Arc::clone(&catalog),
            fetched_at: Instant::now(),
        });
        Ok(catalog)
    }

    /// Drop the snapshot so the next read rebuilds it
    pub fn invalidate(&self) {
        *self.snapshot.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::store;
    use dealscout_core::Error;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingSource {
        fetches: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }
    }

    impl CatalogSource for CountingSource {
        fn fetch_catalog(&self, schema: &DocumentSchema, max_values: usize) -> Result<ValueCatalog> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Unavailable("catalog backend".to_string()));
            }
            store().fetch_catalog(schema, max_values)
        }
    }

    #[test]
    fn test_snapshot_is_reused_within_ttl() {
        let source = Arc::new(CountingSource::new());
        let cache = CatalogCache::new(source.clone(), DocumentSchema::startups(), Duration::from_secs(300), 100);

        let first = cache.current();
        let second = cache.current();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert!(first.values("industry").contains(&"fintech".to_string()));
    }

    #[test]
    fn test_expired_snapshot_is_replaced() {
        let source = Arc::new(CountingSource::new());
        let cache = CatalogCache::new(source.clone(), DocumentSchema::startups(), Duration::ZERO, 100);

        let first = cache.current();
        let second = cache.current();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_refresh_serves_stale_snapshot() {
        let source = Arc::new(CountingSource::new());
        let cache = CatalogCache::new(source.clone(), DocumentSchema::startups(), Duration::ZERO, 100);

        let first = cache.current();
        source.fail.store(true, Ordering::SeqCst);
        let second = cache.current();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.refresh().is_err());
    }

    #[test]
    fn test_failure_without_snapshot_is_empty_catalog() {
        let source = Arc::new(CountingSource::new());
        source.fail.store(true, Ordering::SeqCst);
        let cache = CatalogCache::new(source, DocumentSchema::startups(), Duration::from_secs(300), 100);
        assert!(cache.current().is_empty());
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let source = Arc::new(CountingSource::new());
        let cache = CatalogCache::new(source.clone(), DocumentSchema::startups(), Duration::from_secs(300), 100);
        cache.current();
        cache.invalidate();
        cache.current();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }
}
