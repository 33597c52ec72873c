use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::body::Bytes;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use super::paginate::{index_entries, Paginator};
use super::urlset::build_url_set;
use super::xml::{render_index, render_urlset};
use super::SitemapSettings;
use crate::catalog::Catalog;
use crate::store::CatalogStore;

/// Every locally generated sitemap body for one catalog snapshot.
/// Immutable once built; replaced wholesale on expiry.
#[derive(Debug)]
pub struct LocalSnapshot {
    pub generated_at: DateTime<Utc>,
    pub built_at: Instant,
    pub total_urls: usize,
    pub keyword_count: usize,
    pub location_count: usize,
    pub index: Bytes,
    pub chunks: Vec<Bytes>,
}

impl LocalSnapshot {
    /// CPU-bound: enumerates and serializes the whole URL set. Every
    /// entry's lastmod is the snapshot date.
    pub fn build(
        catalog: &Catalog,
        settings: &SitemapSettings,
        generated_at: DateTime<Utc>,
    ) -> anyhow::Result<Self> {
        let lastmod = Utc
            .from_utc_datetime(&generated_at.date_naive().and_time(NaiveTime::default()))
            .fixed_offset();
        let paginator = Paginator::new(settings.chunk_cap);
        let urls = build_url_set(catalog);
        let chunk_count = paginator.chunk_count(urls.len());

        let chunks = (0..chunk_count)
            .map(|i| {
                let document = paginator.document(&urls, i, &settings.site_url, lastmod);
                render_urlset(&document)
                    .map(Bytes::from)
                    .with_context(|| format!("rendering sitemap chunk {}", i))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let index = render_index(&index_entries(
            &settings.site_url,
            &settings.static_pages_sitemap,
            chunk_count,
            &settings.fixed_sitemaps,
            lastmod,
        ))
        .context("rendering sitemap index")?;

        Ok(LocalSnapshot {
            generated_at,
            built_at: Instant::now(),
            total_urls: urls.len(),
            keyword_count: catalog.keywords().len(),
            location_count: catalog.location_count(),
            index: Bytes::from(index),
            chunks,
        })
    }
}

/// Longest wait before retrying a failed rebuild. Shorter lifetimes retry
/// once per lifetime.
const REBUILD_RETRY: Duration = Duration::from_secs(30);

/// Memoized local sitemap generation.
///
/// Readers share the current `Arc<LocalSnapshot>`. After expiry the first
/// caller rebuilds while holding `rebuild`; concurrent callers wait on the
/// same lock and pick up the new snapshot instead of building their own.
/// A failed rebuild keeps the previous snapshot in service until the next
/// retry.
pub struct LocalSitemaps {
    store: Arc<dyn CatalogStore>,
    settings: Arc<SitemapSettings>,
    ttl: Duration,
    current: RwLock<Option<Arc<LocalSnapshot>>>,
    failed_at: RwLock<Option<Instant>>,
    rebuild: Mutex<()>,
    builds: AtomicUsize,
}

impl LocalSitemaps {
    pub fn new(store: Arc<dyn CatalogStore>, settings: Arc<SitemapSettings>) -> Self {
        let ttl = settings.local_cache_ttl;
        LocalSitemaps {
            store,
            settings,
            ttl,
            current: RwLock::new(None),
            failed_at: RwLock::new(None),
            rebuild: Mutex::new(()),
            builds: AtomicUsize::new(0),
        }
    }

    /// Number of full rebuilds so far.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// The snapshot to serve without rebuilding: one within its lifetime,
    /// or an expired one while a failed rebuild is waiting to be retried.
    async fn servable(&self) -> Option<Arc<LocalSnapshot>> {
        let current = self.current.read().await.clone()?;
        if current.built_at.elapsed() < self.ttl {
            return Some(current);
        }
        match *self.failed_at.read().await {
            Some(at) if at.elapsed() < self.ttl.min(REBUILD_RETRY) => Some(current),
            _ => None,
        }
    }

    /// Errors only when no snapshot has ever been built.
    pub async fn snapshot(&self) -> anyhow::Result<Arc<LocalSnapshot>> {
        if let Some(snapshot) = self.servable().await {
            return Ok(snapshot);
        }

        let _guard = self.rebuild.lock().await;
        // Whoever held the lock before us may already have rebuilt.
        if let Some(snapshot) = self.servable().await {
            tracing::debug!("Local sitemap snapshot settled by a concurrent request");
            return Ok(snapshot);
        }

        match self.build().await {
            Ok(snapshot) => {
                *self.failed_at.write().await = None;
                Ok(snapshot)
            }
            Err(e) => {
                let previous = self.current.read().await.clone();
                let Some(previous) = previous else {
                    return Err(e);
                };
                *self.failed_at.write().await = Some(Instant::now());
                tracing::warn!(
                    "Rebuilding local sitemaps failed, keeping snapshot generated at {}: {:#}",
                    previous.generated_at,
                    e
                );
                Ok(previous)
            }
        }
    }

    async fn build(&self) -> anyhow::Result<Arc<LocalSnapshot>> {
        let started = std::time::Instant::now();
        let keywords = self.store.keywords().await.context("loading keywords")?;
        let locations = self.store.locations().await.context("loading locations")?;
        let catalog = Catalog::new(keywords, locations);
        if catalog.dropped_locations() > 0 {
            tracing::warn!("{} locations failed catalog validation", catalog.dropped_locations());
        }

        let settings = self.settings.clone();
        let snapshot = tokio::task::spawn_blocking(move || {
            LocalSnapshot::build(&catalog, &settings, Utc::now())
        })
        .await
        .context("local sitemap build task failed")??;

        let snapshot = Arc::new(snapshot);
        self.builds.fetch_add(1, Ordering::Relaxed);
        *self.current.write().await = Some(snapshot.clone());
        tracing::info!(
            "Built local sitemap snapshot: {} urls in {} chunks ({:?})",
            snapshot.total_urls,
            snapshot.chunks.len(),
            started.elapsed()
        );
        Ok(snapshot)
    }
}
