//! Single-page lookup with a stale-while-revalidate cache.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::error::{AppError, StoreError};
use crate::model::{Keyword, Location, LocationKind, PageContentRecord, PageStats};
use crate::slug::is_slug;
use crate::store::{CatalogStore, PageContentStore};

/// What a landing page URL asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLookup {
    /// `/{keyword}`: the most recently generated page of that keyword.
    Keyword(String),
    /// `/{keyword}/{province}` or `/{keyword}/{province}/{city}`.
    Located {
        keyword: String,
        province: String,
        city: Option<String>,
    },
}

impl PageLookup {
    pub fn keyword(&self) -> &str {
        match self {
            PageLookup::Keyword(keyword) => keyword,
            PageLookup::Located { keyword, .. } => keyword,
        }
    }

    /// Canonical site-relative path, also the cache key.
    pub fn path(&self) -> String {
        match self {
            PageLookup::Keyword(keyword) => format!("/{}", keyword),
            PageLookup::Located { keyword, province, city: None } => format!("/{}/{}", keyword, province),
            PageLookup::Located { keyword, province, city: Some(city) } => {
                format!("/{}/{}/{}", keyword, province, city)
            }
        }
    }

    fn is_canonical(&self) -> bool {
        match self {
            PageLookup::Keyword(keyword) => is_slug(keyword),
            PageLookup::Located { keyword, province, city } => {
                is_slug(keyword) && is_slug(province) && city.as_deref().map_or(true, is_slug)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    /// Older than the window; a refresh is under way.
    Stale,
    /// Minimal content served while the page store is unreachable.
    StandIn,
}

impl Freshness {
    pub fn as_str(self) -> &'static str {
        match self {
            Freshness::Fresh => "fresh",
            Freshness::Stale => "stale",
            Freshness::StandIn => "stand-in",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedPage {
    pub record: Arc<PageContentRecord>,
    pub freshness: Freshness,
}

#[derive(Debug, Clone)]
pub enum PageOutcome {
    Found(ResolvedPage),
    NotFound,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolverSettings {
    pub fresh_for: Duration,
    pub capacity: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        ResolverSettings {
            fresh_for: Duration::from_secs(60 * 60),
            capacity: 10_000,
        }
    }
}

struct CachedPage {
    record: Arc<PageContentRecord>,
    fetched_at: Instant,
}

struct ResolverInner {
    pages: Arc<dyn PageContentStore>,
    catalog: Arc<dyn CatalogStore>,
    settings: ResolverSettings,
    cache: RwLock<HashMap<String, CachedPage>>,
    refreshing: Mutex<HashSet<String>>,
}

/// Cheap to clone; clones share one cache.
#[derive(Clone)]
pub struct PageResolver {
    inner: Arc<ResolverInner>,
}

impl PageResolver {
    pub fn new(
        pages: Arc<dyn PageContentStore>,
        catalog: Arc<dyn CatalogStore>,
        settings: ResolverSettings,
    ) -> Self {
        PageResolver {
            inner: Arc::new(ResolverInner {
                pages,
                catalog,
                settings,
                cache: RwLock::new(HashMap::new()),
                refreshing: Mutex::new(HashSet::new()),
            }),
        }
    }

    pub async fn cached_pages(&self) -> usize {
        self.inner.cache.read().await.len()
    }

    #[tracing::instrument(skip(self), fields(path = %lookup.path()))]
    pub async fn resolve(&self, lookup: &PageLookup) -> Result<PageOutcome, AppError> {
        if !lookup.is_canonical() {
            tracing::debug!("Non-canonical slug, not found");
            return Ok(PageOutcome::NotFound);
        }
        let key = lookup.path();

        if let Some((record, fetched_at)) = self.inner.cached(&key).await {
            if fetched_at.elapsed() < self.inner.settings.fresh_for {
                return Ok(found(record, Freshness::Fresh));
            }
            self.spawn_refresh(key, lookup.clone()).await;
            return Ok(found(record, Freshness::Stale));
        }

        match self.inner.load(lookup).await {
            Ok(Some(record)) => {
                let record = self.inner.remember(key, record).await;
                Ok(found(record, Freshness::Fresh))
            }
            Ok(None) => Ok(PageOutcome::NotFound),
            Err(e) => {
                tracing::warn!("Page store failed, trying a stand-in: {}", e);
                self.inner.stand_in(lookup).await
            }
        }
    }

    /// At most one refresh per key runs at a time.
    async fn spawn_refresh(&self, key: String, lookup: PageLookup) {
        if !self.inner.refreshing.lock().await.insert(key.clone()) {
            return;
        }
        let inner = self.inner.clone();
        tokio::spawn(async move {
            match inner.load(&lookup).await {
                Ok(Some(record)) => {
                    inner.remember(key.clone(), record).await;
                    tracing::debug!("Refreshed {}", key);
                }
                Ok(None) => {
                    inner.cache.write().await.remove(&key);
                    tracing::info!("{} no longer has content, dropped from cache", key);
                }
                Err(e) => tracing::warn!("Refresh of {} failed, keeping stale copy: {}", key, e),
            }
            inner.refreshing.lock().await.remove(&key);
        });
    }
}

fn found(record: Arc<PageContentRecord>, freshness: Freshness) -> PageOutcome {
    PageOutcome::Found(ResolvedPage { record, freshness })
}

impl ResolverInner {
    async fn cached(&self, key: &str) -> Option<(Arc<PageContentRecord>, Instant)> {
        let cache = self.cache.read().await;
        cache.get(key).map(|c| (c.record.clone(), c.fetched_at))
    }

    async fn load(&self, lookup: &PageLookup) -> Result<Option<PageContentRecord>, StoreError> {
        match lookup {
            PageLookup::Keyword(keyword) => self.pages.first_page_for_keyword(keyword).await,
            PageLookup::Located { .. } => self.pages.page_by_url(&lookup.path()).await,
        }
    }

    async fn remember(&self, key: String, record: PageContentRecord) -> Arc<PageContentRecord> {
        let record = Arc::new(record);
        let mut cache = self.cache.write().await;
        if cache.len() >= self.settings.capacity && !cache.contains_key(&key) {
            let fresh_for = self.settings.fresh_for;
            cache.retain(|_, c| c.fetched_at.elapsed() < fresh_for);
            if cache.len() >= self.settings.capacity {
                let oldest = cache
                    .iter()
                    .min_by_key(|(_, c)| c.fetched_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    cache.remove(&oldest);
                }
            }
        }
        cache.insert(key, CachedPage { record: record.clone(), fetched_at: Instant::now() });
        record
    }

    /// Minimal page for a combination the catalog knows. Never cached.
    async fn stand_in(&self, lookup: &PageLookup) -> Result<PageOutcome, AppError> {
        let Some(keyword) = self.catalog.keyword_by_slug(lookup.keyword()).await.map_err(catalog_down)? else {
            return Ok(PageOutcome::NotFound);
        };

        let place = match lookup {
            PageLookup::Keyword(_) => None,
            PageLookup::Located { province, city, .. } => {
                let Some(province) = self.catalog.location_by_slug(LocationKind::Province, province).await.map_err(catalog_down)? else {
                    return Ok(PageOutcome::NotFound);
                };
                match city {
                    None => Some(province),
                    Some(city) => match self.catalog.location_by_slug(LocationKind::City, city).await.map_err(catalog_down)? {
                        Some(city) if city.parent_id == Some(province.id) => Some(city),
                        _ => return Ok(PageOutcome::NotFound),
                    },
                }
            }
        };

        Ok(found(
            Arc::new(stand_in_record(&keyword, place.as_ref(), lookup.path())),
            Freshness::StandIn,
        ))
    }
}

fn catalog_down(err: StoreError) -> AppError {
    AppError::Unavailable(format!("page content and catalog both unreachable: {}", err))
}

fn stand_in_record(keyword: &Keyword, place: Option<&Location>, url: String) -> PageContentRecord {
    let where_ = place.map(|p| p.name.as_str()).unwrap_or("your area");
    PageContentRecord {
        keyword_id: keyword.id,
        location_id: place.map(|p| p.id).unwrap_or_default(),
        url,
        h1: format!("Find {} in {}", keyword.text, where_),
        headings: Vec::new(),
        intro_text: String::new(),
        meta_title: format!("{} in {}", keyword.text, where_),
        meta_description: format!("Compare and book {} in {}.", keyword.text, where_),
        schema_markup: serde_json::Value::Null,
        related_links: Vec::new(),
        stats: PageStats::default(),
        last_generated: Utc::now(),
    }
}
