#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Notify;

use seo_pages::error::StoreError;
use seo_pages::jobs::location_import::{import_locations, PlaceInput, ProvinceInput};
use seo_pages::jobs::{KeywordImport, TierPolicy};
use seo_pages::model::{
    Keyword, KeywordDraft, Location, LocationDraft, LocationKind, PageContentRecord, PageStats,
    UpsertOutcome,
};
use seo_pages::sitemaps::SitemapSettings;
use seo_pages::store::{CatalogStore, MemoryStore, PageContentStore};

// For initializing tracing once
static INIT: Once = Once::new();

pub fn setup() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}

pub const SITE: &str = "https://example.com";

pub const KEYWORD_CORPUS: &str = "\
## Hair Salon Keywords (1-2)
1. hair salon
2. nail salon
## Barber Keywords (3-3)
3. barber
";

pub const GAUTENG_CITIES: [&str; 5] = ["Johannesburg", "Pretoria", "Soweto", "Sandton", "Centurion"];
pub const WESTERN_CAPE_CITIES: [&str; 5] = ["Cape Town", "Stellenbosch", "George", "Paarl", "Worcester"];

fn province(name: &str, population: i64, cities: &[&str]) -> ProvinceInput {
    ProvinceInput {
        name: name.to_string(),
        slug: None,
        population: Some(population),
        cities: cities
            .iter()
            .map(|c| PlaceInput { name: c.to_string(), slug: None, population: Some(200_000) })
            .collect(),
    }
}

pub fn fixture_provinces() -> Vec<ProvinceInput> {
    vec![
        province("Gauteng", 15_100_000, &GAUTENG_CITIES),
        province("Western Cape", 7_200_000, &WESTERN_CAPE_CITIES),
    ]
}

/// 2 provinces x 5 cities, 3 keywords.
pub async fn fixture_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    import_locations(store.as_ref(), &fixture_provinces()).await;
    let mut import = KeywordImport::new(store.as_ref(), TierPolicy::RunningOrdinal);
    import.import_text("fixture", KEYWORD_CORPUS).await;
    import.finish();
    store
}

pub fn sitemap_settings() -> SitemapSettings {
    SitemapSettings {
        site_url: SITE.to_string(),
        ..SitemapSettings::default()
    }
}

pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, day, 12, 0, 0).unwrap()
}

pub fn page(url: &str, keyword_id: i32, location_id: i32, h1: &str, generated: DateTime<Utc>) -> PageContentRecord {
    PageContentRecord {
        keyword_id,
        location_id,
        url: url.to_string(),
        h1: h1.to_string(),
        headings: vec!["Top rated".to_string()],
        intro_text: "Book trusted professionals near you.".to_string(),
        meta_title: h1.to_string(),
        meta_description: format!("{} - compare prices and book online", h1),
        schema_markup: serde_json::json!({"@context": "https://schema.org", "@type": "Service"}),
        related_links: Vec::new(),
        stats: PageStats { service_count: 4, salon_count: 2, avg_price: Some(180.0) },
        last_generated: generated,
    }
}

fn down() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

/// Every call fails as if the database were unreachable.
pub struct FailingStore;

#[async_trait]
impl CatalogStore for FailingStore {
    async fn keywords(&self) -> Result<Vec<Keyword>, StoreError> {
        Err(down())
    }
    async fn locations(&self) -> Result<Vec<Location>, StoreError> {
        Err(down())
    }
    async fn keyword_by_slug(&self, _slug: &str) -> Result<Option<Keyword>, StoreError> {
        Err(down())
    }
    async fn location_by_slug(&self, _kind: LocationKind, _slug: &str) -> Result<Option<Location>, StoreError> {
        Err(down())
    }
    async fn upsert_keyword(&self, _draft: &KeywordDraft) -> Result<UpsertOutcome, StoreError> {
        Err(down())
    }
    async fn upsert_location(&self, _draft: &LocationDraft) -> Result<(Location, UpsertOutcome), StoreError> {
        Err(down())
    }
}

#[async_trait]
impl PageContentStore for FailingStore {
    async fn page_by_url(&self, _url: &str) -> Result<Option<PageContentRecord>, StoreError> {
        Err(down())
    }
    async fn first_page_for_keyword(&self, _slug: &str) -> Result<Option<PageContentRecord>, StoreError> {
        Err(down())
    }
    async fn location_by_id(&self, _id: i32) -> Result<Option<Location>, StoreError> {
        Err(down())
    }
}

/// Catalog reads are counted and slowed down so concurrent callers overlap.
pub struct CountingCatalog {
    pub inner: Arc<MemoryStore>,
    pub keyword_reads: AtomicUsize,
    pub delay: Duration,
}

impl CountingCatalog {
    pub fn new(inner: Arc<MemoryStore>, delay: Duration) -> Self {
        CountingCatalog { inner, keyword_reads: AtomicUsize::new(0), delay }
    }

    pub fn keyword_reads(&self) -> usize {
        self.keyword_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogStore for CountingCatalog {
    async fn keywords(&self) -> Result<Vec<Keyword>, StoreError> {
        self.keyword_reads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.inner.keywords().await
    }
    async fn locations(&self) -> Result<Vec<Location>, StoreError> {
        self.inner.locations().await
    }
    async fn keyword_by_slug(&self, slug: &str) -> Result<Option<Keyword>, StoreError> {
        self.inner.keyword_by_slug(slug).await
    }
    async fn location_by_slug(&self, kind: LocationKind, slug: &str) -> Result<Option<Location>, StoreError> {
        self.inner.location_by_slug(kind, slug).await
    }
    async fn upsert_keyword(&self, draft: &KeywordDraft) -> Result<UpsertOutcome, StoreError> {
        self.inner.upsert_keyword(draft).await
    }
    async fn upsert_location(&self, draft: &LocationDraft) -> Result<(Location, UpsertOutcome), StoreError> {
        self.inner.upsert_location(draft).await
    }
}

/// Page store whose first `page_by_url` answers at once; every later
/// call waits for `release`.
pub struct GatedPages {
    pub inner: Arc<MemoryStore>,
    pub calls: AtomicUsize,
    pub release: Notify,
}

impl GatedPages {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        GatedPages { inner, calls: AtomicUsize::new(0), release: Notify::new() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageContentStore for GatedPages {
    async fn page_by_url(&self, url: &str) -> Result<Option<PageContentRecord>, StoreError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            self.release.notified().await;
        }
        self.inner.page_by_url(url).await
    }
    async fn first_page_for_keyword(&self, slug: &str) -> Result<Option<PageContentRecord>, StoreError> {
        self.inner.first_page_for_keyword(slug).await
    }
    async fn location_by_id(&self, id: i32) -> Result<Option<Location>, StoreError> {
        self.inner.location_by_id(id).await
    }
}

/// Catalog that can be taken down and brought back mid-test.
pub struct SwitchableCatalog {
    pub inner: Arc<MemoryStore>,
    pub down: AtomicBool,
}

impl SwitchableCatalog {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        SwitchableCatalog { inner, down: AtomicBool::new(false) }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(down());
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for SwitchableCatalog {
    async fn keywords(&self) -> Result<Vec<Keyword>, StoreError> {
        self.check()?;
        self.inner.keywords().await
    }
    async fn locations(&self) -> Result<Vec<Location>, StoreError> {
        self.check()?;
        self.inner.locations().await
    }
    async fn keyword_by_slug(&self, slug: &str) -> Result<Option<Keyword>, StoreError> {
        self.check()?;
        self.inner.keyword_by_slug(slug).await
    }
    async fn location_by_slug(&self, kind: LocationKind, slug: &str) -> Result<Option<Location>, StoreError> {
        self.check()?;
        self.inner.location_by_slug(kind, slug).await
    }
    async fn upsert_keyword(&self, draft: &KeywordDraft) -> Result<UpsertOutcome, StoreError> {
        self.check()?;
        self.inner.upsert_keyword(draft).await
    }
    async fn upsert_location(&self, draft: &LocationDraft) -> Result<(Location, UpsertOutcome), StoreError> {
        self.check()?;
        self.inner.upsert_location(draft).await
    }
}
