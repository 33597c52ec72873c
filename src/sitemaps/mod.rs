//! Sitemap generation and serving: the URL set builder, pagination, XML
//! rendering and validation, and the fallback-aware fetcher.

use std::time::Duration;

pub mod fetcher;
pub mod local_cache;
pub mod paginate;
pub mod urlset;
pub mod xml;

pub use fetcher::{DocumentKey, FetchedDocument, SitemapFetcher, Source};
pub use local_cache::{LocalSitemaps, LocalSnapshot};
pub use paginate::{Paginator, SitemapDocument, SitemapEntry, DEFAULT_CHUNK_CAP, SITEMAP_PROTOCOL_LIMIT};
pub use urlset::{build_url_set, UrlDescriptor};

/// Uncompressed size ceiling the sitemap protocol puts on one document.
pub const SITEMAP_PROTOCOL_BYTES: usize = 50 * 1024 * 1024;

/// Allowance per `<url>` entry when sizing remote documents, plus room
/// for the declaration and root element.
const BYTES_PER_URL: usize = 1024;
const ENVELOPE_BYTES: usize = 16 * 1024;

#[derive(Debug, Clone)]
pub struct SitemapSettings {
    /// Absolute origin without a trailing slash, e.g. `https://example.com`.
    pub site_url: String,
    pub chunk_cap: usize,
    pub remote_cache_ttl: Duration,
    pub local_cache_ttl: Duration,
    pub static_pages_sitemap: String,
    pub fixed_sitemaps: Vec<String>,
}

impl Default for SitemapSettings {
    fn default() -> Self {
        SitemapSettings {
            site_url: "http://localhost:3000".to_string(),
            chunk_cap: DEFAULT_CHUNK_CAP,
            remote_cache_ttl: Duration::from_secs(24 * 60 * 60),
            local_cache_ttl: Duration::from_secs(60 * 60),
            static_pages_sitemap: "sitemap-static.xml".to_string(),
            fixed_sitemaps: vec![
                "sitemap-salons.xml".to_string(),
                "sitemap-services.xml".to_string(),
                "sitemap-jobs.xml".to_string(),
                "sitemap-trends.xml".to_string(),
            ],
        }
    }
}

impl SitemapSettings {
    /// Largest remote body accepted for one document, scaled to the chunk
    /// cap and never above the protocol ceiling.
    pub fn max_document_bytes(&self) -> usize {
        Paginator::new(self.chunk_cap)
            .cap()
            .saturating_mul(BYTES_PER_URL)
            .saturating_add(ENVELOPE_BYTES)
            .min(SITEMAP_PROTOCOL_BYTES)
    }
}
