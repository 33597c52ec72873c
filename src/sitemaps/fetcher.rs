use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::local_cache::{LocalSitemaps, LocalSnapshot};
use super::paginate::{parse_segment, Paginator};
use super::xml::{count_urls, empty_document, validate, RootElement};
use super::SitemapSettings;
use crate::authority::AuthorityClient;
use crate::error::FetchError;
use crate::store::CatalogStore;

/// Bound on remembered backend payloads; segment numbers come from the
/// request path.
const REMOTE_CACHE_CAPACITY: usize = 1024;

/// Where a served sitemap body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Backend,
    LocalFallback,
    EmptyFallback,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Backend => "backend",
            Source::LocalFallback => "local-fallback",
            Source::EmptyFallback => "empty-fallback",
        }
    }

    /// Degraded answers expire sooner so crawlers return once the
    /// authority recovers.
    pub fn cache_control(self) -> &'static str {
        match self {
            Source::Backend => "public, max-age=86400",
            Source::LocalFallback => "public, max-age=3600",
            Source::EmptyFallback => "public, max-age=300",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    Index,
    Segment(usize),
}

impl DocumentKey {
    /// Path on the authority, relative to its base URL.
    pub fn remote_path(self) -> String {
        match self {
            DocumentKey::Index => "seo/sitemap-index".to_string(),
            DocumentKey::Segment(n) => format!("seo/sitemap-seo-{}", n),
        }
    }

    pub fn root(self) -> RootElement {
        match self {
            DocumentKey::Index => RootElement::SitemapIndex,
            DocumentKey::Segment(_) => RootElement::UrlSet,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub body: Bytes,
    pub source: Source,
}

impl FetchedDocument {
    fn empty(root: RootElement) -> Self {
        FetchedDocument {
            body: Bytes::from(empty_document(root)),
            source: Source::EmptyFallback,
        }
    }
}

struct CachedRemote {
    body: Bytes,
    fetched_at: Instant,
}

/// Resolves sitemap documents: authority first, then local generation,
/// then an empty document. Every path yields a body that is valid XML.
pub struct SitemapFetcher {
    settings: Arc<SitemapSettings>,
    authority: Option<AuthorityClient>,
    local: LocalSitemaps,
    remote_cache: RwLock<HashMap<DocumentKey, CachedRemote>>,
}

impl SitemapFetcher {
    pub fn new(
        settings: SitemapSettings,
        authority: Option<AuthorityClient>,
        store: Arc<dyn CatalogStore>,
    ) -> Self {
        let settings = Arc::new(settings);
        SitemapFetcher {
            local: LocalSitemaps::new(store, settings.clone()),
            settings,
            authority,
            remote_cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &SitemapSettings {
        &self.settings
    }

    pub fn local(&self) -> &LocalSitemaps {
        &self.local
    }

    pub async fn index(&self) -> FetchedDocument {
        self.resolve(DocumentKey::Index).await
    }

    /// `raw` is the text between `sitemap-seo-` and `.xml`.
    pub async fn segment(&self, raw: &str) -> FetchedDocument {
        match parse_segment(raw) {
            Some(n) => self.resolve(DocumentKey::Segment(n)).await,
            None => {
                tracing::warn!("Invalid sitemap segment '{}', serving empty urlset", raw);
                FetchedDocument::empty(RootElement::UrlSet)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, key: DocumentKey) -> FetchedDocument {
        if let Some(body) = self.cached_remote(key).await {
            tracing::debug!("Serving cached backend payload");
            return FetchedDocument { body, source: Source::Backend };
        }

        if let Some(authority) = &self.authority {
            match self.fetch_remote(authority, key).await {
                Ok(body) => {
                    self.remember(key, body.clone()).await;
                    return FetchedDocument { body, source: Source::Backend };
                }
                Err(e) => {
                    tracing::warn!("Authority {} unusable, falling back to local generation: {}", key.remote_path(), e);
                }
            }
        }

        match self.local.snapshot().await {
            Ok(snapshot) => FetchedDocument {
                body: local_body(&snapshot, key),
                source: Source::LocalFallback,
            },
            Err(e) => {
                tracing::warn!("Local sitemap generation failed, serving empty document: {:#}", e);
                FetchedDocument::empty(key.root())
            }
        }
    }

    async fn fetch_remote(&self, authority: &AuthorityClient, key: DocumentKey) -> Result<Bytes, FetchError> {
        let body = authority
            .fetch_xml(&key.remote_path(), self.settings.max_document_bytes())
            .await?;
        validate(&body, key.root())?;
        if let DocumentKey::Segment(_) = key {
            let cap = Paginator::new(self.settings.chunk_cap).cap();
            let count = count_urls(&body);
            if count > cap {
                return Err(FetchError::Malformed(format!(
                    "chunk holds {} urls, cap is {}",
                    count, cap
                )));
            }
        }
        Ok(Bytes::from(body))
    }

    async fn cached_remote(&self, key: DocumentKey) -> Option<Bytes> {
        let cache = self.remote_cache.read().await;
        cache
            .get(&key)
            .filter(|c| c.fetched_at.elapsed() < self.settings.remote_cache_ttl)
            .map(|c| c.body.clone())
    }

    async fn remember(&self, key: DocumentKey, body: Bytes) {
        let ttl = self.settings.remote_cache_ttl;
        if ttl == Duration::ZERO {
            return;
        }
        let mut cache = self.remote_cache.write().await;
        if cache.len() >= REMOTE_CACHE_CAPACITY && !cache.contains_key(&key) {
            cache.retain(|_, c| c.fetched_at.elapsed() < ttl);
            if cache.len() >= REMOTE_CACHE_CAPACITY {
                tracing::debug!("Remote sitemap cache full, not caching {:?}", key);
                return;
            }
        }
        cache.insert(key, CachedRemote { body, fetched_at: Instant::now() });
    }
}

/// Out-of-range segments are answered with an empty urlset, still from
/// the local snapshot's point of view.
fn local_body(snapshot: &LocalSnapshot, key: DocumentKey) -> Bytes {
    match key {
        DocumentKey::Index => snapshot.index.clone(),
        DocumentKey::Segment(n) => snapshot
            .chunks
            .get(n)
            .cloned()
            .unwrap_or_else(|| Bytes::from(empty_document(RootElement::UrlSet))),
    }
}
