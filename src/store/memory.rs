use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{keyword_url_prefix, CatalogStore, PageContentStore};
use crate::error::StoreError;
use crate::model::{
    Keyword, KeywordDraft, Location, LocationDraft, LocationKind, PageContentRecord, UpsertOutcome,
};

/// In-process store used when no database is configured (catalog loaded
/// from corpus files) and by the test suite.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    keywords: Vec<Keyword>,
    locations: Vec<Location>,
    pages: Vec<PageContentRecord>,
    next_keyword_id: i32,
    next_location_id: i32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a page, replacing any record for the same (keyword, location).
    pub async fn put_page(&self, record: PageContentRecord) {
        let mut inner = self.inner.write().await;
        inner
            .pages
            .retain(|p| !(p.keyword_id == record.keyword_id && p.location_id == record.location_id));
        inner.pages.push(record);
    }

    pub async fn remove_page(&self, url: &str) {
        self.inner.write().await.pages.retain(|p| p.url != url);
    }

    pub async fn keyword_count(&self) -> usize {
        self.inner.read().await.keywords.len()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn keywords(&self) -> Result<Vec<Keyword>, StoreError> {
        Ok(self.inner.read().await.keywords.clone())
    }

    async fn locations(&self) -> Result<Vec<Location>, StoreError> {
        Ok(self.inner.read().await.locations.clone())
    }

    async fn keyword_by_slug(&self, slug: &str) -> Result<Option<Keyword>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.keywords.iter().find(|k| k.slug == slug).cloned())
    }

    async fn location_by_slug(
        &self,
        kind: LocationKind,
        slug: &str,
    ) -> Result<Option<Location>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .locations
            .iter()
            .find(|l| l.kind == kind && l.slug == slug)
            .cloned())
    }

    async fn upsert_keyword(&self, draft: &KeywordDraft) -> Result<UpsertOutcome, StoreError> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.keywords.iter_mut().find(|k| k.text == draft.text) {
            if existing.slug == draft.slug
                && existing.category == draft.category
                && existing.priority == draft.priority
            {
                return Ok(UpsertOutcome::Unchanged);
            }
            existing.slug = draft.slug.clone();
            existing.category = draft.category.clone();
            existing.priority = draft.priority;
            return Ok(UpsertOutcome::Updated);
        }

        if inner.keywords.iter().any(|k| k.slug == draft.slug) {
            return Err(StoreError::Database(format!(
                "slug '{}' already used by another keyword",
                draft.slug
            )));
        }

        inner.next_keyword_id += 1;
        let id = inner.next_keyword_id;
        inner.keywords.push(Keyword {
            id,
            text: draft.text.clone(),
            slug: draft.slug.clone(),
            category: draft.category.clone(),
            priority: draft.priority,
        });
        Ok(UpsertOutcome::Inserted)
    }

    async fn upsert_location(
        &self,
        draft: &LocationDraft,
    ) -> Result<(Location, UpsertOutcome), StoreError> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner
            .locations
            .iter_mut()
            .find(|l| l.kind == draft.kind && l.slug == draft.slug)
        {
            if existing.name == draft.name
                && existing.parent_id == draft.parent_id
                && existing.population == draft.population
            {
                return Ok((existing.clone(), UpsertOutcome::Unchanged));
            }
            existing.name = draft.name.clone();
            existing.parent_id = draft.parent_id;
            existing.population = draft.population;
            return Ok((existing.clone(), UpsertOutcome::Updated));
        }

        inner.next_location_id += 1;
        let location = Location {
            id: inner.next_location_id,
            name: draft.name.clone(),
            slug: draft.slug.clone(),
            kind: draft.kind,
            parent_id: draft.parent_id,
            population: draft.population,
        };
        inner.locations.push(location.clone());
        Ok((location, UpsertOutcome::Inserted))
    }
}

#[async_trait]
impl PageContentStore for MemoryStore {
    async fn page_by_url(&self, url: &str) -> Result<Option<PageContentRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.pages.iter().find(|p| p.url == url).cloned())
    }

    async fn first_page_for_keyword(
        &self,
        keyword_slug: &str,
    ) -> Result<Option<PageContentRecord>, StoreError> {
        let prefix = keyword_url_prefix(keyword_slug);
        let inner = self.inner.read().await;
        Ok(inner
            .pages
            .iter()
            .filter(|p| p.url.starts_with(&prefix))
            .max_by_key(|p| p.last_generated)
            .cloned())
    }

    async fn location_by_id(&self, id: i32) -> Result<Option<Location>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.locations.iter().find(|l| l.id == id).cloned())
    }
}
