//! Storage seams for the catalog (keywords, locations) and for authored
//! page content.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{
    Keyword, KeywordDraft, Location, LocationDraft, LocationKind, PageContentRecord, UpsertOutcome,
};

pub mod db;
pub mod memory;

pub use db::DbStore;
pub use memory::MemoryStore;

/// Keywords and locations: written by batch import, read by the URL set
/// builder and the page resolver.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn keywords(&self) -> Result<Vec<Keyword>, StoreError>;

    async fn locations(&self) -> Result<Vec<Location>, StoreError>;

    async fn keyword_by_slug(&self, slug: &str) -> Result<Option<Keyword>, StoreError>;

    async fn location_by_slug(
        &self,
        kind: LocationKind,
        slug: &str,
    ) -> Result<Option<Location>, StoreError>;

    /// Upsert keyed on keyword text; category, tier and slug follow the draft.
    async fn upsert_keyword(&self, draft: &KeywordDraft) -> Result<UpsertOutcome, StoreError>;

    /// Upsert keyed on (kind, slug).
    async fn upsert_location(
        &self,
        draft: &LocationDraft,
    ) -> Result<(Location, UpsertOutcome), StoreError>;
}

/// Read side of the authored page content.
#[async_trait]
pub trait PageContentStore: Send + Sync {
    async fn page_by_url(&self, url: &str) -> Result<Option<PageContentRecord>, StoreError>;

    /// Most recently generated page under `/{keyword_slug}/`.
    async fn first_page_for_keyword(
        &self,
        keyword_slug: &str,
    ) -> Result<Option<PageContentRecord>, StoreError>;

    async fn location_by_id(&self, id: i32) -> Result<Option<Location>, StoreError>;
}

/// Prefix every page URL of a keyword starts with.
pub(crate) fn keyword_url_prefix(keyword_slug: &str) -> String {
    format!("/{}/", keyword_slug)
}

/// LIKE pattern for every url under the keyword's prefix. `_` and `%` are
/// legal in slugs, so they are escaped with `\`.
pub(crate) fn keyword_url_pattern(keyword_slug: &str) -> String {
    let prefix = keyword_url_prefix(keyword_slug);
    let mut pattern = String::with_capacity(prefix.len() + 4);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_url_pattern_escapes_wildcards() {
        assert_eq!(keyword_url_pattern("hair-salon"), "/hair-salon/%");
        assert_eq!(keyword_url_pattern("braids_2024"), r"/braids\_2024/%");
        assert_eq!(keyword_url_pattern("100%"), r"/100\%/%");
    }
}
