use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use super::{keyword_url_pattern, CatalogStore, PageContentStore};
use crate::entities::{keyword, location, page_content};
use crate::error::StoreError;
use crate::model::{
    Keyword, KeywordDraft, Location, LocationDraft, LocationKind, PageContentRecord, UpsertOutcome,
};

/// sea-orm backed store for both the catalog and page content.
#[derive(Clone)]
pub struct DbStore {
    db: DatabaseConnection,
}

impl DbStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let db = Database::connect(database_url).await?;
        tracing::info!("Database connection established.");
        Ok(Self { db })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Writes a page content record, keyed on its url. The authoring process
    /// owns this table; the method exists for seeding and tests.
    pub async fn put_page(&self, record: &PageContentRecord) -> Result<(), StoreError> {
        let existing = page_content::Entity::find()
            .filter(page_content::Column::Url.eq(record.url.as_str()))
            .one(&self.db)
            .await?;

        let mut am: page_content::ActiveModel = match existing {
            Some(model) => model.into(),
            None => page_content::ActiveModel {
                url: Set(record.url.clone()),
                ..Default::default()
            },
        };
        am.keyword_id = Set(record.keyword_id);
        am.location_id = Set(record.location_id);
        am.h1 = Set(record.h1.clone());
        am.headings = Set(serde_json::to_value(&record.headings)?);
        am.intro_text = Set(record.intro_text.clone());
        am.meta_title = Set(record.meta_title.clone());
        am.meta_description = Set(record.meta_description.clone());
        am.schema_markup = Set(match &record.schema_markup {
            serde_json::Value::Null => None,
            other => Some(other.clone()),
        });
        am.related_links = Set(serde_json::to_value(&record.related_links)?);
        am.service_count = Set(record.stats.service_count);
        am.salon_count = Set(record.stats.salon_count);
        am.avg_price = Set(record.stats.avg_price);
        am.last_generated = Set(record.last_generated);
        am.save(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for DbStore {
    async fn keywords(&self) -> Result<Vec<Keyword>, StoreError> {
        let rows = keyword::Entity::find()
            .order_by_asc(keyword::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(keyword::Model::into_keyword).collect())
    }

    async fn locations(&self) -> Result<Vec<Location>, StoreError> {
        let rows = location::Entity::find()
            .order_by_asc(location::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().filter_map(location::Model::into_location).collect())
    }

    async fn keyword_by_slug(&self, slug: &str) -> Result<Option<Keyword>, StoreError> {
        let row = keyword::Entity::find()
            .filter(keyword::Column::Slug.eq(slug))
            .one(&self.db)
            .await?;
        Ok(row.map(keyword::Model::into_keyword))
    }

    async fn location_by_slug(
        &self,
        kind: LocationKind,
        slug: &str,
    ) -> Result<Option<Location>, StoreError> {
        let row = location::Entity::find()
            .filter(location::Column::Kind.eq(kind.as_str()))
            .filter(location::Column::Slug.eq(slug))
            .one(&self.db)
            .await?;
        Ok(row.and_then(location::Model::into_location))
    }

    async fn upsert_keyword(&self, draft: &KeywordDraft) -> Result<UpsertOutcome, StoreError> {
        let existing = keyword::Entity::find()
            .filter(keyword::Column::Keyword.eq(draft.text.as_str()))
            .one(&self.db)
            .await?;
        let now = Utc::now();
        let priority = draft.priority.as_i16();

        match existing {
            Some(model) => {
                if model.slug == draft.slug
                    && model.category == draft.category
                    && model.priority == priority
                {
                    return Ok(UpsertOutcome::Unchanged);
                }
                let mut am: keyword::ActiveModel = model.into();
                am.slug = Set(draft.slug.clone());
                am.category = Set(draft.category.clone());
                am.priority = Set(priority);
                am.updated_at = Set(now);
                am.update(&self.db).await?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                let am = keyword::ActiveModel {
                    keyword: Set(draft.text.clone()),
                    slug: Set(draft.slug.clone()),
                    category: Set(draft.category.clone()),
                    priority: Set(priority),
                    search_volume: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default() // id comes from the sequence
                };
                am.insert(&self.db).await?;
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn upsert_location(
        &self,
        draft: &LocationDraft,
    ) -> Result<(Location, UpsertOutcome), StoreError> {
        let existing = location::Entity::find()
            .filter(location::Column::Kind.eq(draft.kind.as_str()))
            .filter(location::Column::Slug.eq(draft.slug.as_str()))
            .one(&self.db)
            .await?;
        let now = Utc::now();

        let (model, outcome) = match existing {
            Some(model)
                if model.name == draft.name
                    && model.parent_id == draft.parent_id
                    && model.population == draft.population =>
            {
                (model, UpsertOutcome::Unchanged)
            }
            Some(model) => {
                let mut am: location::ActiveModel = model.into();
                am.name = Set(draft.name.clone());
                am.parent_id = Set(draft.parent_id);
                am.population = Set(draft.population);
                am.updated_at = Set(now);
                (am.update(&self.db).await?, UpsertOutcome::Updated)
            }
            None => {
                let am = location::ActiveModel {
                    name: Set(draft.name.clone()),
                    slug: Set(draft.slug.clone()),
                    kind: Set(draft.kind.as_str().to_string()),
                    parent_id: Set(draft.parent_id),
                    population: Set(draft.population),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                (am.insert(&self.db).await?, UpsertOutcome::Inserted)
            }
        };

        let location = model.into_location().ok_or_else(|| {
            StoreError::Decode(format!("location '{}' stored with unreadable kind", draft.slug))
        })?;
        Ok((location, outcome))
    }
}

#[async_trait]
impl PageContentStore for DbStore {
    async fn page_by_url(&self, url: &str) -> Result<Option<PageContentRecord>, StoreError> {
        let row = page_content::Entity::find()
            .filter(page_content::Column::Url.eq(url))
            .one(&self.db)
            .await?;
        Ok(row.map(page_content::Model::into_record))
    }

    async fn first_page_for_keyword(
        &self,
        keyword_slug: &str,
    ) -> Result<Option<PageContentRecord>, StoreError> {
        let row = page_content::Entity::find()
            .filter(
                Expr::col(page_content::Column::Url)
                    .like(LikeExpr::new(keyword_url_pattern(keyword_slug)).escape('\\')),
            )
            .order_by_desc(page_content::Column::LastGenerated)
            .one(&self.db)
            .await?;
        Ok(row.map(page_content::Model::into_record))
    }

    async fn location_by_id(&self, id: i32) -> Result<Option<Location>, StoreError> {
        let row = location::Entity::find_by_id(id).one(&self.db).await?;
        Ok(row.and_then(location::Model::into_location))
    }
}
