use sea_orm::entity::prelude::*;
use chrono::{DateTime, Utc};

use crate::model::{Keyword, PriorityTier};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "seo_keywords")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    #[sea_orm(unique)]
    pub keyword: String,    // natural upsert key
    #[sea_orm(unique)]
    pub slug: String,
    pub category: String,
    pub priority: i16,      // 1..=3
    pub search_volume: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Rows with a tier outside 1..=3 are read as the lowest tier.
    pub fn into_keyword(self) -> Keyword {
        let priority = PriorityTier::try_from(self.priority).unwrap_or_else(|e| {
            tracing::warn!("keyword {} has {}; treating as tier 3", self.id, e);
            PriorityTier::Three
        });
        Keyword {
            id: self.id,
            text: self.keyword,
            slug: self.slug,
            category: self.category,
            priority,
        }
    }
}
