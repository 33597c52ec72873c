use sea_orm::entity::prelude::*;
use chrono::{DateTime, Utc};

use crate::model::{PageContentRecord, PageStats, RelatedLink};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "seo_page_cache")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    pub keyword_id: i32,
    pub location_id: i32,
    #[sea_orm(unique)]
    pub url: String,
    pub h1: String,
    pub headings: Json,               // array of strings
    #[sea_orm(column_type = "Text")]
    pub intro_text: String,
    pub meta_title: String,
    #[sea_orm(column_type = "Text")]
    pub meta_description: String,
    pub schema_markup: Option<Json>,
    pub related_links: Json,          // array of {label, url}
    pub service_count: i32,
    pub salon_count: i32,
    pub avg_price: Option<f64>,
    pub last_generated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Malformed JSON columns degrade to empty lists rather than failing
    /// the whole page.
    pub fn into_record(self) -> PageContentRecord {
        let headings: Vec<String> = serde_json::from_value(self.headings).unwrap_or_else(|e| {
            tracing::warn!("page {} has unreadable headings: {}", self.url, e);
            Vec::new()
        });
        let related_links: Vec<RelatedLink> =
            serde_json::from_value(self.related_links).unwrap_or_else(|e| {
                tracing::warn!("page {} has unreadable related links: {}", self.url, e);
                Vec::new()
            });

        PageContentRecord {
            keyword_id: self.keyword_id,
            location_id: self.location_id,
            url: self.url,
            h1: self.h1,
            headings,
            intro_text: self.intro_text,
            meta_title: self.meta_title,
            meta_description: self.meta_description,
            schema_markup: self.schema_markup.unwrap_or(serde_json::Value::Null),
            related_links,
            stats: PageStats {
                service_count: self.service_count,
                salon_count: self.salon_count,
                avg_price: self.avg_price,
            },
            last_generated: self.last_generated,
        }
    }
}
