use sea_orm::entity::prelude::*;
use chrono::{DateTime, Utc};

use crate::model::{Location, LocationKind};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "seo_locations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    pub name: String,
    pub slug: String,            // unique together with kind
    pub kind: String,            // PROVINCE | CITY (TOWN accepted on read)
    pub parent_id: Option<i32>,
    pub population: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The kind column is resolved here, once; rows of kinds this service
    /// does not serve come back as `None`.
    pub fn into_location(self) -> Option<Location> {
        match self.kind.parse::<LocationKind>() {
            Ok(kind) => Some(Location {
                id: self.id,
                name: self.name,
                slug: self.slug,
                kind,
                parent_id: self.parent_id,
                population: self.population,
            }),
            Err(e) => {
                tracing::debug!("skipping location {} ({}): {}", self.id, self.slug, e);
                None
            }
        }
    }
}
