pub use sea_orm_migration::prelude::*;

mod m20250501_090000_create_seo_keywords_table;
mod m20250501_090100_create_seo_locations_table;
mod m20250501_090200_create_seo_page_cache_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250501_090000_create_seo_keywords_table::Migration),
            Box::new(m20250501_090100_create_seo_locations_table::Migration),
            Box::new(m20250501_090200_create_seo_page_cache_table::Migration),
        ]
    }
}
