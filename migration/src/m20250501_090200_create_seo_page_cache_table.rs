use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SeoPageCache::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SeoPageCache::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SeoPageCache::KeywordId).integer().not_null())
                    .col(ColumnDef::new(SeoPageCache::LocationId).integer().not_null())
                    .col(ColumnDef::new(SeoPageCache::Url).string().not_null().unique_key())
                    .col(ColumnDef::new(SeoPageCache::H1).string().not_null())
                    .col(ColumnDef::new(SeoPageCache::Headings).json().not_null())
                    .col(ColumnDef::new(SeoPageCache::IntroText).text().not_null())
                    .col(ColumnDef::new(SeoPageCache::MetaTitle).string().not_null())
                    .col(ColumnDef::new(SeoPageCache::MetaDescription).text().not_null())
                    .col(ColumnDef::new(SeoPageCache::SchemaMarkup).json().null())
                    .col(ColumnDef::new(SeoPageCache::RelatedLinks).json().not_null())
                    .col(ColumnDef::new(SeoPageCache::ServiceCount).integer().not_null().default(0))
                    .col(ColumnDef::new(SeoPageCache::SalonCount).integer().not_null().default(0))
                    .col(ColumnDef::new(SeoPageCache::AvgPrice).double().null())
                    .col(
                        ColumnDef::new(SeoPageCache::LastGenerated)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_seo_page_cache_keyword")
                            .from(SeoPageCache::Table, SeoPageCache::KeywordId)
                            .to(SeoKeywords::Table, SeoKeywords::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_seo_page_cache_location")
                            .from(SeoPageCache::Table, SeoPageCache::LocationId)
                            .to(SeoLocations::Table, SeoLocations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // One content record per (keyword, location)
        manager
            .create_index(
                Index::create()
                    .name("idx_seo_page_cache_keyword_location")
                    .table(SeoPageCache::Table)
                    .col(SeoPageCache::KeywordId)
                    .col(SeoPageCache::LocationId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SeoPageCache::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SeoPageCache {
    Table,
    Id,
    KeywordId,
    LocationId,
    Url,
    H1,
    Headings,
    IntroText,
    MetaTitle,
    MetaDescription,
    SchemaMarkup,
    RelatedLinks,
    ServiceCount,
    SalonCount,
    AvgPrice,
    LastGenerated,
}

#[derive(DeriveIden)]
enum SeoKeywords {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum SeoLocations {
    Table,
    Id,
}
