use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SeoLocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SeoLocations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SeoLocations::Name).string().not_null())
                    .col(ColumnDef::new(SeoLocations::Slug).string().not_null())
                    .col(ColumnDef::new(SeoLocations::Kind).string().not_null()) // PROVINCE | CITY
                    .col(ColumnDef::new(SeoLocations::ParentId).integer().null())
                    .col(ColumnDef::new(SeoLocations::Population).big_integer().null())
                    .col(
                        ColumnDef::new(SeoLocations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SeoLocations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_seo_locations_parent")
                            .from(SeoLocations::Table, SeoLocations::ParentId)
                            .to(SeoLocations::Table, SeoLocations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Slugs are unique within a location kind
        manager
            .create_index(
                Index::create()
                    .name("idx_seo_locations_kind_slug")
                    .table(SeoLocations::Table)
                    .col(SeoLocations::Kind)
                    .col(SeoLocations::Slug)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SeoLocations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SeoLocations {
    Table,
    Id,
    Name,
    Slug,
    Kind,
    ParentId,
    Population,
    CreatedAt,
    UpdatedAt,
}
