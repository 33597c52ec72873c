use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SeoKeywords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SeoKeywords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    // Keyword text is the natural upsert key for re-imports
                    .col(ColumnDef::new(SeoKeywords::Keyword).string().not_null().unique_key())
                    .col(ColumnDef::new(SeoKeywords::Slug).string().not_null().unique_key())
                    .col(ColumnDef::new(SeoKeywords::Category).string().not_null())
                    .col(ColumnDef::new(SeoKeywords::Priority).small_integer().not_null())
                    .col(ColumnDef::new(SeoKeywords::SearchVolume).integer().null())
                    .col(
                        ColumnDef::new(SeoKeywords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SeoKeywords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SeoKeywords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SeoKeywords {
    Table,
    Id,
    Keyword,
    Slug,
    Category,
    Priority,
    SearchVolume,
    CreatedAt,
    UpdatedAt,
}
