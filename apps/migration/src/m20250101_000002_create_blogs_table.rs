use sea_orm_migration::{prelude::*, schema::*};

use super::m20250101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Blogs::Table)
                    .if_not_exists()
                    .col(uuid(Blogs::Id).primary_key())
                    .col(uuid(Blogs::AuthorId))
                    .col(string(Blogs::Title))
                    .col(string(Blogs::Slug).unique_key())
                    .col(text(Blogs::Content))
                    .col(string_null(Blogs::Summary))
                    .col(string(Blogs::Status))
                    .col(json_binary(Blogs::Tags))
                    .col(json_binary(Blogs::Likes))
                    .col(json_binary(Blogs::Comments))
                    .col(integer(Blogs::ViewCount))
                    .col(timestamp_with_time_zone(Blogs::CreatedAt))
                    .col(timestamp_with_time_zone(Blogs::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blogs_author")
                            .from(Blogs::Table, Blogs::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_blogs_author_id")
                    .table(Blogs::Table)
                    .col(Blogs::AuthorId)
                    .to_owned(),
            )
            .await?;

        // Listings sort newest-first.
        manager
            .create_index(
                Index::create()
                    .name("idx_blogs_created_at")
                    .table(Blogs::Table)
                    .col(Blogs::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Blogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Blogs {
    Table,
    Id,
    AuthorId,
    Title,
    Slug,
    Content,
    Summary,
    Status,
    Tags,
    Likes,
    Comments,
    ViewCount,
    CreatedAt,
    UpdatedAt,
}
