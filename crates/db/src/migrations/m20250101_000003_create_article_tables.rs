//! Create post, draft and tag junction tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Post::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Post::Title).string_len(100).not_null())
                    .col(ColumnDef::new(Post::Excerpt).string_len(200).not_null().default(""))
                    .col(ColumnDef::new(Post::Content).text().not_null())
                    .col(ColumnDef::new(Post::Cover).string_len(1024).not_null().default(""))
                    .col(ColumnDef::new(Post::ViewsCnt).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Post::LikeCnt).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Post::UserId).string_len(36).not_null())
                    .col(ColumnDef::new(Post::CategoryId).big_integer())
                    .col(
                        ColumnDef::new(Post::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Post::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_user")
                            .from(Post::Table, Post::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_category")
                            .from(Post::Table, Post::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, created_at) for per-user listings
        manager
            .create_index(
                Index::create()
                    .name("idx_post_user_created")
                    .table(Post::Table)
                    .col(Post::UserId)
                    .col(Post::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_created_at")
                    .table(Post::Table)
                    .col(Post::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Draft::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Draft::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Draft::Title).string_len(100).not_null())
                    .col(ColumnDef::new(Draft::Excerpt).string_len(200).not_null().default(""))
                    .col(ColumnDef::new(Draft::Content).text().not_null())
                    .col(ColumnDef::new(Draft::Cover).string_len(1024).not_null().default(""))
                    .col(ColumnDef::new(Draft::UserId).string_len(36).not_null())
                    .col(ColumnDef::new(Draft::CategoryId).big_integer())
                    .col(ColumnDef::new(Draft::PostId).big_integer().unique_key())
                    .col(
                        ColumnDef::new(Draft::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Draft::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draft_user")
                            .from(Draft::Table, Draft::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draft_category")
                            .from(Draft::Table, Draft::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draft_post")
                            .from(Draft::Table, Draft::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_draft_user_created")
                    .table(Draft::Table)
                    .col(Draft::UserId)
                    .col(Draft::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PostTag::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PostTag::PostId).big_integer().not_null())
                    .col(ColumnDef::new(PostTag::TagId).big_integer().not_null())
                    .primary_key(Index::create().col(PostTag::PostId).col(PostTag::TagId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_tag_post")
                            .from(PostTag::Table, PostTag::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_tag_tag")
                            .from(PostTag::Table, PostTag::TagId)
                            .to(Tag::Table, Tag::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DraftTag::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DraftTag::DraftId).big_integer().not_null())
                    .col(ColumnDef::new(DraftTag::TagId).big_integer().not_null())
                    .primary_key(Index::create().col(DraftTag::DraftId).col(DraftTag::TagId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draft_tag_draft")
                            .from(DraftTag::Table, DraftTag::DraftId)
                            .to(Draft::Table, Draft::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draft_tag_tag")
                            .from(DraftTag::Table, DraftTag::TagId)
                            .to(Tag::Table, Tag::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DraftTag::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PostTag::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Draft::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
    Title,
    Excerpt,
    Content,
    Cover,
    ViewsCnt,
    LikeCnt,
    UserId,
    CategoryId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Draft {
    Table,
    Id,
    Title,
    Excerpt,
    Content,
    Cover,
    UserId,
    CategoryId,
    PostId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PostTag {
    Table,
    PostId,
    TagId,
}

#[derive(Iden)]
enum DraftTag {
    Table,
    DraftId,
    TagId,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Category {
    Table,
    Id,
}

#[derive(Iden)]
enum Tag {
    Table,
    Id,
}
