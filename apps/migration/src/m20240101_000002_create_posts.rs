use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// One slug per calendar day (UTC) of `publish`.
const UNIQUE_SLUG_PER_DAY: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS "uq_posts_publish_date_slug"
    ON "posts" ((("publish" AT TIME ZONE 'UTC')::date), "slug")
"#;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Posts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Posts::Title).string_len(250).not_null())
                    .col(
                        ColumnDef::new(Posts::Slug)
                            .string_len(250)
                            .not_null()
                            .check(Expr::cust(r#""slug" ~ '^[-a-zA-Z0-9_]+$'"#)),
                    )
                    .col(ColumnDef::new(Posts::AuthorId).uuid().not_null())
                    .col(ColumnDef::new(Posts::Body).text().not_null())
                    .col(
                        ColumnDef::new(Posts::Publish)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Posts::Created)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Posts::Updated)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Posts::Status)
                            .string_len(10)
                            .not_null()
                            .default("draft")
                            .check(Expr::col(Posts::Status).is_in(["draft", "published"])),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_author_id")
                            .from(Posts::Table, Posts::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(UNIQUE_SLUG_PER_DAY)
            .await?;

        for (name, cols) in [
            ("idx_posts_slug", vec![Posts::Slug]),
            ("idx_posts_author_id", vec![Posts::AuthorId]),
            ("idx_posts_publish", vec![Posts::Publish]),
            ("idx_posts_status_publish", vec![Posts::Status, Posts::Publish]),
        ] {
            let mut index = Index::create();
            index.name(name).table(Posts::Table).if_not_exists();
            for col in cols {
                index.col(col);
            }
            manager.create_index(index.to_owned()).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Posts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
    Title,
    Slug,
    AuthorId,
    Body,
    Publish,
    Created,
    Updated,
    Status,
}
