//! Migration to create `password_reset_codes` table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PasswordResetCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PasswordResetCodes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PasswordResetCodes::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(PasswordResetCodes::Code)
                            .string_len(6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetCodes::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetCodes::UsedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PasswordResetCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_password_reset_codes_user")
                            .from(PasswordResetCodes::Table, PasswordResetCodes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookups are always by (user, code)
        manager
            .create_index(
                Index::create()
                    .name("idx_password_reset_codes_user_code")
                    .table(PasswordResetCodes::Table)
                    .col(PasswordResetCodes::UserId)
                    .col(PasswordResetCodes::Code)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PasswordResetCodes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PasswordResetCodes {
    Table,
    Id,
    UserId,
    Code,
    ExpiresAt,
    UsedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
