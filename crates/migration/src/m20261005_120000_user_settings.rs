//! Per-user preferences (currency, locale, timezone, date format).
//!
//! Rows are optional: a user without a row gets the defaults.

use sea_orm_migration::prelude::*;

use crate::m20261001_000000_init::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum UserSettings {
    Table,
    UserId,
    Currency,
    Locale,
    Timezone,
    DateFormat,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserSettings::UserId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserSettings::Currency)
                            .string()
                            .not_null()
                            .default("EUR"),
                    )
                    .col(
                        ColumnDef::new(UserSettings::Locale)
                            .string()
                            .not_null()
                            .default("en"),
                    )
                    .col(
                        ColumnDef::new(UserSettings::Timezone)
                            .string()
                            .not_null()
                            .default("UTC"),
                    )
                    .col(
                        ColumnDef::new(UserSettings::DateFormat)
                            .string()
                            .not_null()
                            .default("%Y-%m-%d"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_settings-user_id")
                            .from(UserSettings::Table, UserSettings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserSettings::Table).to_owned())
            .await
    }
}
