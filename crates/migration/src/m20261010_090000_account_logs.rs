//! Derived per-account daily logs.
//!
//! The table is a projection of `transactions`: rows are deleted and
//! re-inserted by the log rebuild, never edited by hand.

use sea_orm_migration::prelude::*;

use crate::m20261001_000000_init::{Accounts, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum AccountLogs {
    Table,
    Id,
    UserId,
    AccountId,
    Date,
    OpeningBalance,
    Inflow,
    Outflow,
    ClosingBalance,
    TransactionCount,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccountLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountLogs::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccountLogs::UserId).string().not_null())
                    .col(ColumnDef::new(AccountLogs::AccountId).string().not_null())
                    .col(ColumnDef::new(AccountLogs::Date).date().not_null())
                    .col(
                        ColumnDef::new(AccountLogs::OpeningBalance)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccountLogs::Inflow).big_integer().not_null())
                    .col(ColumnDef::new(AccountLogs::Outflow).big_integer().not_null())
                    .col(
                        ColumnDef::new(AccountLogs::ClosingBalance)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountLogs::TransactionCount)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-account_logs-account_id")
                            .from(AccountLogs::Table, AccountLogs::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-account_logs-user_id")
                            .from(AccountLogs::Table, AccountLogs::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-account_logs-account_id-date-unique")
                    .table(AccountLogs::Table)
                    .col(AccountLogs::AccountId)
                    .col(AccountLogs::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccountLogs::Table).to_owned())
            .await
    }
}
