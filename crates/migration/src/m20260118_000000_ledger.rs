//! Ledger schema: income/expense buckets and the transactions table.
//!
//! Wallet references on ledger rows are `ON DELETE SET NULL` so history
//! survives a wallet deletion; everything else cascades with its owner.

use sea_orm_migration::prelude::*;

use crate::m20260110_000000_init::{Categories, Goals, Users, Wallets};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Incomes {
    Table,
    Id,
    UserId,
    Name,
    Icon,
    Color,
    AmountMinor,
    WalletId,
    CategoryId,
    OccurredOn,
    Note,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    UserId,
    Name,
    Icon,
    Color,
    AmountMinor,
    WalletId,
    CategoryId,
    OccurredOn,
    Note,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    UserId,
    Kind,
    AmountMinor,
    OccurredOn,
    Note,
    FromWalletId,
    ToWalletId,
    FromGoalId,
    ToGoalId,
    FromCategoryId,
    ToCategoryId,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Incomes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Incomes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Incomes::UserId).string().not_null())
                    .col(ColumnDef::new(Incomes::Name).string().not_null())
                    .col(ColumnDef::new(Incomes::Icon).string())
                    .col(ColumnDef::new(Incomes::Color).string())
                    .col(
                        ColumnDef::new(Incomes::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Incomes::WalletId).string())
                    .col(ColumnDef::new(Incomes::CategoryId).string())
                    .col(ColumnDef::new(Incomes::OccurredOn).date())
                    .col(ColumnDef::new(Incomes::Note).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-incomes-user_id")
                            .from(Incomes::Table, Incomes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-incomes-wallet_id")
                            .from(Incomes::Table, Incomes::WalletId)
                            .to(Wallets::Table, Wallets::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-incomes-category_id")
                            .from(Incomes::Table, Incomes::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-incomes-user_id-name-unique")
                    .table(Incomes::Table)
                    .col(Incomes::UserId)
                    .col(Incomes::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::UserId).string().not_null())
                    .col(ColumnDef::new(Expenses::Name).string().not_null())
                    .col(ColumnDef::new(Expenses::Icon).string())
                    .col(ColumnDef::new(Expenses::Color).string())
                    .col(
                        ColumnDef::new(Expenses::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::WalletId).string())
                    .col(ColumnDef::new(Expenses::CategoryId).string())
                    .col(ColumnDef::new(Expenses::OccurredOn).date())
                    .col(ColumnDef::new(Expenses::Note).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-user_id")
                            .from(Expenses::Table, Expenses::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-wallet_id")
                            .from(Expenses::Table, Expenses::WalletId)
                            .to(Wallets::Table, Wallets::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-category_id")
                            .from(Expenses::Table, Expenses::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-user_id-name-unique")
                    .table(Expenses::Table)
                    .col(Expenses::UserId)
                    .col(Expenses::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::UserId).string().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::OccurredOn).date().not_null())
                    .col(ColumnDef::new(Transactions::Note).string())
                    .col(ColumnDef::new(Transactions::FromWalletId).string())
                    .col(ColumnDef::new(Transactions::ToWalletId).string())
                    .col(ColumnDef::new(Transactions::FromGoalId).string())
                    .col(ColumnDef::new(Transactions::ToGoalId).string())
                    .col(ColumnDef::new(Transactions::FromCategoryId).string())
                    .col(ColumnDef::new(Transactions::ToCategoryId).string())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-user_id")
                            .from(Transactions::Table, Transactions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-from_wallet_id")
                            .from(Transactions::Table, Transactions::FromWalletId)
                            .to(Wallets::Table, Wallets::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-to_wallet_id")
                            .from(Transactions::Table, Transactions::ToWalletId)
                            .to(Wallets::Table, Wallets::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-from_goal_id")
                            .from(Transactions::Table, Transactions::FromGoalId)
                            .to(Goals::Table, Goals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-to_goal_id")
                            .from(Transactions::Table, Transactions::ToGoalId)
                            .to(Goals::Table, Goals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-from_category_id")
                            .from(Transactions::Table, Transactions::FromCategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-to_category_id")
                            .from(Transactions::Table, Transactions::ToCategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-user_id-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Incomes::Table).to_owned())
            .await?;
        Ok(())
    }
}
