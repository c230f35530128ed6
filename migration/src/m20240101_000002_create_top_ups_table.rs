use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TopUps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TopUps::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TopUps::AccountId).integer().not_null())
                    .col(ColumnDef::new(TopUps::Amount).big_integer().not_null())
                    .col(ColumnDef::new(TopUps::Money).double().not_null())
                    .col(ColumnDef::new(TopUps::Quota).big_integer().not_null())
                    .col(
                        ColumnDef::new(TopUps::TradeNo)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(TopUps::CreateTime).big_integer().not_null())
                    .col(
                        ColumnDef::new(TopUps::CompleteTime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TopUps::Status)
                            .string_len(20)
                            .not_null()
                            .default("success"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_top_ups_account_id")
                            .from(TopUps::Table, TopUps::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_top_ups_account_id")
                    .table(TopUps::Table)
                    .col(TopUps::AccountId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TopUps::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TopUps {
    Table,
    Id,
    AccountId,
    Amount,
    Money,
    Quota,
    TradeNo,
    CreateTime,
    CompleteTime,
    Status,
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
}
