use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaymentKeys::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentKeys::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PaymentKeys::TradeNo)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PaymentKeys::AccountId).integer().not_null())
                    .col(ColumnDef::new(PaymentKeys::Quota).big_integer().not_null())
                    .col(ColumnDef::new(PaymentKeys::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_keys_account_id")
                            .from(PaymentKeys::Table, PaymentKeys::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentKeys::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PaymentKeys {
    Table,
    Id,
    TradeNo,
    AccountId,
    Quota,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
}
