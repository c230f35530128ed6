use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccessTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccessTokens::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AccessTokens::AccountId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccessTokens::Key)
                            .string_len(48)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(AccessTokens::Name)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccessTokens::CreatedTime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccessTokens::AccessedTime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccessTokens::ExpiredTime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccessTokens::Status)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(AccessTokens::RemainQuota)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AccessTokens::UnlimitedQuota)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_access_tokens_account_id")
                            .from(AccessTokens::Table, AccessTokens::AccountId)
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
                    .name("idx_access_tokens_account_id")
                    .table(AccessTokens::Table)
                    .col(AccessTokens::AccountId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccessTokens::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AccessTokens {
    Table,
    Id,
    AccountId,
    Key,
    Name,
    CreatedTime,
    AccessedTime,
    ExpiredTime,
    Status,
    RemainQuota,
    UnlimitedQuota,
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
}
