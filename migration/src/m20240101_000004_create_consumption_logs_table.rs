use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConsumptionLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConsumptionLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ConsumptionLogs::AccountId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsumptionLogs::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsumptionLogs::LogType)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsumptionLogs::Username)
                            .string_len(50)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ConsumptionLogs::ModelName)
                            .string_len(100)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ConsumptionLogs::PromptTokens)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ConsumptionLogs::CompletionTokens)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ConsumptionLogs::Quota)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ConsumptionLogs::Content).text())
                    .to_owned(),
            )
            .await?;

        // 查询按账户和时间倒序
        manager
            .create_index(
                Index::create()
                    .name("idx_consumption_logs_account_created")
                    .table(ConsumptionLogs::Table)
                    .col(ConsumptionLogs::AccountId)
                    .col(ConsumptionLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_consumption_logs_model_name")
                    .table(ConsumptionLogs::Table)
                    .col(ConsumptionLogs::ModelName)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConsumptionLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ConsumptionLogs {
    Table,
    Id,
    AccountId,
    CreatedAt,
    LogType,
    Username,
    ModelName,
    PromptTokens,
    CompletionTokens,
    Quota,
    Content,
}
