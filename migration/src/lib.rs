pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_accounts_table;
mod m20240101_000002_create_top_ups_table;
mod m20240101_000003_create_access_tokens_table;
mod m20240101_000004_create_consumption_logs_table;
mod m20240101_000005_create_channels_table;
mod m20240101_000006_create_model_ratios_table;
mod m20240101_000007_create_payment_keys_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_accounts_table::Migration),
            Box::new(m20240101_000002_create_top_ups_table::Migration),
            Box::new(m20240101_000003_create_access_tokens_table::Migration),
            Box::new(m20240101_000004_create_consumption_logs_table::Migration),
            Box::new(m20240101_000005_create_channels_table::Migration),
            Box::new(m20240101_000006_create_model_ratios_table::Migration),
            Box::new(m20240101_000007_create_payment_keys_table::Migration),
        ]
    }
}
