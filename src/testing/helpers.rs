//! # 测试辅助函数
//!
//! 内存数据库、测试配置与应用状态

use crate::channels::ChannelRegistry;
use crate::config::AppConfig;
use crate::management::AppState;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// 初始化测试环境
pub fn init_test_env() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 创建已完成迁移的内存数据库
pub async fn create_test_db() -> DatabaseConnection {
    init_test_env();
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    migration::Migrator::up(&db, None)
        .await
        .expect("run migrations");
    db
}

/// 测试用配置，新用户赠送 100000 额度
#[must_use]
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.billing.new_user_quota = 100_000;
    config
}

/// 基于测试配置和数据库渠道注册表的应用状态
#[must_use]
pub fn test_state(db: DatabaseConnection) -> AppState {
    AppState::new(Arc::new(db), Arc::new(test_config()))
}

/// 使用指定渠道注册表的应用状态
#[must_use]
pub fn test_state_with_channels(
    db: DatabaseConnection,
    channels: Arc<dyn ChannelRegistry>,
) -> AppState {
    test_state(db).with_channels(channels)
}
