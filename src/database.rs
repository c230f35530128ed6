//! # 数据库模块
//!
//! 数据库连接、迁移和默认倍率数据初始化

use crate::config::DatabaseConfig;
use crate::error::{Context, Result};
use crate::{
    lerror, linfo, lwarn,
    logging::{LogComponent, LogStage},
};
use entity::{ModelRatios, model_ratios};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    Set,
};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;

/// 默认模型倍率表：(模型, 模型倍率, 补全倍率)
///
/// 模型倍率 1 对应每 1K 输入 token 0.002 美元
const DEFAULT_MODEL_RATIOS: &[(&str, f64, f64)] = &[
    ("gpt-3.5-turbo", 0.25, 3.0),
    ("gpt-4", 15.0, 2.0),
    ("gpt-4o", 1.25, 4.0),
    ("gpt-4o-mini", 0.075, 4.0),
    ("claude-3-haiku-20240307", 0.125, 5.0),
    ("claude-3-5-sonnet-20241022", 1.5, 5.0),
    ("deepseek-chat", 0.135, 4.0),
    ("deepseek-reasoner", 0.275, 4.0),
    ("deepseek-coder", 0.135, 2.0),
    ("gemini-1.5-flash", 0.0375, 4.0),
];

/// 初始化数据库连接
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    let url = config.get_connection_url()?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "connect",
        "正在连接数据库",
        url = url.chars().take(50).collect::<String>()
    );

    let mut options = ConnectOptions::new(url);
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .acquire_timeout(Duration::from_secs(config.acquire_timeout))
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .context("数据库连接失败")?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "connected",
        "数据库连接成功"
    );
    Ok(db)
}

/// 运行数据库迁移
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "migrate_start",
        "开始运行数据库迁移"
    );

    match ::migration::Migrator::up(db, None).await {
        Ok(()) => {
            linfo!(
                "system",
                LogStage::Startup,
                LogComponent::Database,
                "migrate_done",
                "数据库迁移完成"
            );
            Ok(())
        }
        Err(e) => {
            lerror!(
                "system",
                LogStage::Startup,
                LogComponent::Database,
                "migrate_fail",
                &format!("数据库迁移失败: {e}")
            );
            Err(e).context("数据库迁移失败")
        }
    }
}

/// 检查数据库状态
pub async fn check_database_status(db: &DatabaseConnection) -> Result<()> {
    let pending = ::migration::Migrator::get_pending_migrations(db)
        .await
        .context("查询待应用迁移失败")?;

    if pending.is_empty() {
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Database,
            "migrations_applied",
            "所有迁移都已应用"
        );
    } else {
        lwarn!(
            "system",
            LogStage::Startup,
            LogComponent::Database,
            "migrations_pending",
            &format!("有 {} 个待应用的迁移", pending.len())
        );
    }

    Ok(())
}

/// 连通性检查
pub async fn ping(db: &DatabaseConnection) -> Result<()> {
    db.execute_unprepared("SELECT 1")
        .await
        .context("数据库连通性检查失败")?;
    Ok(())
}

/// 倍率表为空时写入默认模型倍率
pub async fn ensure_model_ratio_data(db: &DatabaseConnection) -> Result<()> {
    let count = ModelRatios::find()
        .count(db)
        .await
        .context("查询模型倍率数据失败")?;

    if count > 0 {
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Pricing,
            "ratio_data_present",
            &format!("模型倍率数据已存在 ({count} 条记录)")
        );
        return Ok(());
    }

    let now = chrono::Utc::now().naive_utc();
    let rows = DEFAULT_MODEL_RATIOS
        .iter()
        .map(|(name, model_ratio, completion_ratio)| model_ratios::ActiveModel {
            model_name: Set((*name).to_string()),
            model_ratio: Set(*model_ratio),
            completion_ratio: Set(*completion_ratio),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        });

    ModelRatios::insert_many(rows)
        .exec(db)
        .await
        .context("写入默认模型倍率失败")?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Pricing,
        "ratio_data_seeded",
        &format!("已初始化 {} 条默认模型倍率", DEFAULT_MODEL_RATIOS.len())
    );
    Ok(())
}
