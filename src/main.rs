//! # Quota Bridge 主程序
//!
//! 加载配置、初始化数据库并启动外部用户桥接 HTTP 服务

use clap::Parser;
use quota_bridge::{
    Result, config, database, lerror, linfo,
    logging::{self, LogComponent, LogStage},
    management::{AppState, ManagementServer},
};
use std::path::PathBuf;
use std::sync::Arc;

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "quota-bridge", version, about = "外部身份桥接与预付费额度服务")]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 日志级别
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.as_deref());

    if let Err(e) = run(cli).await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "service_start_failed",
            &format!("服务启动失败: {e:?}")
        );
        return Err(e);
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "服务正常关闭"
    );
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = Arc::new(config::load_config(cli.config.as_deref())?);

    let db = database::init_database(&config.database).await?;
    database::run_migrations(&db).await?;
    database::check_database_status(&db).await?;
    database::ensure_model_ratio_data(&db).await?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "data_init_complete",
        "数据初始化完成",
        listen = config.server.listen_addr()
    );

    let state = AppState::new(Arc::new(db), config);
    ManagementServer::new(state).serve().await
}
