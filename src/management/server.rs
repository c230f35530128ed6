//! # 管理服务器
//!
//! Axum HTTP 服务器，承载外部用户桥接接口

use crate::channels::{ChannelRegistry, DbChannelRegistry};
use crate::config::{AppConfig, ServerConfig};
use crate::error::{BridgeError, Context, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{linfo, lwarn};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use sea_orm::DatabaseConnection;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::middleware::{request_id_middleware, timezone_middleware};

/// 管理服务器应用状态
#[derive(Clone)]
pub struct AppState {
    /// 数据库连接
    pub database: Arc<DatabaseConnection>,
    /// 应用配置
    pub config: Arc<AppConfig>,
    /// 渠道注册表
    pub channels: Arc<dyn ChannelRegistry>,
}

impl AppState {
    /// 使用数据库渠道注册表创建状态
    #[must_use]
    pub fn new(database: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Self {
        let channels: Arc<dyn ChannelRegistry> =
            Arc::new(DbChannelRegistry::new(Arc::clone(&database)));
        Self {
            database,
            config,
            channels,
        }
    }

    /// 替换渠道注册表
    #[must_use]
    pub fn with_channels(mut self, channels: Arc<dyn ChannelRegistry>) -> Self {
        self.channels = channels;
        self
    }
}

/// 管理服务器
pub struct ManagementServer {
    /// 配置
    config: ServerConfig,
    /// 路由器
    router: Router,
}

impl ManagementServer {
    /// 创建新的管理服务器
    #[must_use]
    pub fn new(state: AppState) -> Self {
        let config = state.config.server.clone();
        let router = create_router(state, &config);
        Self { config, router }
    }

    /// 启动服务器，收到 Ctrl-C 后优雅退出
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self.config.listen_addr().parse().map_err(|e| {
            BridgeError::config_with_source(
                format!("无效的监听地址: {}", self.config.listen_addr()),
                e,
            )
        })?;

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("绑定监听地址失败: {addr}"))?;

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "server_start",
            &format!("管理服务器已启动: http://{addr}")
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("管理服务器运行失败")?;

        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::Main,
            "server_stopped",
            "管理服务器已停止"
        );
        Ok(())
    }
}

/// 创建完整路由，所有接口挂载在 `/api` 下
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .nest("/api", super::routes::create_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.cors_origins))
                .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout)))
                .layer(axum::middleware::from_fn(timezone_middleware)),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            header::HeaderName::from_static("x-timezone"),
            header::HeaderName::from_static("x-request-id"),
        ]);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let parsed = origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<std::result::Result<Vec<_>, _>>();
    match parsed {
        Ok(parsed) => layer.allow_origin(parsed),
        Err(e) => {
            lwarn!(
                "system",
                LogStage::ServerSetup,
                LogComponent::Main,
                "cors_config_fail",
                &format!("CORS 来源配置无效: {e}，回退为允许全部")
            );
            layer.allow_origin(Any)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        lwarn!(
            "system",
            LogStage::Shutdown,
            LogComponent::Main,
            "signal_fail",
            &format!("监听退出信号失败: {e}")
        );
    }
    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "shutdown_signal",
        "收到退出信号，开始优雅关闭"
    );
}
