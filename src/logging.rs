//! # 日志配置模块
//!
//! 初始化 tracing 订阅器，并提供带请求ID、阶段、组件的结构化日志宏

use crate::error::{BridgeError, ErrorCategory};
use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 请求处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    /// 进程启动
    Startup,
    /// 服务器装配
    ServerSetup,
    /// 数据库访问
    Db,
    /// 请求入口
    Request,
    /// 业务处理
    Business,
    /// 响应输出
    Response,
    /// 内部错误
    Internal,
    /// 进程退出
    Shutdown,
}

impl LogStage {
    /// 日志字段值
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::ServerSetup => "server_setup",
            Self::Db => "db",
            Self::Request => "request",
            Self::Business => "business",
            Self::Response => "response",
            Self::Internal => "internal",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    /// 主程序
    Main,
    /// 配置加载
    Configuration,
    /// 数据库
    Database,
    /// 身份同步
    Identity,
    /// 额度账本
    Ledger,
    /// 令牌签发
    Token,
    /// 余额容量估算
    Capacity,
    /// 消费日志查询
    Consumption,
    /// 定价倍率
    Pricing,
    /// 渠道注册表
    Channel,
    /// 管理接口
    Management,
}

impl LogComponent {
    /// 日志字段值
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Configuration => "configuration",
            Self::Database => "database",
            Self::Identity => "identity",
            Self::Ledger => "ledger",
            Self::Token => "token",
            Self::Capacity => "capacity",
            Self::Consumption => "consumption",
            Self::Pricing => "pricing",
            Self::Channel => "channel",
            Self::Management => "management",
        }
    }
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 结构化 info 日志
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($key = %$value,)*
            "{}",
            $message
        )
    };
}

/// 结构化 debug 日志
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($key = %$value,)*
            "{}",
            $message
        )
    };
}

/// 结构化 warn 日志
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($key = %$value,)*
            "{}",
            $message
        )
    };
}

/// 结构化 error 日志
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($key = %$value,)*
            "{}",
            $message
        )
    };
}

/// 记录管理接口错误，客户端错误记 warn，服务端错误记 error
pub fn log_management_error(
    request_id: &str,
    stage: LogStage,
    component: LogComponent,
    operation: &str,
    message: &str,
    err: &BridgeError,
) {
    let (status, code) = err.to_http_response_parts();
    match err.category() {
        ErrorCategory::Client => crate::lwarn!(
            request_id,
            stage,
            component,
            operation,
            message,
            status = status.as_u16(),
            code = code,
            error = err
        ),
        ErrorCategory::Server => crate::lerror!(
            request_id,
            stage,
            component,
            operation,
            message,
            status = status.as_u16(),
            code = code,
            error = format!("{err:?}")
        ),
    }
}

/// 初始化日志系统
pub fn init_logging(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info");

    // 默认关闭 SQL 语句级日志
    let default_filter = format!("{level},quota_bridge=debug,sqlx::query=off,sea_orm::query=warn,sqlx=warn");

    let log_filter = env::var("RUST_LOG").unwrap_or(default_filter);

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
