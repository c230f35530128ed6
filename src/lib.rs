//! # Quota Bridge
//!
//! AI 网关的外部身份桥接与预付费额度账本：身份同步、充值、访问令牌、
//! 余额容量估算与消费日志查询。

pub mod channels;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod management;
pub mod pricing;
pub mod testing;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{BridgeError, Result};
