//! # 管理API模块
//!
//! 外部身份桥接的 HTTP 接口：身份同步、充值、令牌、日志与统计

pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod services;

pub use routes::create_routes;
pub use server::{AppState, ManagementServer, create_router};
