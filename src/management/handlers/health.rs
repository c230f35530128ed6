//! 健康检查处理器

use crate::database;
use crate::logging::{LogComponent, LogStage};
use crate::lwarn;
use crate::management::{response, server::AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

/// 健康状态
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
}

/// 健康检查，包含数据库连通性
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match database::ping(&state.database).await {
        Ok(()) => response::success(HealthStatus {
            status: "healthy",
            database: "connected",
        }),
        Err(err) => {
            lwarn!(
                "system",
                LogStage::Db,
                LogComponent::Database,
                "health_check_fail",
                "健康检查数据库不可用",
                error = err
            );
            response::error(
                StatusCode::SERVICE_UNAVAILABLE,
                "DATABASE_UNAVAILABLE",
                "数据库不可用",
            )
        }
    }
}
