//! # 路由配置
//!
//! 外部用户桥接接口与健康检查路由

use crate::management::handlers::{external_users, health};
use crate::management::server::AppState;
use axum::Router;
use axum::routing::{get, post};

/// 创建所有路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/user/external", external_user_routes())
        .with_state(state)
}

/// 外部用户路由
fn external_user_routes() -> Router<AppState> {
    Router::new()
        .route("/sync", post(external_users::sync_external_user))
        .route("/topup", post(external_users::topup_external_user))
        .route(
            "/token",
            post(external_users::create_external_user_token)
                .delete(external_users::delete_external_user_token),
        )
        .route("/models", get(external_users::list_models))
        .route(
            "/{external_user_id}/logs",
            get(external_users::get_external_user_logs),
        )
        .route(
            "/{external_user_id}/stats",
            get(external_users::get_external_user_stats),
        )
}
