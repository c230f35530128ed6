//! # 外部用户处理器
//!
//! 处理外部身份同步、充值、令牌、日志与统计请求，委托具体业务给服务层。

use crate::{
    logging::{LogComponent, LogStage, log_management_error},
    management::{
        middleware::RequestId,
        response,
        server::AppState,
        services::{
            AccountStatsService, ConsumptionLogQuery, CreditRequest, ExternalIdentity,
            IdentityReconciler, IssueTokenRequest, LogQuery, QuotaLedger, RevokeTokenRequest,
            TokenIssuer,
        },
    },
    types::TimezoneContext,
};
use axum::{
    Json,
    extract::{
        Extension, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;

use super::rejection_response;

/// 身份同步响应
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub user_id: i32,
    pub external_user_id: String,
    pub is_new_user: bool,
}

/// 同步外部用户
pub async fn sync_external_user(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<ExternalIdentity>, JsonRejection>,
) -> impl IntoResponse {
    let identity = match payload {
        Ok(Json(identity)) => identity,
        Err(rejection) => return rejection_response(&request_id, "sync_external_user", &rejection),
    };

    let service = IdentityReconciler::new(&state);
    match service.reconcile(&request_id, &identity).await {
        Ok(outcome) => {
            let message = if outcome.is_new {
                "用户创建成功"
            } else {
                "用户信息更新成功"
            };
            response::success_with_message(
                SyncResponse {
                    user_id: outcome.account.id,
                    external_user_id: outcome.account.external_user_id.unwrap_or_default(),
                    is_new_user: outcome.is_new,
                },
                message,
            )
        }
        Err(err) => {
            log_management_error(
                &request_id,
                LogStage::Business,
                LogComponent::Identity,
                "sync_external_user_fail",
                "外部用户同步失败",
                &err,
            );
            response::app_error(err)
        }
    }
}

/// 为外部用户充值
pub async fn topup_external_user(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<CreditRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(&request_id, "topup_external_user", &rejection),
    };

    let service = QuotaLedger::new(&state);
    match service.credit(&request_id, &request).await {
        Ok(outcome) => {
            let message = if outcome.duplicate {
                "该支付已入账"
            } else {
                "充值成功"
            };
            response::success_with_message(outcome, message)
        }
        Err(err) => {
            log_management_error(
                &request_id,
                LogStage::Business,
                LogComponent::Ledger,
                "topup_external_user_fail",
                "外部用户充值失败",
                &err,
            );
            response::app_error(err)
        }
    }
}

/// 为外部用户签发令牌
pub async fn create_external_user_token(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<IssueTokenRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return rejection_response(&request_id, "create_external_user_token", &rejection);
        }
    };

    let service = TokenIssuer::new(&state);
    match service.issue(&request_id, &request).await {
        Ok(issued) => response::success_with_message(issued, "令牌创建成功"),
        Err(err) => {
            log_management_error(
                &request_id,
                LogStage::Business,
                LogComponent::Token,
                "create_external_user_token_fail",
                "外部用户令牌创建失败",
                &err,
            );
            response::app_error(err)
        }
    }
}

/// 删除外部用户令牌
pub async fn delete_external_user_token(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<RevokeTokenRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return rejection_response(&request_id, "delete_external_user_token", &rejection);
        }
    };

    let service = TokenIssuer::new(&state);
    match service.revoke(&request_id, &request).await {
        Ok(revoked) => response::success_with_message(revoked, "令牌删除成功"),
        Err(err) => {
            log_management_error(
                &request_id,
                LogStage::Business,
                LogComponent::Token,
                "delete_external_user_token_fail",
                "外部用户令牌删除失败",
                &err,
            );
            response::app_error(err)
        }
    }
}

/// 查询外部用户消费记录
pub async fn get_external_user_logs(
    State(state): State<AppState>,
    Path(external_user_id): Path<String>,
    Extension(request_id): Extension<RequestId>,
    Extension(timezone_context): Extension<Arc<TimezoneContext>>,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> impl IntoResponse {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            return rejection_response(&request_id, "get_external_user_logs", &rejection);
        }
    };

    let service = ConsumptionLogQuery::new(&state);
    match service
        .query(&request_id, &external_user_id, &query, &timezone_context)
        .await
    {
        Ok(page) => response::success(page),
        Err(err) => {
            log_management_error(
                &request_id,
                LogStage::Business,
                LogComponent::Consumption,
                "get_external_user_logs_fail",
                "外部用户消费记录查询失败",
                &err,
            );
            response::app_error(err)
        }
    }
}

/// 获取外部用户统计信息
pub async fn get_external_user_stats(
    State(state): State<AppState>,
    Path(external_user_id): Path<String>,
    Extension(request_id): Extension<RequestId>,
    Extension(timezone_context): Extension<Arc<TimezoneContext>>,
) -> impl IntoResponse {
    let service = AccountStatsService::new(&state);
    match service
        .stats(&request_id, &external_user_id, &timezone_context)
        .await
    {
        Ok(stats) => response::success(stats),
        Err(err) => {
            log_management_error(
                &request_id,
                LogStage::Business,
                LogComponent::Management,
                "get_external_user_stats_fail",
                "外部用户统计查询失败",
                &err,
            );
            response::app_error(err)
        }
    }
}

/// 可用模型价格列表
pub async fn list_models(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> impl IntoResponse {
    let service = AccountStatsService::new(&state);
    match service.models(&request_id).await {
        Ok(catalog) => response::success(catalog),
        Err(err) => {
            log_management_error(
                &request_id,
                LogStage::Business,
                LogComponent::Pricing,
                "list_models_fail",
                "模型列表查询失败",
                &err,
            );
            response::app_error(err)
        }
    }
}
