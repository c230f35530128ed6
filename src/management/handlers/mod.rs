//! # 管理接口处理器
//!
//! 解析 HTTP 请求，委托服务层处理，并把结果转换为统一响应

pub mod external_users;
pub mod health;

use crate::error::BridgeError;
use crate::logging::{LogComponent, LogStage, log_management_error};
use crate::management::response;
use axum::response::Response;

/// 请求体或查询参数无法解析时返回校验错误
pub(crate) fn rejection_response(
    request_id: &str,
    operation: &str,
    rejection: &impl std::fmt::Display,
) -> Response {
    let err = BridgeError::validation(format!("请求参数错误: {rejection}"), None);
    log_management_error(
        request_id,
        LogStage::Request,
        LogComponent::Management,
        operation,
        "请求参数解析失败",
        &err,
    );
    response::app_error(err)
}
