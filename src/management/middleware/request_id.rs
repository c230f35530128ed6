//! # Request ID 中间件
//!
//! 为每个请求确定唯一 `request_id`，注入到请求扩展中并回写到响应头。
//! 调用方传入合法的 `x-request-id` 时沿用该值，便于跨系统串联日志。

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use std::fmt;
use std::ops::Deref;
use uuid::Uuid;

/// 请求ID头
pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// 沿用上游请求ID的最大长度
const MAX_INBOUND_LEN: usize = 128;

/// 请求ID类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// 沿用上游请求ID，空值、过长或含非可见字符时生成新的ID
    #[must_use]
    pub fn from_inbound(value: Option<&str>) -> Self {
        value
            .map(str::trim)
            .filter(|raw| {
                !raw.is_empty()
                    && raw.len() <= MAX_INBOUND_LEN
                    && raw.chars().all(|c| c.is_ascii_graphic())
            })
            .map_or_else(Self::new, |raw| Self(raw.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Deref for RequestId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// 请求ID中间件
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let inbound = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok());
    let request_id = RequestId::from_inbound(inbound);
    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::RequestId;

    #[test]
    fn test_inbound_request_id() {
        assert_eq!(RequestId::from_inbound(Some(" abc-123 ")).as_str(), "abc-123");

        let generated = RequestId::from_inbound(None);
        assert_eq!(generated.len(), 36);

        assert_ne!(RequestId::from_inbound(Some("has space")).as_str(), "has space");
        assert_eq!(RequestId::from_inbound(Some(&"x".repeat(129))).len(), 36);
    }
}
