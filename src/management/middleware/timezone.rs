//! # 时区中间件
//!
//! 用于解析 X-Timezone 头，并在请求上下文中提供时区信息。

use crate::types::{TimezoneContext, timezone_utils};
use axum::{extract::Request, middleware::Next, response::Response};
use chrono_tz::Tz;
use std::sync::Arc;

/// 请求时区头
pub const TIMEZONE_HEADER: &str = "X-Timezone";

/// 时区中间件
pub async fn timezone_middleware(mut request: Request, next: Next) -> Response {
    let timezone_header = request
        .headers()
        .get(TIMEZONE_HEADER)
        .and_then(|header| header.to_str().ok());

    // 无效时区回落为 UTC
    let timezone = parse_timezone_header(timezone_header);
    request
        .extensions_mut()
        .insert(Arc::new(TimezoneContext { timezone }));

    next.run(request).await
}

/// 解析时区 header，为空或不合法时返回 UTC
#[must_use]
pub fn parse_timezone_header(header: Option<&str>) -> Tz {
    header.map_or(Tz::UTC, timezone_utils::parse_timezone_safe)
}
