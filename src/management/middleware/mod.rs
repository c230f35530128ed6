//! # 管理接口中间件
//!
//! 请求ID与请求时区上下文注入

pub mod request_id;
pub mod timezone;

pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use timezone::{TIMEZONE_HEADER, parse_timezone_header, timezone_middleware};
