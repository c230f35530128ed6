//! # 服务层共享工具
//!
//! 提供分页、日期范围、字段校验等辅助方法，避免在各域服务中重复实现。
//! 推荐通过 `crate::management::services` 根模块的再导出进行访问。

pub mod pagination;
pub mod time_range;
pub mod validation;

pub use pagination::{PaginationInfo, PaginationParams, build_page};
pub use time_range::{DateRangeFilter, resolve_date_range};
pub use validation::{normalize_optional, validate_length, validate_optional_length};
