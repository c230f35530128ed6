use serde::Serialize;

/// 数据库 OFFSET 的上限
const MAX_OFFSET: u64 = i64::MAX as u64;

/// 分页参数
#[derive(Debug, Clone, Copy)]
pub struct PaginationParams {
    /// 当前页码（>= 1）
    pub page: u64,
    /// 每页条数（>= 1）
    pub limit: u64,
}

impl PaginationParams {
    /// 根据可选参数创建分页配置。
    ///
    /// 缺省或非正值使用默认值，每页条数不超过上限。
    /// 页码上限保证 offset 不超过 `i64::MAX`。
    #[must_use]
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: u64, max_limit: u64) -> Self {
        let limit = limit
            .and_then(|value| u64::try_from(value).ok())
            .filter(|value| *value > 0)
            .unwrap_or(default_limit)
            .min(max_limit)
            .max(1);
        let max_page = MAX_OFFSET / limit + 1;
        let page = page
            .and_then(|value| u64::try_from(value).ok())
            .filter(|value| *value > 0)
            .unwrap_or(1)
            .min(max_page);
        Self { page, limit }
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// 标准分页信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_page: u64,
}

/// 根据总数和分页参数计算分页信息。
#[must_use]
pub const fn build_page(total: u64, params: PaginationParams) -> PaginationInfo {
    let total_page = if total == 0 {
        0
    } else {
        total.div_ceil(params.limit)
    };
    PaginationInfo {
        page: params.page,
        page_size: params.limit,
        total,
        total_page,
    }
}
