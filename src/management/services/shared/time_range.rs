use chrono_tz::Tz;

use crate::error::Result;
use crate::types::timezone_utils;
use crate::{ensure_valid, validation_error};

/// 按天过滤的时间范围，边界为 Unix 秒，均为闭区间
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRangeFilter {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

/// 解析 `YYYY-MM-DD` 形式的起止日期。
///
/// 日期按请求时区解释，开始日期取当天 00:00:00，结束日期取当天 23:59:59。
pub fn resolve_date_range(
    start_date: Option<&str>,
    end_date: Option<&str>,
    timezone: &Tz,
) -> Result<DateRangeFilter> {
    let start = parse_bound(start_date, "start_date", |date| {
        timezone_utils::local_day_start(date, timezone)
    })?;
    let end = parse_bound(end_date, "end_date", |date| {
        timezone_utils::local_day_end(date, timezone)
    })?;

    if let (Some(start), Some(end)) = (start, end) {
        ensure_valid!(start <= end, "end_date", "结束日期不能早于开始日期");
    }

    Ok(DateRangeFilter { start, end })
}

fn parse_bound<F>(value: Option<&str>, field: &str, to_timestamp: F) -> Result<Option<i64>>
where
    F: FnOnce(chrono::NaiveDate) -> Option<i64>,
{
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    let date = timezone_utils::parse_date(raw)
        .ok_or_else(|| validation_error!(field, "日期格式应为 YYYY-MM-DD: {}", raw))?;
    to_timestamp(date)
        .map(Some)
        .ok_or_else(|| validation_error!(field, "日期在当前时区无效: {}", raw))
}
