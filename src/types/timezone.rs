//! # 时区转换类型和工具
//!
//! 请求级时区上下文，以及日期过滤和响应时间格式化所需的转换

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

/// 时区上下文，用于在请求中传递时区信息
#[derive(Debug, Clone)]
pub struct TimezoneContext {
    pub timezone: Tz,
}

impl Default for TimezoneContext {
    fn default() -> Self {
        Self { timezone: Tz::UTC }
    }
}

/// 一个将本地时间安全转换为UTC时间的工具 Trait
pub trait ConvertToUtc {
    /// 接受一个时区作为参数，返回一个UTC的DateTime
    fn to_utc(&self, tz: &Tz) -> Option<DateTime<Utc>>;
}

impl ConvertToUtc for NaiveDateTime {
    fn to_utc(&self, tz: &Tz) -> Option<DateTime<Utc>> {
        // 夏令时切换导致的歧义时间取较早的一个
        tz.from_local_datetime(self)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// 时区工具函数
pub mod timezone_utils {
    use super::{ConvertToUtc, DateTime, NaiveDate, NaiveDateTime, TimeDelta, Tz, Utc};

    /// 日期参数格式
    pub const DATE_FORMAT: &str = "%Y-%m-%d";
    /// 夏令时跳变时寻找有效时刻的最大步数（分钟）
    const MAX_GAP_MINUTES: i32 = 24 * 60;

    /// 解析时区字符串，为空或不合法时返回UTC
    #[must_use]
    pub fn parse_timezone_safe(timezone_str: &str) -> Tz {
        timezone_str.trim().parse::<Tz>().unwrap_or(Tz::UTC)
    }

    /// 解析 `YYYY-MM-DD` 日期
    #[must_use]
    pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT).ok()
    }

    /// 本地日期当天 00:00:00 对应的 Unix 秒
    ///
    /// 零点落在夏令时跳变区间时取其后第一个有效时刻。
    #[must_use]
    pub fn local_day_start(date: NaiveDate, timezone: &Tz) -> Option<i64> {
        first_valid_instant(date.and_hms_opt(0, 0, 0)?, timezone, TimeDelta::minutes(1))
    }

    /// 本地日期当天 23:59:59 对应的 Unix 秒
    ///
    /// 落在夏令时跳变区间时取其前最后一个有效时刻。
    #[must_use]
    pub fn local_day_end(date: NaiveDate, timezone: &Tz) -> Option<i64> {
        first_valid_instant(date.and_hms_opt(23, 59, 59)?, timezone, TimeDelta::minutes(-1))
    }

    fn first_valid_instant(local: NaiveDateTime, timezone: &Tz, step: TimeDelta) -> Option<i64> {
        (0..=MAX_GAP_MINUTES)
            .find_map(|i| (local + step * i).to_utc(timezone))
            .map(|dt| dt.timestamp())
    }

    /// 将UTC时间转换为用户时区的格式化字符串
    #[must_use]
    pub fn format_utc_for_response(utc_dt: &DateTime<Utc>, timezone: &Tz) -> String {
        utc_dt
            .with_timezone(timezone)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    /// 将 Unix 秒转换为用户时区的格式化字符串
    #[must_use]
    pub fn format_unix_for_response(timestamp: i64, timezone: &Tz) -> String {
        DateTime::<Utc>::from_timestamp(timestamp, 0)
            .map(|dt| format_utc_for_response(&dt, timezone))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::timezone_utils;
    use super::{ConvertToUtc, Tz};
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn test_convert_to_utc_trait() {
        let tz = Tz::Asia__Shanghai;
        let naive_dt = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let utc_dt = naive_dt.to_utc(&tz).unwrap();
        assert_eq!(utc_dt.hour(), 4); // 上海时间12点 = UTC 4点
    }

    #[test]
    fn test_timezone_utils() {
        assert_eq!(
            timezone_utils::parse_timezone_safe(" Asia/Shanghai "),
            Tz::Asia__Shanghai
        );
        assert_eq!(timezone_utils::parse_timezone_safe(""), Tz::UTC);

        let invalid_tz = timezone_utils::parse_timezone_safe("Invalid/Timezone");
        assert_eq!(invalid_tz.name(), "UTC");
    }

    #[test]
    fn test_local_day_bounds() {
        let date = timezone_utils::parse_date("2024-01-02").unwrap();

        let start = timezone_utils::local_day_start(date, &Tz::UTC).unwrap();
        let end = timezone_utils::local_day_end(date, &Tz::UTC).unwrap();
        assert_eq!(start, 1_704_153_600);
        assert_eq!(end - start, 86_399);

        let shanghai_start = timezone_utils::local_day_start(date, &Tz::Asia__Shanghai).unwrap();
        assert_eq!(start - shanghai_start, 8 * 3600);

        assert!(timezone_utils::parse_date("2024/01/02").is_none());
        assert!(timezone_utils::parse_date("2024-13-01").is_none());
    }

    #[test]
    fn test_local_day_bounds_across_dst_gap() {
        // 2018-11-04 圣保罗零点直接跳到 01:00 -02:00
        let date = timezone_utils::parse_date("2018-11-04").unwrap();
        assert_eq!(
            timezone_utils::local_day_start(date, &Tz::America__Sao_Paulo),
            Some(1_541_300_400)
        );

        // 萨摩亚跳过了 2011-12-30 整天
        let skipped = timezone_utils::parse_date("2011-12-30").unwrap();
        assert_eq!(
            timezone_utils::local_day_end(skipped, &Tz::Pacific__Apia),
            Some(1_325_239_199)
        );
        assert_eq!(
            timezone_utils::local_day_start(skipped, &Tz::Pacific__Apia),
            Some(1_325_239_200)
        );
    }

    #[test]
    fn test_format_unix_for_response() {
        assert_eq!(
            timezone_utils::format_unix_for_response(1_704_153_600, &Tz::UTC),
            "2024-01-02 00:00:00"
        );
        assert_eq!(
            timezone_utils::format_unix_for_response(1_704_153_600, &Tz::Asia__Shanghai),
            "2024-01-02 08:00:00"
        );
    }
}
