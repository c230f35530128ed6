//! 请求字段校验

use crate::error::Result;
use crate::validation_error;

/// 校验必填字段长度（按字符计），首尾空白不计入
pub fn validate_length(value: &str, field: &str, min: usize, max: usize) -> Result<()> {
    let length = value.trim().chars().count();
    if length < min {
        return Err(if min <= 1 {
            validation_error!(field, "{} 不能为空", field)
        } else {
            validation_error!(field, "{} 长度不能少于 {} 个字符", field, min)
        });
    }
    if length > max {
        return Err(validation_error!(field, "{} 长度不能超过 {} 个字符", field, max));
    }
    Ok(())
}

/// 校验可选字段长度，缺省时跳过
pub fn validate_optional_length(value: Option<&str>, field: &str, max: usize) -> Result<()> {
    match value {
        Some(value) => validate_length(value, field, 0, max),
        None => Ok(()),
    }
}

/// 去除首尾空白，空串视为缺省
#[must_use]
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}
