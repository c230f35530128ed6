//! # 登录方式

use serde::{Deserialize, Serialize};
use std::fmt;

/// 外部身份的登录方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginType {
    /// 邮箱登录
    #[default]
    Email,
    /// 微信登录
    Wechat,
    /// 支付宝登录
    Alipay,
    /// 短信登录
    Sms,
}

impl LoginType {
    /// 存储值
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Wechat => "wechat",
            Self::Alipay => "alipay",
            Self::Sms => "sms",
        }
    }

    /// 宽松解析，未识别的值回落为邮箱登录
    #[must_use]
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "wechat" => Self::Wechat,
            "alipay" => Self::Alipay,
            "sms" => Self::Sms,
            _ => Self::Email,
        }
    }
}

impl fmt::Display for LoginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
