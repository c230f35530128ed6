//! # 应用配置结构定义

use serde::{Deserialize, Serialize};

use crate::ensure_config;
use crate::error::Result;

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP 服务配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 数据库配置
    #[serde(default)]
    pub database: super::DatabaseConfig,
    /// 计费与额度配置
    #[serde(default)]
    pub billing: BillingConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub bind_address: String,
    /// 监听端口
    pub port: u16,
    /// 允许的跨域来源，`*` 表示全部
    pub cors_origins: Vec<String>,
    /// 请求超时时间（秒）
    pub request_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 9090,
            cors_origins: vec!["*".to_string()],
            request_timeout: 30,
        }
    }
}

impl ServerConfig {
    /// 监听地址字符串
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// 计费与额度配置
///
/// 额度与美元的换算、新用户赠送额度、令牌有效期和容量估算参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// 每 1 美元对应的额度
    pub quota_per_unit: i64,
    /// 新建账户赠送的额度
    pub new_user_quota: i64,
    /// 分组倍率
    pub group_ratio: f64,
    /// 令牌默认有效天数
    pub default_token_ttl_days: i64,
    /// 令牌最长有效天数
    pub max_token_ttl_days: i64,
    /// 余额容量估算最多返回的模型数
    pub capacity_model_limit: usize,
    /// 对外返回的访问密钥前缀
    pub access_key_prefix: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            quota_per_unit: 500_000,
            new_user_quota: 0,
            group_ratio: 1.0,
            default_token_ttl_days: 365,
            max_token_ttl_days: 3650,
            capacity_model_limit: 8,
            access_key_prefix: "sk-".to_string(),
        }
    }
}

impl BillingConfig {
    /// 额度折算为美元
    #[must_use]
    pub fn quota_to_usd(&self, quota: i64) -> f64 {
        quota as f64 / self.quota_per_unit as f64
    }

    /// 拼接对外访问密钥
    #[must_use]
    pub fn access_key(&self, key: &str) -> String {
        format!("{}{key}", self.access_key_prefix)
    }
}

impl AppConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        ensure_config!(self.server.port != 0, "Server port must be greater than 0");
        ensure_config!(
            self.server.request_timeout != 0,
            "Server request_timeout must be greater than 0"
        );

        ensure_config!(!self.database.url.is_empty(), "Database URL cannot be empty");
        ensure_config!(
            self.database.max_connections != 0,
            "Database max_connections must be greater than 0"
        );

        let billing = &self.billing;
        ensure_config!(
            billing.quota_per_unit > 0,
            "billing.quota_per_unit must be greater than 0"
        );
        ensure_config!(
            billing.new_user_quota >= 0,
            "billing.new_user_quota cannot be negative"
        );
        ensure_config!(
            billing.group_ratio.is_finite() && billing.group_ratio > 0.0,
            "billing.group_ratio must be a positive number"
        );
        ensure_config!(
            billing.default_token_ttl_days > 0
                && billing.default_token_ttl_days <= billing.max_token_ttl_days,
            "billing.default_token_ttl_days must be within 1..={}",
            billing.max_token_ttl_days
        );
        ensure_config!(
            billing.capacity_model_limit != 0,
            "billing.capacity_model_limit must be greater than 0"
        );

        Ok(())
    }
}
