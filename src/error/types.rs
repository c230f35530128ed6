//! # 错误类型定义

use axum::http::StatusCode;
use thiserror::Error;

/// 账户上的唯一约束字段
///
/// 唯一约束冲突会被归类到具体字段，调用方据此给出可操作的提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    /// 用户名
    Username,
    /// 邮箱
    Email,
    /// 外部用户ID
    ExternalUserId,
    /// 推广码
    ReferralCode,
    /// 支付流水号
    PaymentId,
}

impl UniqueField {
    /// 对外暴露的字段名
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::ExternalUserId => "external_user_id",
            Self::ReferralCode => "aff_code",
            Self::PaymentId => "payment_id",
        }
    }

    /// 冲突错误码
    #[must_use]
    pub const fn conflict_code(self) -> &'static str {
        match self {
            Self::Username => "USERNAME_CONFLICT",
            Self::Email => "EMAIL_CONFLICT",
            Self::ExternalUserId => "EXTERNAL_USER_ID_CONFLICT",
            Self::ReferralCode => "AFF_CODE_CONFLICT",
            Self::PaymentId => "PAYMENT_ID_CONFLICT",
        }
    }

    /// 默认冲突提示
    #[must_use]
    pub const fn conflict_message(self) -> &'static str {
        match self {
            Self::Username => "用户名已存在",
            Self::Email => "邮箱已被其他账户使用",
            Self::ExternalUserId => "外部用户ID已绑定其他账户",
            Self::ReferralCode => "推广码已被其他账户使用",
            Self::PaymentId => "支付流水号已被其他账户使用",
        }
    }
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum BridgeError {
    /// 启动配置错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 数据库相关错误
    #[error("数据库错误: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 输入校验错误
    #[error("验证错误: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// 资源未找到
    #[error("资源未找到: {resource_type} {identifier}")]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    /// 唯一约束冲突
    #[error("资源冲突: {message}")]
    Conflict {
        message: String,
        field: Option<UniqueField>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 定价或渠道配置不可用
    #[error("配置不可用: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// 附加了上下文的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<BridgeError>,
    },
}

impl BridgeError {
    /// 将错误转换为HTTP状态码和错误代码
    #[must_use]
    pub fn to_http_response_parts(&self) -> (StatusCode, &str) {
        match self {
            Self::Config { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Self::Database { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND"),
            Self::Conflict { field, .. } => (
                StatusCode::CONFLICT,
                field.map_or("RESOURCE_CONFLICT", UniqueField::conflict_code),
            ),
            Self::Configuration { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "CONFIGURATION_UNAVAILABLE")
            }
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            Self::Serialization { .. } => (StatusCode::BAD_REQUEST, "SERIALIZATION_ERROR"),
            Self::Context { source, .. } => source.to_http_response_parts(),
        }
    }

    /// 去掉上下文包装后的根错误
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// 校验错误或冲突错误关联的字段名
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self.root() {
            Self::Validation { field, .. } => field.as_deref(),
            Self::Conflict { field, .. } => field.map(UniqueField::as_str),
            _ => None,
        }
    }

    /// 面向调用方的错误描述，不含内部上下文
    #[must_use]
    pub fn client_message(&self) -> String {
        match self.root() {
            Self::Validation { message, .. }
            | Self::Conflict { message, .. }
            | Self::Configuration { message, .. } => message.clone(),
            Self::NotFound {
                resource_type,
                identifier,
            } => format!("{resource_type} 不存在: {identifier}"),
            Self::Database { .. } | Self::Internal { .. } | Self::Io { .. } => {
                "服务内部错误".to_string()
            }
            other => other.to_string(),
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建数据库错误
    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的数据库错误
    pub fn database_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建校验错误
    pub fn validation<T: Into<String>>(message: T, field: Option<&str>) -> Self {
        Self::Validation {
            message: message.into(),
            field: field.map(ToString::to_string),
        }
    }

    /// 创建资源未找到错误
    pub fn not_found<T: Into<String>, I: Into<String>>(resource_type: T, identifier: I) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
        }
    }

    /// 创建字段级冲突错误
    #[must_use]
    pub fn conflict(field: UniqueField) -> Self {
        Self::Conflict {
            message: field.conflict_message().to_string(),
            field: Some(field),
            source: None,
        }
    }

    /// 创建带来源的冲突错误，字段未知时为 None
    pub fn conflict_with_source<E: Into<anyhow::Error>>(
        field: Option<UniqueField>,
        source: E,
    ) -> Self {
        Self::Conflict {
            message: field.map_or("账户数据与现有记录冲突", UniqueField::conflict_message)
                .to_string(),
            field,
            source: Some(source.into()),
        }
    }

    /// 创建配置不可用错误
    pub fn configuration_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建内部错误
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

// 自动转换常见错误类型
impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "文件操作失败".to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON处理失败".to_string(),
            source: err.into(),
        }
    }
}

impl From<sea_orm::error::DbErr> for BridgeError {
    fn from(err: sea_orm::error::DbErr) -> Self {
        Self::database_with_source("数据库操作失败", err)
    }
}

impl From<bcrypt::BcryptError> for BridgeError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::internal_with_source("凭证处理失败", err)
    }
}
