//! # 渠道注册表
//!
//! 只读查询已启用的上游渠道及其对外提供的模型

use crate::error::{BridgeError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::ldebug;
use async_trait::async_trait;
use entity::{Channels, channels};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;

/// 已启用渠道的模型信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    /// 渠道名称
    pub name: String,
    /// 渠道提供的模型
    pub models: Vec<String>,
    /// 渠道测试模型，作为默认推荐模型
    pub test_model: Option<String>,
}

impl ChannelInfo {
    /// 由渠道记录构造，解析模型列表并清理测试模型
    #[must_use]
    pub fn from_model(model: channels::Model) -> Self {
        let test_model = model
            .test_model
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        Self {
            models: parse_model_list(&model.models),
            name: model.name,
            test_model,
        }
    }
}

/// 解析渠道模型列表
///
/// 支持 JSON 字符串数组和逗号分隔两种格式，去除首尾空白并丢弃空项
#[must_use]
pub fn parse_model_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let items = serde_json::from_str::<Vec<String>>(trimmed)
        .unwrap_or_else(|_| trimmed.split(',').map(ToString::to_string).collect());

    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// 渠道注册表查询接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelRegistry: Send + Sync {
    /// 查询所有已启用的渠道
    async fn enabled_channels(&self) -> Result<Vec<ChannelInfo>>;
}

/// 基于 `channels` 表的渠道注册表
#[derive(Debug, Clone)]
pub struct DbChannelRegistry {
    db: Arc<DatabaseConnection>,
}

impl DbChannelRegistry {
    /// 创建渠道注册表
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ChannelRegistry for DbChannelRegistry {
    async fn enabled_channels(&self) -> Result<Vec<ChannelInfo>> {
        let rows = Channels::find()
            .filter(channels::Column::Status.eq(channels::STATUS_ENABLED))
            .order_by_asc(channels::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|err| BridgeError::configuration_with_source("渠道查询失败", err))?;

        ldebug!(
            "system",
            LogStage::Db,
            LogComponent::Channel,
            "enabled_channels",
            &format!("已启用渠道 {} 个", rows.len())
        );

        Ok(rows.into_iter().map(ChannelInfo::from_model).collect())
    }
}
