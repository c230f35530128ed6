//! # 渠道实体定义
//!
//! 上游渠道配置，`models` 字段为 JSON 数组或逗号分隔的模型列表

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 渠道启用状态
pub const STATUS_ENABLED: i32 = 1;
/// 渠道手动禁用状态
pub const STATUS_MANUALLY_DISABLED: i32 = 2;

/// 渠道实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "channels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub models: String,
    /// 渠道测试使用的模型
    pub test_model: Option<String>,
    pub status: i32,
    pub created_time: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
