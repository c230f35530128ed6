//! # 模型倍率实体定义
//!
//! 倍率计费模型：`model_ratio` 为 1 时对应每 1K 输入 token 0.002 美元，
//! `completion_ratio` 为输出相对输入的倍数

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 模型倍率实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "model_ratios")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub model_name: String,
    pub model_ratio: f64,
    pub completion_ratio: f64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
