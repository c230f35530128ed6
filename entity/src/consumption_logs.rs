//! # 消费日志实体定义
//!
//! 由网关计费链路写入，本服务只读

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 充值日志
pub const LOG_TYPE_TOPUP: i32 = 1;
/// 消费日志
pub const LOG_TYPE_CONSUME: i32 = 2;
/// 管理日志
pub const LOG_TYPE_MANAGE: i32 = 3;
/// 系统日志
pub const LOG_TYPE_SYSTEM: i32 = 4;
/// 错误日志
pub const LOG_TYPE_ERROR: i32 = 5;

/// 消费日志实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "consumption_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_id: i32,
    /// Unix 秒
    pub created_at: i64,
    pub log_type: i32,
    pub username: String,
    pub model_name: String,
    pub prompt_tokens: i32,
    pub completion_tokens: i32,
    pub quota: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
