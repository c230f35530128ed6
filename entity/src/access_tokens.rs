//! # 访问令牌实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 令牌启用状态
pub const STATUS_ENABLED: i32 = 1;
/// 令牌禁用状态
pub const STATUS_DISABLED: i32 = 2;

/// 访问令牌实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "access_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_id: i32,
    /// 不含前缀的密钥
    #[sea_orm(unique)]
    pub key: String,
    pub name: String,
    pub created_time: i64,
    pub accessed_time: i64,
    pub expired_time: i64,
    pub status: i32,
    /// 签发时的账户余额快照
    pub remain_quota: i64,
    pub unlimited_quota: bool,
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
