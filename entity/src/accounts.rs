//! # 账户实体定义
//!
//! 外部身份对应的内部账户表，持有预付费额度余额

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 普通用户角色
pub const ROLE_COMMON_USER: i32 = 1;
/// 账户启用状态
pub const STATUS_ENABLED: i32 = 1;
/// 账户禁用状态
pub const STATUS_DISABLED: i32 = 2;

/// 账户实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 外部身份提供方的用户ID，创建后不可变
    #[sea_orm(unique)]
    pub external_user_id: Option<String>,
    #[sea_orm(unique)]
    pub username: String,
    pub display_name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// 占位凭证哈希，外部账户不通过密码登录
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub wechat_openid: Option<String>,
    pub wechat_unionid: Option<String>,
    pub alipay_userid: Option<String>,
    pub login_type: String,
    pub role: i32,
    pub status: i32,
    /// 剩余额度
    pub quota: i64,
    /// 累计已用额度，仅由扣费链路修改
    pub used_quota: i64,
    pub request_count: i64,
    /// 推广码，为空时存 NULL
    #[sea_orm(unique)]
    pub aff_code: Option<String>,
    pub is_external: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub external_data: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::top_ups::Entity")]
    TopUps,
    #[sea_orm(has_many = "super::access_tokens::Entity")]
    AccessTokens,
    #[sea_orm(has_many = "super::consumption_logs::Entity")]
    ConsumptionLogs,
}

impl Related<super::top_ups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TopUps.def()
    }
}

impl Related<super::access_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccessTokens.def()
    }
}

impl Related<super::consumption_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsumptionLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
