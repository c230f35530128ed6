//! # 充值记录实体定义
//!
//! 只追加的充值审计表，`trade_no` 唯一。写入失败不影响入账，幂等由 `payment_keys` 保证

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 充值成功状态
pub const STATUS_SUCCESS: &str = "success";

/// 充值记录实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "top_ups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_id: i32,
    /// 金额，单位为美分
    pub amount: i64,
    /// 金额，单位为美元
    pub money: f64,
    /// 折算后增加的额度
    pub quota: i64,
    #[sea_orm(unique)]
    pub trade_no: String,
    pub create_time: i64,
    pub complete_time: i64,
    pub status: String,
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
