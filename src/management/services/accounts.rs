//! # 账户查询与唯一约束归类
//!
//! 各域服务共用的账户查找方法，以及把存储层的唯一约束冲突归类到具体字段。

use entity::{Accounts, accounts};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, SqlErr};

use crate::error::{BridgeError, Context, Result, UniqueField};

/// 按外部用户ID查找账户
pub async fn find_by_external_id<C>(conn: &C, external_user_id: &str) -> Result<Option<accounts::Model>>
where
    C: ConnectionTrait,
{
    Accounts::find()
        .filter(accounts::Column::ExternalUserId.eq(external_user_id))
        .one(conn)
        .await
        .with_context(|| format!("查询外部用户失败: {external_user_id}"))
}

/// 按外部用户ID查找账户，不存在时返回 `NotFound`
pub async fn require_by_external_id<C>(conn: &C, external_user_id: &str) -> Result<accounts::Model>
where
    C: ConnectionTrait,
{
    find_by_external_id(conn, external_user_id)
        .await?
        .ok_or_else(|| BridgeError::not_found("external_user", external_user_id))
}

/// 写入账户时可能冲突的唯一列取值
#[derive(Debug, Default, Clone, Copy)]
pub struct UniqueCandidates<'a> {
    pub external_user_id: Option<&'a str>,
    pub username: Option<&'a str>,
    pub email: Option<&'a str>,
    pub aff_code: Option<&'a str>,
}

/// 是否为唯一约束冲突
#[must_use]
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// 将账户写入失败归类为字段级错误
///
/// 唯一约束冲突时逐列探测已被其他账户占用的取值，探测不到具体字段时返回不带字段的冲突；
/// 其他存储错误归为内部错误。
pub async fn classify_write_error<C>(
    conn: &C,
    err: DbErr,
    candidates: UniqueCandidates<'_>,
    exclude_id: Option<i32>,
) -> BridgeError
where
    C: ConnectionTrait,
{
    if !is_unique_violation(&err) {
        return BridgeError::internal_with_source("账户写入失败", err);
    }

    let probes = [
        (
            UniqueField::ExternalUserId,
            accounts::Column::ExternalUserId,
            candidates.external_user_id,
        ),
        (
            UniqueField::Username,
            accounts::Column::Username,
            candidates.username,
        ),
        (UniqueField::Email, accounts::Column::Email, candidates.email),
        (
            UniqueField::ReferralCode,
            accounts::Column::AffCode,
            candidates.aff_code,
        ),
    ];

    for (field, column, value) in probes {
        let Some(value) = value else {
            continue;
        };

        let mut query = Accounts::find().filter(column.eq(value));
        if let Some(id) = exclude_id {
            query = query.filter(accounts::Column::Id.ne(id));
        }

        match query.one(conn).await {
            Ok(Some(_)) => return BridgeError::conflict_with_source(Some(field), err),
            Ok(None) => {}
            // 探测本身失败时不再继续猜测字段
            Err(_) => break,
        }
    }

    BridgeError::conflict_with_source(None, err)
}
