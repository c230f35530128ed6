//! # 访问令牌服务
//!
//! 为外部用户签发和吊销访问网关的令牌

use chrono::Utc;
use entity::{AccessTokens, access_tokens};
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::{
    config::BillingConfig,
    error::{BridgeError, Context, Result},
    linfo,
    logging::{LogComponent, LogStage},
    management::server::AppState,
    validation_error,
};

use super::accounts::require_by_external_id;
use super::shared::validate_length;

/// 令牌密钥长度
pub const TOKEN_KEY_LEN: usize = 32;
const SECONDS_PER_DAY: i64 = 86_400;

/// 签发令牌请求
#[derive(Debug, Clone, Deserialize)]
pub struct IssueTokenRequest {
    pub external_user_id: String,
    pub token_name: String,
    /// 有效天数，缺省或 0 使用默认值
    pub expires_in_days: Option<i64>,
}

/// 吊销令牌请求
#[derive(Debug, Clone, Deserialize)]
pub struct RevokeTokenRequest {
    pub external_user_id: String,
    pub token_id: i32,
}

/// 签发结果
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token_id: i32,
    /// 带前缀的完整访问密钥
    pub access_key: String,
    pub token_name: String,
    /// 过期时间，Unix 秒
    pub expires_at: i64,
    /// 签发时的余额快照
    pub remain_quota: i64,
}

/// 吊销结果
#[derive(Debug, Clone, Serialize)]
pub struct RevokedToken {
    pub token_id: i32,
    pub external_user_id: String,
}

/// 令牌摘要，用于统计接口
#[derive(Debug, Clone, Serialize)]
pub struct TokenSummary {
    pub id: i32,
    pub name: String,
    pub key: String,
    pub status: i32,
    pub expired_time: i64,
}

/// 访问令牌服务
pub struct TokenIssuer<'a> {
    db: &'a DatabaseConnection,
    billing: &'a BillingConfig,
}

impl<'a> TokenIssuer<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: state.database.as_ref(),
            billing: &state.config.billing,
        }
    }

    /// 解析有效天数，缺省或 0 使用默认值
    pub fn resolve_ttl_days(&self, requested: Option<i64>) -> Result<i64> {
        match requested {
            None | Some(0) => Ok(self.billing.default_token_ttl_days),
            Some(days) if (1..=self.billing.max_token_ttl_days).contains(&days) => Ok(days),
            Some(days) => Err(validation_error!(
                "expires_in_days",
                "有效天数必须在 1 到 {} 之间: {}",
                self.billing.max_token_ttl_days,
                days
            )),
        }
    }

    /// 签发令牌
    ///
    /// 令牌额度为签发时的账户余额快照，之后不随余额变化
    pub async fn issue(&self, request_id: &str, request: &IssueTokenRequest) -> Result<IssuedToken> {
        validate_length(&request.external_user_id, "external_user_id", 1, 100)?;
        validate_length(&request.token_name, "token_name", 1, 100)?;
        let ttl_days = self.resolve_ttl_days(request.expires_in_days)?;

        let account = require_by_external_id(self.db, request.external_user_id.trim()).await?;

        let now = Utc::now().timestamp();
        let expired_time = now + ttl_days * SECONDS_PER_DAY;
        let token_name = request.token_name.trim().to_string();

        let model = access_tokens::ActiveModel {
            account_id: Set(account.id),
            key: Set(generate_key()),
            name: Set(token_name.clone()),
            created_time: Set(now),
            accessed_time: Set(now),
            expired_time: Set(expired_time),
            status: Set(access_tokens::STATUS_ENABLED),
            remain_quota: Set(account.quota),
            unlimited_quota: Set(false),
            ..Default::default()
        };
        let token = AccessTokens::insert(model)
            .exec_with_returning(self.db)
            .await
            .context("创建访问令牌失败")?;

        linfo!(
            request_id,
            LogStage::Business,
            LogComponent::Token,
            "issue_token",
            "访问令牌签发成功",
            account_id = account.id,
            token_id = token.id,
            ttl_days = ttl_days
        );

        Ok(IssuedToken {
            token_id: token.id,
            access_key: self.billing.access_key(&token.key),
            token_name,
            expires_at: token.expired_time,
            remain_quota: token.remain_quota,
        })
    }

    /// 吊销令牌
    ///
    /// 令牌不存在或不属于该账户时一律返回 `NotFound`
    pub async fn revoke(&self, request_id: &str, request: &RevokeTokenRequest) -> Result<RevokedToken> {
        validate_length(&request.external_user_id, "external_user_id", 1, 100)?;
        let external_user_id = request.external_user_id.trim();
        let account = require_by_external_id(self.db, external_user_id).await?;

        let token = AccessTokens::find_by_id(request.token_id)
            .filter(access_tokens::Column::AccountId.eq(account.id))
            .one(self.db)
            .await
            .context("查询访问令牌失败")?
            .ok_or_else(|| BridgeError::not_found("token", request.token_id.to_string()))?;

        token.delete(self.db).await.context("删除访问令牌失败")?;

        linfo!(
            request_id,
            LogStage::Business,
            LogComponent::Token,
            "revoke_token",
            "访问令牌已删除",
            account_id = account.id,
            token_id = request.token_id
        );

        Ok(RevokedToken {
            token_id: request.token_id,
            external_user_id: external_user_id.to_string(),
        })
    }

    /// 列出账户的全部令牌
    pub async fn list_for_account(&self, account_id: i32) -> Result<Vec<TokenSummary>> {
        let tokens = AccessTokens::find()
            .filter(access_tokens::Column::AccountId.eq(account_id))
            .order_by_asc(access_tokens::Column::Id)
            .all(self.db)
            .await
            .context("查询访问令牌列表失败")?;

        Ok(tokens
            .into_iter()
            .map(|token| TokenSummary {
                id: token.id,
                key: self.billing.access_key(&token.key),
                name: token.name,
                status: token.status,
                expired_time: token.expired_time,
            })
            .collect())
    }
}

/// 生成随机字母数字密钥
fn generate_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_KEY_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::management::services::{CreditRequest, QuotaLedger};
    use crate::testing::{AccountFixture, create_test_db, test_state};
    use sea_orm::PaginatorTrait;

    fn issue_request(name: &str, days: Option<i64>) -> IssueTokenRequest {
        IssueTokenRequest {
            external_user_id: "ext-1".to_string(),
            token_name: name.to_string(),
            expires_in_days: days,
        }
    }

    #[tokio::test]
    async fn test_issue_token() {
        let db = create_test_db().await;
        AccountFixture::new("ext-1", "alice").quota(42_000).insert(&db).await;
        let state = test_state(db);

        let before = Utc::now().timestamp();
        let issued = TokenIssuer::new(&state)
            .issue("t", &issue_request(" main ", None))
            .await
            .unwrap();

        assert!(issued.access_key.starts_with("sk-"));
        let key = issued.access_key.trim_start_matches("sk-");
        assert_eq!(key.len(), TOKEN_KEY_LEN);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(issued.token_name, "main");
        assert_eq!(issued.remain_quota, 42_000);
        let expected = before + 365 * SECONDS_PER_DAY;
        assert!((issued.expires_at - expected).abs() <= 2);
    }

    #[tokio::test]
    async fn test_snapshot_does_not_follow_balance() {
        let db = create_test_db().await;
        AccountFixture::new("ext-1", "alice").quota(10).insert(&db).await;
        let state = test_state(db);

        let issued = TokenIssuer::new(&state)
            .issue("t", &issue_request("snap", Some(30)))
            .await
            .unwrap();
        QuotaLedger::new(&state)
            .credit(
                "t",
                &CreditRequest {
                    external_user_id: "ext-1".to_string(),
                    amount_usd: 1.0,
                    payment_id: "pay-1".to_string(),
                },
            )
            .await
            .unwrap();

        let stored = AccessTokens::find_by_id(issued.token_id)
            .one(state.database.as_ref())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.remain_quota, 10);
        assert!(!stored.unlimited_quota);
        assert_eq!(stored.status, access_tokens::STATUS_ENABLED);
    }

    #[tokio::test]
    async fn test_ttl_rules() {
        let state = test_state(create_test_db().await);
        let issuer = TokenIssuer::new(&state);

        assert_eq!(issuer.resolve_ttl_days(None).unwrap(), 365);
        assert_eq!(issuer.resolve_ttl_days(Some(0)).unwrap(), 365);
        assert_eq!(issuer.resolve_ttl_days(Some(1)).unwrap(), 1);
        assert_eq!(issuer.resolve_ttl_days(Some(3650)).unwrap(), 3650);
        for days in [-1, 3651] {
            let err = issuer.resolve_ttl_days(Some(days)).unwrap_err();
            assert_eq!(err.field(), Some("expires_in_days"));
        }
    }

    #[tokio::test]
    async fn test_issue_validation_and_missing_account() {
        let state = test_state(create_test_db().await);
        let issuer = TokenIssuer::new(&state);

        let err = issuer.issue("t", &issue_request("", None)).await.unwrap_err();
        assert_eq!(err.field(), Some("token_name"));

        let err = issuer
            .issue("t", &issue_request(&"n".repeat(101), None))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("token_name"));

        let err = issuer.issue("t", &issue_request("ok", None)).await.unwrap_err();
        assert!(matches!(err, BridgeError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_revoke_only_own_tokens() {
        let db = create_test_db().await;
        AccountFixture::new("ext-1", "alice").insert(&db).await;
        AccountFixture::new("ext-2", "bob").insert(&db).await;
        let state = test_state(db);
        let issuer = TokenIssuer::new(&state);

        let issued = issuer.issue("t", &issue_request("main", None)).await.unwrap();

        let err = issuer
            .revoke(
                "t",
                &RevokeTokenRequest {
                    external_user_id: "ext-2".to_string(),
                    token_id: issued.token_id,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_http_response_parts().1, "RESOURCE_NOT_FOUND");

        let revoked = issuer
            .revoke(
                "t",
                &RevokeTokenRequest {
                    external_user_id: "ext-1".to_string(),
                    token_id: issued.token_id,
                },
            )
            .await
            .unwrap();
        assert_eq!(revoked.token_id, issued.token_id);
        assert_eq!(
            AccessTokens::find().count(state.database.as_ref()).await.unwrap(),
            0
        );

        let tokens = issuer.list_for_account(1).await.unwrap();
        assert!(tokens.is_empty());
    }
}
