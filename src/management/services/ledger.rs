//! # 预付费额度账本
//!
//! 外部支付完成后为账户增加额度。额度增加与充值审计记录在同一事务内完成，
//! `payment_id` 作为幂等键写入 `payment_keys`，与额度增加同事务提交，
//! 同一笔支付重复通知不会重复加额度。充值审计记录只尽力写入。

use chrono::Utc;
use entity::{Accounts, PaymentKeys, accounts, payment_keys, top_ups};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter,
    TransactionTrait, sea_query::Expr,
};
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};

use crate::{
    config::BillingConfig,
    ensure_valid,
    error::{BridgeError, Context, Result, UniqueField},
    linfo, lwarn,
    logging::{LogComponent, LogStage},
    management::server::AppState,
};

use super::accounts::{is_unique_violation, require_by_external_id};
use super::shared::validate_length;

/// 最小充值金额（美元）
pub const MIN_CREDIT_USD: f64 = 0.01;

/// 充值请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreditRequest {
    pub external_user_id: String,
    pub amount_usd: f64,
    pub payment_id: String,
}

/// 充值结果
#[derive(Debug, Clone, Serialize)]
pub struct CreditOutcome {
    pub amount_usd: f64,
    pub quota_added: i64,
    pub current_quota: i64,
    pub current_balance: f64,
    pub payment_id: String,
    /// 该支付流水此前已入账，本次未改变余额
    pub duplicate: bool,
    /// 充值审计记录是否写入成功
    pub audit_recorded: bool,
}

/// 额度账本服务
pub struct QuotaLedger<'a> {
    db: &'a DatabaseConnection,
    billing: &'a BillingConfig,
}

impl<'a> QuotaLedger<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: state.database.as_ref(),
            billing: &state.config.billing,
        }
    }

    /// 美元金额折算为额度，向下取整
    ///
    /// 折算结果超出 i64 范围时返回 `amount_usd` 校验错误。
    pub fn quota_for(&self, amount_usd: f64) -> Result<i64> {
        let quota = (amount_usd * self.billing.quota_per_unit as f64).floor();
        // i64::MAX 转为 f64 后向上取整为 2^63
        ensure_valid!(
            quota.is_finite() && quota < i64::MAX as f64,
            "amount_usd",
            "充值金额过大"
        );
        Ok(quota as i64)
    }

    /// 为外部用户充值
    pub async fn credit(&self, request_id: &str, request: &CreditRequest) -> Result<CreditOutcome> {
        ensure_valid!(
            request.amount_usd.is_finite() && request.amount_usd >= MIN_CREDIT_USD,
            "amount_usd",
            "充值金额不能小于 {}",
            MIN_CREDIT_USD
        );
        validate_length(&request.payment_id, "payment_id", 1, 200)?;
        validate_length(&request.external_user_id, "external_user_id", 1, 100)?;

        let external_user_id = request.external_user_id.trim();
        let payment_id = request.payment_id.trim();
        let quota_delta = self.quota_for(request.amount_usd)?;

        let txn = self.db.begin().await.context("开启充值事务失败")?;
        let account = require_by_external_id(&txn, external_user_id).await?;

        if let Some(existing) = PaymentKeys::find()
            .filter(payment_keys::Column::TradeNo.eq(payment_id))
            .one(&txn)
            .await
            .context("查询支付幂等键失败")?
        {
            if existing.account_id != account.id {
                return Err(BridgeError::conflict(UniqueField::PaymentId));
            }

            txn.commit().await.context("提交充值事务失败")?;
            lwarn!(
                request_id,
                LogStage::Business,
                LogComponent::Ledger,
                "credit_replayed",
                "重复的支付流水，跳过入账",
                account_id = account.id,
                payment_id = payment_id
            );
            return Ok(self.outcome(
                request.amount_usd,
                existing.quota,
                account.quota,
                payment_id,
                true,
                true,
            ));
        }

        ensure_valid!(
            account.quota.checked_add(quota_delta).is_some(),
            "amount_usd",
            "充值后余额超出上限"
        );

        let now = Utc::now();
        Accounts::update_many()
            .col_expr(
                accounts::Column::Quota,
                Expr::col(accounts::Column::Quota).add(quota_delta),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now.naive_utc()))
            .filter(accounts::Column::Id.eq(account.id))
            .exec(&txn)
            .await
            .context("更新账户额度失败")?;

        let key = payment_keys::ActiveModel {
            trade_no: Set(payment_id.to_string()),
            account_id: Set(account.id),
            quota: Set(quota_delta),
            created_at: Set(now.timestamp()),
            ..Default::default()
        };
        if let Err(err) = key.insert(&txn).await {
            if is_unique_violation(&err) {
                return Err(BridgeError::conflict_with_source(
                    Some(UniqueField::PaymentId),
                    err,
                ));
            }
            return Err(err).context("写入支付幂等键失败");
        }

        let record = top_ups::ActiveModel {
            account_id: Set(account.id),
            amount: Set((request.amount_usd * 100.0).round() as i64),
            money: Set(request.amount_usd),
            quota: Set(quota_delta),
            trade_no: Set(payment_id.to_string()),
            create_time: Set(now.timestamp()),
            complete_time: Set(now.timestamp()),
            status: Set(top_ups::STATUS_SUCCESS.to_string()),
            ..Default::default()
        };
        let audit_recorded = Self::record_top_up(request_id, &txn, record).await?;

        let updated = Accounts::find_by_id(account.id)
            .one(&txn)
            .await
            .context("读取充值后余额失败")?
            .ok_or_else(|| BridgeError::not_found("external_user", external_user_id))?;
        txn.commit().await.context("提交充值事务失败")?;

        linfo!(
            request_id,
            LogStage::Business,
            LogComponent::Ledger,
            "credit",
            "外部用户充值成功",
            account_id = updated.id,
            payment_id = payment_id,
            amount_usd = format!("{:.2}", request.amount_usd),
            quota_added = quota_delta,
            current_quota = updated.quota
        );

        Ok(self.outcome(
            request.amount_usd,
            quota_delta,
            updated.quota,
            payment_id,
            false,
            audit_recorded,
        ))
    }

    /// 在保存点内写入充值记录，失败时只回滚记录本身
    async fn record_top_up(
        request_id: &str,
        txn: &DatabaseTransaction,
        record: top_ups::ActiveModel,
    ) -> Result<bool> {
        let savepoint = txn.begin().await.context("创建保存点失败")?;
        match record.insert(&savepoint).await {
            Ok(_) => {
                savepoint.commit().await.context("释放保存点失败")?;
                Ok(true)
            }
            Err(err) => {
                savepoint.rollback().await.context("回滚保存点失败")?;
                lwarn!(
                    request_id,
                    LogStage::Db,
                    LogComponent::Ledger,
                    "record_top_up_failed",
                    "充值记录写入失败，额度已入账",
                    error = err
                );
                Ok(false)
            }
        }
    }

    fn outcome(
        &self,
        amount_usd: f64,
        quota_added: i64,
        current_quota: i64,
        payment_id: &str,
        duplicate: bool,
        audit_recorded: bool,
    ) -> CreditOutcome {
        CreditOutcome {
            amount_usd,
            quota_added,
            current_quota,
            current_balance: self.billing.quota_to_usd(current_quota),
            payment_id: payment_id.to_string(),
            duplicate,
            audit_recorded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{AccountFixture, create_test_db, reload_account, test_state};
    use entity::TopUps;
    use sea_orm::{ConnectionTrait, PaginatorTrait};

    fn request(external_user_id: &str, amount_usd: f64, payment_id: &str) -> CreditRequest {
        CreditRequest {
            external_user_id: external_user_id.to_string(),
            amount_usd,
            payment_id: payment_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_credit_ten_dollars() {
        let db = create_test_db().await;
        let account = AccountFixture::new("ext-1", "alice").quota(1_000).insert(&db).await;
        let state = test_state(db);

        let outcome = QuotaLedger::new(&state)
            .credit("t", &request("ext-1", 10.0, "pay-1"))
            .await
            .unwrap();

        assert_eq!(outcome.quota_added, 5_000_000);
        assert_eq!(outcome.current_quota, 5_001_000);
        assert!((outcome.current_balance - 10.002).abs() < 1e-9);
        assert!(!outcome.duplicate);
        assert!(outcome.audit_recorded);

        let records = TopUps::find().all(state.database.as_ref()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].account_id, account.id);
        assert_eq!(records[0].amount, 1_000);
        assert_eq!(records[0].quota, 5_000_000);
        assert_eq!(records[0].status, "success");
    }

    #[tokio::test]
    async fn test_quota_is_floored() {
        let db = create_test_db().await;
        AccountFixture::new("ext-1", "alice").insert(&db).await;
        let state = test_state(db);
        let ledger = QuotaLedger::new(&state);

        assert_eq!(ledger.quota_for(0.01).unwrap(), 5_000);
        assert_eq!(ledger.quota_for(0.000_001_9).unwrap(), 0);

        let outcome = ledger
            .credit("t", &request("ext-1", 1.234_567_8, "pay-1"))
            .await
            .unwrap();
        assert_eq!(outcome.quota_added, 617_283);
    }

    #[tokio::test]
    async fn test_duplicate_payment_is_replayed() {
        let db = create_test_db().await;
        let account = AccountFixture::new("ext-1", "alice").insert(&db).await;
        let state = test_state(db);
        let ledger = QuotaLedger::new(&state);

        ledger.credit("t", &request("ext-1", 2.0, "pay-1")).await.unwrap();
        let replay = ledger
            .credit("t", &request("ext-1", 2.0, "pay-1"))
            .await
            .unwrap();

        assert!(replay.duplicate);
        assert_eq!(replay.quota_added, 1_000_000);
        assert_eq!(replay.current_quota, 1_000_000);

        let reloaded = reload_account(state.database.as_ref(), account.id).await;
        assert_eq!(reloaded.quota, 1_000_000, "重复支付不重复入账");
        assert_eq!(TopUps::find().count(state.database.as_ref()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_payment_owned_by_other_account() {
        let db = create_test_db().await;
        AccountFixture::new("ext-1", "alice").insert(&db).await;
        let bob = AccountFixture::new("ext-2", "bob").insert(&db).await;
        let state = test_state(db);
        let ledger = QuotaLedger::new(&state);

        ledger.credit("t", &request("ext-1", 1.0, "pay-1")).await.unwrap();
        let err = ledger
            .credit("t", &request("ext-2", 1.0, "pay-1"))
            .await
            .unwrap_err();

        assert_eq!(err.to_http_response_parts().1, "PAYMENT_ID_CONFLICT");
        assert_eq!(reload_account(state.database.as_ref(), bob.id).await.quota, 0);
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_mutated() {
        let state = test_state(create_test_db().await);
        let err = QuotaLedger::new(&state)
            .credit("t", &request("missing", 1.0, "pay-1"))
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::NotFound { .. }));
        assert_eq!(TopUps::find().count(state.database.as_ref()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_amount_and_payment_id() {
        let db = create_test_db().await;
        AccountFixture::new("ext-1", "alice").insert(&db).await;
        let state = test_state(db);
        let ledger = QuotaLedger::new(&state);

        for amount in [0.0, 0.009, -5.0, f64::NAN, f64::INFINITY] {
            let err = ledger
                .credit("t", &request("ext-1", amount, "pay-1"))
                .await
                .unwrap_err();
            assert_eq!(err.field(), Some("amount_usd"));
        }

        let err = ledger
            .credit("t", &request("ext-1", 1.0, ""))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("payment_id"));

        let err = ledger
            .credit("t", &request("ext-1", 1.0, &"p".repeat(201)))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("payment_id"));
    }

    #[tokio::test]
    async fn test_oversized_amount_is_rejected() {
        let db = create_test_db().await;
        let account = AccountFixture::new("ext-1", "alice").insert(&db).await;
        AccountFixture::new("ext-2", "bob")
            .quota(i64::MAX - 1_000)
            .insert(&db)
            .await;
        let state = test_state(db);
        let ledger = QuotaLedger::new(&state);

        for amount in [1e300, f64::MAX, 2e13] {
            let err = ledger
                .credit("t", &request("ext-1", amount, "pay-big"))
                .await
                .unwrap_err();
            assert_eq!(err.to_http_response_parts().1, "VALIDATION_ERROR");
            assert_eq!(err.field(), Some("amount_usd"));
        }
        assert_eq!(reload_account(state.database.as_ref(), account.id).await.quota, 0);

        // 折算额度合法但加上现有余额会溢出
        let err = ledger
            .credit("t", &request("ext-2", 1.0, "pay-2"))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("amount_usd"));
        assert_eq!(PaymentKeys::find().count(state.database.as_ref()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_audit_failure_keeps_credit_and_idempotency() {
        let db = create_test_db().await;
        let account = AccountFixture::new("ext-1", "alice")
            .quota(100_000)
            .insert(&db)
            .await;
        db.execute_unprepared(
            "CREATE TRIGGER reject_top_ups BEFORE INSERT ON top_ups \
             BEGIN SELECT RAISE(ABORT, 'audit store unavailable'); END;",
        )
        .await
        .unwrap();
        let state = test_state(db);
        let ledger = QuotaLedger::new(&state);

        let first = ledger
            .credit("t", &request("ext-1", 1.0, "pay-1"))
            .await
            .unwrap();
        assert!(!first.audit_recorded);
        assert!(!first.duplicate);
        assert_eq!(first.current_quota, 600_000);

        let replay = ledger
            .credit("t", &request("ext-1", 1.0, "pay-1"))
            .await
            .unwrap();
        assert!(replay.duplicate, "审计记录缺失时仍按幂等键识别重复支付");
        assert_eq!(replay.quota_added, 500_000);
        assert_eq!(replay.current_quota, 600_000);

        let reloaded = reload_account(state.database.as_ref(), account.id).await;
        assert_eq!(reloaded.quota, 600_000);
        assert_eq!(TopUps::find().count(state.database.as_ref()).await.unwrap(), 0);
        assert_eq!(PaymentKeys::find().count(state.database.as_ref()).await.unwrap(), 1);
    }
}
