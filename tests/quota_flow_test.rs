//! # 额度流程测试
//!
//! 直接调用服务层，验证身份同步、充值与令牌之间的协作

mod common;

use common::TestApp;
use entity::{Accounts, TopUps};
use pretty_assertions::assert_eq;
use quota_bridge::management::services::{
    CreditRequest, ExternalIdentity, IdentityReconciler, IssueTokenRequest, QuotaLedger,
    TokenIssuer,
};
use sea_orm::{EntityTrait, PaginatorTrait};

fn identity(external_user_id: &str, username: &str) -> ExternalIdentity {
    ExternalIdentity {
        external_user_id: external_user_id.to_string(),
        username: Some(username.to_string()),
        ..ExternalIdentity::default()
    }
}

fn credit(external_user_id: &str, amount_usd: f64, payment_id: &str) -> CreditRequest {
    CreditRequest {
        external_user_id: external_user_id.to_string(),
        amount_usd,
        payment_id: payment_id.to_string(),
    }
}

#[tokio::test]
async fn reconcile_then_update_keeps_single_account() {
    let app = TestApp::new().await;
    let reconciler = IdentityReconciler::new(&app.state);

    let mut first = identity("ext-1", "alice");
    first.email = Some("alice@example.com".to_string());
    let created = reconciler.reconcile("t", &first).await.unwrap();
    assert!(created.is_new);
    assert!(created.account.aff_code.is_none(), "未提供推广码时保持为空");

    let mut second = identity("ext-1", "alice-new");
    second.display_name = Some("Alice A.".to_string());
    second.email = Some("alice@new.example.com".to_string());
    second.aff_code = Some("REF42".to_string());
    let updated = reconciler.reconcile("t", &second).await.unwrap();

    assert!(!updated.is_new);
    assert_eq!(updated.account.id, created.account.id);
    assert_eq!(updated.account.username, "alice");
    assert_eq!(updated.account.display_name, "Alice A.");
    assert_eq!(updated.account.email, "alice@new.example.com");
    assert_eq!(updated.account.aff_code.as_deref(), Some("REF42"));
    assert_eq!(updated.account.quota, created.account.quota);
    assert_eq!(Accounts::find().count(app.db()).await.unwrap(), 1);
}

#[tokio::test]
async fn credit_is_idempotent_per_payment() {
    let app = TestApp::new().await;
    IdentityReconciler::new(&app.state)
        .reconcile("t", &identity("ext-1", "alice"))
        .await
        .unwrap();
    let ledger = QuotaLedger::new(&app.state);

    let first = ledger.credit("t", &credit("ext-1", 10.0, "pay-1")).await.unwrap();
    assert_eq!(first.quota_added, 5_000_000);
    assert_eq!(first.current_quota, 5_100_000);

    let replay = ledger.credit("t", &credit("ext-1", 10.0, "pay-1")).await.unwrap();
    assert!(replay.duplicate);
    assert_eq!(replay.current_quota, 5_100_000);

    let second = ledger.credit("t", &credit("ext-1", 0.5, "pay-2")).await.unwrap();
    assert_eq!(second.current_quota, 5_350_000);
    assert_eq!(TopUps::find().count(app.db()).await.unwrap(), 2);
}

#[tokio::test]
async fn token_snapshot_is_fixed_at_issue_time() {
    let app = TestApp::new().await;
    IdentityReconciler::new(&app.state)
        .reconcile("t", &identity("ext-1", "alice"))
        .await
        .unwrap();

    let issued = TokenIssuer::new(&app.state)
        .issue(
            "t",
            &IssueTokenRequest {
                external_user_id: "ext-1".to_string(),
                token_name: "main".to_string(),
                expires_in_days: None,
            },
        )
        .await
        .unwrap();
    QuotaLedger::new(&app.state)
        .credit("t", &credit("ext-1", 1.0, "pay-1"))
        .await
        .unwrap();

    let tokens = TokenIssuer::new(&app.state)
        .list_for_account(1)
        .await
        .unwrap();
    assert_eq!(issued.remain_quota, 100_000);
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].key, issued.access_key);

    let stored = entity::AccessTokens::find_by_id(issued.token_id)
        .one(app.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.remain_quota, 100_000);
}
