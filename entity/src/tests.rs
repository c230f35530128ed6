//! # 实体定义测试
//!
//! 测试 Sea-ORM 实体定义的正确性

#[cfg(test)]
mod tests {
    use crate::{access_tokens, accounts, channels, payment_keys, top_ups};
    use sea_orm::{ActiveValue, EntityName, Set};

    #[tokio::test]
    async fn test_account_active_model() {
        let account = accounts::ActiveModel {
            external_user_id: Set(Some("ext-1".to_string())),
            username: Set("alice".to_string()),
            email: Set("ext-1@external.local".to_string()),
            quota: Set(0),
            aff_code: Set(None),
            is_external: Set(true),
            ..Default::default()
        };

        assert_eq!(account.username.as_ref(), "alice");
        assert_eq!(account.aff_code.as_ref(), &None);
        assert_eq!(account.is_external.as_ref(), &true);
        assert!(matches!(account.id, ActiveValue::NotSet));
    }

    #[tokio::test]
    async fn test_top_up_and_token_models() {
        let record = top_ups::ActiveModel {
            account_id: Set(1),
            amount: Set(1000),
            money: Set(10.0),
            quota: Set(5_000_000),
            trade_no: Set("pay-1".to_string()),
            status: Set(top_ups::STATUS_SUCCESS.to_string()),
            ..Default::default()
        };
        assert_eq!(record.trade_no.as_ref(), "pay-1");
        assert_eq!(record.quota.as_ref(), &5_000_000);

        let token = access_tokens::ActiveModel {
            account_id: Set(1),
            key: Set("k".repeat(32)),
            status: Set(access_tokens::STATUS_ENABLED),
            unlimited_quota: Set(false),
            ..Default::default()
        };
        assert_eq!(token.key.as_ref().len(), 32);
    }

    #[test]
    fn test_table_names() {
        assert_eq!(accounts::Entity.table_name(), "accounts");
        assert_eq!(top_ups::Entity.table_name(), "top_ups");
        assert_eq!(access_tokens::Entity.table_name(), "access_tokens");
        assert_eq!(channels::Entity.table_name(), "channels");
        assert_eq!(payment_keys::Entity.table_name(), "payment_keys");
    }
}
