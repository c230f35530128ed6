//! # 外部身份同步服务
//!
//! 将外部身份提供方的用户映射为内部账户：不存在时创建并发放新用户额度，
//! 已存在时只更新允许变更的资料字段。

use chrono::Utc;
use entity::{Accounts, accounts};
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::Deserialize;

use crate::{
    config::BillingConfig,
    ensure_valid,
    error::{BridgeError, Result},
    linfo,
    logging::{LogComponent, LogStage},
    management::server::AppState,
    types::LoginType,
};

use super::accounts::{UniqueCandidates, classify_write_error, find_by_external_id};
use super::shared::{normalize_optional, validate_length, validate_optional_length};

/// 外部账户的占位凭证哈希强度，凭证不用于登录
const PLACEHOLDER_HASH_COST: u32 = 4;
/// 占位凭证长度
const PLACEHOLDER_SECRET_LEN: usize = 16;
/// 未提供邮箱时合成邮箱使用的域名
pub const SYNTHETIC_EMAIL_DOMAIN: &str = "external.local";

/// 外部身份同步请求
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalIdentity {
    pub external_user_id: String,
    /// 仅在创建账户时使用
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub wechat_openid: Option<String>,
    pub wechat_unionid: Option<String>,
    pub alipay_userid: Option<String>,
    pub login_type: Option<String>,
    pub aff_code: Option<String>,
    /// 外部系统附加数据，原样保存
    pub external_data: Option<serde_json::Value>,
}

impl ExternalIdentity {
    fn validate(&self) -> Result<()> {
        validate_length(&self.external_user_id, "external_user_id", 1, 100)?;
        if let Some(username) = self.username.as_deref() {
            validate_length(username, "username", 0, 50)?;
        }
        validate_optional_length(self.display_name.as_deref(), "display_name", 100)?;
        validate_optional_length(self.email.as_deref(), "email", 100)?;
        if let Some(email) = normalize_optional(self.email.as_deref()) {
            ensure_valid!(email.contains('@'), "email", "邮箱格式不正确");
        }
        validate_optional_length(self.phone.as_deref(), "phone", 20)?;
        validate_optional_length(self.wechat_openid.as_deref(), "wechat_openid", 100)?;
        validate_optional_length(self.wechat_unionid.as_deref(), "wechat_unionid", 100)?;
        validate_optional_length(self.alipay_userid.as_deref(), "alipay_userid", 100)?;
        validate_optional_length(self.aff_code.as_deref(), "aff_code", 32)?;
        Ok(())
    }

    fn external_data_text(&self) -> Option<String> {
        match self.external_data.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }

    fn login_type(&self) -> Option<LoginType> {
        normalize_optional(self.login_type.as_deref()).map(|raw| LoginType::parse_or_default(&raw))
    }
}

/// 同步结果
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub account: accounts::Model,
    pub is_new: bool,
}

/// 外部身份同步服务
pub struct IdentityReconciler<'a> {
    db: &'a DatabaseConnection,
    billing: &'a BillingConfig,
}

impl<'a> IdentityReconciler<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: state.database.as_ref(),
            billing: &state.config.billing,
        }
    }

    /// 同步外部身份
    ///
    /// 同一个 `external_user_id` 只对应一个账户，重复调用只会更新资料。
    pub async fn reconcile(
        &self,
        request_id: &str,
        identity: &ExternalIdentity,
    ) -> Result<ReconcileOutcome> {
        identity.validate()?;
        let external_user_id = identity.external_user_id.trim();

        match find_by_external_id(self.db, external_user_id).await? {
            Some(existing) => self.update(request_id, existing, identity).await,
            None => self.create(request_id, external_user_id, identity).await,
        }
    }

    async fn create(
        &self,
        request_id: &str,
        external_user_id: &str,
        identity: &ExternalIdentity,
    ) -> Result<ReconcileOutcome> {
        let Some(username) = normalize_optional(identity.username.as_deref()) else {
            return Err(BridgeError::validation("创建账户时 username 不能为空", Some("username")));
        };

        let email = normalize_optional(identity.email.as_deref())
            .unwrap_or_else(|| format!("{external_user_id}@{SYNTHETIC_EMAIL_DOMAIN}"));
        let aff_code = normalize_optional(identity.aff_code.as_deref());
        let password_hash = placeholder_credential()?;
        let now = Utc::now().naive_utc();

        let model = accounts::ActiveModel {
            external_user_id: Set(Some(external_user_id.to_string())),
            username: Set(username.clone()),
            display_name: Set(identity
                .display_name
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string()),
            email: Set(email.clone()),
            password_hash: Set(password_hash),
            phone: Set(normalize_optional(identity.phone.as_deref())),
            wechat_openid: Set(normalize_optional(identity.wechat_openid.as_deref())),
            wechat_unionid: Set(normalize_optional(identity.wechat_unionid.as_deref())),
            alipay_userid: Set(normalize_optional(identity.alipay_userid.as_deref())),
            login_type: Set(identity.login_type().unwrap_or_default().as_str().to_string()),
            role: Set(accounts::ROLE_COMMON_USER),
            status: Set(accounts::STATUS_ENABLED),
            quota: Set(self.billing.new_user_quota),
            used_quota: Set(0),
            request_count: Set(0),
            aff_code: Set(aff_code.clone()),
            is_external: Set(true),
            external_data: Set(identity.external_data_text()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let account = match Accounts::insert(model).exec_with_returning(self.db).await {
            Ok(account) => account,
            Err(err) => {
                let candidates = UniqueCandidates {
                    external_user_id: Some(external_user_id),
                    username: Some(&username),
                    email: Some(&email),
                    aff_code: aff_code.as_deref(),
                };
                return Err(classify_write_error(self.db, err, candidates, None).await);
            }
        };

        linfo!(
            request_id,
            LogStage::Business,
            LogComponent::Identity,
            "account_created",
            "外部用户账户创建成功",
            account_id = account.id,
            external_user_id = external_user_id,
            quota = account.quota
        );

        Ok(ReconcileOutcome {
            account,
            is_new: true,
        })
    }

    async fn update(
        &self,
        request_id: &str,
        existing: accounts::Model,
        identity: &ExternalIdentity,
    ) -> Result<ReconcileOutcome> {
        let account_id = existing.id;
        let mut model: accounts::ActiveModel = existing.into();

        if let Some(display_name) = identity.display_name.as_deref() {
            model.display_name = Set(display_name.trim().to_string());
        }
        if identity.phone.is_some() {
            model.phone = Set(normalize_optional(identity.phone.as_deref()));
        }
        if identity.wechat_openid.is_some() {
            model.wechat_openid = Set(normalize_optional(identity.wechat_openid.as_deref()));
        }
        if identity.wechat_unionid.is_some() {
            model.wechat_unionid = Set(normalize_optional(identity.wechat_unionid.as_deref()));
        }
        if identity.alipay_userid.is_some() {
            model.alipay_userid = Set(normalize_optional(identity.alipay_userid.as_deref()));
        }
        if identity.external_data.is_some() {
            model.external_data = Set(identity.external_data_text());
        }

        // 邮箱、登录方式和推广码只接受非空值
        let email = normalize_optional(identity.email.as_deref());
        if let Some(email) = email.as_ref() {
            model.email = Set(email.clone());
        }
        if let Some(login_type) = identity.login_type() {
            model.login_type = Set(login_type.as_str().to_string());
        }
        let aff_code = normalize_optional(identity.aff_code.as_deref());
        if let Some(aff_code) = aff_code.as_ref() {
            model.aff_code = Set(Some(aff_code.clone()));
        }
        model.updated_at = Set(Utc::now().naive_utc());

        let account = match model.update(self.db).await {
            Ok(account) => account,
            Err(err) => {
                let candidates = UniqueCandidates {
                    email: email.as_deref(),
                    aff_code: aff_code.as_deref(),
                    ..UniqueCandidates::default()
                };
                return Err(classify_write_error(self.db, err, candidates, Some(account_id)).await);
            }
        };

        linfo!(
            request_id,
            LogStage::Business,
            LogComponent::Identity,
            "account_updated",
            "外部用户资料更新成功",
            account_id = account.id,
            external_user_id = identity.external_user_id.trim()
        );

        Ok(ReconcileOutcome {
            account,
            is_new: false,
        })
    }
}

/// 生成随机占位凭证的哈希
fn placeholder_credential() -> Result<String> {
    let secret: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PLACEHOLDER_SECRET_LEN)
        .map(char::from)
        .collect();
    Ok(bcrypt::hash(secret, PLACEHOLDER_HASH_COST)?)
}
