//! # 测试数据 Fixtures
//!
//! 直接写库的测试数据构建器，绕过业务服务准备前置状态

use entity::{Accounts, ModelRatios, accounts, channels, consumption_logs, model_ratios};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

/// 账户测试数据构建器
pub struct AccountFixture {
    pub external_user_id: String,
    pub username: String,
    pub quota: i64,
    pub aff_code: Option<String>,
}

impl AccountFixture {
    /// 创建新的账户 fixture
    #[must_use]
    pub fn new(external_user_id: &str, username: &str) -> Self {
        Self {
            external_user_id: external_user_id.to_string(),
            username: username.to_string(),
            quota: 0,
            aff_code: None,
        }
    }

    /// 设置余额
    #[must_use]
    pub const fn quota(mut self, quota: i64) -> Self {
        self.quota = quota;
        self
    }

    /// 设置推广码
    #[must_use]
    pub fn aff_code(mut self, code: &str) -> Self {
        self.aff_code = Some(code.to_string());
        self
    }

    /// 写入数据库
    pub async fn insert(self, db: &DatabaseConnection) -> accounts::Model {
        let now = chrono::Utc::now().naive_utc();
        accounts::ActiveModel {
            email: Set(format!("{}@external.local", self.external_user_id)),
            external_user_id: Set(Some(self.external_user_id)),
            username: Set(self.username),
            display_name: Set(String::new()),
            password_hash: Set("placeholder".to_string()),
            login_type: Set("email".to_string()),
            role: Set(accounts::ROLE_COMMON_USER),
            status: Set(accounts::STATUS_ENABLED),
            quota: Set(self.quota),
            used_quota: Set(0),
            request_count: Set(0),
            aff_code: Set(self.aff_code),
            is_external: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("insert account fixture")
    }
}

/// 写入一个渠道
pub async fn insert_channel(
    db: &DatabaseConnection,
    name: &str,
    models: &str,
    test_model: Option<&str>,
    status: i32,
) -> channels::Model {
    channels::ActiveModel {
        name: Set(name.to_string()),
        models: Set(models.to_string()),
        test_model: Set(test_model.map(ToString::to_string)),
        status: Set(status),
        created_time: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert channel fixture")
}

/// 批量写入模型倍率
pub async fn insert_ratios(db: &DatabaseConnection, ratios: &[(&str, f64, f64)]) {
    let now = chrono::Utc::now().naive_utc();
    let rows = ratios
        .iter()
        .map(|(name, ratio, completion)| model_ratios::ActiveModel {
            model_name: Set((*name).to_string()),
            model_ratio: Set(*ratio),
            completion_ratio: Set(*completion),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        });
    ModelRatios::insert_many(rows)
        .exec(db)
        .await
        .expect("insert ratio fixtures");
}

/// 消费日志测试数据
pub struct LogFixture {
    pub created_at: i64,
    pub log_type: i32,
    pub model_name: String,
    pub prompt_tokens: i32,
    pub completion_tokens: i32,
    pub quota: i64,
}

impl LogFixture {
    /// 一条消费日志
    #[must_use]
    pub fn consume(created_at: i64, model_name: &str, quota: i64) -> Self {
        Self {
            created_at,
            log_type: consumption_logs::LOG_TYPE_CONSUME,
            model_name: model_name.to_string(),
            prompt_tokens: 100,
            completion_tokens: 50,
            quota,
        }
    }

    /// 一条充值日志
    #[must_use]
    pub fn topup(created_at: i64, quota: i64) -> Self {
        Self {
            created_at,
            log_type: consumption_logs::LOG_TYPE_TOPUP,
            model_name: String::new(),
            prompt_tokens: 0,
            completion_tokens: 0,
            quota,
        }
    }

    /// 写入数据库
    pub async fn insert(self, db: &DatabaseConnection, account: &accounts::Model) {
        consumption_logs::ActiveModel {
            account_id: Set(account.id),
            created_at: Set(self.created_at),
            log_type: Set(self.log_type),
            username: Set(account.username.clone()),
            model_name: Set(self.model_name),
            prompt_tokens: Set(self.prompt_tokens),
            completion_tokens: Set(self.completion_tokens),
            quota: Set(self.quota),
            content: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("insert log fixture");
    }
}

/// 读取账户最新状态
pub async fn reload_account(db: &DatabaseConnection, id: i32) -> accounts::Model {
    Accounts::find_by_id(id)
        .one(db)
        .await
        .expect("query account")
        .expect("account exists")
}
