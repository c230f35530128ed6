//! # 集成测试公共设施
//!
//! 内存数据库、应用状态和 HTTP 请求辅助

#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use entity::{channels, consumption_logs, model_ratios};
use quota_bridge::{
    config::AppConfig,
    management::{AppState, create_router},
};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// 测试应用
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    /// 新建内存数据库并完成迁移
    pub async fn new() -> Self {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("connect in-memory sqlite");
        migration::Migrator::up(&db, None)
            .await
            .expect("run migrations");

        let mut config = AppConfig::default();
        config.database.url = "sqlite::memory:".to_string();
        config.billing.new_user_quota = 100_000;

        let state = AppState::new(Arc::new(db), Arc::new(config));
        let router = create_router(state.clone(), &state.config.server);
        Self { state, router }
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.state.database.as_ref()
    }

    /// 发送请求并解析 JSON 响应
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), &[]).await
    }

    pub async fn delete(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(body), &[]).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, &[]).await
    }

    /// 写入已启用渠道
    pub async fn add_channel(&self, name: &str, models: &str, test_model: Option<&str>) {
        channels::ActiveModel {
            name: Set(name.to_string()),
            models: Set(models.to_string()),
            test_model: Set(test_model.map(ToString::to_string)),
            status: Set(channels::STATUS_ENABLED),
            created_time: Set(0),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("insert channel");
    }

    /// 写入模型倍率
    pub async fn add_ratio(&self, model: &str, model_ratio: f64, completion_ratio: f64) {
        let now = chrono::Utc::now().naive_utc();
        model_ratios::ActiveModel {
            model_name: Set(model.to_string()),
            model_ratio: Set(model_ratio),
            completion_ratio: Set(completion_ratio),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("insert ratio");
    }

    /// 写入一条消费日志
    pub async fn add_consume_log(&self, account_id: i32, created_at: i64, model: &str, quota: i64) {
        let account = entity::Accounts::find_by_id(account_id)
            .one(self.db())
            .await
            .expect("query account")
            .expect("account exists");
        consumption_logs::ActiveModel {
            account_id: Set(account_id),
            created_at: Set(created_at),
            log_type: Set(consumption_logs::LOG_TYPE_CONSUME),
            username: Set(account.username),
            model_name: Set(model.to_string()),
            prompt_tokens: Set(10),
            completion_tokens: Set(5),
            quota: Set(quota),
            content: Set(None),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("insert log");
    }
}

/// 同步请求体
pub fn sync_body(external_user_id: &str, username: &str) -> Value {
    serde_json::json!({
        "external_user_id": external_user_id,
        "username": username,
    })
}
