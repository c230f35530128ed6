//! # 账户统计与模型目录服务
//!
//! 组合账户余额、余额容量估算、令牌列表、最近日志和模型用量，
//! 并基于已启用渠道和倍率表生成对外的模型价格目录。

use entity::{ConsumptionLogs, consumption_logs};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::Expr,
};
use serde::Serialize;

use crate::{
    channels::ChannelRegistry,
    config::BillingConfig,
    error::{Context, Result},
    ldebug, lwarn,
    logging::{LogComponent, LogStage},
    management::server::AppState,
    pricing::{PricingLookup, RatioTable},
    types::TimezoneContext,
};

use super::accounts::require_by_external_id;
use super::capacity::{
    BalanceCapacity, CHANNEL_QUERY_FAILED, CapacityParams, PRICING_QUERY_FAILED,
    candidate_models, estimate,
};
use super::consumption::{ConsumptionLogQuery, LogEntry};
use super::tokens::{TokenIssuer, TokenSummary};

/// 最近日志条数
pub const RECENT_LOG_LIMIT: u64 = 5;
/// 模型用量条数
pub const MODEL_USAGE_LIMIT: u64 = 10;

/// 账户概览
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub external_user_id: String,
    pub username: String,
    pub display_name: String,
    pub current_quota: i64,
    pub current_balance: f64,
    pub used_quota: i64,
    pub total_requests: i64,
    pub balance_capacity: BalanceCapacity,
}

/// 单个模型的用量
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelUsage {
    pub model: String,
    pub requests: i64,
    pub tokens: i64,
    pub spend: f64,
}

/// 账户统计
#[derive(Debug, Clone, Serialize)]
pub struct AccountStats {
    pub user_info: UserInfo,
    pub tokens: Vec<TokenSummary>,
    pub recent_logs: Vec<LogEntry>,
    pub model_usage: Vec<ModelUsage>,
}

/// 模型价格
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPrice {
    pub name: String,
    pub model_ratio: f64,
    pub completion_ratio: f64,
    /// 每 1K 输入 token 的美元价格
    pub price_per_1k: f64,
    /// 每 1K 输入 token 消耗的额度
    pub quota_per_1k: i64,
    pub billing_type: String,
    pub is_default_model: bool,
}

/// 模型价格目录
#[derive(Debug, Clone, Serialize)]
pub struct ModelCatalog {
    pub models: Vec<ModelPrice>,
    pub quota_per_unit: i64,
    pub currency: String,
}

/// 账户统计服务
pub struct AccountStatsService<'a> {
    state: &'a AppState,
    db: &'a DatabaseConnection,
    billing: &'a BillingConfig,
    channels: &'a dyn ChannelRegistry,
}

impl<'a> AccountStatsService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            state,
            db: state.database.as_ref(),
            billing: &state.config.billing,
            channels: state.channels.as_ref(),
        }
    }

    fn capacity_params(&self) -> CapacityParams {
        CapacityParams {
            group_ratio: self.billing.group_ratio,
            quota_per_unit: self.billing.quota_per_unit,
            limit: self.billing.capacity_model_limit,
        }
    }

    /// 外部用户统计
    pub async fn stats(
        &self,
        request_id: &str,
        external_user_id: &str,
        timezone: &TimezoneContext,
    ) -> Result<AccountStats> {
        let account = require_by_external_id(self.db, external_user_id).await?;

        let balance_capacity = self.balance_capacity(request_id, account.quota).await;
        let tokens = TokenIssuer::new(self.state)
            .list_for_account(account.id)
            .await?;
        let recent_logs = ConsumptionLogQuery::new(self.state)
            .recent(account.id, RECENT_LOG_LIMIT, timezone)
            .await?;
        let model_usage = self.model_usage(account.id).await?;

        ldebug!(
            request_id,
            LogStage::Business,
            LogComponent::Management,
            "account_stats",
            "账户统计查询完成",
            account_id = account.id,
            tokens = tokens.len(),
            capacity_models = balance_capacity.models.len()
        );

        Ok(AccountStats {
            user_info: UserInfo {
                external_user_id: external_user_id.to_string(),
                current_balance: self.billing.quota_to_usd(account.quota),
                username: account.username,
                display_name: account.display_name,
                current_quota: account.quota,
                used_quota: account.used_quota,
                total_requests: account.request_count,
                balance_capacity,
            },
            tokens,
            recent_logs,
            model_usage,
        })
    }

    /// 余额容量估算
    ///
    /// 渠道或倍率数据不可用时返回带错误码的空结果，不影响统计接口本身
    pub async fn balance_capacity(&self, request_id: &str, balance: i64) -> BalanceCapacity {
        if balance <= 0 {
            return BalanceCapacity::default();
        }

        let channels = match self.channels.enabled_channels().await {
            Ok(channels) => channels,
            Err(err) => {
                lwarn!(
                    request_id,
                    LogStage::Business,
                    LogComponent::Capacity,
                    "load_channels_failed",
                    "渠道查询失败，跳过容量估算",
                    error = err
                );
                return BalanceCapacity::unavailable(CHANNEL_QUERY_FAILED, "渠道查询失败");
            }
        };

        let ratios = match RatioTable::load(self.db).await {
            Ok(ratios) => ratios,
            Err(err) => {
                lwarn!(
                    request_id,
                    LogStage::Business,
                    LogComponent::Capacity,
                    "load_ratios_failed",
                    "模型倍率查询失败，跳过容量估算",
                    error = err
                );
                return BalanceCapacity::unavailable(PRICING_QUERY_FAILED, "模型倍率查询失败");
            }
        };

        estimate(balance, &channels, &ratios, self.capacity_params())
    }

    /// 按花费排序的模型用量，只统计消费日志
    pub async fn model_usage(&self, account_id: i32) -> Result<Vec<ModelUsage>> {
        let rows: Vec<(String, i64, Option<i64>, Option<i64>)> = ConsumptionLogs::find()
            .filter(consumption_logs::Column::AccountId.eq(account_id))
            .filter(consumption_logs::Column::LogType.eq(consumption_logs::LOG_TYPE_CONSUME))
            .select_only()
            .column(consumption_logs::Column::ModelName)
            .column_as(Expr::col(consumption_logs::Column::Id).count(), "requests")
            .column_as(
                Expr::expr(
                    Expr::col(consumption_logs::Column::PromptTokens)
                        .add(Expr::col(consumption_logs::Column::CompletionTokens)),
                )
                .sum(),
                "tokens",
            )
            .column_as(Expr::col(consumption_logs::Column::Quota).sum(), "quota")
            .group_by(consumption_logs::Column::ModelName)
            .order_by_desc(Expr::col(consumption_logs::Column::Quota).sum())
            .order_by_asc(consumption_logs::Column::ModelName)
            .limit(MODEL_USAGE_LIMIT)
            .into_tuple()
            .all(self.db)
            .await
            .context("统计模型用量失败")?;

        Ok(rows
            .into_iter()
            .map(|(model, requests, tokens, quota)| ModelUsage {
                model,
                requests,
                tokens: tokens.unwrap_or(0),
                spend: self.billing.quota_to_usd(quota.unwrap_or(0)),
            })
            .collect())
    }

    /// 可用模型价格目录
    ///
    /// 渠道或倍率读取失败时返回配置不可用错误
    pub async fn models(&self, request_id: &str) -> Result<ModelCatalog> {
        let channels = self.channels.enabled_channels().await?;
        let ratios = RatioTable::load(self.db).await?;
        let (ordered, defaults) = candidate_models(&channels);
        let group_ratio = self.billing.group_ratio;

        let models: Vec<ModelPrice> = ordered
            .into_iter()
            .filter_map(|name| {
                let pricing = ratios.lookup(&name)?;
                Some(ModelPrice {
                    is_default_model: defaults.contains(&name),
                    model_ratio: pricing.model_ratio,
                    completion_ratio: pricing.completion_ratio,
                    price_per_1k: pricing.base_price_usd() * group_ratio,
                    quota_per_1k: pricing.quota_per_1k_input(group_ratio),
                    billing_type: "ratio".to_string(),
                    name,
                })
            })
            .collect();

        ldebug!(
            request_id,
            LogStage::Business,
            LogComponent::Pricing,
            "list_models",
            "模型目录生成完成",
            models = models.len()
        );

        Ok(ModelCatalog {
            models,
            quota_per_unit: self.billing.quota_per_unit,
            currency: "USD".to_string(),
        })
    }
}
